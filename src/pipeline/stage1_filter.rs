use tracing::warn;

use crate::model::record::{NUCLEI_COLUMN, RecordSet};

#[derive(Debug)]
pub struct Stage1Output {
    pub records: RecordSet,
    pub removed: usize,
}

/// Optionally drops records whose nuclei count is zero. When the nuclei
/// column is not among the summary columns the removal is skipped with a
/// report instead of failing.
pub fn run_stage1(set: RecordSet, remove_zero_nuclei: bool) -> Stage1Output {
    if !remove_zero_nuclei {
        return Stage1Output {
            records: set,
            removed: 0,
        };
    }

    let Some(nuclei_idx) = set.nuclei_index() else {
        warn!("column '{NUCLEI_COLUMN}' not found; skipping zero-nuclei row removal");
        return Stage1Output {
            records: set,
            removed: 0,
        };
    };

    let mut set = set;
    let before = set.records.len();
    set.records.retain(|r| r.values[nuclei_idx] != 0.0);
    let removed = before - set.records.len();

    Stage1Output {
        records: set,
        removed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::record::Record;

    fn record(object_id: &str, nuclei: f64) -> Record {
        Record {
            object_id: object_id.to_string(),
            mononucleated: true,
            infected: false,
            values: vec![nuclei],
        }
    }

    fn set_with_nuclei(counts: &[f64]) -> RecordSet {
        RecordSet {
            columns: vec![NUCLEI_COLUMN.to_string()],
            records: counts
                .iter()
                .enumerate()
                .map(|(i, &n)| record(&format!("{}", i + 1), n))
                .collect(),
        }
    }

    #[test]
    fn test_disabled_is_passthrough() {
        let out = run_stage1(set_with_nuclei(&[0.0, 2.0]), false);
        assert_eq!(out.removed, 0);
        assert_eq!(out.records.len(), 2);
    }

    #[test]
    fn test_removes_zero_nuclei_rows() {
        let out = run_stage1(set_with_nuclei(&[0.0, 2.0, 0.0, 1.0]), true);
        assert_eq!(out.removed, 2);
        let kept: Vec<_> = out.records.records.iter().map(|r| r.object_id.as_str()).collect();
        assert_eq!(kept, vec!["2", "4"]);
    }

    #[test]
    fn test_missing_nuclei_column_is_reported_noop() {
        let set = RecordSet {
            columns: vec!["AreaShape_Area".to_string()],
            records: vec![record("1", 0.0)],
        };
        let out = run_stage1(set, true);
        assert_eq!(out.removed, 0);
        assert_eq!(out.records.len(), 1);
    }
}
