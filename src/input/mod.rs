use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;

use crate::model::record::{
    INFECTED_COLUMN, MONONUCLEATED_COLUMN, OBJECT_COLUMN, Record, RecordSet,
};

pub mod reader;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("input file '{}' not found", .0.display())]
    SourceNotFound(PathBuf),
    #[error("no columns to parse from '{}'", .0.display())]
    EmptySource(PathBuf),
    #[error("required columns not found in '{}': {}", path.display(), missing.join(", "))]
    MissingColumns { path: PathBuf, missing: Vec<String> },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

/// Loads one delimited input source into a `RecordSet`.
///
/// Headers are whitespace-trimmed before matching. All required columns
/// (identifier, both classification flags, every requested summary column)
/// must be present; every absent one is reported at once. Rows whose flags
/// are not exactly 0/1 or whose summary values are absent or non-numeric are
/// excluded with a warning so the downstream partition stays total.
pub fn load_records(path: &Path, summary_columns: &[String]) -> Result<RecordSet, InputError> {
    if !path.exists() {
        return Err(InputError::SourceNotFound(path.to_path_buf()));
    }

    let source = reader::open_maybe_gz(path)?;
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(source);

    let headers = csv_reader.headers()?.clone();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(InputError::EmptySource(path.to_path_buf()));
    }

    let mut missing: Vec<String> = Vec::new();
    let mut resolve = |name: &str| -> usize {
        headers
            .iter()
            .position(|h| h == name)
            .unwrap_or_else(|| {
                missing.push(name.to_string());
                usize::MAX
            })
    };
    let object_idx = resolve(OBJECT_COLUMN);
    let mono_idx = resolve(MONONUCLEATED_COLUMN);
    let infected_idx = resolve(INFECTED_COLUMN);
    let value_idx: Vec<usize> = summary_columns.iter().map(|c| resolve(c)).collect();

    if !missing.is_empty() {
        return Err(InputError::MissingColumns {
            path: path.to_path_buf(),
            missing,
        });
    }

    let mut records = Vec::new();
    let mut excluded = 0usize;
    for row in csv_reader.records() {
        let row = row?;
        match parse_record(&row, object_idx, mono_idx, infected_idx, &value_idx) {
            Some(record) => records.push(record),
            None => excluded += 1,
        }
    }
    if excluded > 0 {
        warn!(
            "excluded {excluded} rows with missing or non-binary classification fields from '{}'",
            path.display()
        );
    }

    Ok(RecordSet {
        columns: summary_columns.to_vec(),
        records,
    })
}

fn parse_record(
    row: &csv::StringRecord,
    object_idx: usize,
    mono_idx: usize,
    infected_idx: usize,
    value_idx: &[usize],
) -> Option<Record> {
    let object_id = row.get(object_idx)?.to_string();
    let mononucleated = parse_flag(row.get(mono_idx)?)?;
    let infected = parse_flag(row.get(infected_idx)?)?;

    let mut values = Vec::with_capacity(value_idx.len());
    for &idx in value_idx {
        let field = row.get(idx)?;
        if field.is_empty() {
            return None;
        }
        values.push(field.parse::<f64>().ok()?);
    }

    Some(Record {
        object_id,
        mononucleated,
        infected,
        values,
    })
}

// Flags must be exactly 0 or 1; anything else disqualifies the row.
fn parse_flag(field: &str) -> Option<bool> {
    match field {
        "0" => Some(false),
        "1" => Some(true),
        _ => match field.parse::<f64>().ok()? {
            v if v == 0.0 => Some(false),
            v if v == 1.0 => Some(true),
            _ => None,
        },
    }
}
