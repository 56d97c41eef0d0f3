use crate::model::category::Category;
use crate::model::summary::{HistogramBucket, SummaryRow, SummaryTable};
use crate::pipeline::stage2_classify::Partitions;

#[derive(Debug, Clone)]
pub struct Stage3Output {
    pub summary: SummaryTable,
    /// Sparse: zero-count buckets are omitted. See `backfill_buckets`.
    pub histogram: Vec<HistogramBucket>,
    /// Set when the nuclei column was not among the summary columns; nuclei
    /// sums then report 0 and the histogram is empty.
    pub nuclei_missing: bool,
}

/// Computes the infected-cell summary table and the nuclei histogram.
///
/// Percentages are over ALL cells/nuclei (uninfected included), rounded to
/// 2 decimal places; a zero denominator yields the `None` sentinel instead of
/// a division error. The grand-total row never carries percentages.
pub fn run_stage3(partitions: &Partitions, max_bin: u32) -> Stage3Output {
    let nuclei_idx = partitions.nuclei_index();
    let nuclei_of = |r: &crate::model::record::Record| -> f64 {
        nuclei_idx.map(|i| r.values[i]).unwrap_or(0.0)
    };

    let mono = partitions.records(Category::MononucleatedInfected);
    let multi = partitions.records(Category::MultinucleatedInfected);

    let mono_cells = mono.len() as u64;
    let multi_cells = multi.len() as u64;
    let mono_nuclei: f64 = mono.iter().map(|r| nuclei_of(r)).sum();
    let multi_nuclei: f64 = multi.iter().map(|r| nuclei_of(r)).sum();

    let total_cells = partitions.total_cells() as u64;
    let total_nuclei: f64 = partitions.all().map(|r| nuclei_of(r)).sum();

    let pct = |part: f64, total: f64| (total != 0.0).then(|| round2(part / total * 100.0));
    let row = |label: &'static str, cells: u64, nuclei: f64| SummaryRow {
        label,
        cells,
        nuclei,
        pct_cells: pct(cells as f64, total_cells as f64),
        pct_nuclei: pct(nuclei, total_nuclei),
    };

    let summary = SummaryTable {
        rows: vec![
            row("Mononucleated Infected", mono_cells, mono_nuclei),
            row("Multinucleated Infected", multi_cells, multi_nuclei),
            row(
                "Total Infected",
                mono_cells + multi_cells,
                mono_nuclei + multi_nuclei,
            ),
            SummaryRow {
                label: "Total incl uninfected",
                cells: total_cells,
                nuclei: total_nuclei,
                pct_cells: None,
                pct_nuclei: None,
            },
        ],
    };

    let histogram = match nuclei_idx {
        Some(idx) => histogram(partitions.infected().map(|r| r.values[idx]), max_bin),
        None => Vec::new(),
    };

    Stage3Output {
        summary,
        histogram,
        nuclei_missing: nuclei_idx.is_none(),
    }
}

pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Buckets nuclei counts with right-closed edges and an inclusive lowest
/// edge: `"1"` covers [0, 1], `"n"` covers (n-1, n] up to `max_bin - 1`, and
/// `"max_bin+"` pools everything above. A count of 0 therefore lands in
/// bucket `"1"`, never dropped. Zero-count buckets are omitted.
pub fn histogram<I>(nuclei_counts: I, max_bin: u32) -> Vec<HistogramBucket>
where
    I: IntoIterator<Item = f64>,
{
    debug_assert!(max_bin >= 2);
    let overflow = (max_bin - 1) as usize;
    let mut counts = vec![0u64; max_bin as usize];
    for value in nuclei_counts {
        let idx = if value <= 1.0 {
            0
        } else if value > (max_bin - 1) as f64 {
            overflow
        } else {
            value.ceil() as usize - 1
        };
        counts[idx] += 1;
    }
    counts
        .iter()
        .enumerate()
        .filter(|&(_, &count)| count > 0)
        .map(|(i, &count)| HistogramBucket {
            label: bucket_label(i, max_bin),
            count,
        })
        .collect()
}

/// Expands a sparse histogram to the full bucket sequence so the written
/// block always has `max_bin` rows and the chart's category axis is complete.
pub fn backfill_buckets(sparse: &[HistogramBucket], max_bin: u32) -> Vec<HistogramBucket> {
    (0..max_bin as usize)
        .map(|i| {
            let label = bucket_label(i, max_bin);
            let count = sparse
                .iter()
                .find(|b| b.label == label)
                .map(|b| b.count)
                .unwrap_or(0);
            HistogramBucket { label, count }
        })
        .collect()
}

fn bucket_label(index: usize, max_bin: u32) -> String {
    if index + 1 < max_bin as usize {
        format!("{}", index + 1)
    } else {
        format!("{max_bin}+")
    }
}
