use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::model::category::Category;
use crate::model::record::{INFECTED_COLUMN, MONONUCLEATED_COLUMN, NUCLEI_COLUMN, OBJECT_COLUMN};
use crate::model::summary::{HistogramBucket, SummaryTable};
use crate::pipeline::stage2_classify::Partitions;
use crate::pipeline::stage3_summary::{Stage3Output, backfill_buckets};
use crate::report::ReportError;
use crate::report::chart::{ChartSpec, HISTOGRAM_MARKER, plan_histogram_chart};
use crate::report::names::SheetNameAllocator;
use crate::report::workbook::{Cell, SheetDoc, WorkbookDoc, load_sheets};

pub const SUMMARY_SHEET: &str = "Cell Count Summary";

#[derive(Debug)]
pub struct Stage4Input<'a> {
    pub partitions: &'a Partitions,
    pub stats: &'a Stage3Output,
    pub max_bin: u32,
    pub outfile: &'a Path,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartOutcome {
    Placed,
    /// No nuclei column was summarised; there is nothing to chart.
    Skipped,
    /// The histogram marker could not be located. Sheets already written are
    /// preserved; the input counts as failed.
    Failed,
}

#[derive(Debug)]
pub struct Stage4Output {
    pub outfile: PathBuf,
    pub chart: ChartOutcome,
}

/// Assembles one output artifact: category sheets, the combined
/// summary+histogram sheet, the embedded chart, per-column cross-sheet
/// comparison sheets, and the canonical sheet order.
pub fn run_stage4(input: &Stage4Input<'_>) -> Result<Stage4Output, ReportError> {
    let mut allocator = SheetNameAllocator::new();
    let mut doc = WorkbookDoc::new();

    for category in Category::ALL {
        let name = allocator.allocate(category.label());
        doc.upsert_sheet(SheetDoc {
            name,
            rows: category_rows(input.partitions, category),
        });
    }

    let buckets = backfill_buckets(&input.stats.histogram, input.max_bin);
    let summary_name = allocator.allocate(SUMMARY_SHEET);
    doc.upsert_sheet(SheetDoc {
        name: summary_name.clone(),
        rows: summary_rows(&input.stats.summary, &buckets),
    });

    persist(&doc, input.outfile)?;
    info!("writing output data to '{}'", input.outfile.display());

    let chart = if input.stats.nuclei_missing {
        warn!("column '{NUCLEI_COLUMN}' was not summarised; skipping the nuclei distribution chart");
        ChartOutcome::Skipped
    } else {
        match plan_chart(&doc, &summary_name, buckets.len() as u32) {
            Ok(spec) => {
                doc.add_chart(spec);
                ChartOutcome::Placed
            }
            Err(err @ ReportError::ChartPlacement(_)) => {
                error!("{err}; the artifact keeps its sheets but no chart");
                ChartOutcome::Failed
            }
            Err(err) => return Err(err),
        }
    };

    // Cross-sheet comparison sheets are sourced from the artifact on disk,
    // not the in-memory sets, so sheets written by other tooling are
    // included. Those out-of-band sheets are merged into the doc to survive
    // the final rewrite.
    let disk_sheets = load_sheets(input.outfile)?;
    for sheet in &disk_sheets {
        if doc.sheet(&sheet.name).is_none() {
            allocator.reserve(&sheet.name);
            doc.upsert_sheet(sheet.clone());
        }
    }

    let mut priority = vec![summary_name];
    for column in &input.partitions.columns {
        match column_summary_rows(&disk_sheets, column) {
            Some(rows) => {
                let name = allocator.allocate(&format!("{column} Summary"));
                priority.push(name.clone());
                doc.upsert_sheet(SheetDoc { name, rows });
            }
            None => warn!("no data found in any sheet for column '{column}'"),
        }
    }

    doc.reorder(&priority);
    persist(&doc, input.outfile)?;

    Ok(Stage4Output {
        outfile: input.outfile.to_path_buf(),
        chart,
    })
}

fn persist(doc: &WorkbookDoc, path: &Path) -> Result<(), ReportError> {
    doc.save(path)?;
    if !path.exists() {
        return Err(ReportError::ArtifactCreation(path.to_path_buf()));
    }
    Ok(())
}

fn plan_chart(
    doc: &WorkbookDoc,
    summary_name: &str,
    n_rows: u32,
) -> Result<ChartSpec, ReportError> {
    let sheet = doc
        .sheet(summary_name)
        .ok_or_else(|| ReportError::ChartPlacement(summary_name.to_string()))?;
    plan_histogram_chart(sheet, n_rows)
}

/// Identifier, both flags, then the requested summary columns; row order as
/// classified.
fn category_rows(partitions: &Partitions, category: Category) -> Vec<Vec<Cell>> {
    let mut header = vec![
        Cell::text(OBJECT_COLUMN),
        Cell::text(MONONUCLEATED_COLUMN),
        Cell::text(INFECTED_COLUMN),
    ];
    header.extend(partitions.columns.iter().map(|c| Cell::text(c.as_str())));

    let mut rows = vec![header];
    for record in partitions.records(category) {
        let mut row = vec![
            id_cell(&record.object_id),
            Cell::Number(f64::from(record.mononucleated as u8)),
            Cell::Number(f64::from(record.infected as u8)),
        ];
        row.extend(record.values.iter().map(|v| Cell::Number(*v)));
        rows.push(row);
    }
    rows
}

// Object identifiers are usually numeric; keep them typed when they are.
fn id_cell(object_id: &str) -> Cell {
    match object_id.parse::<f64>() {
        Ok(value) => Cell::Number(value),
        Err(_) => Cell::text(object_id),
    }
}

/// Summary table, two spacer rows, the histogram marker, then the backfilled
/// histogram reusing the first two columns so one contiguous range drives
/// the chart.
fn summary_rows(summary: &SummaryTable, buckets: &[HistogramBucket]) -> Vec<Vec<Cell>> {
    let mut rows = vec![
        SummaryTable::HEADER
            .iter()
            .map(|h| Cell::text(*h))
            .collect::<Vec<_>>(),
    ];
    for row in &summary.rows {
        rows.push(vec![
            Cell::text(row.label),
            Cell::Number(row.cells as f64),
            Cell::Number(row.nuclei),
            pct_cell(row.pct_cells),
            pct_cell(row.pct_nuclei),
        ]);
    }
    rows.push(Vec::new());
    rows.push(Vec::new());
    rows.push(vec![Cell::text(HISTOGRAM_MARKER)]);
    for bucket in buckets {
        rows.push(vec![
            Cell::text(bucket.label.as_str()),
            Cell::Number(bucket.count as f64),
        ]);
    }
    rows
}

fn pct_cell(value: Option<f64>) -> Cell {
    value.map(Cell::Number).unwrap_or(Cell::Empty)
}

/// One comparison sheet for `column`: one header cell per sheet that carries
/// the column, values below, ragged ends left empty. `None` when no sheet
/// carries it.
fn column_summary_rows(sheets: &[SheetDoc], column: &str) -> Option<Vec<Vec<Cell>>> {
    let mut series: Vec<(&str, Vec<Cell>)> = Vec::new();
    for sheet in sheets {
        let Some(header) = sheet.rows.first() else {
            continue;
        };
        let Some(idx) = header
            .iter()
            .position(|cell| cell.as_text() == Some(column))
        else {
            continue;
        };
        let values = sheet.rows[1..]
            .iter()
            .map(|row| row.get(idx).cloned().unwrap_or(Cell::Empty))
            .collect();
        series.push((sheet.name.as_str(), values));
    }
    if series.is_empty() {
        return None;
    }

    let height = series.iter().map(|(_, v)| v.len()).max().unwrap_or(0);
    let mut rows = Vec::with_capacity(height + 1);
    rows.push(
        series
            .iter()
            .map(|(name, _)| Cell::text(*name))
            .collect::<Vec<_>>(),
    );
    for i in 0..height {
        rows.push(
            series
                .iter()
                .map(|(_, values)| values.get(i).cloned().unwrap_or(Cell::Empty))
                .collect(),
        );
    }
    Some(rows)
}
