use crate::report::ReportError;
use crate::report::workbook::{Cell, SheetDoc};

/// Section header row that anchors the histogram block in the combined sheet.
/// The chart data range is derived from its position, so a single contiguous
/// cell range drives the chart.
pub const HISTOGRAM_MARKER: &str = "Nuclei Distribution in Infected Cells";

/// A rendering request: two single-column cell ranges (categories and
/// values) and an anchor position. Rendered by the workbook on save.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub sheet: String,
    pub title: String,
    pub x_title: String,
    pub y_title: String,
    /// First and last data row, 0-based, inclusive.
    pub first_row: u32,
    pub last_row: u32,
    pub category_col: u16,
    pub value_col: u16,
    pub anchor_row: u32,
    pub anchor_col: u16,
}

/// Locates the histogram block in the written summary sheet and plans the
/// bar chart over it, anchored a few rows below the table. Failing to find
/// the marker is fatal for the chart step: a chart over a guessed range
/// would be silently malformed.
pub fn plan_histogram_chart(sheet: &SheetDoc, n_rows: u32) -> Result<ChartSpec, ReportError> {
    let marker = sheet
        .rows
        .iter()
        .position(|row| matches!(row.first(), Some(Cell::Text(text)) if text == HISTOGRAM_MARKER))
        .ok_or_else(|| ReportError::ChartPlacement(sheet.name.clone()))?;

    let first_row = marker as u32 + 1;
    Ok(ChartSpec {
        sheet: sheet.name.clone(),
        title: "Nuclei per Infected Cell".to_string(),
        x_title: "Nuclei".to_string(),
        y_title: "Infected cells".to_string(),
        first_row,
        last_row: first_row + n_rows - 1,
        category_col: 0,
        value_col: 1,
        anchor_row: first_row + n_rows + 3,
        anchor_col: 0,
    })
}
