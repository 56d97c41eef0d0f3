// Spreadsheet read/write service for one output artifact.
//
// The assembler builds an in-memory WorkbookDoc, saves it with
// rust_xlsxwriter and re-reads the on-disk artifact with calamine. Charts are
// kept as pending specs and rendered on every save: the read side cannot
// recover them, so they live with the doc rather than the file.

use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};
use rust_xlsxwriter::{Chart, ChartType, Format, Workbook};

use crate::report::ReportError;
use crate::report::chart::ChartSpec;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Cell {
        Cell::Text(value.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(value) => Some(*value),
            _ => None,
        }
    }
}

/// One named sheet: a row-major grid. Row 0 is the header row.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetDoc {
    pub name: String,
    pub rows: Vec<Vec<Cell>>,
}

#[derive(Debug, Default)]
pub struct WorkbookDoc {
    sheets: Vec<SheetDoc>,
    charts: Vec<ChartSpec>,
}

impl WorkbookDoc {
    pub fn new() -> WorkbookDoc {
        WorkbookDoc::default()
    }

    /// Replaces the sheet with the same name, or appends a new one.
    pub fn upsert_sheet(&mut self, sheet: SheetDoc) {
        match self.sheets.iter_mut().find(|s| s.name == sheet.name) {
            Some(existing) => *existing = sheet,
            None => self.sheets.push(sheet),
        }
    }

    pub fn sheet(&self, name: &str) -> Option<&SheetDoc> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn add_chart(&mut self, spec: ChartSpec) {
        self.charts.push(spec);
    }

    /// Moves the named sheets to the front in the given order; all other
    /// sheets keep their prior relative order.
    pub fn reorder(&mut self, priority: &[String]) {
        let mut front = Vec::with_capacity(self.sheets.len());
        for name in priority {
            if let Some(pos) = self.sheets.iter().position(|s| &s.name == name) {
                front.push(self.sheets.remove(pos));
            }
        }
        front.append(&mut self.sheets);
        self.sheets = front;
    }

    pub fn save(&self, path: &Path) -> Result<(), ReportError> {
        let mut workbook = Workbook::new();
        let header_format = Format::new().set_bold();

        for sheet in &self.sheets {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(sheet.name.as_str())?;

            for (r, row) in sheet.rows.iter().enumerate() {
                for (c, cell) in row.iter().enumerate() {
                    let (r, c) = (r as u32, c as u16);
                    match cell {
                        Cell::Empty => {}
                        Cell::Text(text) if r == 0 => {
                            worksheet.write_string_with_format(r, c, text.as_str(), &header_format)?;
                        }
                        Cell::Text(text) => {
                            worksheet.write_string(r, c, text.as_str())?;
                        }
                        Cell::Number(value) => {
                            worksheet.write_number(r, c, *value)?;
                        }
                    }
                }
            }

            for spec in self.charts.iter().filter(|s| s.sheet == sheet.name) {
                let mut chart = Chart::new(ChartType::Column);
                chart.title().set_name(spec.title.as_str());
                chart.x_axis().set_name(spec.x_title.as_str());
                chart.y_axis().set_name(spec.y_title.as_str());
                chart.y_axis().set_major_gridlines(false);
                chart
                    .add_series()
                    .set_values((
                        spec.sheet.as_str(),
                        spec.first_row,
                        spec.value_col,
                        spec.last_row,
                        spec.value_col,
                    ))
                    .set_categories((
                        spec.sheet.as_str(),
                        spec.first_row,
                        spec.category_col,
                        spec.last_row,
                        spec.category_col,
                    ));
                worksheet.insert_chart(spec.anchor_row, spec.anchor_col, &chart)?;
            }
        }

        workbook.save(path)?;
        Ok(())
    }
}

/// Reads every sheet of an existing artifact back into sheet docs, in the
/// file's sheet order. Values only; embedded charts are not represented.
pub fn load_sheets(path: &Path) -> Result<Vec<SheetDoc>, ReportError> {
    let mut workbook = open_workbook_auto(path)?;
    let names = workbook.sheet_names().to_vec();

    let mut sheets = Vec::with_capacity(names.len());
    for name in names {
        let range = workbook.worksheet_range(&name)?;
        let rows = range
            .rows()
            .map(|row| row.iter().map(cell_from_data).collect())
            .collect();
        sheets.push(SheetDoc { name, rows });
    }
    Ok(sheets)
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(v) => Cell::Number(*v),
        Data::Int(v) => Cell::Number(*v as f64),
        Data::Bool(b) => Cell::Number(f64::from(*b as u8)),
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::Error(e) => Cell::Text(format!("{e:?}")),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(name: &str, rows: Vec<Vec<Cell>>) -> SheetDoc {
        SheetDoc {
            name: name.to_string(),
            rows,
        }
    }

    #[test]
    fn test_upsert_replaces_by_name() {
        let mut doc = WorkbookDoc::new();
        doc.upsert_sheet(sheet("A", vec![vec![Cell::Number(1.0)]]));
        doc.upsert_sheet(sheet("B", Vec::new()));
        doc.upsert_sheet(sheet("A", vec![vec![Cell::Number(2.0)]]));
        assert_eq!(doc.sheet_names(), vec!["A", "B"]);
        assert_eq!(doc.sheet("A").unwrap().rows[0][0], Cell::Number(2.0));
    }

    #[test]
    fn test_reorder_moves_priority_first_keeps_rest_stable() {
        let mut doc = WorkbookDoc::new();
        for name in ["A", "B", "C", "D"] {
            doc.upsert_sheet(sheet(name, Vec::new()));
        }
        doc.reorder(&["C".to_string(), "missing".to_string(), "B".to_string()]);
        assert_eq!(doc.sheet_names(), vec!["C", "B", "A", "D"]);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("artifact.xlsx");

        let mut doc = WorkbookDoc::new();
        doc.upsert_sheet(sheet(
            "First",
            vec![
                vec![Cell::text("Name"), Cell::text("Value")],
                vec![Cell::text("a"), Cell::Number(1.5)],
                vec![Cell::Empty, Cell::Number(2.0)],
            ],
        ));
        doc.upsert_sheet(sheet("Second", vec![vec![Cell::text("Only")]]));
        doc.save(&path).unwrap();

        let sheets = load_sheets(&path).unwrap();
        assert_eq!(sheets.len(), 2);
        assert_eq!(sheets[0].name, "First");
        assert_eq!(sheets[1].name, "Second");
        assert_eq!(sheets[0].rows[0][0].as_text(), Some("Name"));
        assert_eq!(sheets[0].rows[1][1].as_number(), Some(1.5));
        assert_eq!(sheets[0].rows[2][0], Cell::Empty);
        assert_eq!(sheets[0].rows[2][1].as_number(), Some(2.0));
    }

    #[test]
    fn test_save_renders_pending_chart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("charted.xlsx");

        let mut doc = WorkbookDoc::new();
        doc.upsert_sheet(sheet(
            "Data",
            vec![
                vec![Cell::text("1"), Cell::Number(2.0)],
                vec![Cell::text("2"), Cell::Number(1.0)],
            ],
        ));
        doc.add_chart(ChartSpec {
            sheet: "Data".to_string(),
            title: "t".to_string(),
            x_title: "x".to_string(),
            y_title: "y".to_string(),
            first_row: 0,
            last_row: 1,
            category_col: 0,
            value_col: 1,
            anchor_row: 5,
            anchor_col: 0,
        });
        doc.save(&path).unwrap();

        // Values survive; the chart itself is not readable back.
        let sheets = load_sheets(&path).unwrap();
        assert_eq!(sheets[0].rows[0][1].as_number(), Some(2.0));
    }
}
