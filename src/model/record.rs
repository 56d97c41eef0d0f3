pub const OBJECT_COLUMN: &str = "ObjectNumber";
pub const MONONUCLEATED_COLUMN: &str = "Classify_Mononucleated";
pub const INFECTED_COLUMN: &str = "Classify_Infected";
pub const NUCLEI_COLUMN: &str = "Children_Nuclei_Count";

pub const DEFAULT_SUMMARY_COLUMNS: [&str; 2] = ["AreaShape_Area", NUCLEI_COLUMN];

/// One measurement row from microscopy analysis. `values` is aligned with the
/// owning set's summary column list.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub object_id: String,
    pub mononucleated: bool,
    pub infected: bool,
    pub values: Vec<f64>,
}

/// Ordered rows loaded from one input source, plus the summary columns each
/// row carries (in requested order).
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    pub columns: Vec<String>,
    pub records: Vec<Record>,
}

impl RecordSet {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn nuclei_index(&self) -> Option<usize> {
        self.column_index(NUCLEI_COLUMN)
    }
}
