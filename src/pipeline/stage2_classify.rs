use crate::model::category::Category;
use crate::model::record::{NUCLEI_COLUMN, Record, RecordSet};

/// The four-way split of one record set. Relative record order is preserved
/// within each category; the union of the four sets is the input.
#[derive(Debug, Clone, Default)]
pub struct Partitions {
    pub columns: Vec<String>,
    sets: [Vec<Record>; 4],
}

impl Partitions {
    pub fn records(&self, category: Category) -> &[Record] {
        &self.sets[category.index()]
    }

    /// Infected records, mononucleated first, matching the summary row order.
    pub fn infected(&self) -> impl Iterator<Item = &Record> {
        Category::ALL
            .iter()
            .filter(|c| c.is_infected())
            .flat_map(|c| self.records(*c).iter())
    }

    pub fn all(&self) -> impl Iterator<Item = &Record> {
        self.sets.iter().flatten()
    }

    pub fn total_cells(&self) -> usize {
        self.sets.iter().map(Vec::len).sum()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn nuclei_index(&self) -> Option<usize> {
        self.column_index(NUCLEI_COLUMN)
    }
}

/// Single pass over the filtered set. Flags are guaranteed boolean by the
/// input filter, so assignment is total and disjoint.
pub fn run_stage2(input: RecordSet) -> Partitions {
    let mut partitions = Partitions {
        columns: input.columns,
        sets: Default::default(),
    };
    for record in input.records {
        let category = Category::of(record.mononucleated, record.infected);
        partitions.sets[category.index()].push(record);
    }
    partitions
}
