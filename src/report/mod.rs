use std::collections::HashSet;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod chart;
pub mod names;
pub mod workbook;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("output artifact '{}' was not created", .0.display())]
    ArtifactCreation(PathBuf),
    #[error("histogram section marker not found in sheet '{0}'")]
    ChartPlacement(String),
    #[error("xlsx write error: {0}")]
    Write(#[from] rust_xlsxwriter::XlsxError),
    #[error("artifact read error: {0}")]
    Read(#[from] calamine::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Run-scoped output path allocation: `output_<stem>.xlsx`, with a numeric
/// suffix probed against both this run's allocations and the filesystem so
/// reruns never overwrite earlier artifacts. Best-effort only: a racing
/// external writer between probe and create is an accepted limitation.
#[derive(Debug, Default)]
pub struct OutputNamer {
    used: HashSet<PathBuf>,
}

impl OutputNamer {
    pub fn new() -> OutputNamer {
        OutputNamer::default()
    }

    pub fn allocate(&mut self, input: &Path, out_dir: &Path) -> PathBuf {
        let stem = input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("input");

        let mut candidate = out_dir.join(format!("output_{stem}.xlsx"));
        let mut counter = 1u32;
        while self.used.contains(&candidate) || candidate.exists() {
            candidate = out_dir.join(format!("output_{stem}_{counter}.xlsx"));
            counter += 1;
        }
        self.used.insert(candidate.clone());
        candidate
    }
}
