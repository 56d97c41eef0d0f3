use thiserror::Error;

use crate::input::InputError;
use crate::report::ReportError;

pub mod stage1_filter;
pub mod stage2_classify;
pub mod stage3_summary;
pub mod stage4_report;

/// Per-input failure, collected by the driver. One bad input never aborts
/// the processing of subsequent inputs.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Report(#[from] ReportError),
}
