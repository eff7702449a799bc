use std::path::PathBuf;

use thiserror::Error;

/// Failures of the I/O collaborators around the pipeline.
///
/// The pipeline itself (normalization, detection, merge) never fails: bad
/// cells degrade to `None` or pass through unchanged.
#[derive(Error, Debug)]
pub enum ConsolidateError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Workbook error: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Unsupported file type '{extension}' for {path}")]
    UnsupportedFormat { path: PathBuf, extension: String },

    #[error("Workbook {path} has no readable sheets")]
    NoSheets { path: PathBuf },
}

pub type ConsolidateResult<T> = Result<T, ConsolidateError>;
