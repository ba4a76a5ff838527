//! Persistence error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid candle series: {0}")]
    Core(#[from] pmm_core::CoreError),

    #[error("{path}:{line}: {reason}")]
    Row {
        path: String,
        line: u64,
        reason: String,
    },

    #[error("Unsupported file format: {0} (expected .csv or .jsonl)")]
    UnsupportedFormat(String),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;
