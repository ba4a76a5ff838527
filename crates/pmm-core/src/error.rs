//! Error types for pmm-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid candle at index {index}: {reason}")]
    InvalidCandle { index: usize, reason: String },

    #[error("Candle timestamps not strictly increasing at index {index}")]
    NonMonotonicTimestamp { index: usize },
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
