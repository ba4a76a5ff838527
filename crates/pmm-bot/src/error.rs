//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Strategy configuration error: {0}")]
    Strategy(#[from] pmm_mm::ConfigError),

    #[error("Simulation error: {0}")]
    Simulation(#[from] pmm_mm::MmError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] pmm_telemetry::TelemetryError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] pmm_persistence::PersistenceError),

    #[error("Candle series is empty")]
    EmptySeries,

    #[error("Sweep worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
