//! Pure market making simulator.
//!
//! Orchestrates a run end to end:
//! - Candle series loading and validation
//! - Single simulation with Prometheus metrics and file output
//! - Parameter sweep over trend and inventory scalars

pub mod app;
pub mod config;
pub mod error;

pub use app::{initial_ledger, simulate, Application, RunOutput};
pub use config::AppConfig;
pub use error::{AppError, AppResult};
