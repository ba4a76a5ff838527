//! Prometheus metrics, structured logging and run summaries.
//!
//! - Structured JSON or pretty logging with tracing
//! - Per-run Prometheus metrics fed by the simulation observer hook
//! - End-of-run summary statistics

pub mod error;
pub mod logging;
pub mod metrics;
pub mod summary;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::SimMetrics;
pub use summary::RunSummary;
