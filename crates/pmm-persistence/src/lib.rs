//! Candle input and run output files for the PMM simulator.
//!
//! Inputs are CSV or JSON Lines candle series, validated before use.
//! Outputs are the per-tick metrics series, the fill log and sweep
//! summaries, written as JSON Lines (.jsonl) or CSV.

pub mod candles;
pub mod error;
pub mod writer;

pub use candles::load_candles;
pub use error::{PersistenceError, PersistenceResult};
pub use writer::{
    FillLogWriter, MetricsWriter, OutputFormat, RecordWriter, SummaryWriter,
};
