//! Pure market making simulation over a candle series.
//!
//! Provides the quoting and simulation core:
//! - Rolling NATR volatility and RSI momentum
//! - Quote calculation with trend and inventory skew
//! - Seedable, pluggable fill model
//! - Two-asset ledger with mark-to-market valuation
//!
//! # Architecture
//!
//! ```text
//! Candle → IndicatorEngine.update()
//!           ├─ warm-up: no quotes
//!           └─ snapshot → compute_quotes()
//!                          ├─ spreads from volatility
//!                          ├─ trend shift from momentum
//!                          └─ inventory shift from InventoryState
//!                               ↓
//!                        FillSimulator.simulate() → PortfolioLedger.apply()
//!                               ↓
//!                        MetricsSample
//! ```

pub mod config;
pub mod error;
pub mod fill;
pub mod indicators;
pub mod ledger;
pub mod quote_engine;
pub mod refresh;
pub mod simulation;

pub use config::{RefreshConfig, StrategyConfig};
pub use error::{ConfigError, LedgerError, MmError, MmResult};
pub use fill::{CoinFlip, FillEvent, FillModel, FillOutcome, FillSimulator};
pub use indicators::{IndicatorEngine, IndicatorSnapshot};
pub use ledger::{InventoryState, PortfolioLedger};
pub use quote_engine::{compute_quotes, QuoteSet};
pub use refresh::{RefreshPolicy, RefreshRegime, RegimeCounts};
pub use simulation::{
    MetricsSample, NoopObserver, Phase, SimulationObserver, SimulationReport, SimulationState,
    TickRecord,
};
