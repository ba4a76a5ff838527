//! Core domain types for the PMM candle simulator.
//!
//! This crate provides the value types shared by every other crate:
//! - `Price`, `Size`: Precision-safe numeric types
//! - `Candle`: One OHLCV bar of the input series
//! - `OrderSide`: Buy/sell enum for fills

pub mod candle;
pub mod decimal;
pub mod error;
pub mod order;

pub use candle::{validate_series, Candle};
pub use decimal::{Price, Size};
pub use error::{CoreError, Result};
pub use order::OrderSide;
