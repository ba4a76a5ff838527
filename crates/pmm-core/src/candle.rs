//! OHLCV candle and series validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::{Price, Size};

/// One OHLCV bar of the input price series.
///
/// Immutable once produced. The timestamp is serialized as epoch
/// milliseconds, matching exchange kline exports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candle {
    /// Bar open time.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub open: Price,
    pub high: Price,
    pub low: Price,
    pub close: Price,
    pub volume: Size,
}

impl Candle {
    /// Create a new candle.
    pub fn new(
        timestamp: DateTime<Utc>,
        open: Price,
        high: Price,
        low: Price,
        close: Price,
        volume: Size,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Check the bar's internal consistency.
    ///
    /// Prices must be positive, `low` must bound `open`/`close` from below
    /// and `high` from above, and volume must not be negative.
    pub fn check(&self) -> std::result::Result<(), String> {
        for (name, px) in [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ] {
            if !px.is_positive() {
                return Err(format!("{name} price {px} is not positive"));
            }
        }
        if self.low > self.open || self.low > self.close {
            return Err(format!("low {} above open/close", self.low));
        }
        if self.high < self.open || self.high < self.close {
            return Err(format!("high {} below open/close", self.high));
        }
        if self.volume.inner().is_sign_negative() && !self.volume.is_zero() {
            return Err(format!("negative volume {}", self.volume));
        }
        Ok(())
    }
}

/// Validate an ordered candle series.
///
/// Every bar must pass [`Candle::check`] and timestamps must be strictly
/// increasing. Gaps between bars are allowed.
pub fn validate_series(candles: &[Candle]) -> Result<()> {
    for (index, candle) in candles.iter().enumerate() {
        candle
            .check()
            .map_err(|reason| CoreError::InvalidCandle { index, reason })?;
        if index > 0 && candle.timestamp <= candles[index - 1].timestamp {
            return Err(CoreError::NonMonotonicTimestamp { index });
        }
    }
    Ok(())
}
