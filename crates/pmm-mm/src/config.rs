//! Strategy configuration.

use pmm_core::Size;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Quoting strategy configuration.
///
/// Every field is required: a TOML table missing any of them fails to
/// deserialize. Built once per run and never mutated afterwards, so parameter
/// sweeps can hand each run its own clone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Bid spread = volatility × this scalar.
    pub bid_spread_scalar: Decimal,

    /// Ask spread = volatility × this scalar.
    /// Independent from the bid scalar so quotes can be asymmetric.
    pub ask_spread_scalar: Decimal,

    /// Maximum reference-price shift as a fraction of price, shared by the
    /// trend and inventory adjustments.
    pub max_shift_spread: Decimal,

    /// Sign selects behavior: negative = mean reversion, positive = trend
    /// following.
    pub trend_scalar: Decimal,

    /// Sensitivity of the inventory skew.
    pub inventory_scalar: Decimal,

    /// Target fraction of portfolio value held in the base asset.
    pub target_inventory_ratio: Decimal,

    /// Base-asset amount per simulated fill.
    pub order_amount: Size,

    /// Indicator window length in candles. Also the warm-up length.
    pub candles_length: usize,
}

impl StrategyConfig {
    /// Reject configurations that cannot produce a meaningful run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.candles_length < 2 {
            return Err(ConfigError::CandlesLength(self.candles_length));
        }
        if !self.order_amount.is_positive() {
            return Err(ConfigError::OrderAmount(self.order_amount.inner()));
        }
        if self.target_inventory_ratio <= Decimal::ZERO
            || self.target_inventory_ratio >= Decimal::ONE
        {
            return Err(ConfigError::TargetInventoryRatio(
                self.target_inventory_ratio,
            ));
        }
        for (field, value) in [
            ("bid_spread_scalar", self.bid_spread_scalar),
            ("ask_spread_scalar", self.ask_spread_scalar),
            ("max_shift_spread", self.max_shift_spread),
            ("inventory_scalar", self.inventory_scalar),
        ] {
            if value < Decimal::ZERO {
                return Err(ConfigError::Negative { field, value });
            }
        }
        Ok(())
    }
}

/// Order refresh regime thresholds.
///
/// Classifies the standard deviation of close-to-close returns over the
/// indicator window into a refresh interval: more volatile markets refresh
/// more often.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Returns std above this selects the fast interval.
    #[serde(default = "default_fast_threshold")]
    pub fast_threshold: f64,

    /// Returns std above this (and not above fast) selects the normal interval.
    #[serde(default = "default_normal_threshold")]
    pub normal_threshold: f64,

    /// Refresh interval in seconds for the fast regime.
    #[serde(default = "default_fast_secs")]
    pub fast_secs: u64,

    /// Refresh interval in seconds for the normal regime.
    #[serde(default = "default_normal_secs")]
    pub normal_secs: u64,

    /// Refresh interval in seconds for the slow regime.
    #[serde(default = "default_slow_secs")]
    pub slow_secs: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            fast_threshold: default_fast_threshold(),
            normal_threshold: default_normal_threshold(),
            fast_secs: default_fast_secs(),
            normal_secs: default_normal_secs(),
            slow_secs: default_slow_secs(),
        }
    }
}

fn default_fast_threshold() -> f64 {
    0.01
}
fn default_normal_threshold() -> f64 {
    0.005
}
fn default_fast_secs() -> u64 {
    5
}
fn default_normal_secs() -> u64 {
    10
}
fn default_slow_secs() -> u64 {
    20
}

/// ETH/USDT one-minute reference parameters.
#[cfg(test)]
pub(crate) fn test_config() -> StrategyConfig {
    use rust_decimal_macros::dec;
    StrategyConfig {
        bid_spread_scalar: dec!(120),
        ask_spread_scalar: dec!(60),
        max_shift_spread: dec!(0.000005),
        trend_scalar: dec!(-1),
        inventory_scalar: dec!(1),
        target_inventory_ratio: dec!(0.5),
        order_amount: Size::new(dec!(0.01)),
        candles_length: 30,
    }
}
