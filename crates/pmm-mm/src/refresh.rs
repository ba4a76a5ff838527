//! Order refresh regime classification.
//!
//! Maps the standard deviation of recent close-to-close returns to an order
//! refresh interval. Higher volatility means more frequent refreshes. The
//! regime is reported per tick; it does not feed back into quoting.

use serde::{Deserialize, Serialize};

use crate::config::RefreshConfig;

/// Refresh regime for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshRegime {
    Fast,
    Normal,
    Slow,
}

impl RefreshRegime {
    /// Label used for metrics and log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Normal => "normal",
            Self::Slow => "slow",
        }
    }
}

/// Classifies return volatility into refresh regimes.
#[derive(Debug, Clone)]
pub struct RefreshPolicy {
    config: RefreshConfig,
}

impl RefreshPolicy {
    pub fn new(config: RefreshConfig) -> Self {
        Self { config }
    }

    /// Regime for the given returns standard deviation.
    ///
    /// Thresholds are strict: a reading equal to a threshold falls into the
    /// slower regime.
    pub fn classify(&self, returns_std: f64) -> RefreshRegime {
        if returns_std > self.config.fast_threshold {
            RefreshRegime::Fast
        } else if returns_std > self.config.normal_threshold {
            RefreshRegime::Normal
        } else {
            RefreshRegime::Slow
        }
    }

    /// Refresh interval in seconds for a regime.
    pub fn interval_secs(&self, regime: RefreshRegime) -> u64 {
        match regime {
            RefreshRegime::Fast => self.config.fast_secs,
            RefreshRegime::Normal => self.config.normal_secs,
            RefreshRegime::Slow => self.config.slow_secs,
        }
    }
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self::new(RefreshConfig::default())
    }
}

/// Tick counts per refresh regime over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegimeCounts {
    pub fast: u64,
    pub normal: u64,
    pub slow: u64,
}

impl RegimeCounts {
    pub fn record(&mut self, regime: RefreshRegime) {
        match regime {
            RefreshRegime::Fast => self.fast += 1,
            RefreshRegime::Normal => self.normal += 1,
            RefreshRegime::Slow => self.slow += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.fast + self.normal + self.slow
    }
}
