//! Rolling volatility and momentum indicators.
//!
//! Each closed candle contributes one close-to-close step (true range, close
//! change, percentage return) relative to the previous candle's close. A
//! snapshot is available once `length` steps are buffered, i.e. from candle
//! index `length` onwards. The first candle only seeds the previous close.
//!
//! - **Volatility**: normalized ATR = mean(true range) / current close, as a
//!   fraction (not percent).
//! - **Momentum**: RSI = `100 − 100 / (1 + avg_gain / avg_loss)` using simple
//!   window averages.
//! - **Returns std**: population standard deviation of the percentage
//!   returns between the last `length` closes (`length - 1` returns), used
//!   only for refresh-regime classification.

use std::collections::VecDeque;

use pmm_core::Candle;

/// Indicator readings for one post-warm-up candle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorSnapshot {
    /// Normalized average true range (fraction of close, >= 0).
    pub volatility: f64,
    /// Relative strength index in [0, 100].
    pub momentum: f64,
    /// Standard deviation of percentage returns within the last `length`
    /// closes.
    pub returns_std: f64,
}

/// True range of a bar given the previous close.
#[inline]
pub fn true_range(high: f64, low: f64, prev_close: f64) -> f64 {
    (high - low)
        .max((high - prev_close).abs())
        .max((low - prev_close).abs())
}

/// Relative strength index over a set of close-to-close changes.
///
/// A window without losses maps to 100 (checked first, so a flat window
/// also reads 100); a window without gains maps to 0.
pub fn rsi<'a>(changes: impl IntoIterator<Item = &'a f64>) -> f64 {
    let mut gain = 0.0;
    let mut loss = 0.0;
    let mut n = 0usize;
    for &c in changes {
        if c > 0.0 {
            gain += c;
        } else {
            loss -= c;
        }
        n += 1;
    }
    if n == 0 {
        return 50.0;
    }
    let avg_gain = gain / n as f64;
    let avg_loss = loss / n as f64;

    if avg_loss == 0.0 {
        return 100.0;
    }
    if avg_gain == 0.0 {
        return 0.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}

/// Population standard deviation.
pub fn std_dev<'a>(values: impl IntoIterator<Item = &'a f64>) -> f64 {
    let values: Vec<f64> = values.into_iter().copied().collect();
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    var.sqrt()
}

/// Rolling indicator state over the trailing `length` candles.
///
/// Fed every candle in order, including warm-up candles.
#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    length: usize,
    prev_close: Option<f64>,
    true_ranges: VecDeque<f64>,
    changes: VecDeque<f64>,
    returns: VecDeque<f64>,
}

impl IndicatorEngine {
    /// Create an engine with the given window length.
    pub fn new(length: usize) -> Self {
        Self {
            length,
            prev_close: None,
            true_ranges: VecDeque::with_capacity(length + 1),
            changes: VecDeque::with_capacity(length + 1),
            returns: VecDeque::with_capacity(length + 1),
        }
    }

    /// Whether enough history is buffered for a snapshot.
    pub fn is_warm(&self) -> bool {
        self.true_ranges.len() >= self.length
    }

    /// Push the next candle and return the snapshot ending at it, if warm.
    pub fn update(&mut self, candle: &Candle) -> Option<IndicatorSnapshot> {
        let high = candle.high.to_f64();
        let low = candle.low.to_f64();
        let close = candle.close.to_f64();

        let prev_close = self.prev_close.replace(close)?;

        Self::push(
            &mut self.true_ranges,
            true_range(high, low, prev_close),
            self.length,
        );
        Self::push(&mut self.changes, close - prev_close, self.length);
        let ret = if prev_close != 0.0 {
            (close - prev_close) / prev_close
        } else {
            0.0
        };
        // Returns stay inside the window of closes: the step into its first
        // close is excluded.
        Self::push(&mut self.returns, ret, self.length.saturating_sub(1));

        if !self.is_warm() {
            return None;
        }

        let atr = self.true_ranges.iter().sum::<f64>() / self.length as f64;
        let volatility = if close > 0.0 { atr / close } else { 0.0 };

        Some(IndicatorSnapshot {
            volatility,
            momentum: rsi(&self.changes),
            returns_std: std_dev(&self.returns),
        })
    }

    fn push(buf: &mut VecDeque<f64>, value: f64, max: usize) {
        buf.push_back(value);
        while buf.len() > max {
            buf.pop_front();
        }
    }
}

/// Batch pass over a whole series.
///
/// Returns one entry per candle; warm-up entries are `None`.
pub fn compute_series(candles: &[Candle], length: usize) -> Vec<Option<IndicatorSnapshot>> {
    let mut engine = IndicatorEngine::new(length);
    candles.iter().map(|c| engine.update(c)).collect()
}
