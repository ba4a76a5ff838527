//! End-of-run summary statistics.
//!
//! Condenses a [`SimulationReport`] into one serializable record:
//! - fill counts per side and skipped attempts
//! - start/final portfolio value, PnL and max drawdown
//! - inventory ratio and spread distribution
//! - refresh regime counts and mean refresh interval

use pmm_core::OrderSide;
use pmm_mm::{RegimeCounts, SimulationReport, StrategyConfig};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

const BPS: Decimal = Decimal::from_parts(10000, 0, 0, false, 0);

/// Summary of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub trend_scalar: Decimal,
    pub inventory_scalar: Decimal,
    pub candles_length: usize,
    pub samples: usize,
    pub buy_fills: usize,
    pub sell_fills: usize,
    pub skipped_attempts: u64,
    /// Portfolio value at the first candle's close.
    pub initial_value: Decimal,
    /// Portfolio value at the last sample, or the initial value when no
    /// tick ran.
    pub final_value: Decimal,
    pub pnl: Decimal,
    pub pnl_bps: Decimal,
    /// Largest peak-to-trough decline of the value series, as a fraction.
    pub max_drawdown: Decimal,
    pub mean_inventory_ratio: Decimal,
    pub min_inventory_ratio: Decimal,
    pub max_inventory_ratio: Decimal,
    pub avg_bid_spread_bps: Decimal,
    pub avg_ask_spread_bps: Decimal,
    pub realized_pnl: Decimal,
    pub unrealized_pnl: Decimal,
    pub final_base_balance: Decimal,
    pub final_quote_balance: Decimal,
    pub regime_counts: RegimeCounts,
    /// Mean order refresh interval over running ticks, in seconds.
    pub mean_refresh_interval_secs: Decimal,
}

impl RunSummary {
    pub fn from_report(report: &SimulationReport, config: &StrategyConfig) -> Self {
        let samples = &report.samples;
        let n = samples.len();

        let buy_fills = report
            .fills
            .iter()
            .filter(|f| f.side == OrderSide::Buy)
            .count();
        let sell_fills = report.fills.len() - buy_fills;

        let initial_value = report.initial_value;
        let final_value = samples
            .last()
            .map(|s| s.mark_to_market_value)
            .unwrap_or(initial_value);
        let pnl = final_value - initial_value;
        let pnl_bps = if initial_value > Decimal::ZERO {
            pnl / initial_value * BPS
        } else {
            Decimal::ZERO
        };

        let ratios = samples.iter().map(|s| s.inventory_ratio);
        let min_inventory_ratio = ratios.clone().min().unwrap_or(Decimal::ZERO);
        let max_inventory_ratio = ratios.clone().max().unwrap_or(Decimal::ZERO);

        Self {
            trend_scalar: config.trend_scalar,
            inventory_scalar: config.inventory_scalar,
            candles_length: config.candles_length,
            samples: n,
            buy_fills,
            sell_fills,
            skipped_attempts: report.skipped_attempts,
            initial_value,
            final_value,
            pnl,
            pnl_bps,
            max_drawdown: max_drawdown(
                initial_value,
                samples.iter().map(|s| s.mark_to_market_value),
            ),
            mean_inventory_ratio: mean(ratios, n),
            min_inventory_ratio,
            max_inventory_ratio,
            avg_bid_spread_bps: mean(samples.iter().map(|s| s.bid_spread_bps), n),
            avg_ask_spread_bps: mean(samples.iter().map(|s| s.ask_spread_bps), n),
            realized_pnl: report.realized_pnl,
            unrealized_pnl: report.unrealized_pnl,
            final_base_balance: report.final_state.base_balance().inner(),
            final_quote_balance: report.final_state.quote_balance(),
            regime_counts: report.regime_counts,
            mean_refresh_interval_secs: if n == 0 {
                Decimal::ZERO
            } else {
                Decimal::from(report.refresh_secs_total) / Decimal::from(n)
            },
        }
    }

    /// Fill rate over running ticks.
    pub fn fill_rate(&self) -> f64 {
        if self.samples == 0 {
            return 0.0;
        }
        (self.buy_fills + self.sell_fills) as f64 / self.samples as f64
    }

    /// Log summary at INFO level.
    pub fn log(&self) {
        info!(
            trend_scalar = %self.trend_scalar,
            inventory_scalar = %self.inventory_scalar,
            samples = self.samples,
            buy_fills = self.buy_fills,
            sell_fills = self.sell_fills,
            skipped = self.skipped_attempts,
            initial_value = %self.initial_value.round_dp(4),
            final_value = %self.final_value.round_dp(4),
            pnl_bps = %self.pnl_bps.round_dp(2),
            max_drawdown = %self.max_drawdown.round_dp(6),
            mean_inventory_ratio = %self.mean_inventory_ratio.round_dp(4),
            avg_bid_spread_bps = %self.avg_bid_spread_bps.round_dp(2),
            avg_ask_spread_bps = %self.avg_ask_spread_bps.round_dp(2),
            fast = self.regime_counts.fast,
            normal = self.regime_counts.normal,
            slow = self.regime_counts.slow,
            mean_refresh_secs = %self.mean_refresh_interval_secs.round_dp(2),
            "Run summary"
        );
    }
}

fn mean(values: impl Iterator<Item = Decimal>, n: usize) -> Decimal {
    if n == 0 {
        return Decimal::ZERO;
    }
    values.sum::<Decimal>() / Decimal::from(n)
}

/// Largest fractional decline from a running peak, seeded with `start`.
fn max_drawdown(start: Decimal, values: impl Iterator<Item = Decimal>) -> Decimal {
    let mut peak = start;
    let mut worst = Decimal::ZERO;
    for v in values {
        if v > peak {
            peak = v;
        } else if peak > Decimal::ZERO {
            worst = worst.max((peak - v) / peak);
        }
    }
    worst
}
