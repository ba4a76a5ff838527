//! Prometheus metrics for one simulation run.
//!
//! Each `SimMetrics` owns its own `Registry` instead of registering into the
//! process-wide default, so runs executing concurrently in a parameter sweep
//! keep separate counters.

use pmm_mm::{FillOutcome, SimulationObserver, TickRecord};
use prometheus::{Encoder, Gauge, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::error::TelemetryResult;

/// Per-run metrics collector.
#[derive(Clone)]
pub struct SimMetrics {
    registry: Registry,
    ticks_total: IntCounter,
    fills_total: IntCounterVec,
    fills_skipped_total: IntCounterVec,
    inventory_ratio: Gauge,
    mark_to_market: Gauge,
    bid_spread_bps: Gauge,
    ask_spread_bps: Gauge,
    refresh_interval: Gauge,
    regime_ticks_total: IntCounterVec,
}

fn as_f64(v: Decimal) -> f64 {
    v.to_f64().unwrap_or(0.0)
}

impl SimMetrics {
    /// Create and register all metrics in a fresh registry.
    pub fn new() -> TelemetryResult<Self> {
        let registry = Registry::new_custom(Some("pmm".to_string()), None)?;

        let ticks_total = IntCounter::new("ticks_total", "Running (post warm-up) ticks")?;
        let fills_total = IntCounterVec::new(
            Opts::new("fills_total", "Simulated fills by side"),
            &["side"],
        )?;
        let fills_skipped_total = IntCounterVec::new(
            Opts::new(
                "fills_skipped_total",
                "Fill attempts skipped for insufficient balance, by side",
            ),
            &["side"],
        )?;
        let inventory_ratio = Gauge::new("inventory_ratio", "Base-asset share of portfolio value")?;
        let mark_to_market = Gauge::new("mark_to_market_value", "Portfolio value in quote units")?;
        let bid_spread_bps = Gauge::new("bid_spread_bps", "Current bid spread in bps")?;
        let ask_spread_bps = Gauge::new("ask_spread_bps", "Current ask spread in bps")?;
        let refresh_interval = Gauge::new(
            "refresh_interval_seconds",
            "Order refresh interval for the current volatility regime",
        )?;
        let regime_ticks_total = IntCounterVec::new(
            Opts::new("regime_ticks_total", "Running ticks by refresh regime"),
            &["regime"],
        )?;

        registry.register(Box::new(ticks_total.clone()))?;
        registry.register(Box::new(fills_total.clone()))?;
        registry.register(Box::new(fills_skipped_total.clone()))?;
        registry.register(Box::new(inventory_ratio.clone()))?;
        registry.register(Box::new(mark_to_market.clone()))?;
        registry.register(Box::new(bid_spread_bps.clone()))?;
        registry.register(Box::new(ask_spread_bps.clone()))?;
        registry.register(Box::new(refresh_interval.clone()))?;
        registry.register(Box::new(regime_ticks_total.clone()))?;

        Ok(Self {
            registry,
            ticks_total,
            fills_total,
            fills_skipped_total,
            inventory_ratio,
            mark_to_market,
            bid_spread_bps,
            ask_spread_bps,
            refresh_interval,
            regime_ticks_total,
        })
    }

    /// Running ticks observed so far.
    pub fn ticks(&self) -> u64 {
        self.ticks_total.get()
    }

    /// Fills observed for a side label ("buy" / "sell").
    pub fn fills(&self, side: &str) -> u64 {
        self.fills_total.with_label_values(&[side]).get()
    }

    /// Skipped attempts observed for a side label.
    pub fn skipped(&self, side: &str) -> u64 {
        self.fills_skipped_total.with_label_values(&[side]).get()
    }

    /// Render all metrics in the Prometheus text exposition format.
    pub fn render(&self) -> TelemetryResult<String> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        Ok(String::from_utf8(buf)?)
    }
}

impl SimulationObserver for SimMetrics {
    fn on_tick(&mut self, record: &TickRecord<'_>) {
        self.ticks_total.inc();
        match record.outcome {
            FillOutcome::Filled(event) => {
                self.fills_total
                    .with_label_values(&[event.side.as_str()])
                    .inc();
            }
            FillOutcome::Skipped(side) => {
                self.fills_skipped_total
                    .with_label_values(&[side.as_str()])
                    .inc();
            }
            FillOutcome::NoAttempt => {}
        }
        self.inventory_ratio
            .set(as_f64(record.sample.inventory_ratio));
        self.mark_to_market
            .set(as_f64(record.sample.mark_to_market_value));
        self.bid_spread_bps.set(as_f64(record.sample.bid_spread_bps));
        self.ask_spread_bps.set(as_f64(record.sample.ask_spread_bps));
        self.refresh_interval
            .set(record.refresh_interval_secs as f64);
        self.regime_ticks_total
            .with_label_values(&[record.regime.as_str()])
            .inc();
    }
}
