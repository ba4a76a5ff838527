//! Candle-by-candle simulation loop.
//!
//! One tick per candle:
//! candle → indicators → quotes → fill attempt → ledger → metrics sample.
//!
//! The loop starts in [`Phase::WarmingUp`] for the first `candles_length`
//! candles (indicators undefined, no quoting), switches irreversibly to
//! [`Phase::Running`], and ends in [`Phase::Finished`] when the series is
//! exhausted. Every running tick appends exactly one [`MetricsSample`].

use chrono::{DateTime, Utc};
use pmm_core::{Candle, Price};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::StrategyConfig;
use crate::error::{MmError, MmResult};
use crate::fill::{CoinFlip, FillEvent, FillModel, FillOutcome, FillSimulator};
use crate::indicators::{IndicatorEngine, IndicatorSnapshot};
use crate::ledger::{InventoryState, PortfolioLedger};
use crate::quote_engine::{compute_quotes, QuoteSet};
use crate::refresh::{RefreshPolicy, RefreshRegime, RegimeCounts};

/// Loop state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    WarmingUp,
    Running,
    Finished,
}

/// One row of the output series.
///
/// Field order is the output column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSample {
    /// Input candle index.
    pub tick: usize,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    /// Candle close.
    pub price: Price,
    /// Base-asset share of portfolio value, before this tick's fill.
    pub inventory_ratio: Decimal,
    pub bid_spread_bps: Decimal,
    pub ask_spread_bps: Decimal,
    /// Portfolio value at `price`, after this tick's fill.
    pub mark_to_market_value: Decimal,
}

/// Everything computed on one running tick, handed to observers.
#[derive(Debug)]
pub struct TickRecord<'a> {
    pub candle: &'a Candle,
    pub snapshot: &'a IndicatorSnapshot,
    pub quotes: &'a QuoteSet,
    pub outcome: &'a FillOutcome,
    pub regime: RefreshRegime,
    /// Order refresh interval for `regime`.
    pub refresh_interval_secs: u64,
    pub sample: &'a MetricsSample,
}

/// Receives each running tick. Used for metrics and progress reporting.
pub trait SimulationObserver {
    fn on_tick(&mut self, record: &TickRecord<'_>);
}

/// Observer that ignores every tick.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl SimulationObserver for NoopObserver {
    fn on_tick(&mut self, _record: &TickRecord<'_>) {}
}

/// Output of a completed run.
#[derive(Debug, Clone)]
pub struct SimulationReport {
    pub samples: Vec<MetricsSample>,
    pub fills: Vec<FillEvent>,
    /// Fill attempts skipped for insufficient balance.
    pub skipped_attempts: u64,
    pub regime_counts: RegimeCounts,
    /// Sum of per-tick refresh intervals.
    pub refresh_secs_total: u64,
    /// Mark-to-market value at the first candle's close.
    pub initial_value: Decimal,
    pub final_state: InventoryState,
    pub final_price: Option<Price>,
    pub realized_pnl: Decimal,
    pub unrealized_pnl: Decimal,
}

/// Per-run simulation state.
///
/// Owns the ledger and the output series; created fresh for every run and
/// consumed by [`SimulationState::run`].
pub struct SimulationState<M> {
    config: StrategyConfig,
    refresh: RefreshPolicy,
    indicators: IndicatorEngine,
    fills: FillSimulator<M>,
    ledger: PortfolioLedger,
    phase: Phase,
    next_tick: usize,
    initial_value: Option<Decimal>,
    last_price: Option<Price>,
    samples: Vec<MetricsSample>,
    fill_log: Vec<FillEvent>,
    skipped_attempts: u64,
    regime_counts: RegimeCounts,
    refresh_secs_total: u64,
}

impl SimulationState<CoinFlip<StdRng>> {
    /// Coin-flip fill model seeded for a reproducible run.
    pub fn seeded(
        config: StrategyConfig,
        refresh: RefreshPolicy,
        ledger: PortfolioLedger,
        seed: u64,
    ) -> MmResult<Self> {
        Self::new(
            config,
            refresh,
            ledger,
            CoinFlip::new(StdRng::seed_from_u64(seed)),
        )
    }
}

impl<M: FillModel> SimulationState<M> {
    /// Create a run. The configuration is validated before any tick.
    pub fn new(
        config: StrategyConfig,
        refresh: RefreshPolicy,
        ledger: PortfolioLedger,
        model: M,
    ) -> MmResult<Self> {
        config.validate()?;
        let indicators = IndicatorEngine::new(config.candles_length);
        Ok(Self {
            config,
            refresh,
            indicators,
            fills: FillSimulator::new(model),
            ledger,
            phase: Phase::WarmingUp,
            next_tick: 0,
            initial_value: None,
            last_price: None,
            samples: Vec::new(),
            fill_log: Vec::new(),
            skipped_attempts: 0,
            regime_counts: RegimeCounts::default(),
            refresh_secs_total: 0,
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn ledger(&self) -> &PortfolioLedger {
        &self.ledger
    }

    pub fn samples(&self) -> &[MetricsSample] {
        &self.samples
    }

    /// Process the next candle.
    ///
    /// Returns the tick's sample once running, `None` during warm-up.
    /// A ledger rejection aborts with [`MmError::Ledger`].
    pub fn step(
        &mut self,
        candle: &Candle,
        observer: &mut dyn SimulationObserver,
    ) -> MmResult<Option<&MetricsSample>> {
        let tick = self.next_tick;
        self.next_tick += 1;
        let price = candle.close;
        self.last_price = Some(price);

        if self.initial_value.is_none() {
            self.initial_value = Some(self.ledger.mark_to_market(price));
        }

        let snapshot = self.indicators.update(candle);

        if tick < self.config.candles_length {
            return Ok(None);
        }
        if self.phase == Phase::WarmingUp {
            info!(tick, "Warm-up complete, quoting started");
            self.phase = Phase::Running;
        }
        let snapshot = snapshot.ok_or(MmError::IndicatorsUnavailable(tick))?;

        let quotes = compute_quotes(
            price,
            snapshot.volatility,
            snapshot.momentum,
            self.ledger.state(),
            &self.config,
        );

        let outcome = self.fills.simulate(
            tick,
            &quotes,
            self.config.order_amount,
            self.ledger.state(),
        );

        match &outcome {
            FillOutcome::Filled(event) => {
                self.ledger.apply(event)?;
                self.fill_log.push(*event);
                debug!(
                    tick,
                    side = %event.side,
                    price = %event.price,
                    amount = %event.amount,
                    "Simulated fill"
                );
            }
            FillOutcome::Skipped(side) => {
                self.skipped_attempts += 1;
                debug!(tick, side = %side, "Fill skipped: insufficient balance");
            }
            FillOutcome::NoAttempt => {}
        }

        let regime = self.refresh.classify(snapshot.returns_std);
        let refresh_interval_secs = self.refresh.interval_secs(regime);
        self.regime_counts.record(regime);
        self.refresh_secs_total += refresh_interval_secs;

        let sample = MetricsSample {
            tick,
            timestamp: candle.timestamp,
            price,
            inventory_ratio: quotes.inventory_ratio,
            bid_spread_bps: quotes.bid_spread_bps(),
            ask_spread_bps: quotes.ask_spread_bps(),
            mark_to_market_value: self.ledger.mark_to_market(price),
        };

        debug!(
            tick,
            price = %price,
            reference = %quotes.reference_price,
            bid = %quotes.bid_price,
            ask = %quotes.ask_price,
            volatility = snapshot.volatility,
            momentum = snapshot.momentum,
            inventory_ratio = %quotes.inventory_ratio,
            refresh_secs = refresh_interval_secs,
            "Quoted"
        );

        observer.on_tick(&TickRecord {
            candle,
            snapshot: &snapshot,
            quotes: &quotes,
            outcome: &outcome,
            regime,
            refresh_interval_secs,
            sample: &sample,
        });

        self.samples.push(sample);
        Ok(self.samples.last())
    }

    /// Run over a whole candle series and return the report.
    pub fn run(
        mut self,
        candles: &[Candle],
        observer: &mut dyn SimulationObserver,
    ) -> MmResult<SimulationReport> {
        info!(
            candles = candles.len(),
            candles_length = self.config.candles_length,
            "Simulation started"
        );
        for candle in candles {
            self.step(candle, observer)?;
        }
        self.phase = Phase::Finished;

        let report = self.into_report();
        info!(
            samples = report.samples.len(),
            fills = report.fills.len(),
            skipped = report.skipped_attempts,
            "Simulation finished"
        );
        Ok(report)
    }

    fn into_report(self) -> SimulationReport {
        let unrealized_pnl = self
            .last_price
            .map(|px| self.ledger.unrealized_pnl(px))
            .unwrap_or(Decimal::ZERO);
        SimulationReport {
            samples: self.samples,
            fills: self.fill_log,
            skipped_attempts: self.skipped_attempts,
            regime_counts: self.regime_counts,
            refresh_secs_total: self.refresh_secs_total,
            initial_value: self.initial_value.unwrap_or(Decimal::ZERO),
            final_state: *self.ledger.state(),
            final_price: self.last_price,
            realized_pnl: self.ledger.realized_pnl(),
            unrealized_pnl,
        }
    }
}
