//! Run orchestration.

use std::path::Path;
use std::sync::Arc;

use pmm_core::{Candle, Size};
use pmm_mm::{
    InventoryState, PortfolioLedger, RefreshConfig, RefreshPolicy, SimulationObserver,
    SimulationReport, SimulationState, StrategyConfig,
};
use pmm_persistence::{load_candles, FillLogWriter, MetricsWriter, SummaryWriter};
use pmm_telemetry::{RunSummary, SimMetrics};
use tokio::sync::Semaphore;
use tracing::{debug, info};

use crate::config::{AppConfig, SimulationConfig};
use crate::error::{AppError, AppResult};

/// Starting ledger for a series.
///
/// The quote balance defaults to `base × first close`. The base position's
/// entry price is the first close.
pub fn initial_ledger(sim: &SimulationConfig, candles: &[Candle]) -> AppResult<PortfolioLedger> {
    let first = candles.first().ok_or(AppError::EmptySeries)?;
    let base = sim.initial_base_balance;
    let quote = sim
        .initial_quote_balance
        .unwrap_or_else(|| base * first.close.inner());
    let state = InventoryState::new(Size::new(base), quote)?;
    Ok(PortfolioLedger::new(state, first.close))
}

/// One seeded simulation over `candles`.
///
/// Every call builds its own ledger, indicator state and RNG, so calls are
/// independent of each other.
pub fn simulate(
    strategy: StrategyConfig,
    refresh: RefreshConfig,
    sim: &SimulationConfig,
    candles: &[Candle],
    observer: &mut dyn SimulationObserver,
) -> AppResult<SimulationReport> {
    let ledger = initial_ledger(sim, candles)?;
    let state = SimulationState::seeded(strategy, RefreshPolicy::new(refresh), ledger, sim.seed)?;
    Ok(state.run(candles, observer)?)
}

/// Result of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub report: SimulationReport,
    pub summary: RunSummary,
    /// Prometheus text exposition of the run's metrics.
    pub metrics: String,
}

/// Simulator application.
pub struct Application {
    config: AppConfig,
}

impl Application {
    /// Create an application from a validated configuration.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Load the configured candle series.
    pub fn load_candles(&self) -> AppResult<Vec<Candle>> {
        let candles = load_candles(&self.config.simulation.candles)?;
        if candles.is_empty() {
            return Err(AppError::EmptySeries);
        }
        Ok(candles)
    }

    /// Single run with metrics collection. Writes nothing.
    pub fn run_candles(&self, candles: &[Candle]) -> AppResult<RunOutput> {
        let mut metrics = SimMetrics::new()?;
        let report = simulate(
            self.config.strategy.clone(),
            self.config.refresh.clone(),
            &self.config.simulation,
            candles,
            &mut metrics,
        )?;
        let summary = RunSummary::from_report(&report, &self.config.strategy);
        Ok(RunOutput {
            report,
            summary,
            metrics: metrics.render()?,
        })
    }

    /// Load candles, run once and write the configured outputs.
    pub fn run(&self) -> AppResult<RunSummary> {
        let candles = self.load_candles()?;
        let output = self.run_candles(&candles)?;
        self.write_outputs(&output)?;
        output.summary.log();
        Ok(output.summary)
    }

    fn write_outputs(&self, output: &RunOutput) -> AppResult<()> {
        let cfg = &self.config.output;

        let mut writer = MetricsWriter::create(&cfg.metrics, cfg.max_buffer_size)?;
        writer.extend(output.report.samples.iter().cloned())?;
        writer.close()?;

        if let Some(path) = &cfg.fills {
            let mut writer = FillLogWriter::create(path, cfg.max_buffer_size)?;
            writer.extend(output.report.fills.iter().copied())?;
            writer.close()?;
        }

        if let Some(path) = &cfg.prometheus {
            write_text(path, &output.metrics)?;
            info!(path = %path.display(), "Wrote Prometheus metrics");
        }
        Ok(())
    }

    /// Run every grid point over `candles`.
    ///
    /// Runs execute on blocking workers, at most `sweep.max_parallel` at a
    /// time. Summaries come back in grid order.
    pub async fn sweep_candles(&self, candles: Arc<[Candle]>) -> AppResult<Vec<RunSummary>> {
        let grid = self.config.sweep.grid(&self.config.strategy);
        let permits = Arc::new(Semaphore::new(self.config.sweep.max_parallel));

        info!(
            points = grid.len(),
            max_parallel = self.config.sweep.max_parallel,
            "Starting parameter sweep"
        );

        let mut handles = Vec::with_capacity(grid.len());
        for (point, strategy) in grid.into_iter().enumerate() {
            let permit = permits
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| AppError::Config(format!("sweep semaphore closed: {e}")))?;
            let candles = Arc::clone(&candles);
            let refresh = self.config.refresh.clone();
            let sim = self.config.simulation.clone();

            handles.push(tokio::task::spawn_blocking(move || {
                let _permit = permit;
                let mut observer = pmm_mm::NoopObserver;
                let report = simulate(strategy.clone(), refresh, &sim, &candles, &mut observer)?;
                let summary = RunSummary::from_report(&report, &strategy);
                debug!(
                    point,
                    trend_scalar = %strategy.trend_scalar,
                    inventory_scalar = %strategy.inventory_scalar,
                    pnl_bps = %summary.pnl_bps.round_dp(2),
                    "Sweep point finished"
                );
                Ok::<_, AppError>(summary)
            }));
        }

        let mut summaries = Vec::with_capacity(handles.len());
        for handle in handles {
            summaries.push(handle.await??);
        }
        Ok(summaries)
    }

    /// Load candles, run the sweep and write summary rows.
    pub async fn sweep(&self) -> AppResult<Vec<RunSummary>> {
        let candles: Arc<[Candle]> = self.load_candles()?.into();
        let summaries = self.sweep_candles(candles).await?;

        let mut writer = SummaryWriter::create(
            &self.config.sweep.output,
            self.config.output.max_buffer_size,
        )?;
        writer.extend(summaries.iter().cloned())?;
        writer.close()?;

        if let Some(best) = summaries.iter().max_by_key(|s| s.pnl_bps) {
            info!(
                trend_scalar = %best.trend_scalar,
                inventory_scalar = %best.inventory_scalar,
                pnl_bps = %best.pnl_bps.round_dp(2),
                "Best sweep point"
            );
        }
        Ok(summaries)
    }
}

fn write_text(path: &Path, text: &str) -> AppResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, text)?;
    Ok(())
}
