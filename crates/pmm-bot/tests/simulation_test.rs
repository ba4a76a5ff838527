//! End-to-end simulator tests.
//!
//! Covers the run lifecycle over synthetic candle series:
//! - Warm-up boundary and output series length
//! - Seed determinism and sweep/single-run agreement
//! - Output files and configuration errors

mod common;

use std::sync::Arc;

use common::{config_in, random_walk, write_csv};
use pmm_bot::{AppError, Application};
use pmm_core::{Candle, OrderSide};
use pmm_mm::{ConfigError, MmError};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tempfile::TempDir;

fn app(dir: &TempDir) -> Application {
    Application::new(config_in(dir.path())).unwrap()
}

#[test]
fn test_thousand_candles_yield_970_samples() {
    let dir = TempDir::new().unwrap();
    let candles = random_walk(1000, 1);
    let out = app(&dir).run_candles(&candles).unwrap();

    assert_eq!(out.report.samples.len(), 970);
    assert_eq!(out.summary.samples, 970);
    assert_eq!(out.report.samples[0].tick, 30);
    assert_eq!(out.report.samples[0].timestamp, candles[30].timestamp);
    assert_eq!(out.report.samples[969].tick, 999);
}

#[test]
fn test_starting_split_is_even() {
    let dir = TempDir::new().unwrap();
    let candles = random_walk(100, 2);
    let out = app(&dir).run_candles(&candles).unwrap();

    // base 1.0, quote = first close
    assert_eq!(out.report.initial_value, candles[0].close.inner() * dec!(2));
}

#[test]
fn test_same_seed_same_output() {
    let dir = TempDir::new().unwrap();
    let candles = random_walk(500, 3);
    let app = app(&dir);
    let a = app.run_candles(&candles).unwrap();
    let b = app.run_candles(&candles).unwrap();
    assert_eq!(a.report.samples, b.report.samples);
    assert_eq!(a.report.fills, b.report.fills);
    assert_eq!(a.summary, b.summary);
}

#[test]
fn test_invariants_hold_over_run() {
    let dir = TempDir::new().unwrap();
    let candles = random_walk(1000, 4);
    let out = app(&dir).run_candles(&candles).unwrap();

    for sample in &out.report.samples {
        assert!(sample.inventory_ratio >= Decimal::ZERO);
        assert!(sample.inventory_ratio <= Decimal::ONE);
        assert!(sample.bid_spread_bps >= Decimal::ZERO);
    }
    // 1.2 vs 0.6 scalars: bid spread is twice the ask spread
    let s = &out.report.samples[100];
    assert!((s.bid_spread_bps - s.ask_spread_bps * dec!(2)).abs() < dec!(0.000001));

    let last = out.report.samples.last().unwrap();
    assert_eq!(
        last.mark_to_market_value,
        out.report.final_state.mark_to_market(last.price)
    );
    assert!(out.report.final_state.quote_balance() >= Decimal::ZERO);
}

#[test]
fn test_without_quote_balance_only_sells_fill() {
    let dir = TempDir::new().unwrap();
    let mut config = config_in(dir.path());
    config.simulation.initial_quote_balance = Some(Decimal::ZERO);
    let app = Application::new(config).unwrap();

    let out = app.run_candles(&random_walk(200, 5)).unwrap();
    // Nothing can be bought until a sell raises the quote balance
    if let Some(first) = out.report.fills.first() {
        assert_eq!(first.side, OrderSide::Sell);
    }
    assert_eq!(
        out.report.fills.len() as u64 + out.report.skipped_attempts,
        out.report.samples.len() as u64
    );
    assert!(out.report.final_state.quote_balance() >= Decimal::ZERO);
}

#[test]
fn test_metrics_observer_matches_report() {
    let dir = TempDir::new().unwrap();
    let out = app(&dir).run_candles(&random_walk(300, 6)).unwrap();
    let buys = out
        .report
        .fills
        .iter()
        .filter(|f| f.side == OrderSide::Buy)
        .count();

    assert!(out.metrics.contains(&format!("pmm_ticks_total {}", out.report.samples.len())));
    assert!(out
        .metrics
        .contains(&format!("pmm_fills_total{{side=\"buy\"}} {buys}")));
    assert_eq!(out.summary.buy_fills, buys);

    // Small random-walk steps keep every tick in the slow regime
    assert_eq!(out.summary.regime_counts.slow, out.report.samples.len() as u64);
    assert_eq!(out.summary.mean_refresh_interval_secs, dec!(20));
    assert!(out.metrics.contains("pmm_refresh_interval_seconds 20"));
}

#[tokio::test]
async fn test_sweep_matches_single_runs() {
    let dir = TempDir::new().unwrap();
    let mut config = config_in(dir.path());
    config.sweep.trend_scalars = vec![dec!(-1), dec!(1)];
    config.sweep.inventory_scalars = vec![dec!(0), dec!(1)];
    config.sweep.max_parallel = 2;
    let sweep_app = Application::new(config.clone()).unwrap();

    let candles: Arc<[Candle]> = random_walk(400, 7).into();
    let summaries = sweep_app.sweep_candles(Arc::clone(&candles)).await.unwrap();
    assert_eq!(summaries.len(), 4);

    let grid = config.sweep.grid(&config.strategy);
    for (summary, strategy) in summaries.iter().zip(&grid) {
        assert_eq!(summary.trend_scalar, strategy.trend_scalar);
        assert_eq!(summary.inventory_scalar, strategy.inventory_scalar);

        let mut single = config.clone();
        single.strategy = strategy.clone();
        let expected = Application::new(single)
            .unwrap()
            .run_candles(&candles)
            .unwrap()
            .summary;
        assert_eq!(summary, &expected);
    }
}

#[test]
fn test_run_writes_outputs() {
    let dir = TempDir::new().unwrap();
    let candles = random_walk(130, 8);
    write_csv(&dir.path().join("candles.csv"), &candles);
    let app = app(&dir);

    let summary = app.run().unwrap();
    assert_eq!(summary.samples, 100);

    let metrics = std::fs::read_to_string(dir.path().join("out/metrics.csv")).unwrap();
    let mut lines = metrics.lines();
    assert_eq!(
        lines.next(),
        Some("tick,timestamp,price,inventory_ratio,bid_spread_bps,ask_spread_bps,mark_to_market_value")
    );
    assert_eq!(lines.count(), 100);

    let fills = std::fs::read_to_string(dir.path().join("out/fills.jsonl")).unwrap();
    assert_eq!(fills.lines().count(), summary.buy_fills + summary.sell_fills);

    let prom = std::fs::read_to_string(dir.path().join("out/metrics.prom")).unwrap();
    assert!(prom.contains("pmm_ticks_total 100"));
}

#[tokio::test]
async fn test_sweep_writes_grid_rows() {
    let dir = TempDir::new().unwrap();
    write_csv(&dir.path().join("candles.csv"), &random_walk(120, 9));
    let summaries = app(&dir).sweep().await.unwrap();
    assert_eq!(summaries.len(), 9);

    let rows = std::fs::read_to_string(dir.path().join("out/sweep.jsonl")).unwrap();
    let parsed: Vec<pmm_telemetry::RunSummary> = rows
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(parsed, summaries);
}

#[test]
fn test_csv_sweep_output_rejected_before_any_run() {
    let dir = TempDir::new().unwrap();
    write_csv(&dir.path().join("candles.csv"), &random_walk(120, 12));
    let mut config = config_in(dir.path());
    config.sweep.output = dir.path().join("out/sweep.csv");

    assert!(matches!(Application::new(config), Err(AppError::Config(_))));
    assert!(!dir.path().join("out/sweep.csv").exists());
}

#[test]
fn test_fill_log_can_be_csv() {
    let dir = TempDir::new().unwrap();
    write_csv(&dir.path().join("candles.csv"), &random_walk(130, 13));
    let mut config = config_in(dir.path());
    config.output.fills = Some(dir.path().join("out/fills.csv"));
    let summary = Application::new(config).unwrap().run().unwrap();

    let fills = std::fs::read_to_string(dir.path().join("out/fills.csv")).unwrap();
    let mut lines = fills.lines();
    assert_eq!(lines.next(), Some("side,price,amount,tick"));
    assert_eq!(lines.count(), summary.buy_fills + summary.sell_fills);
}

#[test]
fn test_header_only_series_is_empty() {
    let dir = TempDir::new().unwrap();
    write_csv(&dir.path().join("candles.csv"), &[]);
    assert!(matches!(app(&dir).run(), Err(AppError::EmptySeries)));
}

#[test]
fn test_out_of_order_series_rejected() {
    let dir = TempDir::new().unwrap();
    let mut candles = random_walk(50, 10);
    candles.swap(10, 11);
    write_csv(&dir.path().join("candles.csv"), &candles);
    assert!(matches!(app(&dir).run(), Err(AppError::Persistence(_))));
}

#[test]
fn test_invalid_strategy_rejected_at_startup() {
    let dir = TempDir::new().unwrap();
    let mut config = config_in(dir.path());
    config.strategy.candles_length = 1;
    assert!(matches!(
        Application::new(config),
        Err(AppError::Strategy(ConfigError::CandlesLength(1)))
    ));

    let mut config = config_in(dir.path());
    config.strategy.order_amount = pmm_core::Size::ZERO;
    assert!(matches!(
        Application::new(config),
        Err(AppError::Strategy(ConfigError::OrderAmount(_)))
    ));
}

#[test]
fn test_simulate_rejects_bad_config_directly() {
    let dir = TempDir::new().unwrap();
    let mut config = config_in(dir.path());
    config.strategy.target_inventory_ratio = Decimal::ZERO;
    let result = pmm_bot::simulate(
        config.strategy,
        config.refresh,
        &config.simulation,
        &random_walk(40, 11),
        &mut pmm_mm::NoopObserver,
    );
    assert!(matches!(
        result,
        Err(AppError::Simulation(MmError::Config(
            ConfigError::TargetInventoryRatio(_)
        )))
    ));
}
