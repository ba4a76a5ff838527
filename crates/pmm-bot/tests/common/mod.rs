//! Shared fixtures for simulator integration tests.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{TimeZone, Utc};
use pmm_bot::AppConfig;
use pmm_core::{Candle, Price, Size};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;

pub const STRATEGY: &str = r#"
[strategy]
bid_spread_scalar = "1.2"
ask_spread_scalar = "0.6"
max_shift_spread = "0.000005"
trend_scalar = "-1"
inventory_scalar = "1"
target_inventory_ratio = "0.5"
order_amount = "0.01"
candles_length = 30
"#;

/// Config with the shared strategy and outputs under `dir`.
pub fn config_in(dir: &Path) -> AppConfig {
    let mut config = AppConfig::from_toml(STRATEGY).unwrap();
    config.simulation.candles = dir.join("candles.csv");
    config.output.metrics = dir.join("out/metrics.csv");
    config.output.fills = Some(dir.join("out/fills.jsonl"));
    config.output.prometheus = Some(dir.join("out/metrics.prom"));
    config.sweep.output = dir.join("out/sweep.jsonl");
    config
}

/// Seeded one-minute random walk around 2000.
pub fn random_walk(n: usize, seed: u64) -> Vec<Candle> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut close = 2000.0_f64;
    (0..n)
        .map(|i| {
            let open = close;
            close *= 1.0 + rng.gen_range(-0.002..0.002);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.001));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.001));
            let px = |v: f64| Price::new(Decimal::from_f64_retain(v).unwrap().round_dp(2));
            Candle::new(
                Utc.timestamp_millis_opt(1_700_000_000_000 + i as i64 * 60_000)
                    .unwrap(),
                px(open),
                px(high),
                px(low),
                px(close),
                Size::new(Decimal::from(rng.gen_range(1..50))),
            )
        })
        .collect()
}

/// Write candles as CSV with the standard header.
pub fn write_csv(path: &Path, candles: &[Candle]) -> PathBuf {
    let mut file = std::fs::File::create(path).unwrap();
    writeln!(file, "timestamp,open,high,low,close,volume").unwrap();
    for c in candles {
        writeln!(
            file,
            "{},{},{},{},{},{}",
            c.timestamp.timestamp_millis(),
            c.open,
            c.high,
            c.low,
            c.close,
            c.volume
        )
        .unwrap();
    }
    path.to_path_buf()
}
