//! Application configuration.

use std::path::{Path, PathBuf};

use pmm_mm::{RefreshConfig, StrategyConfig};
use pmm_persistence::OutputFormat;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Top-level configuration file.
///
/// `[strategy]` is required and every field in it must be present. The
/// other tables fall back to defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub strategy: StrategyConfig,

    #[serde(default)]
    pub simulation: SimulationConfig,

    #[serde(default)]
    pub refresh: RefreshConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub sweep: SweepConfig,
}

/// Input series, starting balances and RNG seed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Candle file (.csv or .jsonl).
    #[serde(default = "default_candles_path")]
    pub candles: PathBuf,

    /// Starting base-asset balance. Default: 1.0.
    #[serde(default = "default_initial_base_balance")]
    pub initial_base_balance: Decimal,

    /// Starting quote balance. Default: base balance × first close, i.e. a
    /// 50/50 split by value.
    #[serde(default)]
    pub initial_quote_balance: Option<Decimal>,

    /// Seed for the fill model RNG. Default: 42.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_candles_path() -> PathBuf {
    PathBuf::from("data/candles.csv")
}

fn default_initial_base_balance() -> Decimal {
    Decimal::ONE
}

fn default_seed() -> u64 {
    42
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            candles: default_candles_path(),
            initial_base_balance: default_initial_base_balance(),
            initial_quote_balance: None,
            seed: default_seed(),
        }
    }
}

/// Output file locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Per-tick metrics series (.csv or .jsonl).
    #[serde(default = "default_metrics_path")]
    pub metrics: PathBuf,

    /// Fill log (.csv or .jsonl). Not written when unset.
    #[serde(default)]
    pub fills: Option<PathBuf>,

    /// Prometheus text dump written at the end of a run. Not written when
    /// unset.
    #[serde(default)]
    pub prometheus: Option<PathBuf>,

    /// Records buffered before each write. Default: 1000.
    #[serde(default = "default_max_buffer_size")]
    pub max_buffer_size: usize,
}

fn default_metrics_path() -> PathBuf {
    PathBuf::from("output/metrics.csv")
}

fn default_max_buffer_size() -> usize {
    1000
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            metrics: default_metrics_path(),
            fills: None,
            prometheus: None,
            max_buffer_size: default_max_buffer_size(),
        }
    }
}

/// Parameter sweep grid.
///
/// Every combination of `trend_scalars` × `inventory_scalars` runs once with
/// the rest of `[strategy]` unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    #[serde(default = "default_trend_scalars")]
    pub trend_scalars: Vec<Decimal>,

    #[serde(default = "default_inventory_scalars")]
    pub inventory_scalars: Vec<Decimal>,

    /// Summary rows (.jsonl), one per grid point in grid order.
    #[serde(default = "default_sweep_output")]
    pub output: PathBuf,

    /// Maximum runs in flight. Default: 4.
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,
}

fn default_trend_scalars() -> Vec<Decimal> {
    vec![Decimal::NEGATIVE_ONE, Decimal::ZERO, Decimal::ONE]
}

fn default_inventory_scalars() -> Vec<Decimal> {
    vec![Decimal::ZERO, Decimal::ONE, Decimal::from(2)]
}

fn default_sweep_output() -> PathBuf {
    PathBuf::from("output/sweep.jsonl")
}

fn default_max_parallel() -> usize {
    4
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            trend_scalars: default_trend_scalars(),
            inventory_scalars: default_inventory_scalars(),
            output: default_sweep_output(),
            max_parallel: default_max_parallel(),
        }
    }
}

impl SweepConfig {
    /// Strategy configuration for every grid point, trend-major.
    pub fn grid(&self, base: &StrategyConfig) -> Vec<StrategyConfig> {
        self.trend_scalars
            .iter()
            .flat_map(|&trend_scalar| {
                self.inventory_scalars
                    .iter()
                    .map(move |&inventory_scalar| StrategyConfig {
                        trend_scalar,
                        inventory_scalar,
                        ..base.clone()
                    })
            })
            .collect()
    }
}

impl AppConfig {
    /// Load from a specific file.
    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config {}: {e}", path.display()))
        })?;

        Self::from_toml(&content)
    }

    /// Parse from TOML text.
    pub fn from_toml(content: &str) -> AppResult<Self> {
        toml::from_str(content).map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    /// Reject configurations that cannot run.
    pub fn validate(&self) -> AppResult<()> {
        self.strategy.validate()?;

        if self.simulation.initial_base_balance < Decimal::ZERO
            || self
                .simulation
                .initial_quote_balance
                .is_some_and(|q| q < Decimal::ZERO)
        {
            return Err(AppError::Config(
                "initial balances must be non-negative".to_string(),
            ));
        }
        if self.refresh.normal_threshold > self.refresh.fast_threshold {
            return Err(AppError::Config(format!(
                "refresh.normal_threshold ({}) exceeds refresh.fast_threshold ({})",
                self.refresh.normal_threshold, self.refresh.fast_threshold
            )));
        }
        if self.sweep.trend_scalars.is_empty() || self.sweep.inventory_scalars.is_empty() {
            return Err(AppError::Config("sweep grid is empty".to_string()));
        }
        if self.sweep.max_parallel == 0 {
            return Err(AppError::Config(
                "sweep.max_parallel must be at least 1".to_string(),
            ));
        }
        for scalar in &self.sweep.inventory_scalars {
            if *scalar < Decimal::ZERO {
                return Err(AppError::Config(format!(
                    "sweep inventory scalar must be non-negative, got {scalar}"
                )));
            }
        }
        self.validate_output_paths()
    }

    /// Output files must have a writable extension before any run starts.
    /// Sweep summaries carry nested regime counts and are JSON Lines only.
    fn validate_output_paths(&self) -> AppResult<()> {
        output_format(&self.output.metrics)?;
        if let Some(path) = &self.output.fills {
            output_format(path)?;
        }
        require_json_lines("sweep.output", &self.sweep.output)
    }
}

fn output_format(path: &Path) -> AppResult<OutputFormat> {
    OutputFormat::from_path(path).map_err(|e| AppError::Config(e.to_string()))
}

fn require_json_lines(key: &str, path: &Path) -> AppResult<()> {
    match output_format(path)? {
        OutputFormat::JsonLines => Ok(()),
        OutputFormat::Csv => Err(AppError::Config(format!(
            "{key} must be a .jsonl file, got {}",
            path.display()
        ))),
    }
}
