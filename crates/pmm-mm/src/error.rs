//! Error types for pmm-mm.

use rust_decimal::Decimal;
use thiserror::Error;

/// Strategy configuration rejected at setup.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("candles_length must be >= 2, got {0}")]
    CandlesLength(usize),

    #[error("order_amount must be positive, got {0}")]
    OrderAmount(Decimal),

    #[error("target_inventory_ratio must be in (0, 1), got {0}")]
    TargetInventoryRatio(Decimal),

    #[error("{field} must be non-negative, got {value}")]
    Negative { field: &'static str, value: Decimal },

    #[error("initial balances must be non-negative (base={base}, quote={quote})")]
    InitialBalance { base: Decimal, quote: Decimal },
}

/// Ledger invariant violation.
///
/// Raised when a fill would drive a balance negative. The fill simulator
/// pre-checks balances, so seeing this means the two disagree.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    #[error("fill at tick {tick} would make base balance negative: {balance} - {amount}")]
    NegativeBase {
        tick: usize,
        balance: Decimal,
        amount: Decimal,
    },

    #[error("fill at tick {tick} would make quote balance negative: {balance} - {cost}")]
    NegativeQuote {
        tick: usize,
        balance: Decimal,
        cost: Decimal,
    },
}

/// Simulation error.
#[derive(Debug, Error)]
pub enum MmError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Ledger invariant violated: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Indicators unavailable at running tick {0}")]
    IndicatorsUnavailable(usize),
}

/// Result type alias for simulation operations.
pub type MmResult<T> = Result<T, MmError>;
