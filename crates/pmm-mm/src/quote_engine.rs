//! Quote price calculation engine.
//!
//! Computes bid/ask prices based on:
//! - Current close (price source)
//! - Volatility-scaled spreads (independent bid/ask scalars)
//! - Trend shift from RSI momentum
//! - Inventory skew toward the target base-asset ratio

use pmm_core::Price;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::config::StrategyConfig;
use crate::ledger::InventoryState;

/// Quotes for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuoteSet {
    /// Price after trend and inventory shifts; quotes are centred on it.
    pub reference_price: Price,
    pub bid_price: Price,
    pub ask_price: Price,
    /// Fractional distance from reference to bid.
    pub bid_spread: Decimal,
    /// Fractional distance from reference to ask.
    pub ask_spread: Decimal,
    /// Trend multiplier component applied to price.
    pub trend_shift: Decimal,
    /// Inventory multiplier component applied to price.
    pub inventory_shift: Decimal,
    /// Inventory ratio the skew was computed from.
    pub inventory_ratio: Decimal,
}

impl QuoteSet {
    /// Bid spread in basis points.
    pub fn bid_spread_bps(&self) -> Decimal {
        self.bid_spread * dec!(10000)
    }

    /// Ask spread in basis points.
    pub fn ask_spread_bps(&self) -> Decimal {
        self.ask_spread * dec!(10000)
    }
}

/// Convert an indicator reading to a decimal, mapping non-finite to zero.
fn to_decimal(v: f64) -> Decimal {
    Decimal::from_f64_retain(v).unwrap_or(Decimal::ZERO)
}

/// Trend shift from RSI momentum.
///
/// `((momentum − 50) / 50) × max_shift_spread × trend_scalar`. With a
/// negative scalar an overbought reading pulls the reference price down
/// (mean reversion); with a positive scalar it pushes it up.
pub fn trend_shift(momentum: Decimal, config: &StrategyConfig) -> Decimal {
    let fifty = dec!(50);
    (momentum - fifty) / fifty * config.max_shift_spread * config.trend_scalar
}

/// Normalized distance from the target inventory ratio, clamped to [-1, 1].
///
/// `(target − ratio) / target` is unbounded above when the target is small
/// and the portfolio holds no base asset. Both bounds are inclusive: a raw
/// value of exactly ±1 passes through, anything beyond is pinned to ±1, so
/// the inventory shift never exceeds `max_shift_spread × inventory_scalar`.
pub fn inventory_delta(ratio: Decimal, target: Decimal) -> Decimal {
    let raw = (target - ratio) / target;
    raw.max(Decimal::NEGATIVE_ONE).min(Decimal::ONE)
}

/// Inventory shift: over-held base (ratio above target) gives a negative
/// shift, lowering quotes to encourage selling base.
pub fn inventory_shift(ratio: Decimal, config: &StrategyConfig) -> Decimal {
    inventory_delta(ratio, config.target_inventory_ratio)
        * config.max_shift_spread
        * config.inventory_scalar
}

/// Calculate quotes for one tick.
///
/// # Arguments
/// * `price` - Current candle close
/// * `volatility` - NATR reading (fraction)
/// * `momentum` - RSI reading in [0, 100]
/// * `inventory` - Balances before this tick's fill
/// * `config` - Strategy configuration
///
/// With positive spreads `bid < reference < ask`. Zero volatility gives
/// `bid == ask == reference`. Negative spreads are a configuration error and
/// are not guarded here.
pub fn compute_quotes(
    price: Price,
    volatility: f64,
    momentum: f64,
    inventory: &InventoryState,
    config: &StrategyConfig,
) -> QuoteSet {
    let volatility = to_decimal(volatility);
    let momentum = to_decimal(momentum);

    let bid_spread = volatility * config.bid_spread_scalar;
    let ask_spread = volatility * config.ask_spread_scalar;

    let trend = trend_shift(momentum, config);

    let ratio = inventory.inventory_ratio(price, config.target_inventory_ratio);
    let inv_shift = inventory_shift(ratio, config);

    let reference = price.inner() * (Decimal::ONE + trend) * (Decimal::ONE + inv_shift);
    let bid = reference * (Decimal::ONE - bid_spread);
    let ask = reference * (Decimal::ONE + ask_spread);

    QuoteSet {
        reference_price: Price::new(reference),
        bid_price: Price::new(bid),
        ask_price: Price::new(ask),
        bid_spread,
        ask_spread,
        trend_shift: trend,
        inventory_shift: inv_shift,
        inventory_ratio: ratio,
    }
}
