//! Simulated fills against quoted prices.
//!
//! The direction of each tick's fill attempt comes from a pluggable
//! [`FillModel`]. The default [`CoinFlip`] model ignores quotes and price
//! action entirely: it exercises inventory dynamics, it does not predict
//! realistic fill rates. [`FillSimulator`] owns the balance pre-check.

use pmm_core::{OrderSide, Price, Size};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::ledger::InventoryState;
use crate::quote_engine::QuoteSet;

/// A simulated execution. At most one per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillEvent {
    pub side: OrderSide,
    /// Bid price for buys, ask price for sells.
    pub price: Price,
    pub amount: Size,
    pub tick: usize,
}

/// Result of one tick's fill attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillOutcome {
    /// The attempt executed.
    Filled(FillEvent),
    /// The drawn side lacked balance; no state change.
    Skipped(OrderSide),
    /// The model declined to attempt a fill this tick.
    NoAttempt,
}

impl FillOutcome {
    /// The fill event, if one executed.
    pub fn event(&self) -> Option<&FillEvent> {
        match self {
            Self::Filled(event) => Some(event),
            _ => None,
        }
    }
}

/// Chooses which side (if any) is attempted on a tick.
pub trait FillModel {
    fn draw_side(&mut self, tick: usize, quotes: &QuoteSet) -> Option<OrderSide>;
}

/// Uniform coin flip between buy and sell using an injected RNG.
///
/// Seed the RNG (e.g. `StdRng::seed_from_u64`) for reproducible runs.
#[derive(Debug, Clone)]
pub struct CoinFlip<R> {
    rng: R,
}

impl<R: Rng> CoinFlip<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> FillModel for CoinFlip<R> {
    fn draw_side(&mut self, _tick: usize, _quotes: &QuoteSet) -> Option<OrderSide> {
        if self.rng.gen::<f64>() < 0.5 {
            Some(OrderSide::Buy)
        } else {
            Some(OrderSide::Sell)
        }
    }
}

/// Applies the balance pre-check to the side drawn by a [`FillModel`].
#[derive(Debug, Clone)]
pub struct FillSimulator<M> {
    model: M,
    check_balance: bool,
}

impl<M: FillModel> FillSimulator<M> {
    pub fn new(model: M) -> Self {
        Self {
            model,
            check_balance: true,
        }
    }

    /// Passes every drawn side through to the ledger.
    #[cfg(test)]
    pub(crate) fn without_balance_check(model: M) -> Self {
        Self {
            model,
            check_balance: false,
        }
    }

    /// Attempt one fill of `amount` against `quotes`.
    ///
    /// A buy needs `quote_balance >= bid × amount`; a sell needs
    /// `base_balance >= amount`. Insufficient balance skips the fill.
    pub fn simulate(
        &mut self,
        tick: usize,
        quotes: &QuoteSet,
        amount: Size,
        inventory: &InventoryState,
    ) -> FillOutcome {
        let Some(side) = self.model.draw_side(tick, quotes) else {
            return FillOutcome::NoAttempt;
        };

        let (price, affordable) = match side {
            OrderSide::Buy => (
                quotes.bid_price,
                inventory.quote_balance() >= amount.notional(quotes.bid_price),
            ),
            OrderSide::Sell => (quotes.ask_price, inventory.base_balance() >= amount),
        };

        if self.check_balance && !affordable {
            return FillOutcome::Skipped(side);
        }

        FillOutcome::Filled(FillEvent {
            side,
            price,
            amount,
            tick,
        })
    }
}
