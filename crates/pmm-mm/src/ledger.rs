//! Two-asset portfolio ledger.
//!
//! Holds base and quote balances, derives inventory ratio and
//! mark-to-market value, and applies simulated fills. Also tracks the
//! average entry price of held base inventory and realized PnL on sells.

use pmm_core::{OrderSide, Price, Size};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::{ConfigError, LedgerError};
use crate::fill::FillEvent;

/// Base and quote balances. Both are always >= 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryState {
    base_balance: Size,
    quote_balance: Decimal,
}

impl InventoryState {
    /// Create a new inventory state; negative balances are rejected.
    pub fn new(base_balance: Size, quote_balance: Decimal) -> Result<Self, ConfigError> {
        if base_balance.inner() < Decimal::ZERO || quote_balance < Decimal::ZERO {
            return Err(ConfigError::InitialBalance {
                base: base_balance.inner(),
                quote: quote_balance,
            });
        }
        Ok(Self {
            base_balance,
            quote_balance,
        })
    }

    /// Amount of the risk asset held.
    #[inline]
    pub fn base_balance(&self) -> Size {
        self.base_balance
    }

    /// Amount of the cash asset held.
    #[inline]
    pub fn quote_balance(&self) -> Decimal {
        self.quote_balance
    }

    /// Value of the base holding at `price`.
    #[inline]
    pub fn base_value(&self, price: Price) -> Decimal {
        self.base_balance.notional(price)
    }

    /// Mark-to-market value: `base × price + quote`.
    #[inline]
    pub fn mark_to_market(&self, price: Price) -> Decimal {
        self.base_value(price) + self.quote_balance
    }

    /// Fraction of portfolio value held in the base asset.
    ///
    /// An empty portfolio has no meaningful ratio; `fallback` (the target
    /// ratio) is returned instead of dividing by zero.
    pub fn inventory_ratio(&self, price: Price, fallback: Decimal) -> Decimal {
        let total = self.mark_to_market(price);
        if total <= Decimal::ZERO {
            return fallback;
        }
        self.base_value(price) / total
    }
}

/// Running ledger for one simulation.
#[derive(Debug, Clone)]
pub struct PortfolioLedger {
    state: InventoryState,
    /// Average entry price of the held base inventory.
    avg_entry: Decimal,
    /// Realized PnL (quote units) from sells against `avg_entry`.
    realized_pnl: Decimal,
    buy_count: u64,
    sell_count: u64,
}

impl PortfolioLedger {
    /// Start a ledger from initial balances.
    ///
    /// Any pre-existing base inventory is booked at `entry_price`.
    pub fn new(state: InventoryState, entry_price: Price) -> Self {
        let avg_entry = if state.base_balance.is_zero() {
            Decimal::ZERO
        } else {
            entry_price.inner()
        };
        Self {
            state,
            avg_entry,
            realized_pnl: Decimal::ZERO,
            buy_count: 0,
            sell_count: 0,
        }
    }

    /// Current balances.
    pub fn state(&self) -> &InventoryState {
        &self.state
    }

    /// Apply a fill.
    ///
    /// Buys debit `price × amount` quote and credit `amount` base; sells do
    /// the reverse. A fill that would leave either balance negative is
    /// rejected and the ledger is left unchanged; balances are never clamped.
    pub fn apply(&mut self, fill: &FillEvent) -> Result<(), LedgerError> {
        let amount = fill.amount.inner();
        let notional = fill.amount.notional(fill.price);
        let base = self.state.base_balance.inner();
        let quote = self.state.quote_balance;

        match fill.side {
            OrderSide::Buy => {
                if quote - notional < Decimal::ZERO {
                    error!(
                        tick = fill.tick,
                        %quote,
                        %notional,
                        "Buy fill would overdraw quote balance"
                    );
                    return Err(LedgerError::NegativeQuote {
                        tick: fill.tick,
                        balance: quote,
                        cost: notional,
                    });
                }
                let new_base = base + amount;
                // Weighted average entry over the enlarged holding
                if !new_base.is_zero() {
                    self.avg_entry = (base * self.avg_entry + notional) / new_base;
                }
                self.state.base_balance = Size::new(new_base);
                self.state.quote_balance = quote - notional;
                self.buy_count += 1;
            }
            OrderSide::Sell => {
                if base - amount < Decimal::ZERO {
                    error!(
                        tick = fill.tick,
                        %base,
                        %amount,
                        "Sell fill would overdraw base balance"
                    );
                    return Err(LedgerError::NegativeBase {
                        tick: fill.tick,
                        balance: base,
                        amount,
                    });
                }
                self.realized_pnl += (fill.price.inner() - self.avg_entry) * amount;
                let new_base = base - amount;
                if new_base.is_zero() {
                    self.avg_entry = Decimal::ZERO;
                }
                self.state.base_balance = Size::new(new_base);
                self.state.quote_balance = quote + notional;
                self.sell_count += 1;
            }
        }
        Ok(())
    }

    /// Inventory ratio at `price`, falling back to `target` for an empty
    /// portfolio.
    pub fn inventory_ratio(&self, price: Price, target: Decimal) -> Decimal {
        self.state.inventory_ratio(price, target)
    }

    /// Mark-to-market value at `price`.
    pub fn mark_to_market(&self, price: Price) -> Decimal {
        self.state.mark_to_market(price)
    }

    /// Average entry price of held base inventory (zero when flat).
    pub fn avg_entry(&self) -> Decimal {
        self.avg_entry
    }

    /// Realized PnL in quote units.
    pub fn realized_pnl(&self) -> Decimal {
        self.realized_pnl
    }

    /// Unrealized PnL of held base inventory at `price`.
    pub fn unrealized_pnl(&self, price: Price) -> Decimal {
        (price.inner() - self.avg_entry) * self.state.base_balance.inner()
    }

    /// Number of applied buy fills.
    pub fn buy_count(&self) -> u64 {
        self.buy_count
    }

    /// Number of applied sell fills.
    pub fn sell_count(&self) -> u64 {
        self.sell_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn fill(side: OrderSide, price: Decimal, amount: Decimal) -> FillEvent {
        FillEvent {
            side,
            price: Price::new(price),
            amount: Size::new(amount),
            tick: 0,
        }
    }

    fn ledger(base: Decimal, quote: Decimal) -> PortfolioLedger {
        let state = InventoryState::new(Size::new(base), quote).unwrap();
        PortfolioLedger::new(state, Price::new(dec!(100)))
    }

    #[test]
    fn test_rejects_negative_initial_balance() {
        assert!(InventoryState::new(Size::new(dec!(-1)), dec!(0)).is_err());
        assert!(InventoryState::new(Size::ZERO, dec!(-0.01)).is_err());
        assert!(InventoryState::new(Size::ZERO, Decimal::ZERO).is_ok());
    }

    #[test]
    fn test_inventory_ratio() {
        let state = InventoryState::new(Size::new(dec!(1)), dec!(100)).unwrap();
        assert_eq!(state.inventory_ratio(Price::new(dec!(100)), dec!(0.5)), dec!(0.5));
        assert_eq!(state.inventory_ratio(Price::new(dec!(300)), dec!(0.5)), dec!(0.75));
    }

    #[test]
    fn test_inventory_ratio_empty_portfolio_uses_fallback() {
        let state = InventoryState::new(Size::ZERO, Decimal::ZERO).unwrap();
        assert_eq!(state.inventory_ratio(Price::new(dec!(100)), dec!(0.4)), dec!(0.4));
    }

    #[test]
    fn test_inventory_ratio_bounds() {
        let all_base = InventoryState::new(Size::new(dec!(2)), Decimal::ZERO).unwrap();
        let all_quote = InventoryState::new(Size::ZERO, dec!(50)).unwrap();
        let px = Price::new(dec!(10));
        assert_eq!(all_base.inventory_ratio(px, dec!(0.5)), Decimal::ONE);
        assert_eq!(all_quote.inventory_ratio(px, dec!(0.5)), Decimal::ZERO);
    }

    #[test]
    fn test_mark_to_market() {
        let state = InventoryState::new(Size::new(dec!(1.5)), dec!(200)).unwrap();
        assert_eq!(state.mark_to_market(Price::new(dec!(100))), dec!(350));
    }

    #[test]
    fn test_buy_updates_balances() {
        let mut l = ledger(dec!(1), dec!(100));
        l.apply(&fill(OrderSide::Buy, dec!(90), dec!(0.5))).unwrap();
        assert_eq!(l.state().base_balance().inner(), dec!(1.5));
        assert_eq!(l.state().quote_balance(), dec!(55));
        assert_eq!(l.buy_count(), 1);
        // (1 × 100 + 0.5 × 90) / 1.5
        assert_eq!(l.avg_entry().round_dp(6), dec!(96.666667));
    }

    #[test]
    fn test_sell_updates_balances_and_realizes() {
        let mut l = ledger(dec!(1), dec!(100));
        l.apply(&fill(OrderSide::Sell, dec!(110), dec!(0.25))).unwrap();
        assert_eq!(l.state().base_balance().inner(), dec!(0.75));
        assert_eq!(l.state().quote_balance(), dec!(127.5));
        assert_eq!(l.realized_pnl(), dec!(2.5));
        assert_eq!(l.sell_count(), 1);
        assert_eq!(l.avg_entry(), dec!(100));
    }

    #[test]
    fn test_sell_to_flat_resets_entry() {
        let mut l = ledger(dec!(1), dec!(0));
        l.apply(&fill(OrderSide::Sell, dec!(120), dec!(1))).unwrap();
        assert!(l.state().base_balance().is_zero());
        assert_eq!(l.avg_entry(), Decimal::ZERO);
        assert_eq!(l.realized_pnl(), dec!(20));
    }

    #[test]
    fn test_rejects_oversell_without_mutation() {
        let mut l = ledger(dec!(0.005), dec!(100));
        let before = *l.state();
        let err = l
            .apply(&fill(OrderSide::Sell, dec!(100), dec!(0.01)))
            .unwrap_err();
        assert!(matches!(err, LedgerError::NegativeBase { .. }));
        assert_eq!(*l.state(), before);
        assert_eq!(l.sell_count(), 0);
    }

    #[test]
    fn test_rejects_overbuy_without_mutation() {
        let mut l = ledger(dec!(1), dec!(0.5));
        let before = *l.state();
        let err = l
            .apply(&fill(OrderSide::Buy, dec!(100), dec!(0.01)))
            .unwrap_err();
        assert!(matches!(err, LedgerError::NegativeQuote { .. }));
        assert_eq!(*l.state(), before);
    }

    #[test]
    fn test_exact_balance_fill_allowed() {
        let mut l = ledger(dec!(0.01), dec!(1));
        l.apply(&fill(OrderSide::Buy, dec!(100), dec!(0.01))).unwrap();
        assert!(l.state().quote_balance().is_zero());
        l.apply(&fill(OrderSide::Sell, dec!(100), dec!(0.02))).unwrap();
        assert!(l.state().base_balance().is_zero());
    }

    #[test]
    fn test_unrealized_pnl() {
        let l = ledger(dec!(2), dec!(0));
        assert_eq!(l.unrealized_pnl(Price::new(dec!(105))), dec!(10));
    }
}
