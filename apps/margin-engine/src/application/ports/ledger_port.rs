//! Ledger Port (Driven Port)
//!
//! Read-only cash and valuation figures of the account.

use rust_decimal::Decimal;

/// Port for the account ledger.
pub trait LedgerPort: Send + Sync {
    /// Margin still available, in account currency.
    fn margin_remaining(&self) -> Decimal;

    /// Total portfolio value, in account currency.
    fn total_portfolio_value(&self) -> Decimal;

    /// ISO code of the account currency.
    fn account_currency(&self) -> String;
}
