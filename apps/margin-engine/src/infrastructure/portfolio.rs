//! In-memory portfolio: holdings, ledger figures and change notifications.

use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::application::ports::{HoldingsChange, HoldingsObserver, HoldingsPort, LedgerPort};
use crate::domain::position_group::{Position, SecurityReferenceProvider};
use crate::domain::shared::InstrumentId;

#[derive(Debug, Default)]
struct Ledger {
    margin_remaining: Decimal,
    total_portfolio_value: Decimal,
}

/// In-memory implementation of `HoldingsPort` and `LedgerPort`.
///
/// Observers are notified synchronously after the holdings lock is released, so they
/// may read the portfolio back.
pub struct InMemoryPortfolio {
    currency: String,
    reference: Arc<dyn SecurityReferenceProvider>,
    holdings: RwLock<BTreeMap<InstrumentId, Decimal>>,
    ledger: RwLock<Ledger>,
    observers: RwLock<Vec<Arc<dyn HoldingsObserver>>>,
}

impl InMemoryPortfolio {
    /// Create an empty portfolio in the given account currency.
    pub fn new(currency: impl Into<String>, reference: Arc<dyn SecurityReferenceProvider>) -> Self {
        Self {
            currency: currency.into(),
            reference,
            holdings: RwLock::new(BTreeMap::new()),
            ledger: RwLock::new(Ledger::default()),
            observers: RwLock::new(Vec::new()),
        }
    }

    /// Start tracking an instrument with no holdings. No-op if already tracked.
    pub fn track(&self, instrument: &InstrumentId) {
        let added = {
            let mut holdings = self
                .holdings
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            if holdings.contains_key(instrument) {
                false
            } else {
                holdings.insert(instrument.clone(), Decimal::ZERO);
                true
            }
        };
        if added {
            self.notify(&HoldingsChange::InstrumentAdded {
                instrument: instrument.clone(),
                quantity: Decimal::ZERO,
            });
        }
    }

    /// Stop tracking an instrument. No-op if not tracked.
    pub fn untrack(&self, instrument: &InstrumentId) {
        let removed = self
            .holdings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(instrument);
        if let Some(quantity) = removed {
            self.notify(&HoldingsChange::InstrumentRemoved {
                instrument: instrument.clone(),
                quantity,
            });
        }
    }

    /// Set the quantity held, tracking the instrument if needed.
    pub fn set_quantity(&self, instrument: &InstrumentId, quantity: Decimal) {
        let previous = self
            .holdings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(instrument.clone(), quantity);
        let change = match previous {
            None => HoldingsChange::InstrumentAdded {
                instrument: instrument.clone(),
                quantity,
            },
            Some(previous) if previous == quantity => return,
            Some(previous) => HoldingsChange::QuantityChanged {
                instrument: instrument.clone(),
                previous,
                current: quantity,
            },
        };
        self.notify(&change);
    }

    /// Add a signed fill to the quantity held.
    pub fn apply_fill(&self, instrument: &InstrumentId, quantity: Decimal) {
        let current = self.quantity(instrument);
        self.set_quantity(instrument, current + quantity);
    }

    /// Set the margin still available.
    pub fn set_margin_remaining(&self, value: Decimal) {
        self.ledger
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .margin_remaining = value;
    }

    /// Set the total portfolio value.
    pub fn set_total_portfolio_value(&self, value: Decimal) {
        self.ledger
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .total_portfolio_value = value;
    }

    fn notify(&self, change: &HoldingsChange) {
        let observers = self
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        tracing::trace!(
            instrument = %change.instrument(),
            observers = observers.len(),
            "Holdings changed"
        );
        for observer in observers {
            observer.on_holdings_changed(change);
        }
    }
}

impl HoldingsPort for InMemoryPortfolio {
    fn tracked_instruments(&self) -> Vec<InstrumentId> {
        self.holdings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    fn quantity(&self, instrument: &InstrumentId) -> Decimal {
        self.holdings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(instrument)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    fn holdings(&self) -> Vec<Position> {
        self.holdings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(_, quantity)| !quantity.is_zero())
            .map(|(instrument, quantity)| {
                Position::from_reference(instrument.clone(), *quantity, self.reference.as_ref())
            })
            .collect()
    }

    fn subscribe(&self, observer: Arc<dyn HoldingsObserver>) {
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer);
    }
}

impl LedgerPort for InMemoryPortfolio {
    fn margin_remaining(&self) -> Decimal {
        self.ledger
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .margin_remaining
    }

    fn total_portfolio_value(&self) -> Decimal {
        self.ledger
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .total_portfolio_value
    }

    fn account_currency(&self) -> String {
        self.currency.clone()
    }
}
