//! Security reference data consumed by resolution and margin models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::shared::InstrumentId;

/// Static and pricing data for a single instrument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityReference {
    /// Last known price. Zero means no usable price.
    pub price: Decimal,
    /// Minimum tradable quantity step.
    pub lot_size: Decimal,
    /// Quote currency code.
    pub currency: String,
}

impl SecurityReference {
    /// Create a new reference record.
    #[must_use]
    pub fn new(price: Decimal, lot_size: Decimal, currency: impl Into<String>) -> Self {
        Self {
            price,
            lot_size,
            currency: currency.into(),
        }
    }
}

/// Synchronous lookup of instrument reference data.
///
/// A missing instrument or a zero price is a degraded answer, not an error:
/// callers detect it through zero margin requirements.
pub trait SecurityReferenceProvider: Send + Sync {
    /// Reference record for the instrument, if known.
    fn security(&self, instrument: &InstrumentId) -> Option<SecurityReference>;

    /// Price of the instrument, zero when unknown.
    fn price(&self, instrument: &InstrumentId) -> Decimal {
        self.security(instrument)
            .map_or(Decimal::ZERO, |security| security.price)
    }

    /// Lot size of the instrument, one when unknown or non-positive.
    fn lot_size(&self, instrument: &InstrumentId) -> Decimal {
        self.security(instrument)
            .map(|security| security.lot_size)
            .filter(|lot| *lot > Decimal::ZERO)
            .unwrap_or(Decimal::ONE)
    }
}
