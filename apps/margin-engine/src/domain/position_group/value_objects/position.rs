//! Position Value Object

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::position_group::SecurityReferenceProvider;
use crate::domain::shared::InstrumentId;

/// A signed holding (or hypothetical change) in a single instrument.
///
/// The lot size travels with the position so groups can express their
/// multiplier in lots without another reference lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Instrument held.
    instrument: InstrumentId,
    /// Signed quantity (positive long, negative short).
    quantity: Decimal,
    /// Quantity step of the instrument.
    lot_size: Decimal,
}

impl Position {
    /// Create a position. A non-positive lot size is treated as one.
    #[must_use]
    pub fn new(instrument: InstrumentId, quantity: Decimal, lot_size: Decimal) -> Self {
        let lot_size = if lot_size > Decimal::ZERO {
            lot_size
        } else {
            Decimal::ONE
        };
        Self {
            instrument,
            quantity,
            lot_size,
        }
    }

    /// Create a position with a lot size of one.
    #[must_use]
    pub fn of(instrument: impl Into<InstrumentId>, quantity: Decimal) -> Self {
        Self::new(instrument.into(), quantity, Decimal::ONE)
    }

    /// Create a position whose lot size comes from reference data.
    #[must_use]
    pub fn from_reference(
        instrument: InstrumentId,
        quantity: Decimal,
        reference: &dyn SecurityReferenceProvider,
    ) -> Self {
        let lot_size = reference.lot_size(&instrument);
        Self::new(instrument, quantity, lot_size)
    }

    /// Get the instrument.
    #[must_use]
    pub const fn instrument(&self) -> &InstrumentId {
        &self.instrument
    }

    /// Get the signed quantity.
    #[must_use]
    pub const fn quantity(&self) -> Decimal {
        self.quantity
    }

    /// Get the lot size.
    #[must_use]
    pub const fn lot_size(&self) -> Decimal {
        self.lot_size
    }

    /// Signed quantity expressed in lots.
    #[must_use]
    pub fn lots(&self) -> Decimal {
        self.quantity / self.lot_size
    }

    /// Returns true if the quantity is a whole number of lots.
    #[must_use]
    pub fn is_whole_lots(&self) -> bool {
        self.lots().fract().is_zero()
    }

    /// Split into the whole-lot part and the odd-lot remainder.
    ///
    /// Both parts keep the sign of the holding and either may be zero.
    #[must_use]
    pub fn split_lots(&self) -> (Self, Self) {
        let whole = self.lots().trunc() * self.lot_size;
        (
            self.with_quantity(whole),
            self.with_quantity(self.quantity - whole),
        )
    }

    /// Same instrument and quantity with the given lot size.
    #[must_use]
    pub fn with_lot_size(&self, lot_size: Decimal) -> Self {
        Self::new(self.instrument.clone(), self.quantity, lot_size)
    }

    /// Returns true if the quantity is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.quantity.is_zero()
    }

    /// Same instrument and lot size with a different quantity.
    #[must_use]
    pub fn with_quantity(&self, quantity: Decimal) -> Self {
        Self {
            instrument: self.instrument.clone(),
            quantity,
            lot_size: self.lot_size,
        }
    }

    /// Additive combination of two positions in the same instrument.
    ///
    /// The receiver's lot size wins.
    #[must_use]
    pub fn combine(&self, other: &Self) -> Self {
        debug_assert_eq!(self.instrument, other.instrument);
        self.with_quantity(self.quantity + other.quantity)
    }
}
