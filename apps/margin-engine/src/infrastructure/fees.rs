//! Per-unit fee model with a minimum charge.

use rust_decimal::Decimal;

use crate::application::ports::FeeModelPort;
use crate::domain::shared::InstrumentId;

/// Charges a flat amount per unit traded, floored at a minimum per order.
///
/// Empty orders are free.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerUnitFeeModel {
    per_unit: Decimal,
    minimum: Decimal,
}

impl PerUnitFeeModel {
    /// Create a fee model.
    #[must_use]
    pub const fn new(per_unit: Decimal, minimum: Decimal) -> Self {
        Self { per_unit, minimum }
    }

    /// Commission-free broker.
    #[must_use]
    pub const fn free() -> Self {
        Self::new(Decimal::ZERO, Decimal::ZERO)
    }
}

impl FeeModelPort for PerUnitFeeModel {
    fn order_fee(&self, _instrument: &InstrumentId, quantity: Decimal) -> Decimal {
        if quantity.is_zero() {
            return Decimal::ZERO;
        }
        (quantity.abs() * self.per_unit).max(self.minimum)
    }
}
