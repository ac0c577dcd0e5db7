//! Percentage-of-notional margin model.

use rust_decimal::Decimal;

use crate::domain::position_group::{
    PositionGroup, PositionGroupMarginModel, SecurityReferenceProvider,
};

/// Margins a group at a flat fraction of the gross notional of its legs.
///
/// Requirement = Σ |quantity| × price × rate. Legs without a price contribute zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PercentageMarginModel {
    initial_rate: Decimal,
    maintenance_rate: Decimal,
}

impl PercentageMarginModel {
    /// Create a model with the given initial and maintenance rates.
    #[must_use]
    pub const fn new(initial_rate: Decimal, maintenance_rate: Decimal) -> Self {
        Self {
            initial_rate,
            maintenance_rate,
        }
    }

    /// Cash account: the full notional is required and reserved.
    #[must_use]
    pub const fn cash() -> Self {
        Self::new(Decimal::ONE, Decimal::ONE)
    }

    /// Initial margin rate.
    #[must_use]
    pub const fn initial_rate(&self) -> Decimal {
        self.initial_rate
    }

    /// Maintenance margin rate.
    #[must_use]
    pub const fn maintenance_rate(&self) -> Decimal {
        self.maintenance_rate
    }

    fn gross_notional(reference: &dyn SecurityReferenceProvider, group: &PositionGroup) -> Decimal {
        group
            .positions()
            .iter()
            .map(|position| position.quantity().abs() * reference.price(position.instrument()))
            .sum()
    }
}

impl PositionGroupMarginModel for PercentageMarginModel {
    fn name(&self) -> &str {
        "percentage"
    }

    fn initial_margin_requirement(
        &self,
        reference: &dyn SecurityReferenceProvider,
        group: &PositionGroup,
    ) -> Decimal {
        Self::gross_notional(reference, group) * self.initial_rate
    }

    fn maintenance_margin_requirement(
        &self,
        reference: &dyn SecurityReferenceProvider,
        group: &PositionGroup,
    ) -> Decimal {
        Self::gross_notional(reference, group) * self.maintenance_rate
    }
}
