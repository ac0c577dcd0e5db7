//! Margin model seam for position groups.

use rust_decimal::Decimal;

use super::{PositionGroup, SecurityReferenceProvider};

/// Per-group margin strategy.
///
/// Concrete rule sets (equity, option strategies, futures) implement this trait and are
/// attached to the groups their resolver produces. Both requirements must be zero for a
/// group whose multiplier is zero.
pub trait PositionGroupMarginModel: Send + Sync {
    /// Short name used in logs and diagnostics.
    fn name(&self) -> &str;

    /// Capital required to open the group's positions.
    fn initial_margin_requirement(
        &self,
        reference: &dyn SecurityReferenceProvider,
        group: &PositionGroup,
    ) -> Decimal;

    /// Capital reserved while holding the group's positions.
    fn maintenance_margin_requirement(
        &self,
        reference: &dyn SecurityReferenceProvider,
        group: &PositionGroup,
    ) -> Decimal;
}
