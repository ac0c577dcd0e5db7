//! Request objects for the buying-power engine.

use rust_decimal::Decimal;

use super::{MarketOrder, OrderDirection};
use crate::domain::position_group::{Position, PositionGroup};

/// Changes whose reserved buying power impact should be evaluated.
#[derive(Debug, Clone, Default)]
pub struct ReservedBuyingPowerImpactParameters {
    /// Hypothetical position changes, merged additively into current holdings.
    pub contemplated_changes: Vec<Position>,
}

impl ReservedBuyingPowerImpactParameters {
    /// Create parameters from changes.
    #[must_use]
    pub fn new(contemplated_changes: Vec<Position>) -> Self {
        Self {
            contemplated_changes,
        }
    }
}

/// A single-instrument order and the group it trades.
#[derive(Debug, Clone)]
pub struct HasSufficientBuyingPowerParameters {
    /// Order under evaluation.
    pub order: MarketOrder,
    /// Group of the order's instrument. Must have exactly one leg.
    pub group: PositionGroup,
}

/// Size an order so the group's initial margin reaches a fraction of portfolio value.
#[derive(Debug, Clone)]
pub struct MaximumOrderQuantityForTargetParameters {
    /// Group to size. Only its key and unit are used; holdings come from the live snapshot.
    pub group: PositionGroup,
    /// Target margin as a signed fraction of total portfolio value.
    pub target_buying_power: Decimal,
    /// Suppress explanatory reasons on zero-quantity results.
    pub silent: bool,
}

/// Size an order so the group's initial margin changes by an absolute amount.
#[derive(Debug, Clone)]
pub struct MaximumOrderQuantityForDeltaParameters {
    /// Group to size.
    pub group: PositionGroup,
    /// Signed change in margin, in account currency. Added to the margin of current
    /// holdings as is, independent of portfolio value and the free-margin reserve.
    pub delta_buying_power: Decimal,
    /// Suppress explanatory reasons on zero-quantity results.
    pub silent: bool,
}

/// Buying power query for a group in a trade direction.
#[derive(Debug, Clone)]
pub struct PositionGroupBuyingPowerParameters {
    /// Group being traded.
    pub group: PositionGroup,
    /// Direction of the contemplated trade.
    pub direction: OrderDirection,
}
