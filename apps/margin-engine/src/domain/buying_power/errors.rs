//! Buying Power Errors

use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::position_group::PositionGroupKey;
use crate::domain::shared::OrderId;

/// Logic and invariant violations raised by the buying-power engine.
///
/// Data problems (missing prices, targets below one unit) are not errors; they come
/// back as results with a reason.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuyingPowerError {
    /// The non-grouped sufficiency check was given a multi-leg group.
    #[error(
        "Order {order_id} targets a group with {group_size} legs; combo orders are not supported by this check"
    )]
    UnsupportedComboOrder {
        /// Order being checked.
        order_id: OrderId,
        /// Number of legs in the supplied group.
        group_size: usize,
    },

    /// The maximum-quantity search stopped making progress.
    #[error(
        "Maximum order quantity search failed to converge for {group}: current margin {current_margin}, quantity {quantity}, lot size {lot_size}, order fee {order_fee}, margin unit {unit_margin}, order margin {order_margin}, target margin {target_margin}"
    )]
    NonConvergence {
        /// Group being sized.
        group: PositionGroupKey,
        /// Initial margin of current holdings.
        current_margin: Decimal,
        /// Quantity estimate at the stall.
        quantity: Decimal,
        /// Lot size of the group's first leg.
        lot_size: Decimal,
        /// Fee of the order at the stalled quantity.
        order_fee: Decimal,
        /// Initial margin of one unit.
        unit_margin: Decimal,
        /// Margin of the order at the stalled quantity.
        order_margin: Decimal,
        /// Fee-adjusted margin budget.
        target_margin: Decimal,
    },
}
