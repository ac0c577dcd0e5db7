//! Contemplated order and trade direction.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::position_group::{Position, PositionGroup, SecurityReferenceProvider};
use crate::domain::shared::{InstrumentId, OrderId};

/// Direction of a contemplated trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderDirection {
    /// Increase the signed quantity.
    Buy,
    /// Decrease the signed quantity.
    Sell,
    /// No change.
    Hold,
}

impl OrderDirection {
    /// Direction implied by a signed quantity.
    #[must_use]
    pub fn from_quantity(quantity: Decimal) -> Self {
        if quantity > Decimal::ZERO {
            Self::Buy
        } else if quantity < Decimal::ZERO {
            Self::Sell
        } else {
            Self::Hold
        }
    }

    /// True if trading in this direction reduces the group's current holdings.
    #[must_use]
    pub fn closes(&self, group: &PositionGroup) -> bool {
        match self {
            Self::Buy => group.multiplier() < Decimal::ZERO,
            Self::Sell => group.multiplier() > Decimal::ZERO,
            Self::Hold => false,
        }
    }
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
            Self::Hold => write!(f, "HOLD"),
        }
    }
}

/// A hypothetical market order in a single instrument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketOrder {
    /// Order identifier.
    pub id: OrderId,
    /// Instrument traded.
    pub instrument: InstrumentId,
    /// Signed quantity (positive buys, negative sells).
    pub quantity: Decimal,
}

impl MarketOrder {
    /// Create an order.
    #[must_use]
    pub fn new(id: OrderId, instrument: InstrumentId, quantity: Decimal) -> Self {
        Self {
            id,
            instrument,
            quantity,
        }
    }

    /// Direction of the order.
    #[must_use]
    pub fn direction(&self) -> OrderDirection {
        OrderDirection::from_quantity(self.quantity)
    }

    /// The position change this order would cause.
    #[must_use]
    pub fn position_change(&self, reference: &dyn SecurityReferenceProvider) -> Position {
        Position::from_reference(self.instrument.clone(), self.quantity, reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::margin::PercentageMarginModel;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    #[test]
    fn direction_from_quantity() {
        assert_eq!(OrderDirection::from_quantity(dec!(5)), OrderDirection::Buy);
        assert_eq!(OrderDirection::from_quantity(dec!(-5)), OrderDirection::Sell);
        assert_eq!(OrderDirection::from_quantity(dec!(0)), OrderDirection::Hold);
    }

    #[test]
    fn closing_direction_depends_on_holdings_sign() {
        let long = PositionGroup::single(
            Position::of("AAPL", dec!(10)),
            Arc::new(PercentageMarginModel::cash()),
        );
        assert!(OrderDirection::Sell.closes(&long));
        assert!(!OrderDirection::Buy.closes(&long));

        let short = long.with_multiplier(dec!(-10));
        assert!(OrderDirection::Buy.closes(&short));

        let flat = long.with_multiplier(dec!(0));
        assert!(!OrderDirection::Sell.closes(&flat));
        assert!(!OrderDirection::Buy.closes(&flat));
    }
}
