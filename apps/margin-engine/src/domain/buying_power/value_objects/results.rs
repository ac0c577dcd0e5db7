//! Result objects of the buying-power engine.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::domain::position_group::{Position, PositionGroup};

/// Before/after reserved buying power of the groups touched by contemplated changes.
#[derive(Debug, Clone)]
pub struct ReservedBuyingPowerImpact {
    /// Maintenance margin of the impacted groups as currently held.
    pub current: Decimal,
    /// Maintenance margin of the re-resolved groups with the changes applied.
    pub contemplated: Decimal,
    /// `contemplated - current`.
    pub delta: Decimal,
    /// Groups sharing an instrument with the changes.
    pub impacted_groups: Vec<Arc<PositionGroup>>,
    /// The changes that were evaluated.
    pub contemplated_changes: Vec<Position>,
    /// Groups resolved from the impacted positions plus the changes.
    pub contemplated_groups: Vec<Arc<PositionGroup>>,
}

/// Outcome of a sufficiency check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HasSufficientBuyingPowerResult {
    /// Whether the order fits.
    pub is_sufficient: bool,
    /// Explanation when it does not.
    pub reason: Option<String>,
}

impl HasSufficientBuyingPowerResult {
    /// Order fits.
    #[must_use]
    pub const fn sufficient() -> Self {
        Self {
            is_sufficient: true,
            reason: None,
        }
    }

    /// Order does not fit.
    #[must_use]
    pub fn insufficient(reason: impl Into<String>) -> Self {
        Self {
            is_sufficient: false,
            reason: Some(reason.into()),
        }
    }
}

/// Signed maximum order quantity, in group units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaximumOrderQuantityResult {
    /// Signed number of group units to trade.
    pub quantity: Decimal,
    /// Explanation for zero results, unless the request was silent.
    pub reason: Option<String>,
    /// True when the zero result stems from degraded data rather than the target.
    pub is_error: bool,
}

impl MaximumOrderQuantityResult {
    /// A sized result.
    #[must_use]
    pub const fn quantity(quantity: Decimal) -> Self {
        Self {
            quantity,
            reason: None,
            is_error: false,
        }
    }

    /// Zero quantity, with the reason dropped when `silent`.
    #[must_use]
    pub fn zero(reason: impl Into<String>, silent: bool) -> Self {
        Self {
            quantity: Decimal::ZERO,
            reason: (!silent).then(|| reason.into()),
            is_error: false,
        }
    }

    /// Zero quantity caused by unusable data.
    #[must_use]
    pub fn error(reason: impl Into<String>) -> Self {
        Self {
            quantity: Decimal::ZERO,
            reason: Some(reason.into()),
            is_error: true,
        }
    }
}

/// Buying power available for a trade, in account currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyingPower {
    /// Amount available.
    pub value: Decimal,
}
