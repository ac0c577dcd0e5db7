//! Buying power engine settings.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Settings applied to every buying-power decision.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct BuyingPowerConfig {
    /// Fraction of margin remaining kept out of reach of new trades, in [0, 1).
    #[serde(default)]
    pub required_free_buying_power_percent: Decimal,
    /// Drop explanatory reasons from zero-quantity sizing results.
    #[serde(default)]
    pub silent_solver: bool,
}
