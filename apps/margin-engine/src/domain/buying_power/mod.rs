//! Buying Power Bounded Context
//!
//! Requests and results of the buying-power engine:
//! - Reserved buying power impact of contemplated changes
//! - Order sufficiency checks
//! - Maximum order quantity for a target or delta buying power
//! - Buying power available to a group in a given direction

pub mod errors;
pub mod value_objects;

pub use errors::BuyingPowerError;
pub use value_objects::{
    BuyingPower, HasSufficientBuyingPowerParameters, HasSufficientBuyingPowerResult,
    MarketOrder, MaximumOrderQuantityForDeltaParameters, MaximumOrderQuantityForTargetParameters,
    MaximumOrderQuantityResult, OrderDirection, PositionGroupBuyingPowerParameters,
    ReservedBuyingPowerImpact, ReservedBuyingPowerImpactParameters,
};
