//! Buying Power Value Objects

mod order;
mod parameters;
mod results;

pub use order::{MarketOrder, OrderDirection};
pub use parameters::{
    HasSufficientBuyingPowerParameters, MaximumOrderQuantityForDeltaParameters,
    MaximumOrderQuantityForTargetParameters, PositionGroupBuyingPowerParameters,
    ReservedBuyingPowerImpactParameters,
};
pub use results::{
    BuyingPower, HasSufficientBuyingPowerResult, MaximumOrderQuantityResult,
    ReservedBuyingPowerImpact,
};
