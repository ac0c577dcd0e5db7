//! Application Services
//!
//! Application services coordinate domain logic and the driven ports.
//! The manager keeps the position group snapshot current; the engine answers
//! buying-power questions against it.

mod buying_power_engine;
mod position_group_manager;

pub use buying_power_engine::BuyingPowerEngine;
pub use position_group_manager::PositionGroupManager;
