//! Position Group Value Objects

mod position;
mod position_collection;
mod position_group;
mod position_group_collection;
mod position_group_key;

pub use position::Position;
pub use position_collection::PositionCollection;
pub use position_group::PositionGroup;
pub use position_group_collection::PositionGroupCollection;
pub use position_group_key::{
    ODD_LOT_DESCRIPTOR, PositionGroupKey, SECURITY_DESCRIPTOR, UnitLeg, gcd_multiple,
};
