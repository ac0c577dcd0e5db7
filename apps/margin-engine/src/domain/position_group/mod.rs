//! Position Group Bounded Context
//!
//! This module decides which holdings are margined together:
//! - Value types for positions, group keys and groups
//! - The scratch working set fed to resolution
//! - The immutable snapshot of resolved groups
//! - The resolver chain (custom descriptors followed by the single-instrument fallback)
//! - The margin model seam each group is evaluated through

pub mod errors;
pub mod margin_model;
pub mod reference;
pub mod services;
pub mod value_objects;

pub use errors::PositionGroupError;
pub use margin_model::PositionGroupMarginModel;
pub use reference::{SecurityReference, SecurityReferenceProvider};
pub use services::{
    CompositePositionGroupResolver, FixedRatioResolver, PositionGroupResolver,
    SecurityPositionGroupResolver,
};
pub use value_objects::{
    ODD_LOT_DESCRIPTOR, Position, PositionCollection, PositionGroup, PositionGroupCollection,
    PositionGroupKey, SECURITY_DESCRIPTOR, UnitLeg, gcd_multiple,
};
