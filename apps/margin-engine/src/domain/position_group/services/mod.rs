//! Position Group Services
//!
//! Resolution strategies and the resolver chain.

mod fixed_ratio_resolver;
mod resolver;
mod security_resolver;

pub use fixed_ratio_resolver::FixedRatioResolver;
pub use resolver::{CompositePositionGroupResolver, PositionGroupResolver};
pub use security_resolver::SecurityPositionGroupResolver;
