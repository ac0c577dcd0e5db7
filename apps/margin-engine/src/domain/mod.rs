//! Domain Layer
//!
//! The innermost layer containing business logic with zero infrastructure dependencies.
//! This layer defines:
//!
//! - **Value Objects**: Immutable domain types with equality by value
//! - **Domain Services**: Stateless resolution strategies
//! - **Strategy Traits**: Margin models and reference data lookups (implemented in adapters)
//!
//! # Bounded Contexts
//!
//! - [`position_group`]: Which holdings are margined together
//! - [`buying_power`]: Requests, results and errors of margin sizing

pub mod buying_power;
pub mod position_group;
pub mod shared;
