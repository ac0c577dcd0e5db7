//! Application Layer
//!
//! The application layer orchestrates domain logic against external collaborators.
//! It defines:
//!
//! - **Ports**: Interfaces for holdings, ledger and fee data
//! - **Services**: The position group manager and the buying-power engine

pub mod ports;
pub mod services;

pub use ports::*;
pub use services::*;
