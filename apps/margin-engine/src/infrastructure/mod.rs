//! Infrastructure Layer
//!
//! This module contains the adapters for the ports and strategy traits defined in
//! the application and domain layers. Following hexagonal architecture:
//!
//! - **Driven Adapters (Outbound)**
//!   - `portfolio`: Holdings and ledger figures with change notifications
//!   - `reference`: Security reference table
//!   - `fees`: Per-unit fee model
//!
//! - **Strategies**
//!   - `margin`: Percentage-of-notional margin model
//!
//! - **Wiring**
//!   - `container`: Builds the engine for a configured account

pub mod container;
pub mod fees;
pub mod margin;
pub mod portfolio;
pub mod reference;

pub use container::{Container, SizingOutcome};
pub use fees::PerUnitFeeModel;
pub use margin::PercentageMarginModel;
pub use portfolio::InMemoryPortfolio;
pub use reference::InMemorySecurityReference;
