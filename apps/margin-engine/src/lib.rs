// Allow unwrap/expect in tests - tests should panic on unexpected errors
// Allow test-specific patterns and pedantic lints in test code
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::needless_collect,
        clippy::option_if_let_else,
        clippy::items_after_statements
    )
)]

//! Margin Engine - Rust Core Library
//!
//! Buying-power evaluation over position groups: which holdings are margined
//! together, what a contemplated trade does to reserved margin, and the largest
//! order that fits a margin target.
//!
//! # Architecture (Clean Architecture + DDD + Hexagonal)
//!
//! ## Layers (inside → outside)
//!
//! - **Domain**: Core business logic (value objects, resolvers, strategy traits)
//!   - `position_group`: Positions, group keys, groups, snapshots, resolver chain
//!   - `buying_power`: Engine requests, results and errors
//!
//! - **Application**: Orchestration
//!   - `ports`: Interfaces for external systems (`HoldingsPort`, `LedgerPort`, `FeeModelPort`)
//!   - `services`: `PositionGroupManager`, `BuyingPowerEngine`
//!
//! - **Infrastructure**: Adapters (implementations)
//!   - `portfolio`: In-memory holdings and ledger
//!   - `reference`: In-memory security reference table
//!   - `fees`, `margin`: Reference fee and margin models
//!   - `container`: Wiring from configuration

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Clean Architecture Layers
// =============================================================================

/// Domain layer - Core business logic with no external dependencies.
pub mod domain;

/// Application layer - Services and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and wiring.
pub mod infrastructure;

// =============================================================================
// Cross-cutting
// =============================================================================

/// Configuration loading and validation.
pub mod config;

/// Rich error handling with codes and context.
pub mod error;

/// Tracing subscriber setup.
pub mod telemetry;

// =============================================================================
// Re-exports from Clean Architecture
// =============================================================================

// Domain re-exports
pub use domain::buying_power::{
    BuyingPower, BuyingPowerError, HasSufficientBuyingPowerParameters,
    HasSufficientBuyingPowerResult, MarketOrder, MaximumOrderQuantityForDeltaParameters,
    MaximumOrderQuantityForTargetParameters, MaximumOrderQuantityResult, OrderDirection,
    PositionGroupBuyingPowerParameters, ReservedBuyingPowerImpact,
    ReservedBuyingPowerImpactParameters,
};
pub use domain::position_group::{
    CompositePositionGroupResolver, FixedRatioResolver, Position, PositionCollection,
    PositionGroup, PositionGroupCollection, PositionGroupError, PositionGroupKey,
    PositionGroupMarginModel, PositionGroupResolver, SecurityPositionGroupResolver,
    SecurityReference, SecurityReferenceProvider, UnitLeg,
};
pub use domain::shared::{DescriptorId, InstrumentId, OrderId};

// Application re-exports
pub use application::ports::{
    FeeModelPort, HoldingsChange, HoldingsObserver, HoldingsPort, LedgerPort,
};
pub use application::services::{BuyingPowerEngine, PositionGroupManager};

// Infrastructure re-exports
pub use infrastructure::{
    Container, InMemoryPortfolio, InMemorySecurityReference, PerUnitFeeModel,
    PercentageMarginModel, SizingOutcome,
};

// Cross-cutting re-exports
pub use error::{EngineError, ErrorCode, ErrorReport};
