//! Application Ports (Driven)
//!
//! Ports define interfaces for the external collaborators the engine reads from.
//! All of them answer synchronously.

mod fee_model_port;
mod holdings_port;
mod ledger_port;

pub use fee_model_port::FeeModelPort;
pub use holdings_port::{HoldingsChange, HoldingsObserver, HoldingsPort};
pub use ledger_port::LedgerPort;
