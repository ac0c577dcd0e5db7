//! Holdings Port (Driven Port)
//!
//! Read access to the account's current holdings plus a change subscription.

use rust_decimal::Decimal;
use std::sync::Arc;

use crate::domain::position_group::Position;
use crate::domain::shared::InstrumentId;

/// Notification fired synchronously by the holdings source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HoldingsChange {
    /// A new instrument is tracked.
    InstrumentAdded {
        /// Instrument now tracked.
        instrument: InstrumentId,
        /// Quantity held when tracking started.
        quantity: Decimal,
    },
    /// An instrument is no longer tracked.
    InstrumentRemoved {
        /// Instrument dropped.
        instrument: InstrumentId,
        /// Quantity held when tracking stopped.
        quantity: Decimal,
    },
    /// Quantity held in a tracked instrument changed.
    QuantityChanged {
        /// Instrument whose quantity changed.
        instrument: InstrumentId,
        /// Quantity before the change.
        previous: Decimal,
        /// Quantity after the change.
        current: Decimal,
    },
}

impl HoldingsChange {
    /// Instrument the notification is about.
    #[must_use]
    pub const fn instrument(&self) -> &InstrumentId {
        match self {
            Self::InstrumentAdded { instrument, .. }
            | Self::InstrumentRemoved { instrument, .. }
            | Self::QuantityChanged { instrument, .. } => instrument,
        }
    }
}

/// Callback registered with a holdings source.
///
/// Implementations must only record the change; no resolution work may happen
/// inside the callback.
pub trait HoldingsObserver: Send + Sync {
    /// Receive a holdings notification.
    fn on_holdings_changed(&self, change: &HoldingsChange);
}

/// Port for the account's holdings.
pub trait HoldingsPort: Send + Sync {
    /// Every tracked instrument, held or not, in instrument order.
    fn tracked_instruments(&self) -> Vec<InstrumentId>;

    /// Quantity held in the instrument, zero when not held.
    fn quantity(&self, instrument: &InstrumentId) -> Decimal;

    /// Every non-zero holding, with lot sizes filled in.
    fn holdings(&self) -> Vec<Position>;

    /// Register an observer for subsequent changes.
    fn subscribe(&self, observer: Arc<dyn HoldingsObserver>);
}
