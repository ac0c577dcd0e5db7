//! Fee Model Port (Driven Port)

use rust_decimal::Decimal;

use crate::domain::shared::InstrumentId;

/// Port for order fee estimation.
///
/// Must be pure: the same instrument and quantity always yield the same fee.
pub trait FeeModelPort: Send + Sync {
    /// Fee, in account currency, of a market order for `quantity` of the instrument.
    fn order_fee(&self, instrument: &InstrumentId, quantity: Decimal) -> Decimal;
}
