//! Fallback resolver: one group per remaining instrument.

use std::sync::Arc;

use super::PositionGroupResolver;
use crate::domain::position_group::{
    PositionCollection, PositionGroup, PositionGroupMarginModel, SECURITY_DESCRIPTOR,
};
use crate::domain::shared::DescriptorId;

/// Groups every unclaimed position on its own.
///
/// Always the last resolver in the chain, so resolution is total. Whole lots form the
/// default group; any remainder below one lot forms a separate odd-lot group so both
/// multipliers stay whole.
pub struct SecurityPositionGroupResolver {
    descriptor: DescriptorId,
    margin_model: Arc<dyn PositionGroupMarginModel>,
}

impl SecurityPositionGroupResolver {
    /// Create the fallback resolver with the margin model for single-instrument groups.
    #[must_use]
    pub fn new(margin_model: Arc<dyn PositionGroupMarginModel>) -> Self {
        Self {
            descriptor: DescriptorId::new(SECURITY_DESCRIPTOR),
            margin_model,
        }
    }
}

impl PositionGroupResolver for SecurityPositionGroupResolver {
    fn descriptor(&self) -> &DescriptorId {
        &self.descriptor
    }

    fn margin_model(&self) -> Arc<dyn PositionGroupMarginModel> {
        Arc::clone(&self.margin_model)
    }

    fn resolve(&self, positions: &mut PositionCollection) -> Vec<PositionGroup> {
        let mut groups = Vec::new();
        for position in positions.drain() {
            let (whole, odd) = position.split_lots();
            if !whole.is_zero() {
                groups.push(PositionGroup::single(whole, Arc::clone(&self.margin_model)));
            }
            if !odd.is_zero() {
                tracing::trace!(
                    instrument = %odd.instrument(),
                    quantity = %odd.quantity(),
                    lot_size = %position.lot_size(),
                    "Grouped odd-lot remainder"
                );
                groups.push(PositionGroup::odd_lot(&odd, Arc::clone(&self.margin_model)));
            }
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::position_group::{Position, PositionGroupKey};
    use crate::domain::shared::InstrumentId;
    use crate::infrastructure::margin::PercentageMarginModel;
    use rust_decimal_macros::dec;

    #[test]
    fn claims_every_position() {
        let resolver = SecurityPositionGroupResolver::new(Arc::new(PercentageMarginModel::cash()));
        let mut positions: PositionCollection =
            vec![Position::of("AAPL", dec!(10)), Position::of("MSFT", dec!(-4))]
                .into_iter()
                .collect();

        let groups = resolver.resolve(&mut positions);

        assert!(positions.is_empty());
        assert_eq!(groups.len(), 2);
        assert!(groups.iter().all(|group| group.key().is_default()));
        assert_eq!(groups[1].multiplier(), dec!(-4));
    }

    #[test]
    fn odd_lot_remainder_gets_its_own_group() {
        let resolver = SecurityPositionGroupResolver::new(Arc::new(PercentageMarginModel::cash()));
        let mut positions: PositionCollection = vec![Position::new(
            InstrumentId::new("AAPL"),
            dec!(150),
            dec!(100),
        )]
        .into_iter()
        .collect();

        let groups = resolver.resolve(&mut positions);

        assert_eq!(groups.len(), 2);
        assert!(groups.iter().all(|group| group.multiplier().fract().is_zero()));
        assert_eq!(groups[0].key(), &PositionGroupKey::single(InstrumentId::new("AAPL")));
        assert_eq!(groups[0].multiplier(), dec!(1));
        assert_eq!(groups[1].key(), &PositionGroupKey::odd_lot(InstrumentId::new("AAPL")));
        assert_eq!(groups[1].positions()[0].quantity(), dec!(50));
    }

    #[test]
    fn holding_below_one_lot_is_only_an_odd_lot() {
        let resolver = SecurityPositionGroupResolver::new(Arc::new(PercentageMarginModel::cash()));
        let mut positions: PositionCollection = vec![Position::new(
            InstrumentId::new("EURUSD"),
            dec!(-400),
            dec!(1000),
        )]
        .into_iter()
        .collect();

        let groups = resolver.resolve(&mut positions);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].multiplier(), dec!(-1));
        assert!(!groups[0].key().is_default());
    }
}
