//! Resolver for a fixed multi-instrument ratio (pairs, spreads, baskets).

use rust_decimal::Decimal;
use std::sync::Arc;

use super::PositionGroupResolver;
use crate::domain::position_group::{
    Position, PositionCollection, PositionGroup, PositionGroupKey, PositionGroupMarginModel,
    UnitLeg,
};
use crate::domain::shared::DescriptorId;

/// Claims as many whole units of a fixed leg ratio as the working set holds.
///
/// Every leg must be present with the unit's sign pattern, or with the exactly
/// inverted pattern, for a group to form. Only the configured instruments are ever
/// inspected, so the resolver is local by construction.
pub struct FixedRatioResolver {
    key: PositionGroupKey,
    margin_model: Arc<dyn PositionGroupMarginModel>,
}

impl FixedRatioResolver {
    /// Create a resolver for the given legs (normalised into a group key).
    #[must_use]
    pub fn new(
        descriptor: DescriptorId,
        legs: Vec<UnitLeg>,
        margin_model: Arc<dyn PositionGroupMarginModel>,
    ) -> Self {
        Self {
            key: PositionGroupKey::new(descriptor, legs),
            margin_model,
        }
    }

    /// Key of the groups this resolver produces.
    #[must_use]
    pub const fn key(&self) -> &PositionGroupKey {
        &self.key
    }

    /// Signed number of whole units available, zero if the ratio cannot be formed.
    fn available_units(&self, positions: &PositionCollection) -> Decimal {
        let mut available: Option<Decimal> = None;
        for leg in self.key.unit() {
            let Some(position) = positions.get(&leg.instrument) else {
                return Decimal::ZERO;
            };
            let units = position.lots() / Decimal::from(leg.ratio);
            available = match available {
                None => Some(units),
                Some(current) if current.is_sign_negative() != units.is_sign_negative() => {
                    return Decimal::ZERO;
                }
                Some(current) if units.abs() < current.abs() => Some(units),
                Some(current) => Some(current),
            };
        }
        available.map_or(Decimal::ZERO, |units| units.trunc())
    }
}

impl PositionGroupResolver for FixedRatioResolver {
    fn descriptor(&self) -> &DescriptorId {
        self.key.descriptor()
    }

    fn margin_model(&self) -> Arc<dyn PositionGroupMarginModel> {
        Arc::clone(&self.margin_model)
    }

    fn resolve(&self, positions: &mut PositionCollection) -> Vec<PositionGroup> {
        let multiplier = self.available_units(positions);
        if multiplier.is_zero() {
            return Vec::new();
        }

        let mut claimed = Vec::with_capacity(self.key.unit().len());
        for leg in self.key.unit() {
            let lot_size = positions
                .get(&leg.instrument)
                .map_or(Decimal::ONE, Position::lot_size);
            let quantity = multiplier * Decimal::from(leg.ratio) * lot_size;
            positions.claim(&leg.instrument, quantity);
            claimed.push(Position::new(leg.instrument.clone(), quantity, lot_size));
        }

        tracing::trace!(
            descriptor = %self.key.descriptor(),
            multiplier = %multiplier,
            "Claimed fixed-ratio group"
        );
        vec![PositionGroup::new(
            self.key.clone(),
            claimed,
            Arc::clone(&self.margin_model),
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::shared::InstrumentId;
    use crate::infrastructure::margin::PercentageMarginModel;
    use rust_decimal_macros::dec;

    fn resolver(legs: Vec<UnitLeg>) -> FixedRatioResolver {
        FixedRatioResolver::new(
            DescriptorId::new("spread"),
            legs,
            Arc::new(PercentageMarginModel::cash()),
        )
    }

    fn working_set(positions: Vec<Position>) -> PositionCollection {
        positions.into_iter().collect()
    }

    #[test]
    fn claims_whole_units_and_leaves_remainder() {
        let resolver = resolver(vec![UnitLeg::new("AAPL", 1), UnitLeg::new("MSFT", -1)]);
        let mut positions =
            working_set(vec![Position::of("AAPL", dec!(5)), Position::of("MSFT", dec!(-3))]);

        let groups = resolver.resolve(&mut positions);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].multiplier(), dec!(3));
        assert_eq!(positions.len(), 1);
        assert_eq!(
            positions.get(&InstrumentId::new("AAPL")).map(Position::quantity),
            Some(dec!(2))
        );
    }

    #[test]
    fn inverted_pattern_yields_negative_multiplier() {
        let resolver = resolver(vec![UnitLeg::new("AAPL", 1), UnitLeg::new("MSFT", -1)]);
        let mut positions =
            working_set(vec![Position::of("AAPL", dec!(-2)), Position::of("MSFT", dec!(2))]);

        let groups = resolver.resolve(&mut positions);

        assert_eq!(groups[0].multiplier(), dec!(-2));
        assert!(positions.is_empty());
    }

    #[test]
    fn mismatched_signs_form_nothing() {
        let resolver = resolver(vec![UnitLeg::new("AAPL", 1), UnitLeg::new("MSFT", -1)]);
        let mut positions =
            working_set(vec![Position::of("AAPL", dec!(2)), Position::of("MSFT", dec!(2))]);

        assert!(resolver.resolve(&mut positions).is_empty());
        assert_eq!(positions.len(), 2);
    }

    #[test]
    fn missing_leg_forms_nothing() {
        let resolver = resolver(vec![UnitLeg::new("AAPL", 1), UnitLeg::new("MSFT", -1)]);
        let mut positions = working_set(vec![Position::of("AAPL", dec!(2))]);

        assert!(resolver.resolve(&mut positions).is_empty());
    }

    #[test]
    fn ratio_and_lot_size_limit_units() {
        let resolver = resolver(vec![UnitLeg::new("SPY 450C", 1), UnitLeg::new("SPY 460C", -2)]);
        let mut positions = working_set(vec![
            Position::new(InstrumentId::new("SPY 450C"), dec!(4), dec!(1)),
            Position::new(InstrumentId::new("SPY 460C"), dec!(-5), dec!(1)),
        ]);

        let groups = resolver.resolve(&mut positions);

        // 460C supports only floor(5 / 2) = 2 units
        assert_eq!(groups[0].multiplier(), dec!(2));
        assert_eq!(
            positions.get(&InstrumentId::new("SPY 450C")).map(Position::quantity),
            Some(dec!(2))
        );
        assert_eq!(
            positions.get(&InstrumentId::new("SPY 460C")).map(Position::quantity),
            Some(dec!(-1))
        );
    }
}
