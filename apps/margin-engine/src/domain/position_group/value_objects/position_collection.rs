//! Working set of positions fed to group resolution.

use rust_decimal::Decimal;
use std::collections::BTreeMap;

use super::Position;
use crate::domain::position_group::SecurityReferenceProvider;
use crate::domain::shared::InstrumentId;

/// Mutable bag of positions keyed by instrument.
///
/// Adding merges quantities additively; positions whose quantity nets to zero are
/// dropped. Resolvers claim quantities by subtracting them, so whatever remains after
/// the chain runs is exactly what has not been grouped yet. Iteration is ordered by
/// instrument, which keeps resolution deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionCollection {
    positions: BTreeMap<InstrumentId, Position>,
}

impl PositionCollection {
    /// Create an empty working set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble current holdings plus hypothetical changes into one working set.
    ///
    /// Every entry takes its lot size from reference data, so a change built without
    /// one counts lots the same way as the holdings it merges into.
    #[must_use]
    pub fn assemble<'a>(
        holdings: impl IntoIterator<Item = &'a Position>,
        changes: &'a [Position],
        reference: &dyn SecurityReferenceProvider,
    ) -> Self {
        let mut collection = Self::new();
        for position in holdings.into_iter().chain(changes) {
            collection.add(&position.with_lot_size(reference.lot_size(position.instrument())));
        }
        collection
    }

    /// Merge a position into the set.
    pub fn add(&mut self, position: &Position) {
        let merged = match self.positions.get(position.instrument()) {
            Some(existing) => existing.combine(position),
            None => position.clone(),
        };
        self.store(merged);
    }

    /// Remove `quantity` of the instrument from the set.
    ///
    /// Claiming an instrument that is not present leaves a negated residual, which
    /// keeps the bookkeeping additive.
    pub fn claim(&mut self, instrument: &InstrumentId, quantity: Decimal) {
        let remaining = match self.positions.get(instrument) {
            Some(existing) => existing.with_quantity(existing.quantity() - quantity),
            None => Position::new(instrument.clone(), -quantity, Decimal::ONE),
        };
        self.store(remaining);
    }

    fn store(&mut self, position: Position) {
        if position.is_zero() {
            self.positions.remove(position.instrument());
        } else {
            self.positions.insert(position.instrument().clone(), position);
        }
    }

    /// Position in the instrument, if non-zero.
    #[must_use]
    pub fn get(&self, instrument: &InstrumentId) -> Option<&Position> {
        self.positions.get(instrument)
    }

    /// Iterate positions in instrument order.
    pub fn iter(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    /// Number of instruments with non-zero quantity.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Returns true if nothing remains.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Take every remaining position, leaving the set empty.
    pub fn drain(&mut self) -> Vec<Position> {
        std::mem::take(&mut self.positions).into_values().collect()
    }
}

impl FromIterator<Position> for PositionCollection {
    fn from_iter<T: IntoIterator<Item = Position>>(iter: T) -> Self {
        let mut collection = Self::new();
        for position in iter {
            collection.add(&position);
        }
        collection
    }
}
