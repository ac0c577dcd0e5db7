//! Position Group Value Object

use rust_decimal::Decimal;
use std::fmt;
use std::sync::Arc;

use super::{Position, PositionGroupKey};
use crate::domain::position_group::{PositionGroupMarginModel, SecurityReferenceProvider};
use crate::domain::shared::InstrumentId;

/// A set of positions margined jointly.
///
/// Every position quantity equals `multiplier × ratio × lot_size` for its leg, and
/// the multiplier is always a whole number. A quantity below one lot is held as a
/// single unit of its own size in an odd-lot group. A multiplier of zero is the
/// placeholder for a key with no holdings.
/// Groups are never mutated; re-resolution replaces them.
#[derive(Clone)]
pub struct PositionGroup {
    key: PositionGroupKey,
    positions: Vec<Position>,
    multiplier: Decimal,
    margin_model: Arc<dyn PositionGroupMarginModel>,
}

impl PositionGroup {
    /// Create a group from positions matching the key's legs.
    ///
    /// Positions are reordered to follow the key's unit order. The multiplier is
    /// derived from the first leg.
    #[must_use]
    pub fn new(
        key: PositionGroupKey,
        mut positions: Vec<Position>,
        margin_model: Arc<dyn PositionGroupMarginModel>,
    ) -> Self {
        positions.sort_by(|a, b| a.instrument().cmp(b.instrument()));
        let multiplier = key
            .unit()
            .first()
            .and_then(|leg| {
                positions
                    .iter()
                    .find(|position| position.instrument() == &leg.instrument)
                    .map(|position| position.lots() / Decimal::from(leg.ratio))
            })
            .unwrap_or(Decimal::ZERO);
        Self {
            key,
            positions,
            multiplier,
            margin_model,
        }
    }

    /// Default single-instrument group holding one position.
    #[must_use]
    pub fn single(position: Position, margin_model: Arc<dyn PositionGroupMarginModel>) -> Self {
        let key = PositionGroupKey::single(position.instrument().clone());
        Self::new(key, vec![position], margin_model)
    }

    /// Group holding an odd-lot remainder as one unit of its own size.
    ///
    /// The multiplier is one, negative for a short remainder.
    #[must_use]
    pub fn odd_lot(remainder: &Position, margin_model: Arc<dyn PositionGroupMarginModel>) -> Self {
        let key = PositionGroupKey::odd_lot(remainder.instrument().clone());
        let position = remainder.with_lot_size(remainder.quantity().abs());
        Self::new(key, vec![position], margin_model)
    }

    /// Zero-multiplier placeholder for a key with no holdings.
    #[must_use]
    pub fn empty(
        key: PositionGroupKey,
        reference: &dyn SecurityReferenceProvider,
        margin_model: Arc<dyn PositionGroupMarginModel>,
    ) -> Self {
        let positions = key
            .unit()
            .iter()
            .map(|leg| {
                Position::new(
                    leg.instrument.clone(),
                    Decimal::ZERO,
                    reference.lot_size(&leg.instrument),
                )
            })
            .collect();
        Self {
            key,
            positions,
            multiplier: Decimal::ZERO,
            margin_model,
        }
    }

    /// Get the key.
    #[must_use]
    pub const fn key(&self) -> &PositionGroupKey {
        &self.key
    }

    /// Get the positions, ordered like the key's unit.
    #[must_use]
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// Get the signed number of units held.
    #[must_use]
    pub const fn multiplier(&self) -> Decimal {
        self.multiplier
    }

    /// Get the margin model attached by the resolver.
    #[must_use]
    pub fn margin_model(&self) -> &Arc<dyn PositionGroupMarginModel> {
        &self.margin_model
    }

    /// Number of legs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// True for the zero-multiplier placeholder.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.multiplier.is_zero()
    }

    /// Position in the given instrument, if it is a leg.
    #[must_use]
    pub fn position(&self, instrument: &InstrumentId) -> Option<&Position> {
        self.positions
            .iter()
            .find(|position| position.instrument() == instrument)
    }

    /// Returns true if any leg is in the instrument.
    #[must_use]
    pub fn contains(&self, instrument: &InstrumentId) -> bool {
        self.key.contains(instrument)
    }

    /// The same structure scaled to the given number of units.
    #[must_use]
    pub fn with_multiplier(&self, multiplier: Decimal) -> Self {
        let positions = self
            .positions
            .iter()
            .map(|position| {
                let ratio = self.key.ratio_of(position.instrument()).unwrap_or(0);
                position.with_quantity(multiplier * Decimal::from(ratio) * position.lot_size())
            })
            .collect();
        Self {
            key: self.key.clone(),
            positions,
            multiplier,
            margin_model: Arc::clone(&self.margin_model),
        }
    }

    /// One unit of this group: the smallest tradable step preserving its structure.
    #[must_use]
    pub fn unit(&self) -> Self {
        self.with_multiplier(Decimal::ONE)
    }

    /// Same key with multipliers of opposite sign.
    #[must_use]
    pub fn is_inverted_of(&self, other: &Self) -> bool {
        self.key == other.key
            && !self.multiplier.is_zero()
            && self.multiplier.is_sign_negative() != other.multiplier.is_sign_negative()
            && !other.multiplier.is_zero()
    }
}

impl fmt::Debug for PositionGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PositionGroup")
            .field("key", &self.key)
            .field("positions", &self.positions)
            .field("multiplier", &self.multiplier)
            .field("margin_model", &self.margin_model.name())
            .finish()
    }
}

impl fmt::Display for PositionGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x{}", self.key, self.multiplier.normalize())
    }
}

impl PartialEq for PositionGroup {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
            && self.multiplier == other.multiplier
            && self.positions == other.positions
    }
}

impl Eq for PositionGroup {}
