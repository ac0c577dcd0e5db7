//! Position Group Key Value Object

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::shared::{DescriptorId, InstrumentId};

/// Descriptor identity of the fallback single-instrument resolver.
pub const SECURITY_DESCRIPTOR: &str = "security";

/// Descriptor identity of the fallback's group for a holding's odd-lot remainder.
pub const ODD_LOT_DESCRIPTOR: &str = "odd-lot";

/// One instrument's share of a group unit.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitLeg {
    /// Instrument of the leg.
    pub instrument: InstrumentId,
    /// Signed lots of this instrument per group unit.
    pub ratio: i64,
}

impl UnitLeg {
    /// Create a unit leg.
    #[must_use]
    pub fn new(instrument: impl Into<InstrumentId>, ratio: i64) -> Self {
        Self {
            instrument: instrument.into(),
            ratio,
        }
    }
}

/// Identity of a grouping outcome.
///
/// Two groups with equal keys have the same structure and differ only by an
/// integer multiplier. The unit is kept in canonical form: legs sorted by
/// instrument, zero ratios dropped, ratios reduced to coprime integers and the
/// first leg positive.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PositionGroupKey {
    descriptor: DescriptorId,
    unit: Vec<UnitLeg>,
}

impl PositionGroupKey {
    /// Create a key, normalising the unit.
    #[must_use]
    pub fn new(descriptor: DescriptorId, legs: Vec<UnitLeg>) -> Self {
        Self {
            descriptor,
            unit: normalize_unit(legs),
        }
    }

    /// Key of the default single-instrument group.
    #[must_use]
    pub fn single(instrument: InstrumentId) -> Self {
        Self {
            descriptor: DescriptorId::new(SECURITY_DESCRIPTOR),
            unit: vec![UnitLeg {
                instrument,
                ratio: 1,
            }],
        }
    }

    /// Key of the group holding an instrument's quantity below one whole lot.
    #[must_use]
    pub fn odd_lot(instrument: InstrumentId) -> Self {
        Self {
            descriptor: DescriptorId::new(ODD_LOT_DESCRIPTOR),
            unit: vec![UnitLeg {
                instrument,
                ratio: 1,
            }],
        }
    }

    /// Descriptor that produced groups of this key.
    #[must_use]
    pub const fn descriptor(&self) -> &DescriptorId {
        &self.descriptor
    }

    /// Canonical unit legs.
    #[must_use]
    pub fn unit(&self) -> &[UnitLeg] {
        &self.unit
    }

    /// True for keys produced by the fallback single-instrument resolver.
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.unit.len() == 1 && self.descriptor.as_str() == SECURITY_DESCRIPTOR
    }

    /// Ratio of the instrument in the unit, if it is a leg.
    #[must_use]
    pub fn ratio_of(&self, instrument: &InstrumentId) -> Option<i64> {
        self.unit
            .iter()
            .find(|leg| &leg.instrument == instrument)
            .map(|leg| leg.ratio)
    }

    /// Returns true if the instrument is a leg of this key.
    #[must_use]
    pub fn contains(&self, instrument: &InstrumentId) -> bool {
        self.ratio_of(instrument).is_some()
    }

    /// Iterate over leg instruments.
    pub fn instruments(&self) -> impl Iterator<Item = &InstrumentId> {
        self.unit.iter().map(|leg| &leg.instrument)
    }
}

impl fmt::Display for PositionGroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[", self.descriptor)?;
        for (i, leg) in self.unit.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}:{}", leg.instrument, leg.ratio)?;
        }
        write!(f, "]")
    }
}

/// Greatest common divisor using the Euclidean algorithm.
fn gcd_two(a: u64, b: u64) -> u64 {
    if b == 0 { a } else { gcd_two(b, a % b) }
}

/// GCD of all ratio magnitudes, or 0 for an empty slice.
pub fn gcd_multiple(ratios: &[i64]) -> u64 {
    ratios
        .iter()
        .map(|ratio| ratio.unsigned_abs())
        .fold(0, gcd_two)
}

fn normalize_unit(legs: Vec<UnitLeg>) -> Vec<UnitLeg> {
    let mut legs: Vec<UnitLeg> = legs.into_iter().filter(|leg| leg.ratio != 0).collect();
    legs.sort_by(|a, b| a.instrument.cmp(&b.instrument));
    legs.dedup_by(|next, kept| {
        if next.instrument == kept.instrument {
            kept.ratio += next.ratio;
            true
        } else {
            false
        }
    });
    legs.retain(|leg| leg.ratio != 0);

    let ratios: Vec<i64> = legs.iter().map(|leg| leg.ratio).collect();
    let divisor = i64::try_from(gcd_multiple(&ratios)).unwrap_or(1).max(1);
    let sign = if legs.first().is_some_and(|leg| leg.ratio < 0) {
        -1
    } else {
        1
    };
    for leg in &mut legs {
        leg.ratio = leg.ratio / divisor * sign;
    }
    legs
}
