//! Immutable snapshot of resolved position groups.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use super::{Position, PositionGroup, PositionGroupKey};
use crate::domain::shared::InstrumentId;

/// Resolved groups indexed by key and by constituent instrument.
///
/// Cloning is cheap: both indexes sit behind `Arc` and groups are shared between
/// snapshots. Every "modifying" method returns a new snapshot and leaves the receiver
/// untouched, so readers holding an older snapshot keep a consistent view.
///
/// An instrument may belong to more than one group when a multi-leg resolver claimed
/// only part of its quantity and the fallback grouped the remainder.
#[derive(Debug, Clone, Default)]
pub struct PositionGroupCollection {
    groups: Arc<BTreeMap<PositionGroupKey, Arc<PositionGroup>>>,
    by_instrument: Arc<HashMap<InstrumentId, BTreeSet<PositionGroupKey>>>,
}

impl PositionGroupCollection {
    /// Empty snapshot.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a snapshot from groups. Groups sharing a key are merged additively.
    #[must_use]
    pub fn from_groups(groups: impl IntoIterator<Item = PositionGroup>) -> Self {
        let mut map: BTreeMap<PositionGroupKey, Arc<PositionGroup>> = BTreeMap::new();
        for group in groups {
            let merged = match map.remove(group.key()) {
                Some(existing) => merge(&existing, &group),
                None => group,
            };
            map.insert(merged.key().clone(), Arc::new(merged));
        }
        Self::from_map(map)
    }

    fn from_map(groups: BTreeMap<PositionGroupKey, Arc<PositionGroup>>) -> Self {
        let mut by_instrument: HashMap<InstrumentId, BTreeSet<PositionGroupKey>> = HashMap::new();
        for key in groups.keys() {
            for instrument in key.instruments() {
                by_instrument
                    .entry(instrument.clone())
                    .or_default()
                    .insert(key.clone());
            }
        }
        Self {
            groups: Arc::new(groups),
            by_instrument: Arc::new(by_instrument),
        }
    }

    /// Group for the key, if resolved.
    #[must_use]
    pub fn get(&self, key: &PositionGroupKey) -> Option<&Arc<PositionGroup>> {
        self.groups.get(key)
    }

    /// Groups containing the instrument, ordered by key.
    #[must_use]
    pub fn groups_for_instrument(&self, instrument: &InstrumentId) -> Vec<&Arc<PositionGroup>> {
        self.by_instrument
            .get(instrument)
            .map(|keys| keys.iter().filter_map(|key| self.groups.get(key)).collect())
            .unwrap_or_default()
    }

    /// Returns true if any group contains the instrument.
    #[must_use]
    pub fn contains_instrument(&self, instrument: &InstrumentId) -> bool {
        self.by_instrument.contains_key(instrument)
    }

    /// Groups sharing at least one instrument with the changes, ordered by key.
    #[must_use]
    pub fn impacted_groups(&self, changes: &[Position]) -> Vec<Arc<PositionGroup>> {
        let keys: BTreeSet<&PositionGroupKey> = changes
            .iter()
            .filter_map(|change| self.by_instrument.get(change.instrument()))
            .flatten()
            .collect();
        keys.into_iter()
            .filter_map(|key| self.groups.get(key).cloned())
            .collect()
    }

    /// New snapshot with the group inserted, replacing any group with the same key.
    #[must_use]
    pub fn with_group(&self, group: PositionGroup) -> Self {
        let mut groups = (*self.groups).clone();
        groups.insert(group.key().clone(), Arc::new(group));
        Self::from_map(groups)
    }

    /// New snapshot without the given key.
    #[must_use]
    pub fn without_group(&self, key: &PositionGroupKey) -> Self {
        if !self.groups.contains_key(key) {
            return self.clone();
        }
        let mut groups = (*self.groups).clone();
        groups.remove(key);
        Self::from_map(groups)
    }

    /// New snapshot containing the groups of both, merging groups that share a key.
    #[must_use]
    pub fn combine(&self, other: &Self) -> Self {
        let mut groups = (*self.groups).clone();
        for (key, group) in other.groups.iter() {
            let merged = match groups.remove(key) {
                Some(existing) => Arc::new(merge(&existing, group)),
                None => Arc::clone(group),
            };
            groups.insert(key.clone(), merged);
        }
        Self::from_map(groups)
    }

    /// Iterate groups in key order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<PositionGroup>> {
        self.groups.values()
    }

    /// Number of groups, placeholders included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Returns true if the snapshot has no groups.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// True when every group came from the fallback single-instrument resolver.
    #[must_use]
    pub fn is_only_default_groups(&self) -> bool {
        self.groups.keys().all(PositionGroupKey::is_default)
    }

    /// Every position of every group, in key order.
    pub fn positions(&self) -> impl Iterator<Item = &Position> {
        self.groups.values().flat_map(|group| group.positions().iter())
    }
}

fn merge(existing: &PositionGroup, addition: &PositionGroup) -> PositionGroup {
    let positions = existing
        .positions()
        .iter()
        .map(|position| {
            addition
                .position(position.instrument())
                .map_or_else(|| position.clone(), |other| position.combine(other))
        })
        .collect();
    PositionGroup::new(
        existing.key().clone(),
        positions,
        Arc::clone(existing.margin_model()),
    )
}
