//! Position Group Manager
//!
//! Owns the live snapshot of resolved position groups. Holdings notifications only
//! record that the snapshot may be stale; the full re-resolution happens on the next
//! explicit call to [`PositionGroupManager::resolve_position_groups`], so any number
//! of changes within one decision cycle cost at most one resolution pass.

use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

use crate::application::ports::{HoldingsChange, HoldingsObserver, HoldingsPort};
use crate::domain::position_group::{
    CompositePositionGroupResolver, Position, PositionCollection, PositionGroup,
    PositionGroupCollection, PositionGroupError, PositionGroupKey, PositionGroupMarginModel,
    PositionGroupResolver, SecurityPositionGroupResolver, SecurityReferenceProvider,
};
use crate::domain::shared::{DescriptorId, InstrumentId};

/// Snapshot and dirty flag shared with the holdings source.
struct GroupState {
    snapshot: RwLock<PositionGroupCollection>,
    dirty: AtomicBool,
    reference: Arc<dyn SecurityReferenceProvider>,
    default_model: Arc<dyn PositionGroupMarginModel>,
}

impl GroupState {
    fn current(&self) -> PositionGroupCollection {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn publish(&self, snapshot: PositionGroupCollection) {
        *self
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner) = snapshot;
    }

    fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    fn placeholder(&self, instrument: &InstrumentId) -> PositionGroup {
        PositionGroup::empty(
            PositionGroupKey::single(instrument.clone()),
            self.reference.as_ref(),
            Arc::clone(&self.default_model),
        )
    }

    fn instrument_added(&self, instrument: &InstrumentId, quantity: Decimal) {
        let snapshot = self.current();
        if !snapshot.contains_instrument(instrument) {
            self.publish(snapshot.with_group(self.placeholder(instrument)));
        }
        if !quantity.is_zero() {
            self.mark_dirty();
        }
    }

    fn instrument_removed(&self, instrument: &InstrumentId, quantity: Decimal) {
        let snapshot = self.current();
        self.publish(snapshot.without_group(&PositionGroupKey::single(instrument.clone())));
        if !quantity.is_zero() {
            self.mark_dirty();
        }
    }

    fn quantity_changed(&self, instrument: &InstrumentId, previous: Decimal, current: Decimal) {
        if previous.is_zero() || current.is_zero() {
            self.mark_dirty();
            return;
        }

        // Only a sole single-instrument group can be patched without re-resolving:
        // any multi-leg membership may regroup on a quantity change, and an odd-lot
        // remainder needs its own group.
        let snapshot = self.current();
        let owners = snapshot.groups_for_instrument(instrument);
        match owners.as_slice() {
            [group] if group.key().is_default() => {
                let lot_size = group
                    .position(instrument)
                    .map_or_else(|| self.reference.lot_size(instrument), Position::lot_size);
                let position = Position::new(instrument.clone(), current, lot_size);
                if !position.is_whole_lots() {
                    self.mark_dirty();
                    return;
                }
                let patched = PositionGroup::single(position, Arc::clone(group.margin_model()));
                self.publish(snapshot.with_group(patched));
            }
            _ => self.mark_dirty(),
        }
    }
}

impl HoldingsObserver for GroupState {
    fn on_holdings_changed(&self, change: &HoldingsChange) {
        match change {
            HoldingsChange::InstrumentAdded {
                instrument,
                quantity,
            } => self.instrument_added(instrument, *quantity),
            HoldingsChange::InstrumentRemoved {
                instrument,
                quantity,
            } => self.instrument_removed(instrument, *quantity),
            HoldingsChange::QuantityChanged {
                instrument,
                previous,
                current,
            } => self.quantity_changed(instrument, *previous, *current),
        }
    }
}

/// Keeps "which positions belong to which group" consistent with the holdings.
pub struct PositionGroupManager {
    holdings: Arc<dyn HoldingsPort>,
    resolver: RwLock<CompositePositionGroupResolver>,
    state: Arc<GroupState>,
}

impl PositionGroupManager {
    /// Create a manager whose chain holds only the fallback resolver, and subscribe it
    /// to the holdings source. The first call to `resolve_position_groups` builds the
    /// initial snapshot.
    pub fn new(
        holdings: Arc<dyn HoldingsPort>,
        reference: Arc<dyn SecurityReferenceProvider>,
        fallback: SecurityPositionGroupResolver,
    ) -> Self {
        let state = Arc::new(GroupState {
            snapshot: RwLock::new(PositionGroupCollection::empty()),
            dirty: AtomicBool::new(true),
            reference,
            default_model: fallback.margin_model(),
        });
        holdings.subscribe(Arc::clone(&state) as Arc<dyn HoldingsObserver>);
        Self {
            holdings,
            resolver: RwLock::new(CompositePositionGroupResolver::new(fallback)),
            state,
        }
    }

    /// Insert a resolver at `index` in the chain.
    ///
    /// The snapshot is marked dirty since the new resolver may regroup holdings.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDescriptorIndex` if `index` is not below the current descriptor
    /// count, or `DuplicateDescriptor` if the descriptor is already registered.
    pub fn register_descriptor(
        &self,
        resolver: Arc<dyn PositionGroupResolver>,
        index: usize,
    ) -> Result<(), PositionGroupError> {
        let descriptor = resolver.descriptor().clone();
        self.resolver
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .register(resolver, index)?;
        self.state.mark_dirty();
        tracing::debug!(descriptor = %descriptor, index, "Registered position group descriptor");
        Ok(())
    }

    /// Rebuild the snapshot from current holdings if it is dirty.
    ///
    /// Returns true when a new snapshot was published.
    pub fn resolve_position_groups(&self) -> bool {
        if !self.state.dirty.swap(false, Ordering::AcqRel) {
            return false;
        }

        let started = Instant::now();
        let working_set: PositionCollection = self.holdings.holdings().into_iter().collect();
        let resolver = self.resolver.read().unwrap_or_else(PoisonError::into_inner);
        let resolved = resolver.resolve(working_set);

        let placeholders: Vec<PositionGroup> = self
            .holdings
            .tracked_instruments()
            .into_iter()
            .filter(|instrument| !resolved.contains_instrument(instrument))
            .map(|instrument| {
                resolver.empty_group(
                    &PositionGroupKey::single(instrument),
                    self.state.reference.as_ref(),
                )
            })
            .collect();
        drop(resolver);

        let snapshot = resolved.combine(&PositionGroupCollection::from_groups(placeholders));
        let groups = snapshot.len();
        self.state.publish(snapshot);

        tracing::debug!(
            groups,
            elapsed_us = started.elapsed().as_micros() as u64,
            "Resolved position groups"
        );
        true
    }

    /// Group for `key`, or a zero-multiplier placeholder if nothing is held under it.
    pub fn get_position_group(&self, key: &PositionGroupKey) -> Arc<PositionGroup> {
        if let Some(group) = self.state.current().get(key) {
            return Arc::clone(group);
        }
        Arc::new(
            self.resolver
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .empty_group(key, self.state.reference.as_ref()),
        )
    }

    /// The current snapshot. Later resolutions never alter the returned value.
    pub fn snapshot(&self) -> PositionGroupCollection {
        self.state.current()
    }

    /// True if holdings changed in a way that requires a full re-resolution.
    pub fn is_dirty(&self) -> bool {
        self.state.dirty.load(Ordering::Acquire)
    }

    /// Descriptors in priority order, the fallback last.
    pub fn descriptors(&self) -> Vec<DescriptorId> {
        self.resolver
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .descriptors()
    }

    /// Resolve an arbitrary working set through the same chain, without touching the
    /// live snapshot.
    pub fn resolve_working_set(&self, positions: PositionCollection) -> PositionGroupCollection {
        self.resolver
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .resolve(positions)
    }

    /// Reference data used for lot sizes and margin models.
    pub fn reference(&self) -> &Arc<dyn SecurityReferenceProvider> {
        &self.state.reference
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::position_group::{FixedRatioResolver, SecurityReference, UnitLeg};
    use crate::infrastructure::margin::PercentageMarginModel;
    use crate::infrastructure::portfolio::InMemoryPortfolio;
    use crate::infrastructure::reference::InMemorySecurityReference;
    use rust_decimal_macros::dec;

    fn setup() -> (Arc<InMemoryPortfolio>, PositionGroupManager) {
        let reference = Arc::new(InMemorySecurityReference::new());
        for symbol in ["AAPL", "MSFT", "TSLA"] {
            reference.upsert(
                InstrumentId::new(symbol),
                SecurityReference::new(dec!(100), dec!(1), "USD"),
            );
        }
        let portfolio = Arc::new(InMemoryPortfolio::new(
            "USD",
            Arc::clone(&reference) as Arc<dyn SecurityReferenceProvider>,
        ));
        let manager = PositionGroupManager::new(
            Arc::clone(&portfolio) as Arc<dyn HoldingsPort>,
            reference,
            SecurityPositionGroupResolver::new(Arc::new(PercentageMarginModel::cash())),
        );
        (portfolio, manager)
    }

    fn pair() -> Arc<dyn PositionGroupResolver> {
        Arc::new(FixedRatioResolver::new(
            DescriptorId::new("pair"),
            vec![UnitLeg::new("AAPL", 1), UnitLeg::new("MSFT", -1)],
            Arc::new(PercentageMarginModel::cash()),
        ))
    }

    #[test]
    fn starts_dirty_and_resolves_once() {
        let (portfolio, manager) = setup();
        portfolio.set_quantity(&InstrumentId::new("AAPL"), dec!(10));

        assert!(manager.is_dirty());
        assert!(manager.resolve_position_groups());
        assert!(!manager.is_dirty());
        assert!(!manager.resolve_position_groups());
        assert_eq!(manager.snapshot().len(), 1);
    }

    #[test]
    fn tracking_an_instrument_inserts_placeholder_without_dirtying() {
        let (portfolio, manager) = setup();
        manager.resolve_position_groups();

        portfolio.track(&InstrumentId::new("TSLA"));

        assert!(!manager.is_dirty());
        let snapshot = manager.snapshot();
        let key = PositionGroupKey::single(InstrumentId::new("TSLA"));
        assert!(snapshot.get(&key).is_some_and(|group| group.is_empty()));
    }

    #[test]
    fn untracking_removes_the_default_group() {
        let (portfolio, manager) = setup();
        portfolio.track(&InstrumentId::new("TSLA"));
        manager.resolve_position_groups();

        portfolio.untrack(&InstrumentId::new("TSLA"));

        assert!(!manager.is_dirty());
        assert!(!manager.snapshot().contains_instrument(&InstrumentId::new("TSLA")));
    }

    #[test]
    fn zero_crossing_marks_dirty() {
        let (portfolio, manager) = setup();
        portfolio.track(&InstrumentId::new("AAPL"));
        manager.resolve_position_groups();

        portfolio.set_quantity(&InstrumentId::new("AAPL"), dec!(5));
        assert!(manager.is_dirty());
    }

    #[test]
    fn non_crossing_change_patches_default_group() {
        let (portfolio, manager) = setup();
        portfolio.set_quantity(&InstrumentId::new("AAPL"), dec!(5));
        manager.resolve_position_groups();

        portfolio.set_quantity(&InstrumentId::new("AAPL"), dec!(8));

        assert!(!manager.is_dirty());
        let group = manager.get_position_group(&PositionGroupKey::single(InstrumentId::new("AAPL")));
        assert_eq!(group.multiplier(), dec!(8));
    }

    #[test]
    fn change_leaving_an_odd_lot_marks_dirty() {
        let reference = Arc::new(InMemorySecurityReference::new());
        reference.upsert(
            InstrumentId::new("AAPL"),
            SecurityReference::new(dec!(100), dec!(100), "USD"),
        );
        let portfolio = Arc::new(InMemoryPortfolio::new(
            "USD",
            Arc::clone(&reference) as Arc<dyn SecurityReferenceProvider>,
        ));
        let manager = PositionGroupManager::new(
            Arc::clone(&portfolio) as Arc<dyn HoldingsPort>,
            reference,
            SecurityPositionGroupResolver::new(Arc::new(PercentageMarginModel::cash())),
        );
        portfolio.set_quantity(&InstrumentId::new("AAPL"), dec!(200));
        manager.resolve_position_groups();

        portfolio.set_quantity(&InstrumentId::new("AAPL"), dec!(250));
        assert!(manager.is_dirty());

        manager.resolve_position_groups();
        let snapshot = manager.snapshot();
        let owners = snapshot.groups_for_instrument(&InstrumentId::new("AAPL"));
        assert_eq!(owners.len(), 2);
        assert!(owners.iter().all(|group| group.multiplier().fract().is_zero()));
    }

    #[test]
    fn non_crossing_change_in_multi_leg_group_marks_dirty() {
        let (portfolio, manager) = setup();
        manager.register_descriptor(pair(), 0).unwrap();
        portfolio.set_quantity(&InstrumentId::new("AAPL"), dec!(3));
        portfolio.set_quantity(&InstrumentId::new("MSFT"), dec!(-3));
        manager.resolve_position_groups();

        portfolio.set_quantity(&InstrumentId::new("AAPL"), dec!(5));
        assert!(manager.is_dirty());

        manager.resolve_position_groups();
        let snapshot = manager.snapshot();
        assert_eq!(snapshot.groups_for_instrument(&InstrumentId::new("AAPL")).len(), 2);
    }

    #[test]
    fn missing_key_yields_placeholder() {
        let (_portfolio, manager) = setup();
        manager.resolve_position_groups();

        let key = PositionGroupKey::new(
            DescriptorId::new("pair"),
            vec![UnitLeg::new("AAPL", 1), UnitLeg::new("MSFT", -1)],
        );
        let group = manager.get_position_group(&key);
        assert!(group.is_empty());
        assert_eq!(group.len(), 2);
    }

    #[test]
    fn registration_index_is_bounds_checked() {
        let (_portfolio, manager) = setup();
        let err = manager.register_descriptor(pair(), 1).unwrap_err();
        assert_eq!(
            err,
            PositionGroupError::InvalidDescriptorIndex { index: 1, count: 1 }
        );
        manager.register_descriptor(pair(), 0).unwrap();
        assert_eq!(manager.descriptors().len(), 2);
    }

    #[test]
    fn burst_of_changes_coalesces_into_one_resolution() {
        let (portfolio, manager) = setup();
        manager.resolve_position_groups();

        portfolio.set_quantity(&InstrumentId::new("AAPL"), dec!(1));
        portfolio.set_quantity(&InstrumentId::new("MSFT"), dec!(2));
        portfolio.set_quantity(&InstrumentId::new("AAPL"), dec!(0));

        assert!(manager.resolve_position_groups());
        assert!(!manager.resolve_position_groups());
        let snapshot = manager.snapshot();
        assert!(snapshot
            .get(&PositionGroupKey::single(InstrumentId::new("AAPL")))
            .is_some_and(|group| group.is_empty()));
    }
}
