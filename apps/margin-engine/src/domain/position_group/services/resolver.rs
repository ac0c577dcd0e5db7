//! Resolver seam and the priority-ordered resolver chain.

use std::sync::Arc;

use super::SecurityPositionGroupResolver;
use crate::domain::position_group::{
    PositionCollection, PositionGroup, PositionGroupCollection, PositionGroupError,
    PositionGroupKey, PositionGroupMarginModel, SecurityReferenceProvider,
};
use crate::domain::shared::DescriptorId;

/// A pluggable grouping strategy.
///
/// Implementations claim whole units of positions from the working set and return the
/// groups they formed. A resolver must be local: a change in instrument X may only
/// alter groups that already contain X.
pub trait PositionGroupResolver: Send + Sync {
    /// Identity of this strategy in the chain.
    fn descriptor(&self) -> &DescriptorId;

    /// Margin model attached to the groups this resolver produces.
    fn margin_model(&self) -> Arc<dyn PositionGroupMarginModel>;

    /// Claim positions from the working set and return the groups formed.
    fn resolve(&self, positions: &mut PositionCollection) -> Vec<PositionGroup>;
}

/// Ordered chain of resolvers with the single-instrument fallback fixed in last place.
pub struct CompositePositionGroupResolver {
    resolvers: Vec<Arc<dyn PositionGroupResolver>>,
    fallback_model: Arc<dyn PositionGroupMarginModel>,
}

impl CompositePositionGroupResolver {
    /// Create a chain containing only the fallback resolver.
    #[must_use]
    pub fn new(fallback: SecurityPositionGroupResolver) -> Self {
        Self {
            fallback_model: fallback.margin_model(),
            resolvers: vec![Arc::new(fallback)],
        }
    }

    /// Number of descriptors, fallback included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    /// Always false: the fallback is present from construction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }

    /// Insert a resolver at `index`.
    ///
    /// # Errors
    ///
    /// `InvalidDescriptorIndex` if `index >= len()` (the fallback must stay last),
    /// `DuplicateDescriptor` if the descriptor is already registered.
    pub fn register(
        &mut self,
        resolver: Arc<dyn PositionGroupResolver>,
        index: usize,
    ) -> Result<(), PositionGroupError> {
        if index >= self.resolvers.len() {
            return Err(PositionGroupError::InvalidDescriptorIndex {
                index,
                count: self.resolvers.len(),
            });
        }
        if self.find(resolver.descriptor()).is_some() {
            return Err(PositionGroupError::DuplicateDescriptor {
                descriptor: resolver.descriptor().clone(),
            });
        }
        self.resolvers.insert(index, resolver);
        Ok(())
    }

    /// Descriptors in priority order.
    #[must_use]
    pub fn descriptors(&self) -> Vec<DescriptorId> {
        self.resolvers
            .iter()
            .map(|resolver| resolver.descriptor().clone())
            .collect()
    }

    /// Resolver registered under the descriptor.
    #[must_use]
    pub fn find(&self, descriptor: &DescriptorId) -> Option<&Arc<dyn PositionGroupResolver>> {
        self.resolvers
            .iter()
            .find(|resolver| resolver.descriptor() == descriptor)
    }

    /// Partition the working set into groups.
    ///
    /// Each resolver runs in priority order against what earlier resolvers left over;
    /// the fallback then groups every remaining instrument on its own.
    #[must_use]
    pub fn resolve(&self, mut positions: PositionCollection) -> PositionGroupCollection {
        let mut groups = Vec::new();
        for resolver in &self.resolvers {
            if positions.is_empty() {
                break;
            }
            groups.extend(resolver.resolve(&mut positions));
        }
        debug_assert!(positions.is_empty(), "fallback resolver must claim everything");
        PositionGroupCollection::from_groups(groups)
    }

    /// Zero-multiplier placeholder for a key, carrying the margin model of its resolver.
    #[must_use]
    pub fn empty_group(
        &self,
        key: &PositionGroupKey,
        reference: &dyn SecurityReferenceProvider,
    ) -> PositionGroup {
        let margin_model = self.find(key.descriptor()).map_or_else(
            || Arc::clone(&self.fallback_model),
            |resolver| resolver.margin_model(),
        );
        PositionGroup::empty(key.clone(), reference, margin_model)
    }
}
