//! In-memory security reference table.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::domain::position_group::{SecurityReference, SecurityReferenceProvider};
use crate::domain::shared::InstrumentId;

/// In-memory implementation of `SecurityReferenceProvider`.
#[derive(Debug, Default)]
pub struct InMemorySecurityReference {
    securities: RwLock<HashMap<InstrumentId, SecurityReference>>,
}

impl InMemorySecurityReference {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the record for an instrument.
    pub fn upsert(&self, instrument: InstrumentId, reference: SecurityReference) {
        self.securities
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(instrument, reference);
    }

    /// Number of instruments known.
    #[must_use]
    pub fn len(&self) -> usize {
        self.securities
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if no instrument is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SecurityReferenceProvider for InMemorySecurityReference {
    fn security(&self, instrument: &InstrumentId) -> Option<SecurityReference> {
        self.securities
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(instrument)
            .cloned()
    }
}
