//! Position Group Errors

use thiserror::Error;

use crate::domain::shared::DescriptorId;

/// Errors raised while configuring the resolver chain.
///
/// Both variants are configuration mistakes and are reported at registration time.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PositionGroupError {
    /// Registration index would place a descriptor at or after the fallback resolver.
    #[error(
        "Invalid descriptor index {index}: must be less than the current descriptor count {count}"
    )]
    InvalidDescriptorIndex {
        /// Requested insertion index.
        index: usize,
        /// Descriptor count at the time of registration (fallback included).
        count: usize,
    },

    /// A resolver with the same descriptor identity is already registered.
    #[error("Descriptor already registered: {descriptor}")]
    DuplicateDescriptor {
        /// The conflicting descriptor.
        descriptor: DescriptorId,
    },
}
