//! World error taxonomy

/// Recoverable failures of world mutations
///
/// Every variant is handled at the command boundary; the render tick is never
/// interrupted by any of them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    /// An entity with this id already exists
    #[error("Entity '{0}' already exists")]
    DuplicateId(String),

    /// No entity or edge with this id exists
    #[error("'{0}' not found")]
    NotFound(String),

    /// The instance pool has no free slot left
    #[error("Instance pool exhausted: {allocated} of {capacity} slots in use")]
    CapacityExceeded {
        /// Slots in use when the allocation was rejected
        allocated: usize,
        /// Total pool capacity
        capacity: usize,
    },

    /// An edge endpoint does not resolve to a live entity
    #[error("Edge '{edge}' references missing entity '{endpoint}'")]
    DanglingEndpoint {
        /// Id of the rejected edge
        edge: String,
        /// The endpoint id that failed to resolve
        endpoint: String,
    },
}
