//! # Core Error Types
//!
//! Setup-time failures of the entity runtime.
//!
//! Per-frame lookups never produce these: a stale handle on the hot path is
//! reported as an absence (`false` / `None`). Errors are reserved for
//! configuration mistakes that should abort construction.

use thiserror::Error;

use crate::ecs::EntityId;

/// Errors that can occur while configuring or populating the entity runtime.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A registry was configured with an unusable kind capacity.
    #[error("invalid component kind capacity {requested}: must be between 1 and {max}")]
    InvalidCapacity {
        /// The capacity that was asked for.
        requested: usize,
        /// The widest bitset the runtime supports.
        max: usize,
    },

    /// More distinct component kinds were referenced than the registry allows.
    #[error("component kind limit reached: capacity {capacity}, cannot register {kind}")]
    TooManyComponentKinds {
        /// Configured maximum number of kinds.
        capacity: usize,
        /// Type name of the kind that did not fit.
        kind: &'static str,
    },

    /// The entity already carries a component of this kind.
    #[error("entity {entity} already carries a {kind} component")]
    DuplicateComponent {
        /// Entity the attach was aimed at.
        entity: EntityId,
        /// Type name of the duplicated kind.
        kind: &'static str,
    },

    /// A kind bit is already bound to a different Rust type in the store.
    ///
    /// Only reachable when a store and a registry disagree about numbering.
    #[error("kind bit {bit} is bound to another type, cannot store {kind}")]
    KindMismatch {
        /// Bit index that was targeted.
        bit: u8,
        /// Type name of the value that was rejected.
        kind: &'static str,
    },

    /// The handle refers to a destroyed entity or a reused slot.
    #[error("entity {0} is not alive")]
    StaleEntity(EntityId),
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
