//! # SKIRMISH Core
//!
//! Entity component runtime for frame-stepped simulations:
//! - Runtime component kind numbering with memoized bitset queries
//! - Generation-checked entity handles
//! - Group memberships shared with the collision world
//!
//! ## Architecture Rules
//!
//! 1. **Setup errors fail fast** - kind limits and duplicates are `Err`
//! 2. **Stale handles are absences** - per-frame lookups return `None`/`false`
//! 3. **One reclamation point** - destroyed entities are freed by `refresh`
//!
//! ## Example
//!
//! ```rust
//! use skirmish_core::{Component, EntityManager, Group};
//!
//! struct Health(u32);
//! impl Component for Health {}
//!
//! const ENEMY: Group = Group::new(1);
//!
//! let mut manager = EntityManager::default();
//! let goblin = manager.spawn(Health(3)).unwrap();
//! manager.add_groups(goblin, ENEMY.mask());
//!
//! assert!(manager.has_entity(ENEMY));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod ecs;
pub mod error;

pub use ecs::{
    Bitset, Bundle, Component, ComponentStore, EntityId, EntityManager, EntityRecord, Group,
    GroupMask, KindInfo, KindSet, ManagerConfig, Matches, Query, TypeRegistry,
    DEFAULT_MAX_COMPONENT_KINDS,
};
pub use error::{CoreError, CoreResult};
