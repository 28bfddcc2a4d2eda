//! # Entity Component Runtime
//!
//! Bitset-matched entities over heterogeneous component storage.
//!
//! ## Design Philosophy
//!
//! - Component kinds are numbered at runtime by an owned [`TypeRegistry`]
//! - Entities carry a [`Bitset`] of held kinds; queries are superset tests
//! - Handles are generation-checked, so retaining one across frames is safe
//! - Destruction is immediate for observers and deferred for storage

mod bitset;
mod entity;
mod group;
pub mod kind;
mod manager;
mod storage;

pub use bitset::{BitIter, Bitset};
pub use entity::{EntityId, EntityRecord};
pub use group::{Group, GroupMask};
pub use kind::{global, Component, KindInfo, KindSet, TypeRegistry, DEFAULT_MAX_COMPONENT_KINDS};
pub use manager::{Bundle, EntityManager, ManagerConfig, Matches, Query};
pub use storage::ComponentStore;
