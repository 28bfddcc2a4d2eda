//! # SKIRMISH Physics
//!
//! Spatial collision world for frame-stepped simulations:
//! - Integer world coordinates, float pixel view
//! - Hashed uniform grid broad phase
//! - Directional group/check-mask detection, buffered and dispatched after
//!   the pass
//! - Least-penetration resolution of dynamic bodies against solids
//!
//! ## Example
//!
//! ```rust
//! use skirmish_core::{EntityManager, Group};
//! use skirmish_physics::{BodyDesc, Vec2f, Vec2i, World, WorldConfig};
//!
//! const SOLID: Group = Group::new(0);
//!
//! let mut entities = EntityManager::default();
//! let mut world = World::new(WorldConfig::default()).unwrap();
//!
//! world
//!     .create_body(BodyDesc::new(Vec2i::new(5500, 5500), Vec2i::new(500, 500))
//!         .group(SOLID.mask())
//!         .resolve(true))
//!     .unwrap();
//! let player = world
//!     .create_body(BodyDesc::new(Vec2i::new(4550, 5500), Vec2i::new(400, 400))
//!         .dynamic()
//!         .check(SOLID.mask())
//!         .resolve(true)
//!         .velocity(Vec2f::new(5000.0, 0.0)))
//!     .unwrap();
//!
//! world.update(1.0 / 60.0, &mut entities);
//! assert_eq!(world.body(player).unwrap().position().x, 4600);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod body;
pub mod error;
pub mod grid;
pub mod math;
pub mod shape;
pub mod world;

pub use body::{Body, BodyDesc, BodyId, BodyKind, BodyRef};
pub use error::{PhysicsError, PhysicsResult};
pub use grid::{Cell, CellRange, SpatialGrid};
pub use math::{Vec2f, Vec2i};
pub use shape::Aabb;
pub use world::{
    DetectionContext, DetectionHandler, DetectionInfo, SpatialQuery, World, WorldConfig,
    WorldStats,
};
