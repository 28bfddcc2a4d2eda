//! # SKIRMISH
//!
//! Frame-stepped driver tying the entity runtime ([`skirmish_core`]) to the
//! collision world ([`skirmish_physics`]).
//!
//! ```rust
//! use skirmish::{Simulation, SimulationConfig, SystemContext};
//! use skirmish::physics::{BodyDesc, Vec2f, Vec2i};
//!
//! let mut sim = Simulation::new(SimulationConfig::default()).unwrap();
//! let ball = sim
//!     .world_mut()
//!     .create_body(BodyDesc::new(Vec2i::new(0, 0), Vec2i::new(50, 50)).dynamic())
//!     .unwrap();
//!
//! sim.add_system(move |ctx: &mut SystemContext<'_>, _dt: f32| {
//!     ctx.world.set_velocity(ball, Vec2f::new(640.0, 0.0));
//! });
//! sim.tick(0.0625).unwrap();
//!
//! assert_eq!(sim.world().body(ball).unwrap().position().x, 40);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod simulation;
pub mod stats;
pub mod system;

pub use skirmish_core as ecs;
pub use skirmish_physics as physics;

pub use config::SimulationConfig;
pub use error::{SimulationError, SimulationResult};
pub use simulation::Simulation;
pub use stats::FrameStats;
pub use system::{System, SystemContext};
