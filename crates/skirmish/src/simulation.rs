//! # Simulation Driver
//!
//! One tick runs in a fixed order:
//!
//! ```text
//! 1. systems            (registration order)
//! 2. world.step         (integrate, detect, resolve)
//! 3. dispatch           (detection handlers)
//! 4. entities.refresh   (destroyed entities reclaimed)
//! 5. world.reclaim      (removed and orphaned bodies reclaimed)
//! ```
//!
//! Anything destroyed during 1-3 is still readable until 4, and gone after
//! the tick returns.

use skirmish_core::EntityManager;
use skirmish_physics::World;
use tracing::{debug, info, trace, warn};

use crate::config::SimulationConfig;
use crate::error::{SimulationError, SimulationResult};
use crate::stats::FrameStats;
use crate::system::{System, SystemContext};

/// Owns the entity runtime, the collision world and the systems.
pub struct Simulation {
    config: SimulationConfig,
    entities: EntityManager,
    world: World,
    systems: Vec<Box<dyn System>>,
    frame: u64,
    last: FrameStats,
}

impl Simulation {
    /// Creates an empty simulation.
    ///
    /// # Errors
    ///
    /// Returns the first configuration error found.
    pub fn new(config: SimulationConfig) -> SimulationResult<Self> {
        config.validate()?;
        let entities = EntityManager::new(&config.entities)?;
        let world = World::new(config.physics.clone())?;
        info!(
            max_delta_time = config.max_delta_time,
            cell_size = config.physics.cell_size,
            "Simulation created"
        );
        Ok(Self {
            config,
            entities,
            world,
            systems: Vec::new(),
            frame: 0,
            last: FrameStats::default(),
        })
    }

    /// Appends a system. Systems run in the order they were added.
    pub fn add_system(&mut self, system: impl System + 'static) -> &mut Self {
        debug!(system = system.name(), "Added system");
        self.systems.push(Box::new(system));
        self
    }

    /// Returns the configuration.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Returns the entity runtime.
    #[inline]
    #[must_use]
    pub const fn entities(&self) -> &EntityManager {
        &self.entities
    }

    /// Returns the entity runtime for setup outside a tick.
    #[inline]
    pub fn entities_mut(&mut self) -> &mut EntityManager {
        &mut self.entities
    }

    /// Returns the collision world.
    #[inline]
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// Returns the collision world for setup outside a tick.
    #[inline]
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Returns both halves at once, for setup that spans them (such as
    /// [`World::attach_body`]).
    #[inline]
    pub fn parts_mut(&mut self) -> (&mut EntityManager, &mut World) {
        (&mut self.entities, &mut self.world)
    }

    /// Number of ticks run so far.
    #[inline]
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    /// Statistics of the last completed tick.
    #[inline]
    #[must_use]
    pub const fn last_stats(&self) -> &FrameStats {
        &self.last
    }

    /// Advances the simulation by `dt` seconds.
    ///
    /// `dt` is clamped to `max_delta_time`.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::InvalidDeltaTime`] for a negative or
    /// non-finite `dt`. Nothing runs in that case.
    pub fn tick(&mut self, dt: f32) -> SimulationResult<FrameStats> {
        if !dt.is_finite() || dt < 0.0 {
            warn!(dt, "Rejected tick");
            return Err(SimulationError::InvalidDeltaTime(dt));
        }
        let dt = dt.min(self.config.max_delta_time);
        let frame = self.frame;
        let _span = tracing::debug_span!("tick", frame).entered();

        {
            let _span = tracing::trace_span!("systems", count = self.systems.len()).entered();
            let mut ctx = SystemContext {
                entities: &mut self.entities,
                world: &mut self.world,
                frame,
            };
            for system in &mut self.systems {
                trace!(system = system.name(), "Running system");
                system.update(&mut ctx, dt);
            }
        }

        self.world.step(dt);
        let detections = self.world.dispatch_detections(&mut self.entities);
        let reclaimed_entities = self.entities.refresh();
        let reclaimed_bodies = self.world.reclaim(&self.entities);

        let stats = FrameStats {
            detections,
            reclaimed_entities,
            reclaimed_bodies,
            ..FrameStats::sample(frame, &self.entities, &self.world)
        };
        trace!(%stats, "Tick complete");

        self.frame += 1;
        self.last = stats;
        Ok(stats)
    }

    /// Drops every entity and body. Systems and the frame counter are kept.
    pub fn clear(&mut self) {
        self.entities.clear();
        self.world.clear();
        self.last = FrameStats {
            frame: self.last.frame,
            ..FrameStats::default()
        };
        debug!(frame = self.frame, "Simulation cleared");
    }
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("frame", &self.frame)
            .field("systems", &self.systems.len())
            .field("entities", &self.entities.len())
            .field("bodies", &self.world.len())
            .finish()
    }
}
