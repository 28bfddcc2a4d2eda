//! # Frame Statistics

use std::fmt;

use skirmish_core::EntityManager;
use skirmish_physics::World;

/// Counters sampled at the end of a tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Tick index, starting at 0.
    pub frame: u64,
    /// Live entities.
    pub entities: usize,
    /// Stored component values.
    pub components: usize,
    /// Live bodies.
    pub bodies: usize,
    /// Static bodies.
    pub static_bodies: usize,
    /// Dynamic bodies.
    pub dynamic_bodies: usize,
    /// Sensor bodies.
    pub sensors: usize,
    /// Occupied grid cells.
    pub grid_cells: usize,
    /// Detections dispatched this tick.
    pub detections: usize,
    /// Entities reclaimed this tick.
    pub reclaimed_entities: usize,
    /// Bodies reclaimed this tick.
    pub reclaimed_bodies: usize,
}

impl FrameStats {
    /// Samples the entity runtime and the collision world.
    #[must_use]
    pub fn sample(frame: u64, entities: &EntityManager, world: &World) -> Self {
        let bodies = world.stats();
        Self {
            frame,
            entities: entities.len(),
            components: entities.component_count(),
            bodies: bodies.bodies,
            static_bodies: bodies.static_bodies,
            dynamic_bodies: bodies.dynamic_bodies,
            sensors: bodies.sensors,
            grid_cells: bodies.grid_cells,
            ..Self::default()
        }
    }
}

impl fmt::Display for FrameStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "frame {} | entities {} ({} components) | bodies {} (static {}, dynamic {}, sensors {}) | cells {} | detections {}",
            self.frame,
            self.entities,
            self.components,
            self.bodies,
            self.static_bodies,
            self.dynamic_bodies,
            self.sensors,
            self.grid_cells,
            self.detections,
        )
    }
}
