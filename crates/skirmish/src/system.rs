//! # Systems
//!
//! Game logic runs as systems, called once per tick in registration order
//! before the collision world steps.

use skirmish_core::EntityManager;
use skirmish_physics::World;

/// Mutable view of the simulation handed to each system.
pub struct SystemContext<'a> {
    /// Entity runtime.
    pub entities: &'a mut EntityManager,
    /// Collision world.
    pub world: &'a mut World,
    /// Index of the tick being run.
    pub frame: u64,
}

/// Per-tick game logic.
///
/// Any `FnMut(&mut SystemContext<'_>, f32)` closure is a system.
pub trait System {
    /// Runs one tick of this system.
    fn update(&mut self, ctx: &mut SystemContext<'_>, dt: f32);

    /// Name used in trace output.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl<F> System for F
where
    F: FnMut(&mut SystemContext<'_>, f32),
{
    fn update(&mut self, ctx: &mut SystemContext<'_>, dt: f32) {
        self(ctx, dt);
    }
}
