//! # Collision World
//!
//! Owns every body, the broad-phase grid and the per-tick detection buffer.
//!
//! ## Tick phases
//!
//! ```text
//! step(dt)
//!   1. integrate dynamic bodies, migrate their grid cells
//!   2. for each dynamic/sensor body: grid candidates -> exact overlap
//!   3. group filter (directional) -> buffer DetectionInfo
//!   4. resolve: push dynamic bodies out of solids along least penetration
//! dispatch_detections(entities)
//!   drain the buffer, call handlers with &mut World + &mut EntityManager
//! reclaim(entities)
//!   5. free removed bodies and bodies whose owner entity is gone
//! ```
//!
//! Handlers run after the pass, so they may remove bodies, change velocities
//! or destroy entities without disturbing the iteration that found them.
//!
//! Resolution with three or more simultaneous overlaps follows candidate
//! enumeration order: cells row by row, each bucket in insertion order. The
//! order is stable for a given history but not physically "correct".

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use skirmish_core::{EntityId, EntityManager, GroupMask};
use tracing::{debug, trace, warn};

use crate::body::{Body, BodyDesc, BodyId, BodyKind, BodyRef};
use crate::error::{PhysicsError, PhysicsResult};
use crate::grid::{Candidates, CellRange, SpatialGrid};
use crate::math::{Vec2f, Vec2i};
use crate::shape::Aabb;

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Collision world settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Grid cell edge in world units.
    pub cell_size: i32,
    /// World units per pixel.
    pub units_per_pixel: i32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            cell_size: 1000,
            units_per_pixel: 100,
        }
    }
}

impl WorldConfig {
    /// Checks the configuration before any state is built from it.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::InvalidCellSize`] or
    /// [`PhysicsError::InvalidUnitsPerPixel`] for non-positive values.
    pub fn validate(&self) -> PhysicsResult<()> {
        if self.cell_size <= 0 {
            warn!(cell_size = self.cell_size, "rejected world configuration");
            return Err(PhysicsError::InvalidCellSize(self.cell_size));
        }
        if self.units_per_pixel <= 0 {
            warn!(units_per_pixel = self.units_per_pixel, "rejected world configuration");
            return Err(PhysicsError::InvalidUnitsPerPixel(self.units_per_pixel));
        }
        Ok(())
    }
}

// ============================================================================
// DETECTION
// ============================================================================

/// One overlapping pair, seen from the body whose handler runs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DetectionInfo {
    /// The detecting body.
    pub body: BodyId,
    /// Owner of the detecting body.
    pub owner: EntityId,
    /// The body that was detected.
    pub other: BodyId,
    /// Owner of the detected body.
    pub other_owner: EntityId,
    /// Groups of the detected body.
    pub other_group: GroupMask,
    /// Translation that would move `body` out of `other`, measured before
    /// any resolution this tick.
    pub penetration: Vec2i,
    /// Whether `body` was pushed out of `other`.
    pub resolved: bool,
}

/// Mutable access handed to detection handlers.
pub struct DetectionContext<'a> {
    /// The collision world.
    pub world: &'a mut World,
    /// The entity runtime.
    pub entities: &'a mut EntityManager,
}

/// Callback run for every detection a body makes.
pub type DetectionHandler = dyn FnMut(&DetectionInfo, &mut DetectionContext<'_>);

/// Body counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorldStats {
    /// Bodies not pending removal.
    pub bodies: usize,
    /// Static bodies.
    pub static_bodies: usize,
    /// Dynamic bodies.
    pub dynamic_bodies: usize,
    /// Sensor bodies.
    pub sensors: usize,
    /// Occupied grid cells.
    pub grid_cells: usize,
}

struct BodySlot {
    generation: u32,
    body: Option<Body>,
    handler: Option<Box<DetectionHandler>>,
}

// ============================================================================
// WORLD
// ============================================================================

/// The collision world.
pub struct World {
    config: WorldConfig,
    slots: Vec<BodySlot>,
    free_slots: Vec<u32>,
    /// Removed this tick, reclaimed by `reclaim`.
    pending: Vec<BodyId>,
    grid: SpatialGrid,
    /// Per-tick event buffer.
    detections: Vec<DetectionInfo>,
    /// Ordered (detector, other) pairs already reported this tick, mapped to
    /// their index in `detections`.
    fired: HashMap<(BodyId, BodyId), usize>,
    /// Bodies not pending removal.
    live: usize,
    scratch: Vec<BodyId>,
    seen: HashSet<BodyId>,
}

impl World {
    /// Creates an empty world.
    ///
    /// # Errors
    ///
    /// Returns the [`WorldConfig::validate`] error for a bad configuration.
    pub fn new(config: WorldConfig) -> PhysicsResult<Self> {
        config.validate()?;
        let grid = SpatialGrid::new(config.cell_size)?;
        debug!(
            cell_size = config.cell_size,
            units_per_pixel = config.units_per_pixel,
            "Creating World"
        );
        Ok(Self {
            config,
            slots: Vec::new(),
            free_slots: Vec::new(),
            pending: Vec::new(),
            grid,
            detections: Vec::new(),
            fired: HashMap::new(),
            live: 0,
            scratch: Vec::new(),
            seen: HashSet::new(),
        })
    }

    /// Returns the configuration.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Returns the broad-phase grid.
    #[inline]
    #[must_use]
    pub const fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    /// Converts pixels to world coordinates.
    #[inline]
    #[must_use]
    pub fn to_coords(&self, pixels: Vec2f) -> Vec2i {
        Vec2i::from_pixels(pixels, self.config.units_per_pixel)
    }

    /// Converts world coordinates to pixels.
    #[inline]
    #[must_use]
    pub fn to_pixels(&self, coords: Vec2i) -> Vec2f {
        coords.to_pixels(self.config.units_per_pixel)
    }

    // ========================================================================
    // BODIES
    // ========================================================================

    /// Adds a body.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::ZeroAreaBody`] if the described box has no
    /// area. Nothing is added in that case.
    pub fn create_body(&mut self, desc: BodyDesc) -> PhysicsResult<BodyId> {
        let shape = Aabb::new(desc.center, desc.half)?;

        let id = if let Some(index) = self.free_slots.pop() {
            BodyId::new(index, self.slots[index as usize].generation)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(BodySlot {
                generation: 0,
                body: None,
                handler: None,
            });
            BodyId::new(index, 0)
        };

        let cells = self.grid.range_for(&shape);
        let body = Body {
            id,
            shape,
            kind: desc.kind,
            group: desc.group,
            check: desc.check,
            resolve: desc.resolve && desc.kind != BodyKind::Sensor,
            velocity: desc.velocity,
            remainder: Vec2f::ZERO,
            owner: desc.owner,
            cells,
            removed: false,
        };
        self.grid.insert(id, cells);
        self.slots[id.index() as usize].body = Some(body);
        self.live += 1;

        trace!(%id, kind = ?desc.kind, owner = %desc.owner, "Created body");
        Ok(id)
    }

    /// Adds a body owned by a live entity and attaches a [`BodyRef`] to it.
    ///
    /// # Errors
    ///
    /// - [`PhysicsError::Core`] wrapping `StaleEntity` if `owner` is dead
    /// - [`PhysicsError::Core`] if the entity already carries a body
    /// - [`PhysicsError::ZeroAreaBody`] for a box with no area
    pub fn attach_body(
        &mut self,
        entities: &mut EntityManager,
        owner: EntityId,
        desc: BodyDesc,
    ) -> PhysicsResult<BodyId> {
        if !entities.is_alive(owner) {
            return Err(skirmish_core::CoreError::StaleEntity(owner).into());
        }
        let id = self.create_body(desc.owner(owner))?;
        if let Err(err) = entities.attach(owner, BodyRef(id)) {
            self.remove_body(id);
            return Err(err.into());
        }
        Ok(id)
    }

    /// Requests removal of a body.
    ///
    /// The body leaves queries and detection immediately; its slot is
    /// reclaimed by [`reclaim`](Self::reclaim). Returns `false` for a stale
    /// handle or a body already being removed.
    pub fn remove_body(&mut self, id: BodyId) -> bool {
        let Some(body) = self.body_mut(id) else {
            return false;
        };
        if body.removed {
            return false;
        }
        body.removed = true;
        self.pending.push(id);
        self.live -= 1;
        trace!(%id, "Removed body");
        true
    }

    /// Gets a body, including one pending removal.
    #[must_use]
    pub fn body(&self, id: BodyId) -> Option<&Body> {
        if id.is_null() {
            return None;
        }
        let slot = self.slots.get(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.body.as_ref()
    }

    /// Gets a body for setup code that treats a stale handle as an error.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::StaleBody`] if the body was reclaimed.
    pub fn try_body(&self, id: BodyId) -> PhysicsResult<&Body> {
        self.body(id).ok_or(PhysicsError::StaleBody(id))
    }

    fn body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        slot_body_mut(&mut self.slots, id)
    }

    /// Checks if a body exists and is not being removed.
    #[must_use]
    pub fn contains(&self, id: BodyId) -> bool {
        self.body(id).is_some_and(|body| !body.removed)
    }

    /// Number of bodies not pending removal.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.live
    }

    /// Checks if the world holds no body.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates over bodies not pending removal, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Body> + '_ {
        self.slots
            .iter()
            .filter_map(|slot| slot.body.as_ref())
            .filter(|body| !body.removed)
    }

    // ========================================================================
    // BODY API
    // ========================================================================

    fn with_body(&mut self, id: BodyId, f: impl FnOnce(&mut Body)) -> bool {
        match self.body_mut(id) {
            Some(body) if !body.removed => {
                f(body);
                true
            }
            _ => false,
        }
    }

    /// Replaces what the body is.
    pub fn set_group(&mut self, id: BodyId, group: GroupMask) -> bool {
        self.with_body(id, |body| body.group = group)
    }

    /// Adds to what the body is.
    pub fn add_groups(&mut self, id: BodyId, groups: GroupMask) -> bool {
        self.with_body(id, |body| body.group.insert(groups))
    }

    /// Replaces what the body looks for.
    pub fn set_check_mask(&mut self, id: BodyId, check: GroupMask) -> bool {
        self.with_body(id, |body| body.check = check)
    }

    /// Adds to what the body looks for.
    pub fn add_check_groups(&mut self, id: BodyId, groups: GroupMask) -> bool {
        self.with_body(id, |body| body.check.insert(groups))
    }

    /// Enables or disables resolution. Sensors never resolve.
    pub fn set_resolve(&mut self, id: BodyId, resolve: bool) -> bool {
        self.with_body(id, |body| body.resolve = resolve && body.kind != BodyKind::Sensor)
    }

    /// Sets the velocity in world units per second.
    pub fn set_velocity(&mut self, id: BodyId, velocity: Vec2f) -> bool {
        self.with_body(id, |body| body.velocity = velocity)
    }

    /// Teleports a body, keeping its grid membership in sync.
    pub fn set_position(&mut self, id: BodyId, center: Vec2i) -> bool {
        let Some(body) = slot_body_mut(&mut self.slots, id).filter(|body| !body.removed) else {
            return false;
        };
        body.shape = body.shape.with_center(center);
        body.remainder = Vec2f::ZERO;
        let (old, new) = (body.cells, self.grid.range_for(&body.shape));
        body.cells = new;
        self.grid.relocate(id, old, new);
        true
    }

    /// Installs the detection handler of a body, replacing any previous one.
    pub fn on_detection<F>(&mut self, id: BodyId, handler: F) -> bool
    where
        F: FnMut(&DetectionInfo, &mut DetectionContext<'_>) + 'static,
    {
        if !self.contains(id) {
            return false;
        }
        self.slots[id.index() as usize].handler = Some(Box::new(handler));
        true
    }

    // ========================================================================
    // TICK
    // ========================================================================

    /// Runs the whole world tick: [`step`](Self::step),
    /// [`dispatch_detections`](Self::dispatch_detections), then
    /// [`reclaim`](Self::reclaim).
    ///
    /// Returns the number of detections dispatched.
    pub fn update(&mut self, dt: f32, entities: &mut EntityManager) -> usize {
        self.step(dt);
        let detections = self.dispatch_detections(entities);
        self.reclaim(entities);
        detections
    }

    /// Integrates, detects and resolves. Detections are buffered, not
    /// dispatched.
    pub fn step(&mut self, dt: f32) {
        let _span = tracing::trace_span!("world_step", bodies = self.slots.len()).entered();
        self.fired.clear();
        self.integrate(dt);
        for index in 0..self.slots.len() {
            self.detect_from(index);
        }
        trace!(buffered = self.detections.len(), "Detection pass complete");
    }

    /// Moves dynamic bodies by `velocity * dt`.
    ///
    /// Positions are integers; the fractional part is carried in a per-body
    /// remainder so slow bodies still move.
    fn integrate(&mut self, dt: f32) {
        for slot in &mut self.slots {
            let Some(body) = slot.body.as_mut() else {
                continue;
            };
            if body.removed || body.kind != BodyKind::Dynamic || body.velocity.is_zero() {
                continue;
            }
            let (delta, remainder) = (body.remainder + body.velocity * dt).split_whole();
            body.remainder = remainder;
            if delta == Vec2i::ZERO {
                continue;
            }
            body.shape = body.shape.translate(delta);
            let new = self.grid.range_for(&body.shape);
            self.grid.relocate(body.id, body.cells, new);
            body.cells = new;
        }
    }

    /// Runs the detection pass of the body in `index`.
    ///
    /// The pass runs for every moving or sensing body, including one that
    /// checks nothing, so that targets checking it still hear about it.
    fn detect_from(&mut self, index: usize) {
        let Some(detector) = self.slots[index].body.filter(Body::scans) else {
            return;
        };
        let id = detector.id;

        self.scratch.clear();
        self.seen.clear();
        for candidate in self.grid.candidates(detector.cells) {
            if candidate != id && self.seen.insert(candidate) {
                self.scratch.push(candidate);
            }
        }

        let candidates = std::mem::take(&mut self.scratch);
        for &other_id in &candidates {
            let Some(other) = self.body(other_id).filter(|body| !body.removed).copied() else {
                continue;
            };
            // Earlier resolutions may have moved the detector
            let Some(current) = self.body(id).copied() else {
                break;
            };
            let Some(penetration) = current.shape.min_penetration(&other.shape) else {
                continue;
            };

            let forward = current.check.intersects(other.group);
            let backward = other.check.intersects(current.group);
            let resolve = forward && current.resolves_against(&other);

            if forward {
                match self.fired.entry((id, other_id)) {
                    Entry::Vacant(entry) => {
                        entry.insert(self.detections.len());
                        self.detections.push(DetectionInfo {
                            body: id,
                            owner: current.owner,
                            other: other_id,
                            other_owner: other.owner,
                            other_group: other.group,
                            penetration,
                            resolved: resolve,
                        });
                    }
                    // Reported earlier from the other body's pass, before
                    // this body was pushed
                    Entry::Occupied(entry) if resolve => {
                        let info = &mut self.detections[*entry.get()];
                        info.penetration = penetration;
                        info.resolved = true;
                    }
                    Entry::Occupied(_) => {}
                }
            }
            if backward {
                if let Entry::Vacant(entry) = self.fired.entry((other_id, id)) {
                    entry.insert(self.detections.len());
                    self.detections.push(DetectionInfo {
                        body: other_id,
                        owner: other.owner,
                        other: id,
                        other_owner: current.owner,
                        other_group: current.group,
                        penetration: -penetration,
                        resolved: false,
                    });
                }
            }
            if resolve {
                self.push_out(id, penetration);
            }
        }
        self.scratch = candidates;
    }

    /// Moves a body by `push` and stops it along the pushed axis.
    fn push_out(&mut self, id: BodyId, push: Vec2i) {
        let Some(body) = slot_body_mut(&mut self.slots, id) else {
            return;
        };
        body.shape = body.shape.translate(push);
        if push.x != 0 {
            body.velocity.x = 0.0;
            body.remainder.x = 0.0;
        }
        if push.y != 0 {
            body.velocity.y = 0.0;
            body.remainder.y = 0.0;
        }
        let (old, new) = (body.cells, self.grid.range_for(&body.shape));
        body.cells = new;
        self.grid.relocate(id, old, new);
        trace!(%id, dx = push.x, dy = push.y, "Resolved body");
    }

    /// Calls handlers for every buffered detection, in detection order.
    ///
    /// Handlers of bodies removed earlier in the same dispatch still run;
    /// they observe the state the pass saw. Returns the number of
    /// detections drained.
    pub fn dispatch_detections(&mut self, entities: &mut EntityManager) -> usize {
        let mut events = std::mem::take(&mut self.detections);
        for info in &events {
            let Some(slot) = self.slots.get_mut(info.body.index() as usize) else {
                continue;
            };
            if slot.generation != info.body.generation() {
                continue;
            }
            let Some(mut handler) = slot.handler.take() else {
                continue;
            };

            let mut ctx = DetectionContext {
                world: &mut *self,
                entities: &mut *entities,
            };
            handler(info, &mut ctx);

            // Keep a handler installed from inside the callback
            let slot = &mut self.slots[info.body.index() as usize];
            if slot.generation == info.body.generation() && slot.handler.is_none() {
                slot.handler = Some(handler);
            }
        }

        let count = events.len();
        events.clear();
        if self.detections.is_empty() {
            self.detections = events;
        }
        count
    }

    /// Reclaims removed bodies and bodies whose owner entity is gone.
    ///
    /// This is the world's end-of-tick reclamation point. Slot generations
    /// are bumped so old handles go stale. Returns the number of bodies
    /// reclaimed.
    pub fn reclaim(&mut self, entities: &EntityManager) -> usize {
        for slot in &mut self.slots {
            let Some(body) = slot.body.as_mut() else {
                continue;
            };
            if !body.removed && !body.owner.is_null() && !entities.is_alive(body.owner) {
                body.removed = true;
                self.pending.push(body.id);
                self.live -= 1;
            }
        }

        let mut reclaimed = 0;
        for id in std::mem::take(&mut self.pending) {
            let slot = &mut self.slots[id.index() as usize];
            if slot.generation != id.generation() {
                continue;
            }
            let Some(body) = slot.body.take() else {
                continue;
            };
            self.grid.remove(id, body.cells);
            slot.handler = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.free_slots.push(id.index());
            reclaimed += 1;
        }

        if reclaimed > 0 {
            debug!(reclaimed, "Reclaimed bodies");
        }
        reclaimed
    }

    /// Detections buffered by the last [`step`](Self::step) and not yet
    /// dispatched.
    #[must_use]
    pub fn pending_detections(&self) -> &[DetectionInfo] {
        &self.detections
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    /// Bodies whose box overlaps `area`.
    #[must_use]
    pub fn query_region(&self, area: Aabb) -> SpatialQuery<'_> {
        self.query(self.grid.range_for(&area), QueryTest::Region(area), None)
    }

    /// Bodies overlapping `area` that belong to at least one group of `mask`.
    #[must_use]
    pub fn query_region_filtered(&self, area: Aabb, mask: GroupMask) -> SpatialQuery<'_> {
        self.query(self.grid.range_for(&area), QueryTest::Region(area), Some(mask))
    }

    /// Bodies whose center lies within `radius` of `point`.
    #[must_use]
    pub fn query_distance(&self, point: Vec2i, radius: i32) -> SpatialQuery<'_> {
        let radius = radius.max(0);
        let test = QueryTest::Distance {
            center: point,
            radius_squared: i64::from(radius) * i64::from(radius),
        };
        self.query(self.grid.range_around(point, radius), test, None)
    }

    fn query(&self, range: CellRange, test: QueryTest, mask: Option<GroupMask>) -> SpatialQuery<'_> {
        SpatialQuery {
            world: self,
            candidates: self.grid.candidates(range),
            seen: HashSet::new(),
            test,
            mask,
        }
    }

    /// Returns body counters.
    #[must_use]
    pub fn stats(&self) -> WorldStats {
        let mut stats = WorldStats {
            grid_cells: self.grid.cell_count(),
            ..WorldStats::default()
        };
        for body in self.iter() {
            stats.bodies += 1;
            match body.kind {
                BodyKind::Static => stats.static_bodies += 1,
                BodyKind::Dynamic => stats.dynamic_bodies += 1,
                BodyKind::Sensor => stats.sensors += 1,
            }
        }
        stats
    }

    /// Drops every body and handler. Every outstanding handle goes stale.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            if slot.body.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
            slot.handler = None;
        }
        self.free_slots = (0..self.slots.len() as u32).rev().collect();
        self.pending.clear();
        self.detections.clear();
        self.fired.clear();
        self.live = 0;
        self.grid.clear();
        debug!(slots = self.slots.len(), "Cleared World");
    }
}

/// Live or pending body in `slots` whose generation matches `id`.
fn slot_body_mut(slots: &mut [BodySlot], id: BodyId) -> Option<&mut Body> {
    if id.is_null() {
        return None;
    }
    let slot = slots.get_mut(id.index() as usize)?;
    if slot.generation != id.generation() {
        return None;
    }
    slot.body.as_mut()
}

// ============================================================================
// SPATIAL QUERIES
// ============================================================================

#[derive(Clone, Copy, Debug)]
enum QueryTest {
    Region(Aabb),
    Distance { center: Vec2i, radius_squared: i64 },
}

impl QueryTest {
    fn passes(&self, body: &Body) -> bool {
        match self {
            Self::Region(area) => body.shape.overlaps(area),
            Self::Distance {
                center,
                radius_squared,
            } => body.position().distance_squared(*center) <= *radius_squared,
        }
    }
}

/// Single-pass iterator over the bodies matching a spatial query.
///
/// Each body is yielded at most once. Bodies pending removal are skipped.
/// The query borrows the world, so it cannot outlive the tick phase that
/// created it; build a new one for every lookup.
pub struct SpatialQuery<'a> {
    world: &'a World,
    candidates: Candidates<'a>,
    seen: HashSet<BodyId>,
    test: QueryTest,
    /// Group filter; `None` accepts group-less bodies too.
    mask: Option<GroupMask>,
}

impl Iterator for SpatialQuery<'_> {
    type Item = BodyId;

    fn next(&mut self) -> Option<BodyId> {
        loop {
            let id = self.candidates.next()?;
            if !self.seen.insert(id) {
                continue;
            }
            let Some(body) = self.world.body(id) else {
                continue;
            };
            let in_groups = self.mask.map_or(true, |mask| body.group.intersects(mask));
            if !body.removed && in_groups && self.test.passes(body) {
                return Some(id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use skirmish_core::Group;

    const SOLID: Group = Group::new(0);
    const PLAYER: Group = Group::new(1);
    const PLATE: Group = Group::new(2);

    fn world() -> World {
        World::new(WorldConfig::default()).unwrap()
    }

    fn wall(center: Vec2i) -> BodyDesc {
        BodyDesc::new(center, Vec2i::new(500, 500))
            .group(SOLID.mask())
            .resolve(true)
    }

    #[test]
    fn test_invalid_config() {
        let config = WorldConfig {
            units_per_pixel: 0,
            ..WorldConfig::default()
        };
        assert_eq!(
            World::new(config).err(),
            Some(PhysicsError::InvalidUnitsPerPixel(0))
        );
    }

    #[test]
    fn test_zero_area_body_rejected() {
        let mut world = world();
        let desc = BodyDesc::new(Vec2i::ZERO, Vec2i::new(0, 0));
        assert!(matches!(
            world.create_body(desc),
            Err(PhysicsError::ZeroAreaBody { .. })
        ));
        assert!(world.is_empty());
    }

    #[test]
    fn test_integration_carries_remainder() {
        let mut world = world();
        let id = world
            .create_body(
                BodyDesc::new(Vec2i::ZERO, Vec2i::new(10, 10))
                    .dynamic()
                    .velocity(Vec2f::new(30.0, 0.0)),
            )
            .unwrap();

        // 0.5 units per tick: moves every other tick
        for _ in 0..4 {
            world.step(1.0 / 60.0);
        }
        assert_eq!(world.body(id).unwrap().position(), Vec2i::new(2, 0));
    }

    #[test]
    fn test_empty_check_mask_never_detects() {
        let mut world = world();
        world.create_body(wall(Vec2i::new(500, 500))).unwrap();
        world
            .create_body(
                BodyDesc::new(Vec2i::new(600, 500), Vec2i::new(100, 100))
                    .dynamic()
                    .resolve(true),
            )
            .unwrap();
        world.step(0.0);
        assert!(world.pending_detections().is_empty());
    }

    #[test]
    fn test_sensor_detects_but_never_resolves() {
        let mut world = world();
        let mut entities = EntityManager::default();

        let plate = world
            .create_body(
                BodyDesc::new(Vec2i::new(500, 500), Vec2i::new(500, 500))
                    .sensor()
                    .group(PLATE.mask())
                    .check(PLAYER.mask())
                    .resolve(true),
            )
            .unwrap();
        let player = world
            .create_body(
                BodyDesc::new(Vec2i::new(500, 500), Vec2i::new(100, 100))
                    .dynamic()
                    .group(PLAYER.mask())
                    .check(SOLID.mask())
                    .resolve(true),
            )
            .unwrap();

        let pressed = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&pressed);
        world.on_detection(plate, move |info, _| log.borrow_mut().push(info.other));

        assert_eq!(world.update(1.0 / 60.0, &mut entities), 1);
        assert_eq!(*pressed.borrow(), vec![player]);
        assert!(!world.body(plate).unwrap().resolve());
        assert_eq!(world.body(player).unwrap().position(), Vec2i::new(500, 500));
    }

    #[test]
    fn test_handler_can_remove_bodies() {
        let mut world = world();
        let mut entities = EntityManager::default();

        let target = world.create_body(wall(Vec2i::new(500, 500))).unwrap();
        let bullet = world
            .create_body(
                BodyDesc::new(Vec2i::new(500, 500), Vec2i::new(50, 50))
                    .dynamic()
                    .check(SOLID.mask()),
            )
            .unwrap();
        world.on_detection(bullet, |info, ctx| {
            ctx.world.remove_body(info.body);
            ctx.world.remove_body(info.other);
        });

        world.step(0.0);
        world.dispatch_detections(&mut entities);
        assert!(!world.contains(bullet));
        assert!(world.body(target).is_some());

        assert_eq!(world.reclaim(&entities), 2);
        assert!(world.body(target).is_none());
        assert!(world.is_empty());
        assert_eq!(world.grid().cell_count(), 0);
    }

    #[test]
    fn test_orphaned_bodies_are_reclaimed() {
        let mut world = world();
        let mut entities = EntityManager::default();
        let owner = entities.create_entity();
        let body = world
            .attach_body(&mut entities, owner, wall(Vec2i::ZERO))
            .unwrap();
        assert_eq!(entities.get::<BodyRef>(owner), Some(&BodyRef(body)));

        entities.destroy(owner);
        entities.refresh();
        assert_eq!(world.reclaim(&entities), 1);
        assert!(world.body(body).is_none());
    }

    #[test]
    fn test_len_tracks_lifecycle() {
        let mut world = world();
        let mut entities = EntityManager::default();
        let a = world.create_body(wall(Vec2i::ZERO)).unwrap();
        world.create_body(wall(Vec2i::new(5000, 0))).unwrap();
        let owner = entities.create_entity();
        world
            .attach_body(&mut entities, owner, wall(Vec2i::new(9000, 0)))
            .unwrap();
        assert_eq!(world.len(), 3);

        // Removal counts immediately, not at reclaim
        assert!(world.remove_body(a));
        assert!(!world.remove_body(a));
        assert_eq!(world.len(), 2);

        entities.destroy(owner);
        entities.refresh();
        assert_eq!(world.reclaim(&entities), 2);
        assert_eq!(world.len(), 1);
        assert_eq!(world.len(), world.iter().count());

        // A failed attach leaves the count untouched
        let dead = entities.create_entity();
        entities.destroy(dead);
        assert!(world.attach_body(&mut entities, dead, wall(Vec2i::ZERO)).is_err());
        let taken = entities.create_entity();
        entities.attach(taken, BodyRef(BodyId::NULL)).unwrap();
        assert!(world.attach_body(&mut entities, taken, wall(Vec2i::ZERO)).is_err());
        assert_eq!(world.len(), 1);

        world.clear();
        assert_eq!(world.len(), 0);
        assert!(world.is_empty());
    }

    #[test]
    fn test_attach_body_to_dead_entity() {
        let mut world = world();
        let mut entities = EntityManager::default();
        let owner = entities.create_entity();
        entities.destroy(owner);
        let err = world
            .attach_body(&mut entities, owner, wall(Vec2i::ZERO))
            .unwrap_err();
        assert_eq!(
            err,
            PhysicsError::Core(skirmish_core::CoreError::StaleEntity(owner))
        );
    }

    #[test]
    fn test_stats_and_clear() {
        let mut world = world();
        world.create_body(wall(Vec2i::ZERO)).unwrap();
        let player = world
            .create_body(BodyDesc::new(Vec2i::ZERO, Vec2i::new(5, 5)).dynamic())
            .unwrap();
        world
            .create_body(BodyDesc::new(Vec2i::ZERO, Vec2i::new(5, 5)).sensor())
            .unwrap();

        let stats = world.stats();
        assert_eq!(stats.bodies, 3);
        assert_eq!(stats.static_bodies, 1);
        assert_eq!(stats.dynamic_bodies, 1);
        assert_eq!(stats.sensors, 1);

        world.clear();
        assert_eq!(world.stats(), WorldStats::default());
        assert!(world.body(player).is_none());
        assert!(world.try_body(player).is_err());
    }

    #[test]
    fn test_distance_query_prunes_corners() {
        let mut world = world();
        let near = world
            .create_body(BodyDesc::new(Vec2i::new(300, 0), Vec2i::new(10, 10)))
            .unwrap();
        // Inside the bounding square, outside the circle
        world
            .create_body(BodyDesc::new(Vec2i::new(450, 450), Vec2i::new(10, 10)))
            .unwrap();

        let found: Vec<_> = world.query_distance(Vec2i::ZERO, 500).collect();
        assert_eq!(found, vec![near]);
    }

    #[test]
    fn test_filtered_region_query() {
        let mut world = world();
        let solid = world.create_body(wall(Vec2i::new(500, 500))).unwrap();
        world
            .create_body(BodyDesc::new(Vec2i::new(500, 500), Vec2i::new(10, 10)).group(PLAYER.mask()))
            .unwrap();

        let area = Aabb::new(Vec2i::new(500, 500), Vec2i::new(100, 100)).unwrap();
        assert_eq!(world.query_region(area).count(), 2);
        let solids: Vec<_> = world.query_region_filtered(area, SOLID.mask()).collect();
        assert_eq!(solids, vec![solid]);
    }
}
