//! # Bodies
//!
//! A body is a box in the collision world with two group masks:
//!
//! - `group`: what the body *is* (solid, enemy, projectile...)
//! - `check`: what the body *looks for*
//!
//! Checking is directional. A projectile that checks `ENEMY` detects an
//! enemy even if the enemy checks nothing.

use std::fmt;

use skirmish_core::{Component, EntityId, GroupMask};

use crate::grid::CellRange;
use crate::math::{Vec2f, Vec2i};
use crate::shape::Aabb;

/// Generation-checked handle to a body.
///
/// Same packing as [`EntityId`]: slot index in the low 32 bits, generation
/// in the high 32 bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct BodyId(u64);

impl BodyId {
    /// Null handle. Never refers to a body.
    pub const NULL: Self = Self(u64::MAX);

    /// Creates a handle from slot index and generation.
    #[inline]
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self(((generation as u64) << 32) | (index as u64))
    }

    /// Returns the slot index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0 as u32
    }

    /// Returns the generation.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Checks if this is the null handle.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == u64::MAX
    }
}

impl Default for BodyId {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            f.write_str("body(null)")
        } else {
            write!(f, "body({}v{})", self.index(), self.generation())
        }
    }
}

/// Component linking an entity to the body it owns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BodyRef(pub BodyId);

impl Component for BodyRef {}

/// How a body takes part in a tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BodyKind {
    /// Never moves. Only ever a target.
    #[default]
    Static,
    /// Integrated by velocity, runs detection, may be pushed out of solids.
    Dynamic,
    /// Never moves and is never pushed, but runs detection for its own
    /// check mask (pressure plates, trigger zones).
    Sensor,
}

/// Construction parameters for a body.
///
/// # Example
///
/// ```rust
/// use skirmish_core::Group;
/// use skirmish_physics::{BodyDesc, Vec2f, Vec2i};
///
/// const SOLID: Group = Group::new(0);
/// const PLAYER: Group = Group::new(1);
///
/// let desc = BodyDesc::new(Vec2i::new(1500, 5500), Vec2i::new(400, 400))
///     .dynamic()
///     .group(PLAYER.mask())
///     .check(SOLID.mask())
///     .resolve(true)
///     .velocity(Vec2f::new(5000.0, 0.0));
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyDesc {
    /// Center in world coordinates.
    pub center: Vec2i,
    /// Half extents in world coordinates.
    pub half: Vec2i,
    /// Participation mode.
    pub kind: BodyKind,
    /// What the body is.
    pub group: GroupMask,
    /// What the body looks for.
    pub check: GroupMask,
    /// Whether overlap with solids causes positional correction.
    pub resolve: bool,
    /// World units per second.
    pub velocity: Vec2f,
    /// Owning entity, or [`EntityId::NULL`] for unowned scenery.
    pub owner: EntityId,
}

impl BodyDesc {
    /// Starts a static, group-less, unowned body description.
    #[must_use]
    pub const fn new(center: Vec2i, half: Vec2i) -> Self {
        Self {
            center,
            half,
            kind: BodyKind::Static,
            group: GroupMask::NONE,
            check: GroupMask::NONE,
            resolve: false,
            velocity: Vec2f::ZERO,
            owner: EntityId::NULL,
        }
    }

    /// Sets the participation mode.
    #[must_use]
    pub const fn kind(mut self, kind: BodyKind) -> Self {
        self.kind = kind;
        self
    }

    /// Shorthand for [`BodyKind::Dynamic`].
    #[must_use]
    pub const fn dynamic(self) -> Self {
        self.kind(BodyKind::Dynamic)
    }

    /// Shorthand for [`BodyKind::Sensor`].
    #[must_use]
    pub const fn sensor(self) -> Self {
        self.kind(BodyKind::Sensor)
    }

    /// Sets the group mask.
    #[must_use]
    pub const fn group(mut self, group: GroupMask) -> Self {
        self.group = group;
        self
    }

    /// Sets the check mask.
    #[must_use]
    pub const fn check(mut self, check: GroupMask) -> Self {
        self.check = check;
        self
    }

    /// Sets the resolve flag.
    #[must_use]
    pub const fn resolve(mut self, resolve: bool) -> Self {
        self.resolve = resolve;
        self
    }

    /// Sets the initial velocity.
    #[must_use]
    pub const fn velocity(mut self, velocity: Vec2f) -> Self {
        self.velocity = velocity;
        self
    }

    /// Sets the owning entity.
    #[must_use]
    pub const fn owner(mut self, owner: EntityId) -> Self {
        self.owner = owner;
        self
    }
}

/// A body owned by the [`World`](crate::World).
#[derive(Clone, Copy, Debug)]
pub struct Body {
    pub(crate) id: BodyId,
    pub(crate) shape: Aabb,
    pub(crate) kind: BodyKind,
    pub(crate) group: GroupMask,
    pub(crate) check: GroupMask,
    pub(crate) resolve: bool,
    pub(crate) velocity: Vec2f,
    /// Sub-unit movement carried into the next tick.
    pub(crate) remainder: Vec2f,
    pub(crate) owner: EntityId,
    /// Cells the body is registered in.
    pub(crate) cells: CellRange,
    /// Removal requested; reclaimed at the end of the tick.
    pub(crate) removed: bool,
}

impl Body {
    /// Returns the handle of this body.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> BodyId {
        self.id
    }

    /// Returns the current box.
    #[inline]
    #[must_use]
    pub const fn shape(&self) -> &Aabb {
        &self.shape
    }

    /// Returns the center in world coordinates.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> Vec2i {
        self.shape.center()
    }

    /// Returns the participation mode.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> BodyKind {
        self.kind
    }

    /// Returns what the body is.
    #[inline]
    #[must_use]
    pub const fn group(&self) -> GroupMask {
        self.group
    }

    /// Returns what the body looks for.
    #[inline]
    #[must_use]
    pub const fn check_mask(&self) -> GroupMask {
        self.check
    }

    /// Returns whether the body takes part in resolution.
    #[inline]
    #[must_use]
    pub const fn resolve(&self) -> bool {
        self.resolve
    }

    /// Returns the velocity in world units per second.
    #[inline]
    #[must_use]
    pub const fn velocity(&self) -> Vec2f {
        self.velocity
    }

    /// Returns the owning entity.
    #[inline]
    #[must_use]
    pub const fn owner(&self) -> EntityId {
        self.owner
    }

    /// Returns whether removal was requested this tick.
    #[inline]
    #[must_use]
    pub const fn is_removed(&self) -> bool {
        self.removed
    }

    /// Checks if the body runs a candidate pass each tick.
    ///
    /// Static bodies are only ever targets. A scanning body with an empty
    /// check mask raises nothing itself, but targets that check it are still
    /// reported from its pass.
    #[inline]
    #[must_use]
    pub fn scans(&self) -> bool {
        !self.removed && self.kind != BodyKind::Static
    }

    /// Checks if the body raises detections of its own.
    #[inline]
    #[must_use]
    pub fn detects(&self) -> bool {
        self.scans() && !self.check.is_empty()
    }

    /// Checks if this body may be pushed out of `other`.
    #[inline]
    #[must_use]
    pub fn resolves_against(&self, other: &Self) -> bool {
        self.kind == BodyKind::Dynamic
            && self.resolve
            && other.resolve
            && other.kind != BodyKind::Sensor
    }
}
