//! # Axis-Aligned Boxes
//!
//! Every body is an [`Aabb`] stored as a center and half extents in world
//! coordinates. Edges are derived:
//!
//! ```text
//!        top = center.y - half.y
//!      ┌──────────────┐
//! left │    center    │ right = center.x + half.x
//!      └──────────────┘
//!        bottom = center.y + half.y
//! ```
//!
//! Overlap is strict: two boxes that only share an edge do not overlap, so a
//! body resolved flush against a wall stays out of contact.

use crate::error::{PhysicsError, PhysicsResult};
use crate::math::Vec2i;

/// Axis-aligned bounding box with positive area.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Aabb {
    center: Vec2i,
    half: Vec2i,
}

impl Aabb {
    /// Creates a box from its center and half extents.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::ZeroAreaBody`] if either half extent is zero
    /// or negative.
    pub fn new(center: Vec2i, half: Vec2i) -> PhysicsResult<Self> {
        if half.x <= 0 || half.y <= 0 {
            return Err(PhysicsError::ZeroAreaBody { half });
        }
        Ok(Self { center, half })
    }

    /// Returns the center.
    #[inline]
    #[must_use]
    pub const fn center(&self) -> Vec2i {
        self.center
    }

    /// Returns the half extents.
    #[inline]
    #[must_use]
    pub const fn half(&self) -> Vec2i {
        self.half
    }

    /// Left edge.
    #[inline]
    #[must_use]
    pub const fn left(&self) -> i32 {
        self.center.x - self.half.x
    }

    /// Right edge.
    #[inline]
    #[must_use]
    pub const fn right(&self) -> i32 {
        self.center.x + self.half.x
    }

    /// Top edge.
    #[inline]
    #[must_use]
    pub const fn top(&self) -> i32 {
        self.center.y - self.half.y
    }

    /// Bottom edge.
    #[inline]
    #[must_use]
    pub const fn bottom(&self) -> i32 {
        self.center.y + self.half.y
    }

    /// Checks if the two boxes share interior area.
    #[inline]
    #[must_use]
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.top() < other.bottom()
            && self.bottom() > other.top()
    }

    /// Returns the overlap on each axis. Positive = overlap, zero or
    /// negative = gap.
    #[inline]
    #[must_use]
    pub fn overlap_extent(&self, other: &Self) -> Vec2i {
        Vec2i::new(
            self.right().min(other.right()) - self.left().max(other.left()),
            self.bottom().min(other.bottom()) - self.top().max(other.top()),
        )
    }

    /// Returns the smallest translation that moves `self` out of `other`.
    ///
    /// The push runs along the axis of least penetration, away from
    /// `other`'s center. Equal penetration on both axes pushes along y.
    /// Returns `None` when the boxes do not overlap.
    #[must_use]
    pub fn min_penetration(&self, other: &Self) -> Option<Vec2i> {
        if !self.overlaps(other) {
            return None;
        }
        let extent = self.overlap_extent(other);
        let push = if extent.x < extent.y {
            let dx = if self.center.x < other.center.x { -extent.x } else { extent.x };
            Vec2i::new(dx, 0)
        } else {
            let dy = if self.center.y < other.center.y { -extent.y } else { extent.y };
            Vec2i::new(0, dy)
        };
        Some(push)
    }

    /// Returns a copy moved by `delta`.
    #[inline]
    #[must_use]
    pub fn translate(&self, delta: Vec2i) -> Self {
        Self {
            center: self.center + delta,
            half: self.half,
        }
    }

    /// Returns a copy centered on `center`.
    #[inline]
    #[must_use]
    pub const fn with_center(&self, center: Vec2i) -> Self {
        Self {
            center,
            half: self.half,
        }
    }

    /// Checks if a point lies inside. Left and top edges are inclusive.
    #[inline]
    #[must_use]
    pub const fn contains(&self, point: Vec2i) -> bool {
        point.x >= self.left()
            && point.x < self.right()
            && point.y >= self.top()
            && point.y < self.bottom()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aabb(cx: i32, cy: i32, hx: i32, hy: i32) -> Aabb {
        Aabb::new(Vec2i::new(cx, cy), Vec2i::new(hx, hy)).unwrap()
    }

    #[test]
    fn test_zero_area_rejected() {
        let err = Aabb::new(Vec2i::ZERO, Vec2i::new(0, 10)).unwrap_err();
        assert_eq!(err, PhysicsError::ZeroAreaBody { half: Vec2i::new(0, 10) });
        assert!(Aabb::new(Vec2i::ZERO, Vec2i::new(5, -1)).is_err());
    }

    #[test]
    fn test_touching_edges_do_not_overlap() {
        let wall = aabb(5500, 5500, 500, 500);
        let flush = aabb(4600, 5500, 400, 400);
        assert_eq!(flush.right(), wall.left());
        assert!(!flush.overlaps(&wall));
        assert!(flush.translate(Vec2i::new(1, 0)).overlaps(&wall));
    }

    #[test]
    fn test_min_penetration_axis() {
        let wall = aabb(0, 0, 500, 500);

        // Shallow from the left: push left
        let left = aabb(-850, 0, 400, 400);
        assert_eq!(left.min_penetration(&wall), Some(Vec2i::new(-50, 0)));

        // Shallow from below: push down
        let below = aabb(100, 880, 400, 400);
        assert_eq!(below.min_penetration(&wall), Some(Vec2i::new(0, 20)));

        // Equal extents go along y
        let corner = aabb(850, 850, 400, 400);
        assert_eq!(corner.min_penetration(&wall), Some(Vec2i::new(0, 50)));

        assert_eq!(aabb(2000, 0, 10, 10).min_penetration(&wall), None);
    }

    #[test]
    fn test_resolution_removes_penetration() {
        let wall = aabb(0, 0, 500, 500);
        let body = aabb(-870, 30, 400, 400);
        let push = body.min_penetration(&wall).unwrap();
        let resolved = body.translate(push);
        assert!(!resolved.overlaps(&wall));
        assert_eq!(resolved.min_penetration(&wall), None);
    }

    #[test]
    fn test_contains() {
        let b = aabb(0, 0, 10, 10);
        assert!(b.contains(Vec2i::new(-10, -10)));
        assert!(!b.contains(Vec2i::new(10, 0)));
    }
}
