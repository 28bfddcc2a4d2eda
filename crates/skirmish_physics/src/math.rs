//! # Vector Math
//!
//! Positions live in integer world coordinates so that grid bucketing and
//! overlap tests are exact. Pixel space is a float view of the same values,
//! scaled down by `units_per_pixel`.

use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

use bytemuck::{Pod, Zeroable};

/// Integer 2D vector in world coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(C)]
pub struct Vec2i {
    /// X coordinate.
    pub x: i32,
    /// Y coordinate (grows downwards).
    pub y: i32,
}

impl Vec2i {
    /// The origin.
    pub const ZERO: Self = Self::new(0, 0);

    /// Creates a new vector.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns the squared length, widened so it cannot overflow.
    #[inline]
    #[must_use]
    pub const fn length_squared(self) -> i64 {
        let x = self.x as i64;
        let y = self.y as i64;
        x * x + y * y
    }

    /// Returns the squared distance to another point.
    #[inline]
    #[must_use]
    pub fn distance_squared(self, other: Self) -> i64 {
        let dx = i64::from(self.x) - i64::from(other.x);
        let dy = i64::from(self.y) - i64::from(other.y);
        dx * dx + dy * dy
    }

    /// Converts world coordinates to pixels.
    #[inline]
    #[must_use]
    pub fn to_pixels(self, units_per_pixel: i32) -> Vec2f {
        let scale = units_per_pixel as f32;
        Vec2f::new(self.x as f32 / scale, self.y as f32 / scale)
    }

    /// Converts pixels to world coordinates, rounding to the nearest unit.
    #[inline]
    #[must_use]
    pub fn from_pixels(pixels: Vec2f, units_per_pixel: i32) -> Self {
        let scale = units_per_pixel as f32;
        Self::new(
            (pixels.x * scale).round() as i32,
            (pixels.y * scale).round() as i32,
        )
    }
}

impl fmt::Display for Vec2i {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl Add for Vec2i {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2i {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2i {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Vec2i {
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Neg for Vec2i {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

impl Mul<i32> for Vec2i {
    type Output = Self;

    fn mul(self, rhs: i32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

/// Float 2D vector, used for velocities and pixel positions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Vec2f {
    /// X component.
    pub x: f32,
    /// Y component.
    pub y: f32,
}

impl Vec2f {
    /// The zero vector.
    pub const ZERO: Self = Self::new(0.0, 0.0);

    /// Creates a new vector.
    #[inline]
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns the length.
    #[inline]
    #[must_use]
    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }

    /// Checks if both components are exactly zero.
    #[inline]
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    /// Splits off the whole part, truncating towards zero.
    ///
    /// Returns the whole part and the fractional remainder.
    #[inline]
    #[must_use]
    pub fn split_whole(self) -> (Vec2i, Self) {
        let whole = Vec2i::new(self.x.trunc() as i32, self.y.trunc() as i32);
        (whole, Self::new(self.x - whole.x as f32, self.y - whole.y as f32))
    }
}

impl From<Vec2i> for Vec2f {
    fn from(v: Vec2i) -> Self {
        Self::new(v.x as f32, v.y as f32)
    }
}

impl Add for Vec2f {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2f {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2f {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2f {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}
