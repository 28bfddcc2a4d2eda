//! # Groups
//!
//! Coarse categories ("enemy", "projectile", "solid wall") used both for
//! manager-level group lookups and for body collision filtering.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use bytemuck::{Pod, Zeroable};

/// A single group index (0-63).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Group(u8);

impl Group {
    /// Number of distinct groups.
    pub const COUNT: usize = 64;

    /// Creates a group.
    ///
    /// # Panics
    ///
    /// Panics if `index >= 64`. Group tables are declared as constants, so
    /// this fires at setup, not mid-frame.
    #[must_use]
    pub const fn new(index: u8) -> Self {
        assert!((index as usize) < Self::COUNT, "group index out of range");
        Self(index)
    }

    /// Returns the group index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u8 {
        self.0
    }

    /// Returns a mask holding only this group.
    #[inline]
    #[must_use]
    pub const fn mask(self) -> GroupMask {
        GroupMask(1 << self.0)
    }
}

/// A set of groups.
///
/// On a body, the *group* mask says what the body is and the *check* mask
/// says what it looks for. Checking is directional.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(transparent)]
pub struct GroupMask(u64);

impl GroupMask {
    /// No groups.
    pub const NONE: Self = Self(0);
    /// Every group.
    pub const ALL: Self = Self(u64::MAX);

    /// Creates a mask from raw bits.
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    /// Creates a mask from a list of groups.
    #[must_use]
    pub fn of(groups: &[Group]) -> Self {
        groups.iter().fold(Self::NONE, |mask, group| mask.with(*group))
    }

    /// Returns the raw bits.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Returns a copy with `group` added.
    #[inline]
    #[must_use]
    pub const fn with(self, group: Group) -> Self {
        Self(self.0 | group.mask().0)
    }

    /// Adds every group of `other`.
    #[inline]
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// Removes every group of `other`.
    #[inline]
    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    /// Checks if `group` is in the mask.
    #[inline]
    #[must_use]
    pub const fn contains(self, group: Group) -> bool {
        self.0 & group.mask().0 != 0
    }

    /// Checks if the two masks share at least one group.
    #[inline]
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Checks if no group is set.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterates over the groups in the mask, lowest index first.
    pub fn iter(self) -> impl Iterator<Item = Group> {
        (0..Group::COUNT as u8).filter(move |i| self.0 & (1 << i) != 0).map(Group)
    }
}

impl fmt::Debug for GroupMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GroupMask({:#b})", self.0)
    }
}

impl From<Group> for GroupMask {
    fn from(group: Group) -> Self {
        group.mask()
    }
}

impl BitOr for Group {
    type Output = GroupMask;

    fn bitor(self, rhs: Self) -> GroupMask {
        self.mask().with(rhs)
    }
}

impl BitOr<Group> for GroupMask {
    type Output = Self;

    fn bitor(self, rhs: Group) -> Self {
        self.with(rhs)
    }
}

impl BitOr for GroupMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign<Group> for GroupMask {
    fn bitor_assign(&mut self, rhs: Group) {
        self.0 |= rhs.mask().0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOLID: Group = Group::new(0);
    const ENEMY: Group = Group::new(3);
    const PROJECTILE: Group = Group::new(63);

    #[test]
    fn test_mask_ops() {
        let mut mask = SOLID | ENEMY;
        assert!(mask.contains(SOLID));
        assert!(!mask.contains(PROJECTILE));

        mask |= PROJECTILE;
        assert!(mask.intersects(PROJECTILE.mask()));

        mask.remove(SOLID.mask());
        assert_eq!(mask.iter().collect::<Vec<_>>(), vec![ENEMY, PROJECTILE]);
    }

    #[test]
    fn test_none_never_intersects() {
        assert!(!GroupMask::NONE.intersects(GroupMask::ALL));
        assert!(GroupMask::of(&[]).is_empty());
    }
}
