//! # Kind Bitsets
//!
//! Fixed-width bit vectors describing which component kinds an entity
//! carries, or which kinds a query requires.
//!
//! Matching is a single AND + compare:
//!
//! ```text
//! entity:  0b1011_0110
//! query:   0b0010_0100
//! (entity & query) == query  -> match
//! ```

use bytemuck::{Pod, Zeroable};

/// A set of component kind bits.
///
/// The storage is 64 bits wide. How many of those bits may be handed out is
/// decided by the [`TypeRegistry`](super::TypeRegistry) capacity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(transparent)]
pub struct Bitset(u64);

impl Bitset {
    /// Number of bits available.
    pub const BITS: usize = 64;

    /// The empty set. Every entity is a superset of it.
    pub const EMPTY: Self = Self(0);

    /// Creates an empty bitset.
    #[inline]
    #[must_use]
    pub const fn empty() -> Self {
        Self::EMPTY
    }

    /// Creates a bitset from raw bits.
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    /// Creates a bitset with a single bit set.
    ///
    /// # Arguments
    ///
    /// * `bit` - The bit index (0-63)
    #[inline]
    #[must_use]
    pub const fn single(bit: u8) -> Self {
        debug_assert!((bit as usize) < Self::BITS, "bit index out of range");
        Self(1 << bit)
    }

    /// Returns the raw bits.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Returns a copy of this set with `bit` added.
    #[inline]
    #[must_use]
    pub const fn with(self, bit: u8) -> Self {
        Self(self.0 | Self::single(bit).0)
    }

    /// Adds a bit to the set.
    #[inline]
    pub fn set(&mut self, bit: u8) {
        self.0 |= Self::single(bit).0;
    }

    /// Removes a bit from the set.
    #[inline]
    pub fn unset(&mut self, bit: u8) {
        self.0 &= !Self::single(bit).0;
    }

    /// Checks whether a bit is set.
    #[inline]
    #[must_use]
    pub const fn contains(self, bit: u8) -> bool {
        (bit as usize) < Self::BITS && (self.0 >> bit) & 1 == 1
    }

    /// Checks whether every bit of `required` is also set in `self`.
    ///
    /// This is the query matching rule.
    #[inline]
    #[must_use]
    pub const fn is_superset_of(self, required: Self) -> bool {
        (self.0 & required.0) == required.0
    }

    /// Union of two sets.
    #[inline]
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Intersection of two sets.
    #[inline]
    #[must_use]
    pub const fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    /// Number of bits set.
    #[inline]
    #[must_use]
    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// Checks if no bit is set.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterates over the set bit indices in ascending order.
    #[inline]
    #[must_use]
    pub const fn iter(self) -> BitIter {
        BitIter { remaining: self.0 }
    }
}

impl IntoIterator for Bitset {
    type Item = u8;
    type IntoIter = BitIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the set bits of a [`Bitset`].
#[derive(Clone, Debug)]
pub struct BitIter {
    remaining: u64,
}

impl Iterator for BitIter {
    type Item = u8;

    #[inline]
    fn next(&mut self) -> Option<u8> {
        if self.remaining == 0 {
            return None;
        }
        let bit = self.remaining.trailing_zeros() as u8;
        // Clear lowest set bit
        self.remaining &= self.remaining - 1;
        Some(bit)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining.count_ones() as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for BitIter {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_superset_matching() {
        let entity = Bitset::empty().with(1).with(2).with(5);
        assert!(entity.is_superset_of(Bitset::single(2)));
        assert!(entity.is_superset_of(Bitset::single(1).with(5)));
        assert!(!entity.is_superset_of(Bitset::single(3)));
        assert!(entity.is_superset_of(Bitset::EMPTY));
    }

    #[test]
    fn test_set_unset() {
        let mut bits = Bitset::empty();
        bits.set(63);
        assert!(bits.contains(63));
        bits.unset(63);
        assert!(bits.is_empty());
        assert!(!bits.contains(64));
    }

    #[test]
    fn test_iter_ascending() {
        let bits = Bitset::single(9).with(0).with(31);
        assert_eq!(bits.iter().collect::<Vec<_>>(), vec![0, 9, 31]);
        assert_eq!(bits.iter().len(), 3);
        assert_eq!(bits.count(), 3);
    }
}
