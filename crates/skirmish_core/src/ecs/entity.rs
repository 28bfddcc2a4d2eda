//! # Entity Management
//!
//! Entities are lightweight identifiers consisting of:
//! - An index into the slot table
//! - A generation counter for safe reuse
//!
//! The generation doubles as the liveness token handed to collaborators
//! that cache a reference across frames (targeting, pressure plates). A
//! handle whose generation no longer matches its slot is simply not alive.

use std::fmt;

use super::bitset::Bitset;
use super::group::GroupMask;

/// Unique identifier for an entity.
///
/// The ID is split into two parts:
/// - Lower 32 bits: Slot index
/// - Upper 32 bits: Generation counter for detecting stale references
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct EntityId(u64);

impl EntityId {
    /// Null/invalid entity ID. Never alive.
    pub const NULL: Self = Self(u64::MAX);

    /// Creates a new entity ID from index and generation.
    ///
    /// # Arguments
    ///
    /// * `index` - The slot index (0 to 2^32-1)
    /// * `generation` - The generation counter (0 to 2^32-1)
    #[inline]
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self(((generation as u64) << 32) | (index as u64))
    }

    /// Returns the index portion of the entity ID.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0 as u32
    }

    /// Returns the generation portion of the entity ID.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Checks if this entity ID is null/invalid.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == u64::MAX
    }

    /// Returns the raw packed value.
    #[inline]
    #[must_use]
    pub const fn to_bits(self) -> u64 {
        self.0
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            f.write_str("entity(null)")
        } else {
            write!(f, "entity({}v{})", self.index(), self.generation())
        }
    }
}

/// One row of the entity slot table.
///
/// It tracks which components are attached via a bitset.
#[derive(Clone, Copy, Debug)]
pub struct EntityRecord {
    /// Current occupant (or, for a free slot, the id the next occupant gets).
    pub id: EntityId,
    /// Kinds attached to this entity.
    pub components: Bitset,
    /// Groups this entity belongs to.
    pub groups: GroupMask,
    /// Draw ordering hint; higher values draw first.
    pub draw_priority: i32,
    /// Whether this entity slot is currently alive.
    pub alive: bool,
}

impl EntityRecord {
    /// Creates a live record for a fresh slot.
    #[inline]
    #[must_use]
    pub const fn new(id: EntityId) -> Self {
        Self {
            id,
            components: Bitset::EMPTY,
            groups: GroupMask::NONE,
            draw_priority: 0,
            alive: true,
        }
    }

    /// Checks whether `id` names the live occupant of this slot.
    #[inline]
    #[must_use]
    pub fn is_live(&self, id: EntityId) -> bool {
        self.alive && self.id == id
    }

    /// Clears the slot and advances its generation.
    ///
    /// Every handle issued for the previous occupant stops comparing equal.
    pub(crate) fn reclaim(&mut self) {
        let next = self.id.generation().wrapping_add(1);
        *self = Self::new(EntityId::new(self.id.index(), next));
        self.alive = false;
    }

    /// Marks a reclaimed slot live again under its current id.
    pub(crate) fn revive(&mut self) {
        self.alive = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_roundtrip() {
        let id = EntityId::new(12345, 67890);
        assert_eq!(id.index(), 12345);
        assert_eq!(id.generation(), 67890);
        assert!(!id.is_null());
        assert!(EntityId::default().is_null());
    }

    #[test]
    fn test_reclaim_bumps_generation() {
        let id = EntityId::new(7, 3);
        let mut record = EntityRecord::new(id);
        record.components.set(4);
        assert!(record.is_live(id));

        record.reclaim();
        assert!(!record.alive);
        assert!(record.components.is_empty());
        assert_eq!(record.id, EntityId::new(7, 4));
        assert!(!record.is_live(id));

        record.revive();
        assert!(record.is_live(EntityId::new(7, 4)));
        assert!(!record.is_live(id));
    }

    #[test]
    fn test_display() {
        assert_eq!(EntityId::new(2, 9).to_string(), "entity(2v9)");
        assert_eq!(EntityId::NULL.to_string(), "entity(null)");
    }
}
