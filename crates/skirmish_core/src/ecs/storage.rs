//! # Component Storage
//!
//! Heterogeneous per-kind columns indexed by entity slot.
//!
//! The store keeps one column per kind bit:
//! - Columns are type-erased so one store holds every kind
//! - Access is O(1): bit -> column, slot -> value
//! - A slot's values are owned by that slot only; nothing is shared
//!
//! ```text
//! bit 0 (Position): [Some(p0), None,     Some(p2), ...]
//! bit 1 (Health):   [None,     Some(h1), Some(h2), ...]
//! ```

use std::any::Any;

use super::bitset::Bitset;
use super::kind::Component;

/// Object-safe face of a typed column.
trait ErasedColumn {
    /// Drops the value at `slot`. Returns whether one was present.
    fn remove(&mut self, slot: usize) -> bool;
    /// Drops every value.
    fn clear(&mut self);
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Dense column for a single component kind.
struct Column<C> {
    slots: Vec<Option<C>>,
}

impl<C: Component> Column<C> {
    fn new() -> Self {
        Self { slots: Vec::new() }
    }

    fn slot_mut(&mut self, slot: usize) -> &mut Option<C> {
        if slot >= self.slots.len() {
            self.slots.resize_with(slot + 1, || None);
        }
        &mut self.slots[slot]
    }
}

impl<C: Component> ErasedColumn for Column<C> {
    fn remove(&mut self, slot: usize) -> bool {
        self.slots.get_mut(slot).and_then(Option::take).is_some()
    }

    fn clear(&mut self) {
        self.slots.clear();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Owns every component instance of every entity.
///
/// The store knows nothing about liveness; the
/// [`EntityManager`](super::EntityManager) decides which slots are valid.
#[derive(Default)]
pub struct ComponentStore {
    /// Indexed by kind bit.
    columns: Vec<Option<Box<dyn ErasedColumn>>>,
    /// Number of stored values across all columns.
    len: usize,
}

impl ComponentStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored component values.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Checks if no component is stored.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn column<C: Component>(&self, bit: u8) -> Option<&Column<C>> {
        self.columns
            .get(bit as usize)?
            .as_ref()?
            .as_any()
            .downcast_ref::<Column<C>>()
    }

    fn column_mut<C: Component>(&mut self, bit: u8) -> Option<&mut Column<C>> {
        self.columns
            .get_mut(bit as usize)?
            .as_mut()?
            .as_any_mut()
            .downcast_mut::<Column<C>>()
    }

    /// Stores a value for `slot` under kind `bit`.
    ///
    /// Returns the previous value, if any. If the bit is already bound to a
    /// different Rust type the value is handed back unstored.
    ///
    /// # Errors
    ///
    /// Returns `Err(value)` on a type mismatch for `bit`.
    pub fn insert<C: Component>(&mut self, bit: u8, slot: usize, value: C) -> Result<Option<C>, C> {
        let index = bit as usize;
        if index >= self.columns.len() {
            self.columns.resize_with(index + 1, || None);
        }
        let entry = &mut self.columns[index];
        if entry.is_none() {
            *entry = Some(Box::new(Column::<C>::new()));
        }

        let Some(column) = self.column_mut::<C>(bit) else {
            return Err(value);
        };
        let previous = column.slot_mut(slot).replace(value);
        if previous.is_none() {
            self.len += 1;
        }
        Ok(previous)
    }

    /// Gets the value of kind `bit` stored for `slot`.
    #[inline]
    #[must_use]
    pub fn get<C: Component>(&self, bit: u8, slot: usize) -> Option<&C> {
        self.column::<C>(bit)?.slots.get(slot)?.as_ref()
    }

    /// Gets the value of kind `bit` stored for `slot`, mutably.
    #[inline]
    pub fn get_mut<C: Component>(&mut self, bit: u8, slot: usize) -> Option<&mut C> {
        self.column_mut::<C>(bit)?.slots.get_mut(slot)?.as_mut()
    }

    /// Drops the value of kind `bit` stored for `slot`.
    pub fn remove(&mut self, bit: u8, slot: usize) -> bool {
        let removed = self
            .columns
            .get_mut(bit as usize)
            .and_then(Option::as_mut)
            .is_some_and(|column| column.remove(slot));
        if removed {
            self.len -= 1;
        }
        removed
    }

    /// Drops every value of `slot` whose kind bit is in `bits`.
    ///
    /// Returns how many values were dropped.
    pub fn remove_all(&mut self, slot: usize, bits: Bitset) -> usize {
        bits.iter().filter(|bit| self.remove(*bit, slot)).count()
    }

    /// Drops every stored value. Columns stay allocated.
    pub fn clear(&mut self) {
        for column in self.columns.iter_mut().flatten() {
            column.clear();
        }
        self.len = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Health(f32);
    impl Component for Health {}

    #[derive(Debug, PartialEq)]
    struct Name(String);
    impl Component for Name {}

    #[test]
    fn test_insert_get() {
        let mut store = ComponentStore::new();
        assert_eq!(store.insert(0, 5, Health(10.0)), Ok(None));
        assert_eq!(store.insert(3, 5, Name("wall".into())), Ok(None));

        assert_eq!(store.get::<Health>(0, 5), Some(&Health(10.0)));
        assert_eq!(store.get::<Name>(3, 5).map(|n| n.0.as_str()), Some("wall"));
        assert!(store.get::<Health>(0, 4).is_none());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_type_mismatch_is_rejected() {
        let mut store = ComponentStore::new();
        store.insert(0, 0, Health(1.0)).unwrap();
        assert_eq!(store.insert(0, 1, Name("x".into())), Err(Name("x".into())));
        assert!(store.get::<Name>(0, 0).is_none());
    }

    #[test]
    fn test_remove_all() {
        let mut store = ComponentStore::new();
        store.insert(0, 2, Health(1.0)).unwrap();
        store.insert(1, 2, Name("a".into())).unwrap();
        store.insert(0, 3, Health(2.0)).unwrap();

        let bits = Bitset::single(0).with(1);
        assert_eq!(store.remove_all(2, bits), 2);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get::<Health>(0, 3), Some(&Health(2.0)));
    }

    #[test]
    fn test_get_mut_and_clear() {
        let mut store = ComponentStore::new();
        store.insert(0, 0, Health(5.0)).unwrap();
        store.get_mut::<Health>(0, 0).unwrap().0 -= 2.0;
        assert_eq!(store.get::<Health>(0, 0), Some(&Health(3.0)));

        store.clear();
        assert!(store.is_empty());
        assert!(store.get::<Health>(0, 0).is_none());
    }
}
