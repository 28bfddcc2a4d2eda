//! # Component Kinds
//!
//! Runtime identity and bit assignment for component types.
//!
//! Each component type receives a bit index the first time a registry sees
//! it. Indices are handed out in registration order, are never reused, and
//! stay fixed for the lifetime of the registry. Two registries fed the same
//! registrations in the same order agree on every index; nothing else is
//! promised across binaries.
//!
//! ## Kind sets
//!
//! Queries name a *set* of kinds as a tuple type, e.g. `(Position, Health)`.
//! The bitset for a given tuple type is computed once and memoized.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::sync::OnceLock;

use parking_lot::RwLock;
use tracing::{debug, warn};

use super::bitset::Bitset;
use crate::error::{CoreError, CoreResult};

/// Default number of distinct component kinds a registry accepts.
pub const DEFAULT_MAX_COMPONENT_KINDS: usize = 32;

/// Marker trait for per-entity data.
///
/// Components are plain data. Behaviour lives in systems that query for
/// them, never in the component itself.
///
/// # Example
///
/// ```rust
/// use skirmish_core::Component;
///
/// struct Health {
///     current: f32,
/// }
///
/// impl Component for Health {}
/// ```
pub trait Component: Any {}

/// Registration record for one component kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KindInfo {
    /// Process-stable identity of the Rust type.
    pub identity: TypeId,
    /// Bit index inside [`Bitset`].
    pub bit: u8,
    /// Type name, for diagnostics.
    pub name: &'static str,
}

/// Assigns bit indices to component kinds and memoizes kind-set bitsets.
///
/// The counter is an owned field: independent registries number
/// independently. Use [`global`] when a single process-wide numbering is
/// wanted.
#[derive(Debug)]
pub struct TypeRegistry {
    /// Identity -> registration.
    kinds: HashMap<TypeId, KindInfo>,
    /// Registrations ordered by bit index.
    by_bit: Vec<KindInfo>,
    /// Maximum number of kinds.
    capacity: usize,
    /// Kind-set tuple identity -> bitset.
    set_cache: HashMap<TypeId, Bitset>,
}

impl TypeRegistry {
    /// Creates a registry with [`DEFAULT_MAX_COMPONENT_KINDS`] capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::build(DEFAULT_MAX_COMPONENT_KINDS)
    }

    /// Creates a registry accepting at most `capacity` kinds.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidCapacity`] if `capacity` is zero or wider
    /// than [`Bitset::BITS`].
    pub fn with_capacity(capacity: usize) -> CoreResult<Self> {
        if capacity == 0 || capacity > Bitset::BITS {
            warn!(capacity, "rejected component kind capacity");
            return Err(CoreError::InvalidCapacity {
                requested: capacity,
                max: Bitset::BITS,
            });
        }
        Ok(Self::build(capacity))
    }

    fn build(capacity: usize) -> Self {
        debug!(capacity, "Creating TypeRegistry");
        Self {
            kinds: HashMap::new(),
            by_bit: Vec::with_capacity(capacity),
            capacity,
            set_cache: HashMap::new(),
        }
    }

    /// Maximum number of kinds this registry accepts.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of registered kinds.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_bit.len()
    }

    /// Checks if nothing has been registered yet.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_bit.is_empty()
    }

    /// Returns the process-stable identity of a kind.
    ///
    /// Identity does not depend on registration; the bit index does.
    #[inline]
    #[must_use]
    pub fn identity_of<K: Component>() -> TypeId {
        TypeId::of::<K>()
    }

    /// Registers a kind, returning its bit index.
    ///
    /// Registering an already known kind returns the index it was given the
    /// first time.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::TooManyComponentKinds`] when the registry is full.
    /// The registry is left unchanged.
    pub fn register<K: Component>(&mut self) -> CoreResult<u8> {
        self.register_raw(TypeId::of::<K>(), type_name::<K>())
    }

    fn register_raw(&mut self, identity: TypeId, name: &'static str) -> CoreResult<u8> {
        if let Some(info) = self.kinds.get(&identity) {
            return Ok(info.bit);
        }

        let next = self.by_bit.len();
        if next >= self.capacity {
            warn!(kind = name, capacity = self.capacity, "component kind limit reached");
            return Err(CoreError::TooManyComponentKinds {
                capacity: self.capacity,
                kind: name,
            });
        }

        let info = KindInfo {
            identity,
            bit: next as u8,
            name,
        };
        self.kinds.insert(identity, info);
        self.by_bit.push(info);

        debug!(kind = name, bit = info.bit, "Registered component kind");
        Ok(info.bit)
    }

    /// Returns the bit index of a kind, if registered.
    #[inline]
    #[must_use]
    pub fn bit_index_of<K: Component>(&self) -> Option<u8> {
        self.kinds.get(&TypeId::of::<K>()).map(|info| info.bit)
    }

    /// Returns the registration record of a kind, if registered.
    #[must_use]
    pub fn info_of<K: Component>(&self) -> Option<&KindInfo> {
        self.kinds.get(&TypeId::of::<K>())
    }

    /// Returns the registration record owning a bit index.
    #[must_use]
    pub fn info_by_bit(&self, bit: u8) -> Option<&KindInfo> {
        self.by_bit.get(bit as usize)
    }

    /// Builds the bitset for a kind set, registering unknown members.
    ///
    /// The result is memoized per kind-set type: after the first call the
    /// lookup is a single hash probe.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::TooManyComponentKinds`] if the unknown members do
    /// not all fit. Nothing is registered in that case.
    pub fn build_bitset<S: KindSet>(&mut self) -> CoreResult<Bitset> {
        let key = TypeId::of::<S>();
        if let Some(bits) = self.set_cache.get(&key) {
            return Ok(*bits);
        }

        let kinds = S::kinds();

        let mut unknown: Vec<(TypeId, &'static str)> = Vec::new();
        for &(identity, name) in &kinds {
            if !self.kinds.contains_key(&identity) && !unknown.iter().any(|(id, _)| *id == identity) {
                unknown.push((identity, name));
            }
        }
        if self.by_bit.len() + unknown.len() > self.capacity {
            let (_, name) = unknown[self.capacity - self.by_bit.len()];
            warn!(kind = name, capacity = self.capacity, "kind set does not fit registry");
            return Err(CoreError::TooManyComponentKinds {
                capacity: self.capacity,
                kind: name,
            });
        }

        let mut bits = Bitset::empty();
        for (identity, name) in kinds {
            bits.set(self.register_raw(identity, name)?);
        }

        self.set_cache.insert(key, bits);
        Ok(bits)
    }

    /// Returns a previously built kind-set bitset without building it.
    #[must_use]
    pub fn cached_bitset<S: KindSet>(&self) -> Option<Bitset> {
        self.set_cache.get(&TypeId::of::<S>()).copied()
    }

    /// Iterates over registrations in bit order.
    pub fn iter(&self) -> impl Iterator<Item = &KindInfo> {
        self.by_bit.iter()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// KIND SETS
// ============================================================================

/// A compile-time set of component kinds, written as a component type or a
/// tuple of component types.
pub trait KindSet: 'static {
    /// Identity and name of every member, in declaration order.
    fn kinds() -> Vec<(TypeId, &'static str)>;
}

impl<K: Component> KindSet for K {
    fn kinds() -> Vec<(TypeId, &'static str)> {
        vec![(TypeId::of::<K>(), type_name::<K>())]
    }
}

macro_rules! impl_kind_set {
    ($($kind:ident),+) => {
        impl<$($kind: Component),+> KindSet for ($($kind,)+) {
            fn kinds() -> Vec<(TypeId, &'static str)> {
                vec![$((TypeId::of::<$kind>(), type_name::<$kind>())),+]
            }
        }
    };
}

impl_kind_set!(A);
impl_kind_set!(A, B);
impl_kind_set!(A, B, C);
impl_kind_set!(A, B, C, D);
impl_kind_set!(A, B, C, D, E);
impl_kind_set!(A, B, C, D, E, F);
impl_kind_set!(A, B, C, D, E, F, G);
impl_kind_set!(A, B, C, D, E, F, G, H);

// ============================================================================
// PROCESS-WIDE REGISTRY
// ============================================================================

static GLOBAL_REGISTRY: OnceLock<RwLock<TypeRegistry>> = OnceLock::new();

/// Returns the process-wide registry.
///
/// Initialized on first access. Most code should prefer the registry owned
/// by an [`EntityManager`](super::EntityManager); this one exists for tools
/// that must agree on bit numbering without sharing a manager.
pub fn global() -> &'static RwLock<TypeRegistry> {
    GLOBAL_REGISTRY.get_or_init(|| RwLock::new(TypeRegistry::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Position;
    impl Component for Position {}

    struct Velocity;
    impl Component for Velocity {}

    struct Health;
    impl Component for Health {}

    #[test]
    fn test_registration_order_assigns_bits() {
        let mut registry = TypeRegistry::new();
        assert_eq!(registry.register::<Velocity>().unwrap(), 0);
        assert_eq!(registry.register::<Position>().unwrap(), 1);
        assert_eq!(registry.bit_index_of::<Velocity>(), Some(0));
        assert_eq!(registry.bit_index_of::<Health>(), None);
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut registry = TypeRegistry::new();
        let first = registry.register::<Health>().unwrap();
        registry.register::<Position>().unwrap();
        assert_eq!(registry.register::<Health>().unwrap(), first);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_independent_registries() {
        let mut a = TypeRegistry::new();
        let mut b = TypeRegistry::new();
        a.register::<Position>().unwrap();
        a.register::<Health>().unwrap();
        b.register::<Health>().unwrap();
        assert_eq!(a.bit_index_of::<Health>(), Some(1));
        assert_eq!(b.bit_index_of::<Health>(), Some(0));
    }

    #[test]
    fn test_capacity_limit() {
        let mut registry = TypeRegistry::with_capacity(2).unwrap();
        registry.register::<Position>().unwrap();
        registry.register::<Velocity>().unwrap();
        let err = registry.register::<Health>().unwrap_err();
        assert!(matches!(err, CoreError::TooManyComponentKinds { capacity: 2, .. }));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_invalid_capacity() {
        assert!(TypeRegistry::with_capacity(0).is_err());
        assert!(TypeRegistry::with_capacity(65).is_err());
        assert!(TypeRegistry::with_capacity(64).is_ok());
    }

    #[test]
    fn test_build_bitset_memoized() {
        let mut registry = TypeRegistry::new();
        assert!(registry.cached_bitset::<(Position, Health)>().is_none());

        let bits = registry.build_bitset::<(Position, Health)>().unwrap();
        assert_eq!(bits, Bitset::single(0).with(1));
        assert_eq!(registry.cached_bitset::<(Position, Health)>(), Some(bits));

        // Same kinds in another order is another key with the same bits
        let swapped = registry.build_bitset::<(Health, Position)>().unwrap();
        assert_eq!(swapped, bits);
    }

    #[test]
    fn test_kind_set_all_or_nothing() {
        let mut registry = TypeRegistry::with_capacity(2).unwrap();
        registry.register::<Position>().unwrap();
        assert!(registry.build_bitset::<(Velocity, Health)>().is_err());
        // Velocity must not have been half-registered
        assert_eq!(registry.bit_index_of::<Velocity>(), None);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_global_registry_is_shared() {
        struct GlobalOnly;
        impl Component for GlobalOnly {}

        let bit = global().write().register::<GlobalOnly>().unwrap();
        assert_eq!(global().read().bit_index_of::<GlobalOnly>(), Some(bit));
    }
}
