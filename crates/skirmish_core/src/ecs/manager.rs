//! # Entity Manager
//!
//! Owns every entity, its components and its group memberships.
//!
//! ## Lifecycle
//!
//! ```text
//! create_entity ──► alive ──destroy──► pending ──refresh──► free slot
//!                     │                   │
//!                  attach            get() still works,
//!                                    is_alive() == false
//! ```
//!
//! Destruction is split in two so that code running later in the same tick
//! never observes a half-removed entity or a slot that was already handed to
//! someone else. `refresh` is the single reclamation point.
//!
//! ## Queries
//!
//! A [`Query`] is a bitset of required kinds. Registering it with
//! [`EntityManager::query`] creates a member list that is kept up to date as
//! components are attached, so later lookups do not scan the slot table.

use std::any::type_name;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use super::bitset::Bitset;
use super::entity::{EntityId, EntityRecord};
use super::group::{Group, GroupMask};
use super::kind::{Component, KindSet, TypeRegistry, DEFAULT_MAX_COMPONENT_KINDS};
use super::storage::ComponentStore;
use crate::error::{CoreError, CoreResult};

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Entity manager settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Maximum number of distinct component kinds (1-64).
    pub max_component_kinds: usize,
    /// Number of entity slots reserved up front.
    pub initial_capacity: usize,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            max_component_kinds: DEFAULT_MAX_COMPONENT_KINDS,
            initial_capacity: 1024,
        }
    }
}

impl ManagerConfig {
    /// Checks the configuration before any state is built from it.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidCapacity`] if `max_component_kinds` is
    /// zero or wider than [`Bitset::BITS`].
    pub fn validate(&self) -> CoreResult<()> {
        if self.max_component_kinds == 0 || self.max_component_kinds > Bitset::BITS {
            warn!(
                max_component_kinds = self.max_component_kinds,
                "rejected manager configuration"
            );
            return Err(CoreError::InvalidCapacity {
                requested: self.max_component_kinds,
                max: Bitset::BITS,
            });
        }
        Ok(())
    }
}

// ============================================================================
// QUERIES
// ============================================================================

/// An immutable set of required component kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Query {
    bits: Bitset,
}

impl Query {
    /// Creates a query from a raw bitset.
    ///
    /// Queries built this way are not indexed until passed through
    /// [`EntityManager::query_bits`].
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: Bitset) -> Self {
        Self { bits }
    }

    /// Returns the required kinds.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> Bitset {
        self.bits
    }

    /// Checks whether an entity bitset satisfies this query.
    #[inline]
    #[must_use]
    pub const fn matches(self, entity: Bitset) -> bool {
        entity.is_superset_of(self.bits)
    }
}

/// Iterator over the live entities matching a query.
pub struct Matches<'a> {
    records: &'a [EntityRecord],
    source: MatchSource<'a>,
}

enum MatchSource<'a> {
    /// Members of an indexed query. May contain pending entities.
    Indexed(std::slice::Iter<'a, EntityId>),
    /// Full slot scan for an unindexed query.
    Scan {
        slots: std::slice::Iter<'a, EntityRecord>,
        bits: Bitset,
    },
}

impl Iterator for Matches<'_> {
    type Item = EntityId;

    fn next(&mut self) -> Option<EntityId> {
        let records = self.records;
        match &mut self.source {
            MatchSource::Indexed(ids) => ids
                .find(|id| records[id.index() as usize].is_live(**id))
                .copied(),
            MatchSource::Scan { slots, bits } => slots
                .find(|record| record.alive && record.components.is_superset_of(*bits))
                .map(|record| record.id),
        }
    }
}

// ============================================================================
// BUNDLES
// ============================================================================

/// A set of component values attached together by [`EntityManager::spawn`].
pub trait Bundle: 'static {
    /// Attaches every value to `id`, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Propagates the first [`EntityManager::attach`] error.
    fn attach_all(self, manager: &mut EntityManager, id: EntityId) -> CoreResult<()>;
}

impl<K: Component> Bundle for K {
    fn attach_all(self, manager: &mut EntityManager, id: EntityId) -> CoreResult<()> {
        manager.attach(id, self)
    }
}

macro_rules! impl_bundle {
    ($(($kind:ident, $value:ident)),+) => {
        impl<$($kind: Component),+> Bundle for ($($kind,)+) {
            fn attach_all(self, manager: &mut EntityManager, id: EntityId) -> CoreResult<()> {
                let ($($value,)+) = self;
                $(manager.attach(id, $value)?;)+
                Ok(())
            }
        }
    };
}

impl_bundle!((A, a));
impl_bundle!((A, a), (B, b));
impl_bundle!((A, a), (B, b), (C, c));
impl_bundle!((A, a), (B, b), (C, c), (D, d));
impl_bundle!((A, a), (B, b), (C, c), (D, d), (E, e));
impl_bundle!((A, a), (B, b), (C, c), (D, d), (E, e), (F, f));
impl_bundle!((A, a), (B, b), (C, c), (D, d), (E, e), (F, f), (G, g));
impl_bundle!((A, a), (B, b), (C, c), (D, d), (E, e), (F, f), (G, g), (H, h));

// ============================================================================
// MANAGER
// ============================================================================

/// Owns all entities and answers component and group queries.
///
/// # Example
///
/// ```rust
/// use skirmish_core::{Component, EntityManager};
///
/// struct Health(f32);
/// impl Component for Health {}
///
/// let mut manager = EntityManager::default();
/// let query = manager.query::<Health>().unwrap();
///
/// let id = manager.spawn(Health(10.0)).unwrap();
/// assert_eq!(manager.get_entities(&query).collect::<Vec<_>>(), vec![id]);
///
/// manager.destroy(id);
/// assert!(!manager.is_alive(id));
/// assert_eq!(manager.get_entities(&query).count(), 0);
/// ```
pub struct EntityManager {
    registry: TypeRegistry,
    /// Slot table, indexed by `EntityId::index`.
    records: Vec<EntityRecord>,
    /// Reclaimed slots ready for reuse.
    free_slots: Vec<u32>,
    /// Destroyed this tick, reclaimed by `refresh`.
    pending: Vec<EntityId>,
    store: ComponentStore,
    /// Indexed query bitset -> members in the order they started matching.
    queries: HashMap<Bitset, Vec<EntityId>>,
    /// Group index -> members in the order they joined.
    groups: Vec<Vec<EntityId>>,
    alive_count: usize,
}

impl EntityManager {
    /// Creates a manager from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidCapacity`] for an invalid kind limit.
    pub fn new(config: &ManagerConfig) -> CoreResult<Self> {
        config.validate()?;
        let registry = TypeRegistry::with_capacity(config.max_component_kinds)?;
        let mut manager = Self::with_registry(registry);
        manager.records.reserve(config.initial_capacity);
        Ok(manager)
    }

    /// Creates a manager around an existing registry.
    ///
    /// Kinds already known to the registry keep their bit indices.
    #[must_use]
    pub fn with_registry(registry: TypeRegistry) -> Self {
        debug!(capacity = registry.capacity(), "Creating EntityManager");
        Self {
            registry,
            records: Vec::new(),
            free_slots: Vec::new(),
            pending: Vec::new(),
            store: ComponentStore::new(),
            queries: HashMap::new(),
            groups: vec![Vec::new(); Group::COUNT],
            alive_count: 0,
        }
    }

    /// Returns the kind registry.
    #[inline]
    #[must_use]
    pub const fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Registers a kind with this manager's registry.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::TooManyComponentKinds`] when the registry is full.
    pub fn register<K: Component>(&mut self) -> CoreResult<u8> {
        self.registry.register::<K>()
    }

    /// Number of live entities.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.alive_count
    }

    /// Checks if no entity is alive.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.alive_count == 0
    }

    /// Number of stored component values, pending entities included.
    #[inline]
    #[must_use]
    pub const fn component_count(&self) -> usize {
        self.store.len()
    }

    /// Number of destroyed entities waiting for [`refresh`](Self::refresh).
    #[inline]
    #[must_use]
    pub fn pending_reclaim(&self) -> usize {
        self.pending.len()
    }

    /// Slot record whose generation matches `id`, alive or pending.
    fn record(&self, id: EntityId) -> Option<&EntityRecord> {
        if id.is_null() {
            return None;
        }
        self.records
            .get(id.index() as usize)
            .filter(|record| record.id == id)
    }

    fn live_record_mut(&mut self, id: EntityId) -> Option<&mut EntityRecord> {
        if id.is_null() {
            return None;
        }
        self.records
            .get_mut(id.index() as usize)
            .filter(|record| record.is_live(id))
    }

    // ========================================================================
    // CREATION
    // ========================================================================

    /// Creates an entity with no components.
    ///
    /// Reclaimed slots are reused first; their generation was already bumped
    /// when they were reclaimed.
    pub fn create_entity(&mut self) -> EntityId {
        let id = if let Some(index) = self.free_slots.pop() {
            let record = &mut self.records[index as usize];
            record.revive();
            record.id
        } else {
            let id = EntityId::new(self.records.len() as u32, 0);
            self.records.push(EntityRecord::new(id));
            id
        };
        self.alive_count += 1;

        // The empty query matches everything
        for (bits, members) in &mut self.queries {
            if bits.is_empty() {
                members.push(id);
            }
        }

        trace!(%id, "Created entity");
        id
    }

    /// Creates an entity and attaches a bundle of components.
    ///
    /// # Errors
    ///
    /// Propagates the first attach error. The fresh entity is destroyed
    /// before returning so no partially built entity stays visible.
    pub fn spawn<B: Bundle>(&mut self, bundle: B) -> CoreResult<EntityId> {
        let id = self.create_entity();
        if let Err(err) = bundle.attach_all(self, id) {
            self.destroy(id);
            return Err(err);
        }
        Ok(id)
    }

    /// Attaches a component to a live entity.
    ///
    /// # Errors
    ///
    /// - [`CoreError::StaleEntity`] if `id` is not alive
    /// - [`CoreError::DuplicateComponent`] if the entity already carries `K`;
    ///   the original value is kept
    /// - [`CoreError::TooManyComponentKinds`] if `K` is new and does not fit
    pub fn attach<K: Component>(&mut self, id: EntityId, value: K) -> CoreResult<()> {
        if !self.is_alive(id) {
            return Err(CoreError::StaleEntity(id));
        }
        let bit = self.registry.register::<K>()?;
        let slot = id.index() as usize;

        let before = self.records[slot].components;
        if before.contains(bit) {
            return Err(CoreError::DuplicateComponent {
                entity: id,
                kind: type_name::<K>(),
            });
        }
        if self.store.insert(bit, slot, value).is_err() {
            return Err(CoreError::KindMismatch {
                bit,
                kind: type_name::<K>(),
            });
        }

        let after = before.with(bit);
        self.records[slot].components = after;

        for (bits, members) in &mut self.queries {
            if after.is_superset_of(*bits) && !before.is_superset_of(*bits) {
                members.push(id);
            }
        }
        Ok(())
    }

    // ========================================================================
    // COMPONENT ACCESS
    // ========================================================================

    /// Gets a component.
    ///
    /// Entities destroyed this tick still answer until the next
    /// [`refresh`](Self::refresh).
    #[must_use]
    pub fn get<K: Component>(&self, id: EntityId) -> Option<&K> {
        self.record(id)?;
        let bit = self.registry.bit_index_of::<K>()?;
        self.store.get(bit, id.index() as usize)
    }

    /// Gets a component mutably. The entity must be alive.
    pub fn get_mut<K: Component>(&mut self, id: EntityId) -> Option<&mut K> {
        if !self.is_alive(id) {
            return None;
        }
        let bit = self.registry.bit_index_of::<K>()?;
        self.store.get_mut(bit, id.index() as usize)
    }

    /// Checks whether the entity carries kind `K`.
    #[must_use]
    pub fn has<K: Component>(&self, id: EntityId) -> bool {
        match (self.record(id), self.registry.bit_index_of::<K>()) {
            (Some(record), Some(bit)) => record.components.contains(bit),
            _ => false,
        }
    }

    /// Returns the kinds an entity carries.
    #[must_use]
    pub fn bitset(&self, id: EntityId) -> Option<Bitset> {
        self.record(id).map(|record| record.components)
    }

    /// Checks whether a live entity satisfies a query.
    #[must_use]
    pub fn matches(&self, id: EntityId, query: &Query) -> bool {
        self.record(id)
            .is_some_and(|record| record.alive && query.matches(record.components))
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    /// Builds the query for a kind set and starts indexing it.
    ///
    /// Unknown kinds are registered. Calling this again for the same set is
    /// a cache hit.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::TooManyComponentKinds`] if the set does not fit.
    pub fn query<S: KindSet>(&mut self) -> CoreResult<Query> {
        let bits = self.registry.build_bitset::<S>()?;
        Ok(self.query_bits(bits))
    }

    /// Starts indexing a raw bitset query.
    pub fn query_bits(&mut self, bits: Bitset) -> Query {
        let records = &self.records;
        self.queries.entry(bits).or_insert_with(|| {
            trace!(bits = bits.bits(), "Indexing query");
            records
                .iter()
                .filter(|record| record.alive && record.components.is_superset_of(bits))
                .map(|record| record.id)
                .collect()
        });
        Query::from_bits(bits)
    }

    /// Returns the live entities matching a query.
    ///
    /// Entities destroyed earlier in the tick are excluded. Indexed queries
    /// yield members in the order they started matching; unindexed queries
    /// scan in slot order.
    #[must_use]
    pub fn get_entities(&self, query: &Query) -> Matches<'_> {
        let source = match self.queries.get(&query.bits) {
            Some(members) => MatchSource::Indexed(members.iter()),
            None => MatchSource::Scan {
                slots: self.records.iter(),
                bits: query.bits,
            },
        };
        Matches {
            records: &self.records,
            source,
        }
    }

    /// Collects the live entities carrying every kind of `S`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::TooManyComponentKinds`] if the set does not fit.
    pub fn entities_with<S: KindSet>(&mut self) -> CoreResult<Vec<EntityId>> {
        let query = self.query::<S>()?;
        Ok(self.get_entities(&query).collect())
    }

    /// Iterates over every live entity in slot order.
    pub fn iter(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.records
            .iter()
            .filter(|record| record.alive)
            .map(|record| record.id)
    }

    // ========================================================================
    // GROUPS
    // ========================================================================

    /// Adds a live entity to groups. Returns `false` for a stale handle.
    pub fn add_groups(&mut self, id: EntityId, mask: GroupMask) -> bool {
        let Some(record) = self.live_record_mut(id) else {
            return false;
        };
        let mut added = mask;
        added.remove(record.groups);
        record.groups.insert(mask);

        for group in added.iter() {
            self.groups[group.index() as usize].push(id);
        }
        true
    }

    /// Removes a live entity from groups. Returns `false` for a stale handle.
    pub fn remove_groups(&mut self, id: EntityId, mask: GroupMask) -> bool {
        let Some(record) = self.live_record_mut(id) else {
            return false;
        };
        let removed = GroupMask::from_bits(record.groups.bits() & mask.bits());
        record.groups.remove(mask);

        for group in removed.iter() {
            self.groups[group.index() as usize].retain(|member| *member != id);
        }
        true
    }

    /// Returns the groups an entity belongs to.
    #[must_use]
    pub fn groups(&self, id: EntityId) -> Option<GroupMask> {
        self.record(id).map(|record| record.groups)
    }

    /// Iterates over the live members of a group, in joining order.
    pub fn get_entities_in_group(&self, group: Group) -> impl Iterator<Item = EntityId> + '_ {
        self.groups[group.index() as usize]
            .iter()
            .copied()
            .filter(|id| self.is_alive(*id))
    }

    /// Checks if a group has at least one live member.
    #[must_use]
    pub fn has_entity(&self, group: Group) -> bool {
        self.first_in_group(group).is_some()
    }

    /// Returns the earliest live member of a group.
    #[must_use]
    pub fn first_in_group(&self, group: Group) -> Option<EntityId> {
        self.get_entities_in_group(group).next()
    }

    // ========================================================================
    // DRAW PRIORITY
    // ========================================================================

    /// Sets the draw ordering hint. Returns `false` for a stale handle.
    pub fn set_draw_priority(&mut self, id: EntityId, priority: i32) -> bool {
        match self.live_record_mut(id) {
            Some(record) => {
                record.draw_priority = priority;
                true
            }
            None => false,
        }
    }

    /// Returns the draw ordering hint.
    #[must_use]
    pub fn draw_priority(&self, id: EntityId) -> Option<i32> {
        self.record(id).map(|record| record.draw_priority)
    }

    /// Returns live entities sorted by descending draw priority.
    ///
    /// Ties keep slot order.
    #[must_use]
    pub fn entities_by_draw_priority(&self) -> Vec<EntityId> {
        let mut ordered: Vec<&EntityRecord> = self
            .records
            .iter()
            .filter(|record| record.alive)
            .collect();
        ordered.sort_by_key(|record| std::cmp::Reverse(record.draw_priority));
        ordered.into_iter().map(|record| record.id).collect()
    }

    // ========================================================================
    // LIFECYCLE
    // ========================================================================

    /// Checks if an entity is alive.
    ///
    /// O(1): one bounds check and one generation compare.
    #[inline]
    #[must_use]
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.record(id).is_some_and(|record| record.alive)
    }

    /// Destroys an entity.
    ///
    /// The entity stops being alive immediately. Its components and slot are
    /// reclaimed by the next [`refresh`](Self::refresh).
    ///
    /// # Returns
    ///
    /// `false` if the entity was already dead or the handle is stale.
    pub fn destroy(&mut self, id: EntityId) -> bool {
        let Some(record) = self.live_record_mut(id) else {
            return false;
        };
        record.alive = false;
        self.alive_count -= 1;
        self.pending.push(id);
        trace!(%id, "Destroyed entity");
        true
    }

    /// Reclaims every entity destroyed since the last call.
    ///
    /// Components are dropped, index memberships are removed and each slot's
    /// generation is bumped before it is freed. Returns how many entities were
    /// reclaimed.
    pub fn refresh(&mut self) -> usize {
        if self.pending.is_empty() {
            return 0;
        }

        let mut reclaimed = 0;
        for id in std::mem::take(&mut self.pending) {
            let slot = id.index() as usize;
            let record = &mut self.records[slot];
            if record.id != id || record.alive {
                continue;
            }
            self.store.remove_all(slot, record.components);
            record.reclaim();
            self.free_slots.push(id.index());
            reclaimed += 1;
        }

        let records = &self.records;
        let current = |member: &EntityId| records[member.index() as usize].id == *member;
        for members in self.queries.values_mut() {
            members.retain(current);
        }
        for members in &mut self.groups {
            members.retain(current);
        }

        debug!(reclaimed, alive = self.alive_count, "Refreshed entities");
        reclaimed
    }

    /// Destroys and reclaims every entity at once.
    ///
    /// Every outstanding handle goes stale. Registered kinds and indexed
    /// queries are kept.
    pub fn clear(&mut self) {
        for record in &mut self.records {
            let occupied = record.alive || !record.components.is_empty();
            let pending = self.pending.contains(&record.id);
            if occupied || pending {
                record.reclaim();
            }
        }
        self.pending.clear();
        self.store.clear();
        for members in self.queries.values_mut() {
            members.clear();
        }
        for members in &mut self.groups {
            members.clear();
        }
        self.free_slots = (0..self.records.len() as u32).rev().collect();
        self.alive_count = 0;
        debug!(slots = self.records.len(), "Cleared EntityManager");
    }
}

impl Default for EntityManager {
    fn default() -> Self {
        Self::with_registry(TypeRegistry::new())
    }
}
