//! # ECS World
//!
//! The central container for all entities and components.
//! Pre-allocates all memory at creation time.

use std::ops::Range;

use super::component::{
    mask_of, Component, LocalToParent, MapTile, MeshRef, Parent, PhysicsCollider, Tag,
    Translation,
};
use super::entity::{ComponentMask, Entity, EntityId};
use super::storage::ComponentStorage;

/// The ECS World - container for all game state.
///
/// All memory is pre-allocated at creation. Spawning and despawning reuse
/// slots; a despawned slot bumps its generation so old handles go stale.
///
/// # Capacity
///
/// The world has a fixed capacity set at creation. Spawning past it returns
/// [`EntityId::NULL`].
///
/// # Example
///
/// ```rust
/// use delve_core::{World, Translation};
///
/// let mut world = World::new(16);
/// let entity = world.spawn();
/// world.insert(entity, Translation::new(1.0, 0.0, 2.0));
/// assert!(world.has::<Translation>(entity));
/// ```
pub struct World {
    /// All entity slots (pre-allocated).
    entities: Box<[Entity]>,
    /// Free list of entity indices for reuse.
    free_indices: Vec<u32>,
    /// Number of currently alive entities.
    alive_count: usize,

    // =========================================================================
    // Component Storages - Add new component types here
    // =========================================================================
    pub(crate) tiles: ComponentStorage<MapTile>,
    pub(crate) translations: ComponentStorage<Translation>,
    pub(crate) parents: ComponentStorage<Parent>,
    pub(crate) local_to_parents: ComponentStorage<LocalToParent>,
    pub(crate) meshes: ComponentStorage<MeshRef>,
    pub(crate) colliders: ComponentStorage<PhysicsCollider>,
}

impl World {
    /// Creates a new world with the specified entity capacity.
    ///
    /// # Panics
    ///
    /// Panics if capacity is zero or exceeds `u32::MAX`.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than zero");
        assert!(
            u32::try_from(capacity).is_ok(),
            "Capacity cannot exceed u32::MAX"
        );

        let entities = vec![Entity::default(); capacity].into_boxed_slice();

        // Reversed so that spawn order hands out ascending indices
        let free_indices: Vec<u32> = (0..capacity as u32).rev().collect();

        Self {
            entities,
            free_indices,
            alive_count: 0,
            tiles: ComponentStorage::new(capacity),
            translations: ComponentStorage::new(capacity),
            parents: ComponentStorage::new(capacity),
            local_to_parents: ComponentStorage::new(capacity),
            meshes: ComponentStorage::new(capacity),
            colliders: ComponentStorage::new(capacity),
        }
    }

    /// Returns the maximum capacity of this world.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.entities.len()
    }

    /// Returns the number of currently alive entities.
    #[inline]
    #[must_use]
    pub const fn alive_count(&self) -> usize {
        self.alive_count
    }

    /// Returns the number of free slots.
    #[inline]
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.free_indices.len()
    }

    /// Spawns a new entity with no components.
    ///
    /// Returns `EntityId::NULL` if capacity is reached.
    #[inline]
    pub fn spawn(&mut self) -> EntityId {
        let Some(index) = self.free_indices.pop() else {
            return EntityId::NULL;
        };

        let entity = &mut self.entities[index as usize];

        // Increment generation to invalidate old references
        let generation = entity.id.generation().wrapping_add(1);
        let new_id = EntityId::new(index, generation);

        *entity = Entity::new(new_id);
        self.alive_count += 1;

        new_id
    }

    /// Despawns an entity, freeing its slot for reuse.
    ///
    /// Returns `false` if the entity was already dead or the ID was stale.
    #[inline]
    pub fn despawn(&mut self, id: EntityId) -> bool {
        if !self.is_alive(id) {
            return false;
        }

        let idx = id.index() as usize;
        let mask = self.entities[idx].component_mask;
        self.entities[idx] = Entity::dead(id);
        self.alive_count -= 1;
        self.free_indices.push(id.index());

        for component_id in 0..64u8 {
            if mask & mask_of(component_id) != 0 {
                self.reset_storage(idx, component_id);
            }
        }

        true
    }

    /// Checks if an entity is alive.
    #[inline]
    #[must_use]
    pub fn is_alive(&self, id: EntityId) -> bool {
        if id.is_null() {
            return false;
        }

        self.entities
            .get(id.index() as usize)
            .is_some_and(|entity| entity.alive && entity.id.generation() == id.generation())
    }

    /// Gets an entity slot by ID, or `None` if dead/stale.
    #[inline]
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        if !self.is_alive(id) {
            return None;
        }
        Some(&self.entities[id.index() as usize])
    }

    /// Checks whether an alive entity carries the component or tag `id`.
    #[inline]
    #[must_use]
    pub fn has_id(&self, entity: EntityId, component_id: u8) -> bool {
        self.get(entity)
            .is_some_and(|slot| slot.has_component(component_id))
    }

    /// Checks whether an alive entity carries component `C`.
    #[inline]
    #[must_use]
    pub fn has<C: Component>(&self, entity: EntityId) -> bool {
        self.has_id(entity, C::ID)
    }

    /// Checks whether an alive entity carries tag `T`.
    #[inline]
    #[must_use]
    pub fn has_tag<T: Tag>(&self, entity: EntityId) -> bool {
        self.has_id(entity, T::ID)
    }

    /// Reads component `C` of an entity.
    #[inline]
    #[must_use]
    pub fn get_component<C: Component>(&self, entity: EntityId) -> Option<&C> {
        if !self.has::<C>(entity) {
            return None;
        }
        C::storage(self).get(entity.index() as usize)
    }

    /// Mutably accesses component `C` of an entity.
    #[inline]
    pub fn get_component_mut<C: Component>(&mut self, entity: EntityId) -> Option<&mut C> {
        if !self.has::<C>(entity) {
            return None;
        }
        C::storage_mut(self).get_mut(entity.index() as usize)
    }

    /// Attaches (or overwrites) component `C`.
    ///
    /// Returns `false` if the entity is dead.
    #[inline]
    pub fn insert<C: Component>(&mut self, entity: EntityId, value: C) -> bool {
        if !self.is_alive(entity) {
            return false;
        }
        let idx = entity.index() as usize;
        C::storage_mut(self).set(idx, value);
        self.entities[idx].add_component(C::ID);
        true
    }

    /// Overwrites component `C` only if it is already attached.
    ///
    /// Returns the previous value, or `None` if the component was missing.
    #[inline]
    pub fn replace<C: Component>(&mut self, entity: EntityId, value: C) -> Option<C> {
        if !self.has::<C>(entity) {
            return None;
        }
        C::storage_mut(self).replace(entity.index() as usize, value)
    }

    /// Detaches component `C`, returning its last value.
    #[inline]
    pub fn remove<C: Component>(&mut self, entity: EntityId) -> Option<C> {
        if !self.has::<C>(entity) {
            return None;
        }
        let idx = entity.index() as usize;
        self.entities[idx].remove_component(C::ID);
        C::storage_mut(self).replace(idx, C::default())
    }

    /// Attaches tag `T`. Idempotent.
    ///
    /// Returns `false` if the entity is dead.
    #[inline]
    pub fn add_tag<T: Tag>(&mut self, entity: EntityId) -> bool {
        self.add_id(entity, T::ID)
    }

    /// Detaches tag `T`. Returns whether it was present.
    #[inline]
    pub fn remove_tag<T: Tag>(&mut self, entity: EntityId) -> bool {
        self.remove_id(entity, T::ID)
    }

    /// Sets the mask bit `component_id` without touching storage.
    ///
    /// Used for tags. Returns `false` if the entity is dead.
    pub fn add_id(&mut self, entity: EntityId, component_id: u8) -> bool {
        if !self.is_alive(entity) {
            return false;
        }
        self.entities[entity.index() as usize].add_component(component_id);
        true
    }

    /// Clears the mask bit `component_id` and resets any backing storage.
    ///
    /// Returns whether the bit was set.
    pub fn remove_id(&mut self, entity: EntityId, component_id: u8) -> bool {
        if !self.has_id(entity, component_id) {
            return false;
        }
        let idx = entity.index() as usize;
        self.entities[idx].remove_component(component_id);
        self.reset_storage(idx, component_id);
        true
    }

    /// Iterates the IDs of all alive entities carrying every bit of `mask`.
    pub fn query(&self, mask: ComponentMask) -> impl Iterator<Item = EntityId> + '_ {
        self.query_range(mask, 0..self.capacity())
    }

    /// Like [`World::query`], restricted to slot indices in `range`.
    ///
    /// Jobs use this to split a scan over the whole slot table into batches.
    pub fn query_range(
        &self,
        mask: ComponentMask,
        range: Range<usize>,
    ) -> impl Iterator<Item = EntityId> + '_ {
        let end = range.end.min(self.entities.len());
        let start = range.start.min(end);
        self.entities[start..end]
            .iter()
            .filter(move |entity| entity.alive && entity.has_all(mask))
            .map(|entity| entity.id)
    }

    /// Counts alive entities carrying every bit of `mask`.
    #[must_use]
    pub fn count(&self, mask: ComponentMask) -> usize {
        self.query(mask).count()
    }

    fn reset_storage(&mut self, idx: usize, component_id: u8) {
        match component_id {
            id if id == MapTile::ID => self.tiles.reset(idx),
            id if id == Translation::ID => self.translations.reset(idx),
            id if id == Parent::ID => self.parents.reset(idx),
            id if id == LocalToParent::ID => self.local_to_parents.reset(idx),
            id if id == MeshRef::ID => self.meshes.reset(idx),
            id if id == PhysicsCollider::ID => self.colliders.reset(idx),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::component::{ColliderAsset, ColliderShape, UpdateTileView, ViewPart};
    use crate::ecs::tile_type::TileType;

    #[test]
    fn test_world_creation() {
        let world = World::new(1000);
        assert_eq!(world.capacity(), 1000);
        assert_eq!(world.alive_count(), 0);
        assert_eq!(world.free_count(), 1000);
    }

    #[test]
    fn test_spawn_despawn() {
        let mut world = World::new(100);

        let id1 = world.spawn();
        assert!(!id1.is_null());
        assert!(world.is_alive(id1));
        assert_eq!(id1.index(), 0);

        let id2 = world.spawn();
        assert_eq!(id2.index(), 1);
        assert_eq!(world.alive_count(), 2);

        assert!(world.despawn(id1));
        assert!(!world.is_alive(id1));
        assert!(!world.despawn(id1));
        assert_eq!(world.alive_count(), 1);

        // Spawn again - should reuse the slot
        let id3 = world.spawn();
        assert_eq!(id3.index(), id1.index());
        assert_ne!(id3.generation(), id1.generation());
        assert!(!world.is_alive(id1));
    }

    #[test]
    fn test_spawn_past_capacity() {
        let mut world = World::new(1);
        assert!(!world.spawn().is_null());
        assert!(world.spawn().is_null());
    }

    #[test]
    fn test_component_lifecycle() {
        let mut world = World::new(4);
        let id = world.spawn();

        assert!(world.get_component::<MapTile>(id).is_none());
        assert!(world
            .replace(id, MapTile::new(TileType::Earth, 0, 0, 0))
            .is_none());

        assert!(world.insert(id, MapTile::new(TileType::Earth, 0, 0, 0)));
        assert_eq!(
            world.get_component::<MapTile>(id).map(MapTile::tile_type),
            Some(TileType::Earth)
        );

        if let Some(tile) = world.get_component_mut::<MapTile>(id) {
            tile.set_tile_type(TileType::Gold);
        }
        let removed = world.remove::<MapTile>(id);
        assert_eq!(removed.map(|t| t.tile_type()), Some(TileType::Gold));
        assert!(!world.has::<MapTile>(id));
    }

    #[test]
    fn test_replace_keeps_component_attached() {
        let mut world = World::new(4);
        let id = world.spawn();
        let floor = ColliderAsset::new(1, ColliderShape::Quad);
        let solid = ColliderAsset::new(2, ColliderShape::Box);

        world.insert(id, PhysicsCollider { asset: solid });
        let old = world.replace(id, PhysicsCollider { asset: floor });

        assert_eq!(old, Some(PhysicsCollider { asset: solid }));
        assert_eq!(
            world.get_component::<PhysicsCollider>(id),
            Some(&PhysicsCollider { asset: floor })
        );
    }

    #[test]
    fn test_tags_and_queries() {
        let mut world = World::new(8);
        let a = world.spawn();
        let b = world.spawn();
        let c = world.spawn();

        world.add_tag::<UpdateTileView>(a);
        world.add_tag::<UpdateTileView>(a);
        world.add_tag::<UpdateTileView>(c);
        world.add_tag::<ViewPart>(c);

        let dirty: Vec<_> = world.query(mask_of(UpdateTileView::ID)).collect();
        assert_eq!(dirty, vec![a, c]);
        assert_eq!(
            world.count(mask_of(UpdateTileView::ID) | mask_of(ViewPart::ID)),
            1
        );
        assert_eq!(world.query_range(mask_of(UpdateTileView::ID), 1..3).count(), 1);

        assert!(world.remove_tag::<UpdateTileView>(a));
        assert!(!world.remove_tag::<UpdateTileView>(a));
        assert!(!world.has_tag::<UpdateTileView>(b));
    }

    #[test]
    fn test_despawn_resets_storage() {
        let mut world = World::new(2);
        let id = world.spawn();
        world.insert(id, Parent { entity: EntityId::new(1, 0) });
        world.despawn(id);

        let reused = world.spawn();
        assert_eq!(reused.index(), id.index());
        assert!(!world.has::<Parent>(reused));
        assert_eq!(Parent::storage(&world).get(0), Some(&Parent::default()));
    }
}
