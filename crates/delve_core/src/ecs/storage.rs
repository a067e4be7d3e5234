//! # Component Storage
//!
//! Pre-allocated, dense component storage indexed by entity slot.
//!
//! - All component slots are pre-allocated at world creation
//! - Access is O(1) via entity index
//! - Presence is tracked by the entity's component mask, not here

use super::component::Component;

/// Pre-allocated storage for a single component type.
///
/// A slot holds a meaningful value only while the owning entity's mask has
/// the component bit set; otherwise it holds `C::default()`.
pub struct ComponentStorage<C: Component> {
    /// The dense array of components.
    data: Box<[C]>,
}

impl<C: Component> ComponentStorage<C> {
    /// Creates new component storage with the specified capacity.
    ///
    /// # Panics
    ///
    /// Panics if capacity is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than zero");

        Self {
            data: vec![C::default(); capacity].into_boxed_slice(),
        }
    }

    /// Returns the capacity of this storage.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Gets a component by entity index, or `None` if out of bounds.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&C> {
        self.data.get(index)
    }

    /// Gets a mutable component by entity index, or `None` if out of bounds.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut C> {
        self.data.get_mut(index)
    }

    /// Overwrites the slot at `index`.
    ///
    /// Returns `false` if index was out of bounds.
    #[inline]
    pub fn set(&mut self, index: usize, component: C) -> bool {
        if let Some(slot) = self.data.get_mut(index) {
            *slot = component;
            true
        } else {
            false
        }
    }

    /// Overwrites the slot at `index`, returning the previous value.
    #[inline]
    pub fn replace(&mut self, index: usize, component: C) -> Option<C> {
        self.data
            .get_mut(index)
            .map(|slot| std::mem::replace(slot, component))
    }

    /// Returns a slice of all components.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[C] {
        &self.data
    }

    /// Resets a component slot to its default value.
    #[inline]
    pub fn reset(&mut self, index: usize) {
        if let Some(slot) = self.data.get_mut(index) {
            *slot = C::default();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::component::{MapTile, Translation};
    use crate::ecs::tile_type::TileType;

    #[test]
    fn test_storage_creation() {
        let storage: ComponentStorage<Translation> = ComponentStorage::new(1000);
        assert_eq!(storage.capacity(), 1000);
    }

    #[test]
    fn test_storage_get_set() {
        let mut storage: ComponentStorage<Translation> = ComponentStorage::new(100);

        let pos = Translation::new(1.0, 2.0, 3.0);
        assert!(storage.set(50, pos));
        assert_eq!(storage.get(50), Some(&pos));
        assert!(!storage.set(100, pos));
    }

    #[test]
    fn test_storage_replace_and_reset() {
        let mut storage: ComponentStorage<MapTile> = ComponentStorage::new(4);
        storage.set(1, MapTile::new(TileType::Earth, 0, 1, 0));

        let old = storage.replace(1, MapTile::new(TileType::Empty, 0, 1, 0));
        assert_eq!(old.map(|t| t.tile_type()), Some(TileType::Earth));

        storage.reset(1);
        assert_eq!(storage.get(1), Some(&MapTile::default()));
        assert!(storage.replace(4, MapTile::default()).is_none());
    }
}
