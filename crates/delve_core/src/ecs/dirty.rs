//! # Dirty Tracking
//!
//! Compact bitset over entity slot indices. The authoritative dirty state of
//! a tile is its `UpdateTileView` tag; a [`DirtyTracker`] is the frame-scoped
//! snapshot of those tags that parallel jobs consult for O(1) membership
//! ("is my parent tile dirty?") without touching the world's entity table.
//!
//! - Mark dirty: O(1)
//! - Membership: O(1)

use super::entity::EntityId;

/// Dirty tracking bitset, 64 slots per word.
#[derive(Clone, Debug)]
pub struct DirtyTracker {
    /// Bitset: 1 = dirty, 0 = clean.
    bits: Vec<u64>,
    /// Capacity in slots.
    capacity: usize,
    /// Cached count of dirty slots.
    dirty_count: usize,
}

impl DirtyTracker {
    /// Creates an empty tracker for `capacity` slots.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            bits: vec![0u64; capacity.div_ceil(64)],
            capacity,
            dirty_count: 0,
        }
    }

    /// Builds a tracker with the slots of `entities` marked.
    #[must_use]
    pub fn from_entities(capacity: usize, entities: &[EntityId]) -> Self {
        let mut tracker = Self::new(capacity);
        for entity in entities {
            tracker.mark_dirty(entity.index() as usize);
        }
        tracker
    }

    /// Marks a slot index as dirty. Marking twice is the same as once.
    ///
    /// Out-of-range indices are ignored.
    #[inline]
    pub fn mark_dirty(&mut self, index: usize) {
        if index >= self.capacity {
            return;
        }
        let mask = 1u64 << (index % 64);
        let word = &mut self.bits[index / 64];
        if *word & mask == 0 {
            *word |= mask;
            self.dirty_count += 1;
        }
    }

    /// Checks if a slot is dirty.
    #[inline]
    #[must_use]
    pub fn is_dirty(&self, index: usize) -> bool {
        if index >= self.capacity {
            return false;
        }
        (self.bits[index / 64] >> (index % 64)) & 1 == 1
    }

    /// Checks if the slot of `entity` is dirty.
    #[inline]
    #[must_use]
    pub fn contains(&self, entity: EntityId) -> bool {
        !entity.is_null() && self.is_dirty(entity.index() as usize)
    }

    /// Returns the number of dirty slots.
    #[inline]
    #[must_use]
    pub fn dirty_count(&self) -> usize {
        self.dirty_count
    }
}
