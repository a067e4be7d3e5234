//! # Dirty Propagation
//!
//! A tile is dirty while it carries the [`UpdateTileView`] tag. Anything
//! that changes a tile's type marks it (and usually its neighbors) dirty;
//! only the view pass clears the tag, through its barrier.
//!
//! Marking is idempotent: the tag is a presence bit, not a counter.

use delve_core::{
    mask_of, CommandResult, CommandWriter, Component, DirtyTracker, EntityId, MapTile, Tag,
    UpdateTileView, World,
};

use crate::map::TileMapSnapshot;

/// Component mask of a dirty tile.
pub const DIRTY_TILE_MASK: u64 = mask_of(UpdateTileView::ID) | mask_of(MapTile::ID);

/// Marks `entity` dirty. Returns `false` if it is not alive.
#[inline]
pub fn mark_dirty(world: &mut World, entity: EntityId) -> bool {
    world.add_tag::<UpdateTileView>(entity)
}

/// Marks the `(2r+1)²` block around `(x, y)` dirty, clipped to the map.
/// Returns the number of tiles marked.
///
/// Any non-negative radius is accepted; the block never extends past the grid.
pub fn mark_dirty_neighborhood(
    world: &mut World,
    snapshot: &TileMapSnapshot,
    x: i32,
    y: i32,
    radius: i32,
) -> usize {
    let radius = radius.max(0);
    let rows =
        y.saturating_sub(radius).max(0)..=y.saturating_add(radius).min(snapshot.height() - 1);
    let columns =
        x.saturating_sub(radius).max(0)..=x.saturating_add(radius).min(snapshot.width() - 1);
    let mut marked = 0;
    for ny in rows {
        for nx in columns.clone() {
            if let Some(entity) = snapshot.lookup(nx, ny) {
                marked += usize::from(mark_dirty(world, entity));
            }
        }
    }
    marked
}

/// Records a deferred dirty mark, for producers running as jobs.
///
/// # Errors
///
/// Fails if the same writer already requested destruction of `entity`.
#[inline]
pub fn mark_dirty_deferred(writer: &mut CommandWriter, entity: EntityId) -> CommandResult<()> {
    writer.add_tag::<UpdateTileView>(entity)
}

/// All dirty tiles, in slot order.
#[must_use]
pub fn dirty_tiles(world: &World) -> Vec<EntityId> {
    world.query(DIRTY_TILE_MASK).collect()
}

/// Bitset snapshot of `tiles` for O(1) membership checks inside jobs.
#[must_use]
pub fn dirty_snapshot(world: &World, tiles: &[EntityId]) -> DirtyTracker {
    DirtyTracker::from_entities(world.capacity(), tiles)
}
