//! # Tile Registry
//!
//! Builds the tile population once at world load and hands out a
//! [`TileMapSnapshot`]: a shared, read-only table from `x + y * width` to
//! the tile entity. The snapshot never changes after creation, so jobs read
//! it without any locking.

use std::sync::Arc;

use delve_core::{EntityId, MapTile, Translation, UpdateTileView, World};

use crate::config::Facet;
use crate::error::MapError;

/// Immutable coordinate → entity index. Cloning shares the table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileMapSnapshot {
    tiles: Arc<[EntityId]>,
    width: i32,
    height: i32,
}

impl TileMapSnapshot {
    /// Map width in tiles.
    #[inline]
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Map height in tiles.
    #[inline]
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// Number of tiles.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Whether the map has no tiles. Never true for a created map.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Whether `(x, y)` lies in `[0, width) x [0, height)`.
    #[inline]
    #[must_use]
    pub const fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height
    }

    /// The tile entity at `(x, y)`, or `None` outside the map.
    #[inline]
    #[must_use]
    pub fn lookup(&self, x: i32, y: i32) -> Option<EntityId> {
        if !self.in_bounds(x, y) {
            return None;
        }
        self.tiles.get((x + y * self.width) as usize).copied()
    }

    /// All tile entities in `x + y * width` order.
    #[must_use]
    pub fn tiles(&self) -> &[EntityId] {
        &self.tiles
    }

    /// Map center in grid units.
    #[must_use]
    pub fn center(&self) -> [f32; 2] {
        [self.width as f32 * 0.5, self.height as f32 * 0.5]
    }
}

/// Spawns a `width x height` grid of tiles and returns its snapshot.
///
/// Each tile gets its grid position, the type from `type_fn` promoted by
/// ownership ([`delve_core::TileType::claimed_by`]), the owner from
/// `owner_fn`, a world translation at the cell center and an
/// [`UpdateTileView`] tag so the first frame builds every decoration.
///
/// # Errors
///
/// [`MapError::InvalidDimensions`] for empty maps and
/// [`MapError::CapacityExceeded`] if the world cannot hold every tile.
pub fn create_map<T, O>(
    world: &mut World,
    width: i32,
    height: i32,
    mut type_fn: T,
    mut owner_fn: O,
) -> Result<TileMapSnapshot, MapError>
where
    T: FnMut(i32, i32) -> delve_core::TileType,
    O: FnMut(i32, i32) -> i32,
{
    if width <= 0 || height <= 0 {
        return Err(MapError::InvalidDimensions { width, height });
    }
    let required = width as usize * height as usize;
    if required > world.free_count() {
        return Err(MapError::CapacityExceeded {
            required,
            available: world.free_count(),
        });
    }

    let mut tiles = Vec::with_capacity(required);
    for y in 0..height {
        for x in 0..width {
            let owner = owner_fn(x, y);
            let tile_type = type_fn(x, y).claimed_by(owner);

            let entity = world.spawn();
            world.insert(entity, MapTile::new(tile_type, owner, x, y));
            world.insert(entity, Translation::from_grid(x, y));
            world.add_tag::<UpdateTileView>(entity);
            tiles.push(entity);
        }
    }

    tracing::info!(width, height, tiles = tiles.len(), "tile map created");

    Ok(TileMapSnapshot {
        tiles: tiles.into(),
        width,
        height,
    })
}

/// Solidity of the cell at `(x, y)`. Cells outside the map count as solid.
#[inline]
#[must_use]
pub fn is_solid_tile(world: &World, snapshot: &TileMapSnapshot, x: i32, y: i32) -> bool {
    snapshot.lookup(x, y).map_or(true, |entity| {
        world
            .get_component::<MapTile>(entity)
            .is_some_and(|tile| tile.tile_type().is_solid())
    })
}

/// Solidity of the four neighbors of `(x, y)` in north, east, south, west
/// order.
#[must_use]
pub fn neighbor_solidity(world: &World, snapshot: &TileMapSnapshot, x: i32, y: i32) -> [bool; 4] {
    Facet::SIDES.map(|side| {
        let (dx, dy) = side.offset().unwrap_or_default();
        is_solid_tile(world, snapshot, x + dx, y + dy)
    })
}
