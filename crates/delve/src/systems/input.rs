//! # Tile Interaction
//!
//! Turns a primary-trigger pointer event into one tile type cycle:
//!
//! 1. the camera turns the screen point into a ray
//! 2. the ray caster resolves the ray to a tile entity
//! 3. the tile advances to the next type in cycle order
//! 4. the tile and its neighbors are marked dirty
//!
//! Camera and ray caster are collaborator seams. [`crate::physics`] ships a
//! top-down camera and a grid ray caster over the tile colliders.

use delve_core::{EntityId, MapTile, TileType, World};

use crate::dirty::mark_dirty_neighborhood;
use crate::map::TileMapSnapshot;

/// A world-space ray.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    /// Start point.
    pub origin: [f32; 3],
    /// Direction; need not be normalized.
    pub direction: [f32; 3],
}

impl Ray {
    /// Creates a ray.
    #[must_use]
    pub const fn new(origin: [f32; 3], direction: [f32; 3]) -> Self {
        Self { origin, direction }
    }
}

/// Maps screen positions to world rays.
pub trait ScreenCamera {
    /// The ray through `screen` (pixels, origin top-left).
    fn screen_point_to_ray(&self, screen: [f32; 2]) -> Ray;
}

/// Resolves rays against the collision layer.
pub trait RayCaster {
    /// The first tile hit within `max_distance`, if any.
    fn cast_ray(&self, world: &World, ray: &Ray, max_distance: f32) -> Option<EntityId>;
}

/// Primary trigger pressed at a screen position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerEvent {
    /// Screen position in pixels.
    pub screen: [f32; 2],
}

/// Outcome of a successful interaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileChange {
    /// The cycled tile.
    pub tile: EntityId,
    /// Its grid position.
    pub position: [i32; 2],
    /// Type before the cycle.
    pub from: TileType,
    /// Type after the cycle.
    pub to: TileType,
    /// Tiles marked dirty.
    pub marked: usize,
}

/// Advances `tile` to the next type and marks the `(2r+1)²` block around it
/// dirty. Returns `None` if `tile` is not a live tile.
pub fn cycle_tile(
    world: &mut World,
    snapshot: &TileMapSnapshot,
    tile: EntityId,
    radius: i32,
) -> Option<TileChange> {
    let data = world.get_component_mut::<MapTile>(tile)?;
    let from = data.tile_type();
    let to = from.next();
    data.set_tile_type(to);
    let position = data.position;

    let marked = mark_dirty_neighborhood(world, snapshot, position[0], position[1], radius);
    Some(TileChange {
        tile,
        position,
        from,
        to,
        marked,
    })
}

/// Pointer-to-tile interaction handler.
pub struct TileInteraction<C, R> {
    camera: C,
    caster: R,
    max_distance: f32,
    radius: i32,
}

impl<C: ScreenCamera, R: RayCaster> TileInteraction<C, R> {
    /// Creates a handler casting rays up to `max_distance` and dirtying a
    /// block of `radius` around the hit tile.
    #[must_use]
    pub fn new(camera: C, caster: R, max_distance: f32, radius: i32) -> Self {
        Self {
            camera,
            caster,
            max_distance,
            radius,
        }
    }

    /// The camera.
    pub fn camera(&self) -> &C {
        &self.camera
    }

    /// Mutable access to the camera, e.g. to pan it.
    pub fn camera_mut(&mut self) -> &mut C {
        &mut self.camera
    }

    /// Handles one trigger event. Returns `None` when the ray hits nothing.
    pub fn handle(
        &self,
        world: &mut World,
        snapshot: &TileMapSnapshot,
        event: PointerEvent,
    ) -> Option<TileChange> {
        let ray = self.camera.screen_point_to_ray(event.screen);
        let tile = self.caster.cast_ray(world, &ray, self.max_distance)?;
        let change = cycle_tile(world, snapshot, tile, self.radius)?;
        tracing::debug!(
            %tile,
            x = change.position[0],
            y = change.position[1],
            from = %change.from,
            to = %change.to,
            "tile cycled"
        );
        Some(change)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::create_map;
    use delve_core::UpdateTileView;

    struct FixedCamera;

    impl ScreenCamera for FixedCamera {
        fn screen_point_to_ray(&self, screen: [f32; 2]) -> Ray {
            Ray::new([screen[0], 10.0, screen[1]], [0.0, -1.0, 0.0])
        }
    }

    /// Picks the tile under the ray origin.
    struct GridPick(TileMapSnapshot);

    impl RayCaster for GridPick {
        fn cast_ray(&self, _: &World, ray: &Ray, _: f32) -> Option<EntityId> {
            self.0
                .lookup(ray.origin[0].floor() as i32, ray.origin[2].floor() as i32)
        }
    }

    #[test]
    fn test_cycle_visits_every_type() {
        let mut world = World::new(16);
        let map = create_map(&mut world, 1, 1, |_, _| TileType::Empty, |_, _| 0).unwrap();
        let tile = map.lookup(0, 0).unwrap();

        let mut seen = Vec::new();
        for _ in 0..TileType::COUNT {
            seen.push(cycle_tile(&mut world, &map, tile, 1).unwrap().to);
        }
        assert_eq!(
            seen,
            vec![
                TileType::Water,
                TileType::Earth,
                TileType::Stone,
                TileType::Gold,
                TileType::Gems,
                TileType::Tile,
                TileType::Wall,
                TileType::Empty,
            ]
        );
    }

    #[test]
    fn test_interaction_marks_neighborhood() {
        let mut world = World::new(32);
        let map = create_map(&mut world, 4, 4, |_, _| TileType::Earth, |_, _| 0).unwrap();
        for &tile in map.tiles() {
            world.remove_tag::<UpdateTileView>(tile);
        }

        let handler = TileInteraction::new(FixedCamera, GridPick(map.clone()), 100.0, 1);
        let change = handler
            .handle(&mut world, &map, PointerEvent { screen: [0.5, 3.5] })
            .unwrap();

        assert_eq!(change.position, [0, 3]);
        assert_eq!((change.from, change.to), (TileType::Earth, TileType::Stone));
        assert_eq!(change.marked, 4);
        assert!(world.has_tag::<UpdateTileView>(map.lookup(1, 2).unwrap()));
        assert!(!world.has_tag::<UpdateTileView>(map.lookup(2, 2).unwrap()));

        let miss = handler.handle(&mut world, &map, PointerEvent { screen: [9.0, 9.0] });
        assert!(miss.is_none());
    }
}
