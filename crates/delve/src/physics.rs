//! # Tile Picking
//!
//! A minimal collision layer for pointer interaction, built from the tile
//! colliders alone:
//!
//! - box colliders fill the cell `[x, x+1) x [0, 1) x [y, y+1)`
//! - quad colliders fill the cell one layer below, `[-1, 0)`
//! - tiles without a collider are not pickable
//!
//! Rays are marched cell by cell with a DDA (Digital Differential Analyzer).
//! Grid `y` maps onto world `z`.

use delve_core::{ColliderShape, EntityId, PhysicsCollider, World};

use crate::map::TileMapSnapshot;
use crate::systems::{Ray, RayCaster, ScreenCamera};

/// Lowest cell layer a ray is marched through.
const FLOOR_LAYER: i32 = -1;

/// Result of a raycast against the tile colliders.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RaycastHit {
    /// The tile that was hit.
    pub tile: EntityId,
    /// The cell that was hit, `(x, layer, z)`.
    pub cell: [i32; 3],
    /// The face normal of the hit (-1, 0, or 1 for each axis).
    pub normal: [i32; 3],
    /// Distance from ray origin to hit point.
    pub distance: f32,
}

/// DDA ray caster over the tile map's colliders.
#[derive(Clone, Debug)]
pub struct TileRayCaster {
    snapshot: TileMapSnapshot,
}

impl TileRayCaster {
    /// Creates a caster for the tiles in `snapshot`.
    #[must_use]
    pub const fn new(snapshot: TileMapSnapshot) -> Self {
        Self { snapshot }
    }

    /// The tile whose collider occupies cell `(x, layer, z)`.
    fn occupant(&self, world: &World, cell: [i32; 3]) -> Option<EntityId> {
        let tile = self.snapshot.lookup(cell[0], cell[2])?;
        let collider = world.get_component::<PhysicsCollider>(tile)?;
        let layer = match collider.asset.shape() {
            ColliderShape::Box => 0,
            ColliderShape::Quad => FLOOR_LAYER,
        };
        (layer == cell[1]).then_some(tile)
    }

    /// Marches `ray` through the grid and returns the first occupied cell.
    #[must_use]
    pub fn raycast(&self, world: &World, ray: &Ray, max_distance: f32) -> Option<RaycastHit> {
        let origin = ray.origin;
        let direction = ray.direction;

        // Normalize direction
        let len = (direction[0].powi(2) + direction[1].powi(2) + direction[2].powi(2)).sqrt();
        if len < 0.0001 {
            return None;
        }
        let dir = [direction[0] / len, direction[1] / len, direction[2] / len];

        let mut cell = [
            origin[0].floor() as i32,
            origin[1].floor() as i32,
            origin[2].floor() as i32,
        ];

        let step = dir.map(|d| if d >= 0.0 { 1 } else { -1 });

        // Distance between cell boundaries along each axis
        let t_delta = dir.map(|d| if d.abs() < 0.0001 { f32::MAX } else { (1.0 / d).abs() });

        // Distance to the first boundary along each axis
        let mut t_max = [0usize, 1, 2].map(|axis| {
            let d = dir[axis];
            if d.abs() < 0.0001 {
                f32::MAX
            } else if d > 0.0 {
                ((cell[axis] + 1) as f32 - origin[axis]) / d
            } else {
                (cell[axis] as f32 - origin[axis]) / d
            }
        });

        let mut distance = 0.0;
        let mut last_normal = [0, 0, 0];

        while distance <= max_distance {
            if let Some(tile) = self.occupant(world, cell) {
                return Some(RaycastHit {
                    tile,
                    cell,
                    normal: last_normal,
                    distance,
                });
            }

            // Below the floor layer nothing can be hit any more
            if cell[1] < FLOOR_LAYER && step[1] < 0 {
                return None;
            }

            if t_max[0] < t_max[1] && t_max[0] < t_max[2] {
                distance = t_max[0];
                t_max[0] += t_delta[0];
                cell[0] += step[0];
                last_normal = [-step[0], 0, 0];
            } else if t_max[1] < t_max[2] {
                distance = t_max[1];
                t_max[1] += t_delta[1];
                cell[1] += step[1];
                last_normal = [0, -step[1], 0];
            } else {
                distance = t_max[2];
                t_max[2] += t_delta[2];
                cell[2] += step[2];
                last_normal = [0, 0, -step[2]];
            }
        }

        None
    }
}

impl RayCaster for TileRayCaster {
    fn cast_ray(&self, world: &World, ray: &Ray, max_distance: f32) -> Option<EntityId> {
        self.raycast(world, ray, max_distance).map(|hit| hit.tile)
    }
}

/// Orthographic camera looking straight down at the map.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TopDownCamera {
    /// World `(x, z)` under the viewport center.
    pub center: [f32; 2],
    /// Height of the ray origins above the map.
    pub height: f32,
    /// Screen pixels per tile.
    pub pixels_per_tile: f32,
    /// Viewport size in pixels.
    pub viewport: [f32; 2],
}

impl TopDownCamera {
    /// A camera centered on a `width x height` map that fits it into
    /// `viewport`.
    #[must_use]
    pub fn framing(width: i32, height: i32, viewport: [f32; 2]) -> Self {
        let fit = (viewport[0] / width.max(1) as f32).min(viewport[1] / height.max(1) as f32);
        Self {
            center: [width as f32 * 0.5, height as f32 * 0.5],
            height: 10.0,
            pixels_per_tile: fit.max(1.0),
            viewport,
        }
    }

    /// World `(x, z)` under screen point `screen`. Screen y grows downwards,
    /// world z grows to the north.
    #[must_use]
    pub fn screen_to_ground(&self, screen: [f32; 2]) -> [f32; 2] {
        [
            self.center[0] + (screen[0] - self.viewport[0] * 0.5) / self.pixels_per_tile,
            self.center[1] - (screen[1] - self.viewport[1] * 0.5) / self.pixels_per_tile,
        ]
    }
}

impl ScreenCamera for TopDownCamera {
    fn screen_point_to_ray(&self, screen: [f32; 2]) -> Ray {
        let ground = self.screen_to_ground(screen);
        Ray::new([ground[0], self.height, ground[1]], [0.0, -1.0, 0.0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::create_map;
    use delve_core::{ColliderAsset, TileType};

    fn world_with_colliders() -> (World, TileMapSnapshot) {
        let mut world = World::new(16);
        let map = create_map(
            &mut world,
            3,
            1,
            |x, _| if x == 1 { TileType::Stone } else { TileType::Empty },
            |_, _| 0,
        )
        .unwrap();
        for x in 0..2 {
            let tile = map.lookup(x, 0).unwrap();
            let shape = if x == 1 { ColliderShape::Box } else { ColliderShape::Quad };
            world.insert(tile, PhysicsCollider { asset: ColliderAsset::new(0, shape) });
        }
        (world, map)
    }

    #[test]
    fn test_ray_from_above_hits_box_top() {
        let (world, map) = world_with_colliders();
        let caster = TileRayCaster::new(map.clone());

        let ray = Ray::new([1.5, 10.0, 0.5], [0.0, -1.0, 0.0]);
        let hit = caster.raycast(&world, &ray, 100.0).unwrap();
        assert_eq!(hit.tile, map.lookup(1, 0).unwrap());
        assert_eq!(hit.cell, [1, 0, 0]);
        assert_eq!(hit.normal, [0, 1, 0]); // Hit from above
    }

    #[test]
    fn test_ray_hits_floor_layer() {
        let (world, map) = world_with_colliders();
        let caster = TileRayCaster::new(map.clone());

        let ray = Ray::new([0.5, 10.0, 0.5], [0.0, -1.0, 0.0]);
        let hit = caster.raycast(&world, &ray, 100.0).unwrap();
        assert_eq!(hit.tile, map.lookup(0, 0).unwrap());
        assert_eq!(hit.cell[1], FLOOR_LAYER);
    }

    #[test]
    fn test_ray_misses() {
        let (world, map) = world_with_colliders();
        let caster = TileRayCaster::new(map);

        // No collider on (2, 0)
        let down = Ray::new([2.5, 10.0, 0.5], [0.0, -1.0, 0.0]);
        assert!(caster.cast_ray(&world, &down, 100.0).is_none());
        // Too short
        let short = Ray::new([1.5, 10.0, 0.5], [0.0, -1.0, 0.0]);
        assert!(caster.cast_ray(&world, &short, 5.0).is_none());
        // Degenerate direction
        let zero = Ray::new([1.5, 10.0, 0.5], [0.0, 0.0, 0.0]);
        assert!(caster.cast_ray(&world, &zero, 100.0).is_none());
    }

    #[test]
    fn test_top_down_camera_mapping() {
        let camera = TopDownCamera::framing(4, 2, [400.0, 200.0]);
        assert_eq!(camera.pixels_per_tile, 100.0);
        assert_eq!(camera.screen_to_ground([200.0, 100.0]), [2.0, 1.0]);
        // Top-left pixel is the north-west corner
        assert_eq!(camera.screen_to_ground([0.0, 0.0]), [0.0, 2.0]);

        let ray = camera.screen_point_to_ray([50.0, 150.0]);
        assert_eq!(ray.origin, [0.5, 10.0, 0.5]);
        assert_eq!(ray.direction, [0.0, -1.0, 0.0]);
    }
}
