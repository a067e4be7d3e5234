//! # Tile Collider Regeneration
//!
//! Keeps exactly one collider per tile whose shape matches the tile's
//! solidity. Runs on the same dirty set as the view pass but records into
//! its own barrier, so both passes can run concurrently.
//!
//! - tiles that already carry a collider get its value swapped in place when
//!   the shape is wrong (never remove + add)
//! - tiles without one get the right collider attached
//!
//! The dirty tag is left alone; the view pass owns clearing it.

use std::sync::Arc;

use delve_core::{
    CommandBarrier, CommandResult, CommandWriter, EntityId, JobHandle, JobScheduler, MapTile,
    PhysicsCollider, SharedWorld, World,
};

use crate::config::ColliderAssets;
use crate::dirty::dirty_tiles;
use crate::systems::ScheduledPass;

/// Swaps wrong-shaped colliders by value.
fn record_swaps(
    world: &World,
    assets: ColliderAssets,
    tiles: &[EntityId],
    writer: &mut CommandWriter,
) -> CommandResult<()> {
    for &tile in tiles {
        let (Some(data), Some(collider)) = (
            world.get_component::<MapTile>(tile),
            world.get_component::<PhysicsCollider>(tile),
        ) else {
            continue;
        };
        let expected = assets.for_tile(data.tile_type());
        if collider.asset.shape() != expected.shape() {
            writer.set_component(tile, PhysicsCollider { asset: expected })?;
        }
    }
    Ok(())
}

/// Attaches a collider to tiles that have none.
fn record_attaches(
    world: &World,
    assets: ColliderAssets,
    tiles: &[EntityId],
    writer: &mut CommandWriter,
) -> CommandResult<()> {
    for &tile in tiles {
        let Some(data) = world.get_component::<MapTile>(tile) else {
            continue;
        };
        let asset = assets.for_tile(data.tile_type());
        writer.add_component(tile, PhysicsCollider { asset })?;
    }
    Ok(())
}

/// The collider regeneration pass.
pub struct TileCollisionSystem {
    assets: ColliderAssets,
    batch_size: usize,
}

impl TileCollisionSystem {
    /// Creates the pass. `batch_size` is the number of dirty tiles per job.
    #[must_use]
    pub fn new(assets: ColliderAssets, batch_size: usize) -> Self {
        Self {
            assets,
            batch_size: batch_size.max(1),
        }
    }

    /// The collider pair in use.
    #[must_use]
    pub const fn assets(&self) -> ColliderAssets {
        self.assets
    }

    /// Schedules swap jobs for tiles with a collider and attach jobs for
    /// tiles without one. Returns `None` when no tile is dirty.
    pub fn schedule(
        &self,
        scheduler: &JobScheduler,
        world: &SharedWorld,
        barrier: &CommandBarrier,
        dependencies: &[JobHandle],
    ) -> Option<ScheduledPass> {
        let (with_collider, without_collider): (Vec<_>, Vec<_>) = {
            let world = world.read();
            let split = dirty_tiles(&world)
                .into_iter()
                .partition(|&tile| world.has::<PhysicsCollider>(tile));
            split
        };
        let tiles = with_collider.len() + without_collider.len();
        if tiles == 0 {
            return None;
        }

        let mut handles = Vec::new();
        for (batch, attach) in with_collider
            .chunks(self.batch_size)
            .map(|batch| (batch, false))
            .chain(without_collider.chunks(self.batch_size).map(|batch| (batch, true)))
        {
            let batch = batch.to_vec();
            let mut writer = barrier.create_writer();
            let world = Arc::clone(world);
            let assets = self.assets;
            handles.push(scheduler.schedule(dependencies, move || {
                let world = world.read();
                let result = if attach {
                    record_attaches(&world, assets, &batch, &mut writer)
                } else {
                    record_swaps(&world, assets, &batch, &mut writer)
                };
                if let Err(err) = result {
                    tracing::warn!(error = %err, "collider batch aborted");
                }
            }));
        }

        let jobs = handles.len();
        let handle = scheduler.combine(&handles);
        barrier.add_job_handle_for_producer(handle.clone());

        tracing::debug!(
            swaps = with_collider.len(),
            attaches = without_collider.len(),
            jobs,
            "collider pass scheduled"
        );
        Some(ScheduledPass {
            handle,
            tiles,
            jobs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::create_map;
    use delve_core::{share, ColliderAsset, ColliderShape, TileType};

    fn assets() -> ColliderAssets {
        ColliderAssets::new(
            ColliderAsset::new(1, ColliderShape::Quad),
            ColliderAsset::new(2, ColliderShape::Box),
        )
        .unwrap()
    }

    #[test]
    fn test_attach_then_swap() {
        let mut world = World::new(8);
        let map = create_map(
            &mut world,
            2,
            1,
            |x, _| if x == 0 { TileType::Earth } else { TileType::Water },
            |_, _| 0,
        )
        .unwrap();
        let world = share(world);
        let scheduler = JobScheduler::new(2).unwrap();
        let barrier = CommandBarrier::new("collision");
        let system = TileCollisionSystem::new(assets(), 1);

        let pass = system.schedule(&scheduler, &world, &barrier, &[]).unwrap();
        assert_eq!(pass.tiles, 2);
        let stats = barrier.playback(&world).unwrap();
        assert_eq!(stats.added, 2);

        let earth = map.lookup(0, 0).unwrap();
        assert_eq!(
            world.read().get_component::<PhysicsCollider>(earth),
            Some(&PhysicsCollider { asset: assets().solid() })
        );

        // Earth -> Empty swaps the value, the component stays attached
        if let Some(tile) = world.write().get_component_mut::<MapTile>(earth) {
            tile.set_tile_type(TileType::Empty);
        }
        system.schedule(&scheduler, &world, &barrier, &[]).unwrap();
        let stats = barrier.playback(&world).unwrap();
        assert_eq!((stats.set, stats.added, stats.removed), (1, 0, 0));
        assert_eq!(
            world.read().get_component::<PhysicsCollider>(earth),
            Some(&PhysicsCollider { asset: assets().floor() })
        );
    }

    #[test]
    fn test_clean_world_schedules_nothing() {
        let world = share(World::new(4));
        let scheduler = JobScheduler::new(1).unwrap();
        let barrier = CommandBarrier::new("collision");
        let system = TileCollisionSystem::new(assets(), 4);

        assert!(system.schedule(&scheduler, &world, &barrier, &[]).is_none());
        assert!(!barrier.has_pending_work());
    }
}
