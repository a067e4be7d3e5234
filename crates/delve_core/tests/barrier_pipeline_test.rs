//! Integration test for command barriers fed by scheduled jobs.

use std::sync::Arc;

use delve_core::{
    mask_of, share, CommandBarrier, ComponentValue, EntityId, JobScheduler, MapTile, Parent,
    Tag, TileType, UpdateTileView, ViewPart, World,
};

const CHILD_MASK: u64 = mask_of(ViewPart::ID);

fn tiles(world: &mut World, count: i32) -> Vec<EntityId> {
    (0..count)
        .map(|x| {
            let tile = world.spawn();
            world.insert(tile, MapTile::new(TileType::Earth, 0, x, 0));
            world.add_tag::<UpdateTileView>(tile);
            tile
        })
        .collect()
}

fn child_of(tile: EntityId) -> Vec<ComponentValue> {
    vec![Parent { entity: tile }.into(), ComponentValue::tag::<ViewPart>()]
}

#[test]
fn test_two_phase_rebuild_through_one_barrier() {
    let scheduler = JobScheduler::new(4).unwrap();
    let barrier = CommandBarrier::new("rebuild");

    let mut world = World::new(256);
    let tiles = tiles(&mut world, 32);
    let old_children: Vec<EntityId> = tiles
        .iter()
        .map(|&tile| {
            let child = world.spawn();
            world.insert(child, Parent { entity: tile });
            world.add_tag::<ViewPart>(child);
            child
        })
        .collect();
    let world = share(world);

    // Phase A: destroy every child, in slot batches
    let mut cleanup = Vec::new();
    for start in (0..256).step_by(64) {
        let mut writer = barrier.create_writer();
        let world = Arc::clone(&world);
        cleanup.push(scheduler.schedule(&[], move || {
            let world = world.read();
            for child in world.query_range(CHILD_MASK, start..start + 64) {
                writer.despawn(child).unwrap();
            }
        }));
    }
    let cleaned = scheduler.combine(&cleanup);

    // Phase B: two children per tile, then clear the tag
    let mut rebuild = Vec::new();
    for batch in tiles.chunks(5) {
        let batch = batch.to_vec();
        let mut writer = barrier.create_writer();
        rebuild.push(scheduler.schedule(std::slice::from_ref(&cleaned), move || {
            for tile in batch {
                writer.spawn(child_of(tile)).unwrap();
                writer.spawn(child_of(tile)).unwrap();
                writer.remove_tag::<UpdateTileView>(tile).unwrap();
            }
        }));
    }
    barrier.add_job_handle_for_producer(scheduler.combine(&rebuild));

    let stats = barrier.playback(&world).unwrap();
    assert_eq!(stats.despawned, 32);
    assert_eq!(stats.spawned, 64);
    assert_eq!(stats.removed, 32);
    assert_eq!(stats.skipped, 0);
    assert_eq!(stats.producers, 4 + 7);

    let world = world.read();
    assert!(old_children.iter().all(|&child| !world.is_alive(child)));
    assert_eq!(world.count(CHILD_MASK), 64);
    assert_eq!(world.count(mask_of(UpdateTileView::ID)), 0);
    for &tile in &tiles {
        let children = world
            .query(CHILD_MASK)
            .filter(|&child| world.get_component::<Parent>(child).unwrap().entity == tile)
            .count();
        assert_eq!(children, 2);
    }
}

#[test]
fn test_barrier_is_reusable_across_frames() {
    let scheduler = JobScheduler::new(2).unwrap();
    let barrier = CommandBarrier::new("frames");
    let mut world = World::new(64);
    let tiles = tiles(&mut world, 8);
    let world = share(world);

    for frame in 0..3 {
        let mut handles = Vec::new();
        for &tile in &tiles {
            let mut writer = barrier.create_writer();
            let world = Arc::clone(&world);
            handles.push(scheduler.schedule(&[], move || {
                let kind = world.read().get_component::<MapTile>(tile).unwrap().tile_type();
                writer
                    .set_component(tile, MapTile::new(kind.next(), 0, 0, 0))
                    .unwrap();
            }));
        }
        barrier.add_job_handle_for_producer(scheduler.combine(&handles));

        let stats = barrier.playback(&world).unwrap();
        assert_eq!(stats.set, tiles.len(), "frame {frame}");
        assert!(!barrier.has_pending_work());
    }

    let expected = TileType::Earth.next().next().next();
    {
        let world = world.read();
        for &tile in &tiles {
            assert_eq!(
                world.get_component::<MapTile>(tile).unwrap().tile_type(),
                expected
            );
        }
    }

    // Nothing registered: playback is a no-op
    assert_eq!(barrier.playback(&world).unwrap().applied(), 0);
}
