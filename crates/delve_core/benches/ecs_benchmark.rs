//! # ECS Performance Benchmark
//!
//! Spawn, query and dirty-snapshot costs for a large tile world.
//!
//! Run with: `cargo bench --package delve_core`

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use delve_core::{
    mask_of, DirtyTracker, MapTile, Tag, TileType, Translation, UpdateTileView, World,
};

/// 256 x 256 map.
const TILE_COUNT: usize = 65_536;

fn tile_world(count: usize) -> World {
    let mut world = World::new(count);
    let side = (count as f64).sqrt() as i32;
    for i in 0..count as i32 {
        let entity = world.spawn();
        let (x, y) = (i % side, i / side);
        world.insert(entity, MapTile::new(TileType::Earth, 0, x, y));
        world.insert(entity, Translation::from_grid(x, y));
        if i % 7 == 0 {
            world.add_tag::<UpdateTileView>(entity);
        }
    }
    world
}

fn bench_world_creation(c: &mut Criterion) {
    c.bench_function("world_creation_64k", |b| {
        b.iter(|| black_box(World::new(TILE_COUNT)));
    });
}

fn bench_spawn_tiles(c: &mut Criterion) {
    let mut group = c.benchmark_group("spawn_tiles");

    for count in [1_024, 16_384, TILE_COUNT] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| tile_world(count).alive_count());
        });
    }

    group.finish();
}

fn bench_dirty_query(c: &mut Criterion) {
    let world = tile_world(TILE_COUNT);
    let mask = mask_of(UpdateTileView::ID);

    c.bench_function("dirty_query_64k", |b| {
        b.iter(|| black_box(world.count(black_box(mask))));
    });
}

fn bench_dirty_snapshot(c: &mut Criterion) {
    let world = tile_world(TILE_COUNT);
    let dirty: Vec<_> = world.query(mask_of(UpdateTileView::ID)).collect();

    c.bench_function("dirty_snapshot_64k", |b| {
        b.iter(|| {
            let tracker = DirtyTracker::from_entities(world.capacity(), black_box(&dirty));
            tracker.dirty_count()
        });
    });
}

criterion_group!(
    benches,
    bench_world_creation,
    bench_spawn_tiles,
    bench_dirty_query,
    bench_dirty_snapshot,
);
criterion_main!(benches);
