//! # Tile Pipeline Benchmark
//!
//! Full frames over a claimed map: the initial build of every decoration,
//! a single interaction and a running wave.

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use delve::core::{ColliderAsset, ColliderShape, TileType};
use delve::{
    ColliderAssets, Color32, FrameInput, MapImage, MapPalette, Simulation, SimulationConfig,
    ViewConfiguration, ViewParts, ViewTemplate,
};

fn views() -> ViewConfiguration {
    let mut views = ViewConfiguration::new();
    for tile_type in TileType::ALL {
        let mesh = tile_type.index() as u32 * 10;
        views.insert(
            tile_type,
            ViewParts {
                top: Some(ViewTemplate::new(mesh)),
                north: Some(ViewTemplate::new(mesh + 1).with_translation([0.0, 0.5, 0.5])),
                east: Some(ViewTemplate::new(mesh + 2).with_translation([0.5, 0.5, 0.0])),
                south: Some(ViewTemplate::new(mesh + 3).with_translation([0.0, 0.5, -0.5])),
                west: Some(ViewTemplate::new(mesh + 4).with_translation([-0.5, 0.5, 0.0])),
            },
        );
    }
    views
}

fn simulation(size: i32) -> Simulation {
    let dirt = Color32::rgb(120, 80, 40);
    let floor = Color32::rgb(0, 0, 0);
    let blue = Color32::rgb(0, 0, 255);
    let palette = MapPalette::new()
        .with_terrain(dirt, TileType::Earth)
        .with_terrain(floor, TileType::Empty)
        .with_player(blue);

    let mut terrain = MapImage::filled(size, size, dirt).unwrap();
    let mut territory = MapImage::filled(size, size, floor).unwrap();
    for y in size / 4..size * 3 / 4 {
        for x in size / 4..size * 3 / 4 {
            terrain.set_pixel(x, y, floor);
            territory.set_pixel(x, y, blue);
        }
    }
    let layout = palette.layout(&terrain, &territory).unwrap();

    let colliders = ColliderAssets::new(
        ColliderAsset::new(1, ColliderShape::Quad),
        ColliderAsset::new(2, ColliderShape::Box),
    )
    .unwrap();
    Simulation::from_layout(&layout, views(), colliders, SimulationConfig::default()).unwrap()
}

fn bench_initial_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("initial_build");
    group.sample_size(20);

    for size in [32, 64] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter_with_setup(
                || simulation(size),
                |mut sim| black_box(sim.tick(FrameInput::default())),
            );
        });
    }
    group.finish();
}

fn bench_interaction_frame(c: &mut Criterion) {
    let mut sim = simulation(64);
    sim.tick(FrameInput::default());
    let camera = *sim.interaction_mut().camera();
    let center = [camera.viewport[0] * 0.5, camera.viewport[1] * 0.5];

    c.bench_function("interaction_frame_64", |b| {
        b.iter(|| {
            black_box(sim.tick(FrameInput {
                pointer: Some(delve::PointerEvent { screen: center }),
                ..FrameInput::default()
            }))
        });
    });
}

fn bench_wave_frame(c: &mut Criterion) {
    let mut sim = simulation(64);
    sim.tick(FrameInput::default());
    sim.start_animation();
    let mut time = 0.0_f32;

    c.bench_function("wave_frame_64", |b| {
        b.iter(|| {
            time += 1.0 / 60.0;
            black_box(sim.tick(FrameInput {
                time,
                ..FrameInput::default()
            }))
        });
    });
}

criterion_group!(
    benches,
    bench_initial_build,
    bench_interaction_frame,
    bench_wave_frame
);
criterion_main!(benches);
