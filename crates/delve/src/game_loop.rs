//! # Frame Orchestration
//!
//! ```text
//! Frame N:
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │ 1. INTERACTION (main thread, write lock)                            │
//! │    └─ pointer event → ray → cycle tile → dirty 3x3                  │
//! │                                                                     │
//! │ 2. ANIMATION (jobs)                                                 │
//! │    ├─ wave step records new types + dirty tags                      │
//! │    └─ animation barrier playback                                    │
//! │                                                                     │
//! │ 3. DECORATION (jobs, concurrent)                                    │
//! │    ├─ collider pass → collision barrier                             │
//! │    └─ view pass (cleanup → rebuild) → view barrier                  │
//! │                                                                     │
//! │ 4. PLAYBACK                                                         │
//! │    ├─ collision barrier                                             │
//! │    └─ view barrier (clears dirty tags)                              │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! No error leaves a frame: a rejected barrier is logged, counted in
//! [`FrameStats`] and its commands are dropped.

use std::time::{Duration, Instant};

use delve_core::{
    share, CommandBarrier, JobScheduler, PlaybackStats, SharedWorld, TileType, World,
};

use crate::config::{ColliderAssets, SimulationConfig, ViewConfiguration};
use crate::error::DelveResult;
use crate::map::{MapLayout, TileMapSnapshot};
use crate::physics::{TileRayCaster, TopDownCamera};
use crate::systems::{
    PointerEvent, RayCaster, ScreenCamera, TileChange, TileCollisionSystem, TileInteraction,
    TileViewSystem, WaveAnimator,
};

/// Target frame time for 60 FPS.
pub const TARGET_FRAME_TIME: Duration = Duration::from_micros(16_666);

/// Entity slots reserved per tile: the tile plus up to five fragments.
pub const SLOTS_PER_TILE: usize = 6;

/// Default viewport used to frame the built-in camera.
const DEFAULT_VIEWPORT: [f32; 2] = [1280.0, 720.0];

/// Inputs of a single frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameInput {
    /// Seconds since the simulation started; drives the wave phase.
    pub time: f32,
    /// Primary trigger event, if any.
    pub pointer: Option<PointerEvent>,
    /// Starts the wave animator.
    pub start_animation: bool,
}

/// What happened during one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Frame number.
    pub frame: u64,
    /// Total frame time in microseconds.
    pub total_us: u64,
    /// Interaction time in microseconds.
    pub interaction_us: u64,
    /// Animation step + playback time in microseconds.
    pub animation_us: u64,
    /// Decoration passes + playback time in microseconds.
    pub decoration_us: u64,
    /// The tile cycled by interaction.
    pub interaction: Option<TileChange>,
    /// Tiles the animator changed.
    pub animated_tiles: usize,
    /// Dirty tiles the decoration passes consumed.
    pub dirty_tiles: usize,
    /// Jobs scheduled this frame.
    pub jobs: usize,
    /// View fragments created.
    pub fragments_spawned: usize,
    /// View fragments destroyed.
    pub fragments_destroyed: usize,
    /// Colliders swapped by value.
    pub colliders_swapped: usize,
    /// Colliders attached.
    pub colliders_attached: usize,
    /// Barriers whose frame was rejected.
    pub rejected_playbacks: usize,
}

/// The tile world with its passes, barriers and worker pool.
pub struct Simulation<C = TopDownCamera, R = TileRayCaster> {
    world: SharedWorld,
    snapshot: TileMapSnapshot,
    scheduler: JobScheduler,
    config: SimulationConfig,

    views: TileViewSystem,
    colliders: TileCollisionSystem,
    animator: WaveAnimator,
    interaction: TileInteraction<C, R>,

    animation_barrier: CommandBarrier,
    collision_barrier: CommandBarrier,
    view_barrier: CommandBarrier,

    frame_count: u64,
    stats_accumulator: FrameStatsAccumulator,
}

impl Simulation {
    /// Builds a simulation over an already populated world, picking tiles
    /// with the grid ray caster through a camera framing the whole map.
    ///
    /// # Errors
    ///
    /// Invalid `config` or a worker pool that cannot start.
    pub fn new(
        world: World,
        snapshot: TileMapSnapshot,
        views: ViewConfiguration,
        colliders: ColliderAssets,
        config: SimulationConfig,
    ) -> DelveResult<Self> {
        let camera = TopDownCamera::framing(snapshot.width(), snapshot.height(), DEFAULT_VIEWPORT);
        let caster = TileRayCaster::new(snapshot.clone());
        Self::with_interaction(world, snapshot, views, colliders, config, camera, caster)
    }

    /// Creates a world sized for `layout`, spawns its tiles and builds the
    /// simulation.
    ///
    /// # Errors
    ///
    /// Map, config or scheduler errors.
    pub fn from_layout(
        layout: &MapLayout,
        views: ViewConfiguration,
        colliders: ColliderAssets,
        config: SimulationConfig,
    ) -> DelveResult<Self> {
        let tiles = layout.width().max(1) as usize * layout.height().max(1) as usize;
        let mut world = World::new(tiles * SLOTS_PER_TILE);
        let snapshot = layout.spawn_into(&mut world)?;
        Self::new(world, snapshot, views, colliders, config)
    }
}

impl<C: ScreenCamera, R: RayCaster> Simulation<C, R> {
    /// Builds a simulation with a custom camera and ray caster.
    ///
    /// # Errors
    ///
    /// Invalid `config` or a worker pool that cannot start.
    pub fn with_interaction(
        world: World,
        snapshot: TileMapSnapshot,
        views: ViewConfiguration,
        colliders: ColliderAssets,
        config: SimulationConfig,
        camera: C,
        caster: R,
    ) -> DelveResult<Self> {
        config.validate()?;
        let scheduler = if config.worker_count == 0 {
            JobScheduler::with_available_parallelism()?
        } else {
            JobScheduler::new(config.worker_count)?
        };

        tracing::info!(
            width = snapshot.width(),
            height = snapshot.height(),
            capacity = world.capacity(),
            workers = scheduler.worker_count(),
            view_types = views.len(),
            "simulation ready"
        );

        Ok(Self {
            world: share(world),
            snapshot,
            scheduler,
            views: TileViewSystem::new(views, config.batch_size),
            colliders: TileCollisionSystem::new(colliders, config.batch_size),
            animator: WaveAnimator::new(config.wave, config.batch_size),
            interaction: TileInteraction::new(
                camera,
                caster,
                config.max_ray_distance,
                config.interaction_radius,
            ),
            config,
            animation_barrier: CommandBarrier::new("animation"),
            collision_barrier: CommandBarrier::new("collision"),
            view_barrier: CommandBarrier::new("view"),
            frame_count: 0,
            stats_accumulator: FrameStatsAccumulator::new(),
        })
    }

    /// Runs one frame.
    pub fn tick(&mut self, input: FrameInput) -> FrameStats {
        let frame_start = Instant::now();
        let mut stats = FrameStats {
            frame: self.frame_count,
            ..FrameStats::default()
        };

        // 1. Interaction
        let phase_start = Instant::now();
        if let Some(event) = input.pointer {
            let mut world = self.world.write();
            stats.interaction = self.interaction.handle(&mut world, &self.snapshot, event);
        }
        stats.interaction_us = elapsed_us(phase_start);

        // 2. Animation
        let phase_start = Instant::now();
        if input.start_animation {
            self.animator.start();
        }
        if let Some(pass) = self.animator.schedule(
            &self.scheduler,
            &self.world,
            &self.snapshot,
            &self.animation_barrier,
            input.time,
        ) {
            stats.jobs += pass.jobs;
            if let Some(playback) = self.play(&self.animation_barrier, &mut stats) {
                stats.animated_tiles = playback.set;
            }
        }
        stats.animation_us = elapsed_us(phase_start);

        // 3. Decoration passes, both capture the same dirty set
        let phase_start = Instant::now();
        let collision = self.colliders.schedule(
            &self.scheduler,
            &self.world,
            &self.collision_barrier,
            &[],
        );
        let view = self.views.schedule(
            &self.scheduler,
            &self.world,
            &self.snapshot,
            &self.view_barrier,
            &[],
        );

        // 4. Playback
        if let Some(pass) = collision {
            stats.jobs += pass.jobs;
            if let Some(playback) = self.play(&self.collision_barrier, &mut stats) {
                stats.colliders_swapped = playback.set;
                stats.colliders_attached = playback.added;
            }
        }
        if let Some(pass) = view {
            stats.jobs += pass.jobs;
            stats.dirty_tiles = pass.tiles;
            if let Some(playback) = self.play(&self.view_barrier, &mut stats) {
                stats.fragments_spawned = playback.spawned;
                stats.fragments_destroyed = playback.despawned;
            }
        }
        stats.decoration_us = elapsed_us(phase_start);

        stats.total_us = elapsed_us(frame_start);
        self.frame_count += 1;
        self.stats_accumulator.record(&stats);

        tracing::debug!(
            frame = stats.frame,
            dirty = stats.dirty_tiles,
            spawned = stats.fragments_spawned,
            destroyed = stats.fragments_destroyed,
            total_us = stats.total_us,
            "frame complete"
        );
        stats
    }

    /// Plays `barrier` back, counting a rejection in `stats`.
    fn play(&self, barrier: &CommandBarrier, stats: &mut FrameStats) -> Option<PlaybackStats> {
        match barrier.playback(&self.world) {
            Ok(playback) => Some(playback),
            Err(err) => {
                tracing::error!(barrier = barrier.name(), error = %err, "frame commands dropped");
                stats.rejected_playbacks += 1;
                None
            }
        }
    }

    /// Starts the wave animator from the next frame on.
    pub fn start_animation(&mut self) {
        self.animator.start();
    }

    /// Whether the wave animator is running.
    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.animator.is_running()
    }

    /// The shared world, for renderers and physics.
    #[must_use]
    pub fn world(&self) -> &SharedWorld {
        &self.world
    }

    /// The coordinate snapshot.
    #[must_use]
    pub fn snapshot(&self) -> &TileMapSnapshot {
        &self.snapshot
    }

    /// The runtime configuration.
    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// The interaction handler, e.g. to move its camera.
    pub fn interaction_mut(&mut self) -> &mut TileInteraction<C, R> {
        &mut self.interaction
    }

    /// Type of the tile at `(x, y)`.
    #[must_use]
    pub fn tile_type(&self, x: i32, y: i32) -> Option<TileType> {
        let tile = self.snapshot.lookup(x, y)?;
        self.world
            .read()
            .get_component::<delve_core::MapTile>(tile)
            .map(delve_core::MapTile::tile_type)
    }

    /// Frames run so far.
    #[inline]
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Statistics accumulated over all frames.
    #[must_use]
    pub fn stats(&self) -> &FrameStatsAccumulator {
        &self.stats_accumulator
    }
}

fn elapsed_us(since: Instant) -> u64 {
    u64::try_from(since.elapsed().as_micros()).unwrap_or(u64::MAX)
}

/// Accumulator for frame statistics.
#[derive(Clone, Debug)]
pub struct FrameStatsAccumulator {
    /// Total frames recorded.
    pub frames_recorded: u64,
    /// Sum of total frame times.
    pub total_us_sum: u64,
    /// Min frame time.
    pub min_frame_us: u64,
    /// Max frame time.
    pub max_frame_us: u64,
    /// Frames that exceeded budget.
    pub frames_over_budget: u64,
    /// Fragments created over all frames.
    pub fragments_spawned: u64,
    /// Fragments destroyed over all frames.
    pub fragments_destroyed: u64,
    /// Barrier rejections over all frames.
    pub rejected_playbacks: u64,
}

impl FrameStatsAccumulator {
    /// Creates a new accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            frames_recorded: 0,
            total_us_sum: 0,
            min_frame_us: u64::MAX,
            max_frame_us: 0,
            frames_over_budget: 0,
            fragments_spawned: 0,
            fragments_destroyed: 0,
            rejected_playbacks: 0,
        }
    }

    /// Records a frame's statistics.
    pub fn record(&mut self, stats: &FrameStats) {
        self.frames_recorded += 1;
        self.total_us_sum += stats.total_us;
        self.min_frame_us = self.min_frame_us.min(stats.total_us);
        self.max_frame_us = self.max_frame_us.max(stats.total_us);
        self.fragments_spawned += stats.fragments_spawned as u64;
        self.fragments_destroyed += stats.fragments_destroyed as u64;
        self.rejected_playbacks += stats.rejected_playbacks as u64;

        if stats.total_us > TARGET_FRAME_TIME.as_micros() as u64 {
            self.frames_over_budget += 1;
        }
    }

    /// Returns average frame time in milliseconds.
    #[must_use]
    pub fn avg_frame_ms(&self) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        (self.total_us_sum as f64 / self.frames_recorded as f64) / 1000.0
    }

    /// Returns average FPS.
    #[must_use]
    pub fn avg_fps(&self) -> f64 {
        let avg_ms = self.avg_frame_ms();
        if avg_ms <= 0.0 {
            return 0.0;
        }
        1000.0 / avg_ms
    }

    /// Returns the share of frames over budget.
    #[must_use]
    pub fn over_budget_ratio(&self) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        self.frames_over_budget as f64 / self.frames_recorded as f64
    }

    /// Logs a summary at info level.
    pub fn log_summary(&self) {
        tracing::info!(
            frames = self.frames_recorded,
            avg_ms = self.avg_frame_ms(),
            fps = self.avg_fps(),
            min_us = self.min_frame_us,
            max_us = self.max_frame_us,
            over_budget = self.frames_over_budget,
            fragments_spawned = self.fragments_spawned,
            fragments_destroyed = self.fragments_destroyed,
            rejected = self.rejected_playbacks,
            "frame statistics"
        );
    }
}

impl Default for FrameStatsAccumulator {
    fn default() -> Self {
        Self::new()
    }
}
