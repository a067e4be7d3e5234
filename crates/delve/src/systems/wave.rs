//! # Procedural Wave Animator
//!
//! A continuous dirty source: once started, every frame each tile takes the
//! type picked by a radial sine wave around the map center,
//!
//! ```text
//! d = |center - position|
//! s = sin(d * frequency + t * speed) * 0.5 + 0.5
//! type = ALL[min(floor(s * 8), 7)]
//! ```
//!
//! and tiles whose type changed are marked dirty. The new type and the tag
//! are recorded into the animator's own barrier, which the frame plays back
//! before the view and collider passes capture their dirty set.

use std::sync::Arc;

use delve_core::{
    CommandBarrier, CommandResult, CommandWriter, EntityId, JobScheduler, MapTile, SharedWorld,
    TileType, World,
};

use crate::config::WaveConfig;
use crate::dirty::mark_dirty_deferred;
use crate::map::TileMapSnapshot;
use crate::systems::ScheduledPass;

/// Tile type of the wave at `position` for phase `phase`.
#[must_use]
pub fn wave_type(center: [f32; 2], position: [i32; 2], frequency: f32, phase: f32) -> TileType {
    let dx = center[0] - position[0] as f32;
    let dy = center[1] - position[1] as f32;
    let distance = dx.hypot(dy);
    let s = (distance * frequency + phase).sin() * 0.5 + 0.5;

    // s == 1.0 would index one past the end
    let index = ((s * TileType::COUNT as f32) as usize).min(TileType::COUNT - 1);
    TileType::ALL[index]
}

fn record_wave(
    world: &World,
    center: [f32; 2],
    config: WaveConfig,
    phase: f32,
    tiles: &[EntityId],
    writer: &mut CommandWriter,
) -> CommandResult<()> {
    for &tile in tiles {
        let Some(data) = world.get_component::<MapTile>(tile) else {
            continue;
        };
        let next = wave_type(center, data.position, config.frequency, phase);
        if next != data.tile_type() {
            writer.set_component(tile, data.with_tile_type(next))?;
            mark_dirty_deferred(writer, tile)?;
        }
    }
    Ok(())
}

/// The wave animator. Idle until [`WaveAnimator::start`].
pub struct WaveAnimator {
    config: WaveConfig,
    batch_size: usize,
    running: bool,
}

impl WaveAnimator {
    /// Creates an idle animator.
    #[must_use]
    pub fn new(config: WaveConfig, batch_size: usize) -> Self {
        Self {
            config,
            batch_size: batch_size.max(1),
            running: false,
        }
    }

    /// Starts animating from the next frame on. Idempotent.
    pub fn start(&mut self) {
        if !self.running {
            tracing::info!("wave animator started");
        }
        self.running = true;
    }

    /// Stops animating. Tiles keep their last type.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Whether the animator produces work.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Schedules one wave step at `time` seconds. Returns `None` while idle.
    pub fn schedule(
        &self,
        scheduler: &JobScheduler,
        world: &SharedWorld,
        snapshot: &TileMapSnapshot,
        barrier: &CommandBarrier,
        time: f32,
    ) -> Option<ScheduledPass> {
        if !self.running || snapshot.is_empty() {
            return None;
        }

        let center = snapshot.center();
        let phase = time * self.config.speed;
        let mut handles = Vec::new();
        for batch in snapshot.tiles().chunks(self.batch_size) {
            let batch = batch.to_vec();
            let mut writer = barrier.create_writer();
            let world = Arc::clone(world);
            let config = self.config;
            handles.push(scheduler.schedule(&[], move || {
                let world = world.read();
                if let Err(err) = record_wave(&world, center, config, phase, &batch, &mut writer) {
                    tracing::warn!(error = %err, "wave batch aborted");
                }
            }));
        }

        let jobs = handles.len();
        let handle = scheduler.combine(&handles);
        barrier.add_job_handle_for_producer(handle.clone());
        Some(ScheduledPass {
            handle,
            tiles: snapshot.len(),
            jobs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wave_at_center() {
        // d = 0: s = sin(phase) * 0.5 + 0.5
        assert_eq!(wave_type([2.0, 2.0], [2, 2], 0.8, 0.0), TileType::Gold);
        assert_eq!(
            wave_type([2.0, 2.0], [2, 2], 0.8, std::f32::consts::FRAC_PI_2),
            TileType::Wall
        );
        assert_eq!(
            wave_type([2.0, 2.0], [2, 2], 0.8, -std::f32::consts::FRAC_PI_2),
            TileType::Empty
        );
    }

    #[test]
    fn test_wave_depends_on_distance() {
        let center = [4.0, 4.0];
        let near = wave_type(center, [4, 5], 0.8, 0.0);
        let same_ring = wave_type(center, [5, 4], 0.8, 0.0);
        assert_eq!(near, same_ring);
    }

    #[test]
    fn test_idle_animator_schedules_nothing() {
        let scheduler = JobScheduler::new(1).unwrap();
        let mut world = World::new(16);
        let map = crate::map::create_map(&mut world, 2, 2, |_, _| TileType::Empty, |_, _| 0)
            .unwrap();
        let world = delve_core::share(world);
        let barrier = CommandBarrier::new("animation");

        let mut animator = WaveAnimator::new(WaveConfig::default(), 2);
        assert!(animator
            .schedule(&scheduler, &world, &map, &barrier, 0.0)
            .is_none());

        animator.start();
        let pass = animator
            .schedule(&scheduler, &world, &map, &barrier, 0.0)
            .unwrap();
        assert_eq!(pass.jobs, 2);
        barrier.playback(&world).unwrap();
    }
}
