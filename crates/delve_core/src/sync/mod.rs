//! # Deferred Structural Changes
//!
//! Systems run as jobs that only read the world. Anything that changes the
//! world's structure is recorded and replayed later:
//!
//! ```text
//! Frame N:
//!   main thread   schedules jobs, takes writers from barriers
//!   workers       read world (shared lock), record commands
//!   main thread   barrier.playback(): wait for jobs, write lock, apply
//! ```
//!
//! The world is shared as [`SharedWorld`]. Jobs hold read guards for the
//! duration of a batch; playback is the only writer.

mod command_buffer;
mod jobs;

use std::sync::Arc;

use parking_lot::RwLock;

use crate::ecs::World;

pub use command_buffer::{
    Command, CommandBarrier, CommandWriter, ComponentValue, PlaybackStats,
};
pub use jobs::{JobHandle, JobScheduler};

/// World handle shared between the main thread and jobs.
pub type SharedWorld = Arc<RwLock<World>>;

/// Wraps a world for sharing with jobs.
#[must_use]
pub fn share(world: World) -> SharedWorld {
    Arc::new(RwLock::new(world))
}
