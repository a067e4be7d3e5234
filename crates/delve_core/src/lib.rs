//! # DELVE Core Engine
//!
//! Entity kernel of the DELVE tile-world simulation:
//! - Fixed-capacity ECS with generational entity IDs
//! - Dense component storage, mask-only tags
//! - Deferred command buffers replayed at barriers
//! - Worker-pool jobs with dependency handles
//!
//! ## Architecture Rules
//!
//! 1. **Jobs never mutate the world** - they record commands
//! 2. **One writer per producer** - barriers replay writers in creation order
//! 3. **Storage is pre-allocated** - spawning past capacity fails, it never grows
//!
//! ## Example
//!
//! ```rust
//! use delve_core::{share, CommandBarrier, MapTile, TileType, World};
//!
//! let mut world = World::new(64);
//! let tile = world.spawn();
//! world.insert(tile, MapTile::new(TileType::Earth, 0, 0, 0));
//! let world = share(world);
//!
//! let barrier = CommandBarrier::new("example");
//! {
//!     let mut writer = barrier.create_writer();
//!     writer
//!         .set_component(tile, MapTile::new(TileType::Gold, 0, 0, 0))
//!         .unwrap();
//! }
//! let stats = barrier.playback(&world).unwrap();
//! assert_eq!(stats.set, 1);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod ecs;
pub mod error;
pub mod sync;

pub use ecs::{
    mask_of, ColliderAsset, ColliderShape, Component, ComponentMask, ComponentStorage,
    DirtyTracker, Entity, EntityId, LocalToParent, MapTile, MeshRef, Parent,
    ParseTileTypeError, PhysicsCollider, Tag, TileType, Translation, UpdateTileView, ViewPart,
    World,
};
pub use error::{CommandError, CommandResult, SchedulerError};
pub use sync::{
    share, Command, CommandBarrier, CommandWriter, ComponentValue, JobHandle, JobScheduler,
    PlaybackStats, SharedWorld,
};
