//! # DELVE
//!
//! Reactive tile-world core: a fixed grid of tile entities whose view
//! fragments and colliders follow a continuously changing tile-type grid.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              DELVE                                      │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐   │
//! │  │  DIRTY SOURCES  │     │   DIRTY SET     │     │  DECORATION     │   │
//! │  │                 │────>│                 │────>│                 │   │
//! │  │  • Interaction  │     │  UpdateTileView │     │  • View pass    │   │
//! │  │  • Wave         │     │  tags           │     │  • Collider pass│   │
//! │  └─────────────────┘     └─────────────────┘     └────────┬────────┘   │
//! │                                                           │            │
//! │                          ┌─────────────────┐              │            │
//! │                          │   BARRIERS      │<─────────────┘            │
//! │                          │  (delve_core)   │                           │
//! │                          │  apply at sync  │                           │
//! │                          │  point          │                           │
//! │                          └─────────────────┘                           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `map`: tile registry, coordinate snapshot, palette bootstrap
//! - `dirty`: dirty marking and neighborhood propagation
//! - `systems`: view, collider, wave and interaction passes
//! - `physics`: grid ray casting and the top-down camera
//! - `game_loop`: frame orchestration and timing
//! - `config`: view templates, collider assets, runtime parameters

pub mod config;
pub mod dirty;
pub mod error;
pub mod game_loop;
pub mod map;
pub mod physics;
pub mod systems;

// Re-export the kernel
pub use delve_core as core;

// Re-export commonly used types
pub use config::{
    ColliderAssets, Facet, SimulationConfig, ViewConfiguration, ViewParts, ViewTemplate,
    WaveConfig,
};
pub use dirty::{mark_dirty, mark_dirty_deferred, mark_dirty_neighborhood};
pub use error::{ConfigError, DelveError, DelveResult, MapError};
pub use game_loop::{FrameInput, FrameStats, FrameStatsAccumulator, Simulation};
pub use map::{
    create_map, is_solid_tile, Color32, MapImage, MapLayout, MapPalette, TileMapSnapshot,
};
pub use physics::{RaycastHit, TileRayCaster, TopDownCamera};
pub use systems::{
    cycle_tile, fragments_of, wave_type, PointerEvent, Ray, RayCaster, ScreenCamera,
    TileChange, TileCollisionSystem, TileInteraction, TileViewSystem, WaveAnimator,
};
