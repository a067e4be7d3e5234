//! # Tile Systems
//!
//! The per-frame passes over the tile population. Each pass captures its
//! input on the calling thread, fans out read-only jobs and records every
//! structural change into a [`delve_core::CommandBarrier`].

mod collision;
mod input;
mod view;
mod wave;

use delve_core::JobHandle;

pub use collision::TileCollisionSystem;
pub use input::{
    cycle_tile, PointerEvent, Ray, RayCaster, ScreenCamera, TileChange, TileInteraction,
};
pub use view::{fragment_components, fragments_of, visible_facets, TileViewSystem, FRAGMENT_MASK};
pub use wave::{wave_type, WaveAnimator};

/// Work a pass put on the job system this frame.
#[derive(Clone, Debug)]
pub struct ScheduledPass {
    /// Completes when every job of the pass finished.
    pub handle: JobHandle,
    /// Tiles the pass consumed.
    pub tiles: usize,
    /// Jobs scheduled.
    pub jobs: usize,
}
