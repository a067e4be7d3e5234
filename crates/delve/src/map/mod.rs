//! # Tile Map
//!
//! The registry that spawns one entity per grid cell, the immutable
//! coordinate snapshot, and the palette that turns map images into initial
//! tile data.

mod palette;
mod registry;

pub use palette::{Color32, MapImage, MapLayout, MapPalette};
pub use registry::{create_map, is_solid_tile, neighbor_solidity, TileMapSnapshot};
