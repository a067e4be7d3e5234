//! # Error Types
//!
//! All errors the tile world can raise outside a running frame. Inside a frame
//! failures are logged and degrade to "no decoration".

use thiserror::Error;

use delve_core::{CommandError, ParseTileTypeError, SchedulerError};

/// Errors building the tile map.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MapError {
    /// Width or height is zero or negative.
    #[error("invalid map dimensions {width}x{height}")]
    InvalidDimensions {
        /// Requested width.
        width: i32,
        /// Requested height.
        height: i32,
    },

    /// The world has too few free slots for one entity per tile.
    #[error("world has {available} free slots, map needs {required}")]
    CapacityExceeded {
        /// Tiles to spawn.
        required: usize,
        /// Free slots in the world.
        available: usize,
    },

    /// An image's pixel buffer does not match its dimensions.
    #[error("image is {width}x{height} but has {actual} pixels")]
    PixelCountMismatch {
        /// Image width.
        width: i32,
        /// Image height.
        height: i32,
        /// Pixels supplied.
        actual: usize,
    },

    /// Terrain and territory images differ in size.
    #[error("terrain is {terrain:?} but territory is {territory:?}")]
    ImageSizeMismatch {
        /// Terrain `(width, height)`.
        terrain: (i32, i32),
        /// Territory `(width, height)`.
        territory: (i32, i32),
    },
}

/// Errors loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Reading a config file failed.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The TOML document is malformed or has the wrong shape.
    #[error("invalid config document: {0}")]
    Parse(#[from] toml::de::Error),

    /// A tile type name is unknown.
    #[error(transparent)]
    TileType(#[from] ParseTileTypeError),

    /// A color string is not `#rrggbb` or `#rrggbbaa`.
    #[error("invalid color {0:?}")]
    InvalidColor(String),

    /// The same color maps to two terrain types.
    #[error("color {0} listed twice in palette")]
    DuplicateColor(String),

    /// A collider asset has the wrong shape for its role.
    #[error("{role} collider must be a {expected:?}, got {actual:?}")]
    ColliderShape {
        /// "floor" or "solid".
        role: &'static str,
        /// Required shape.
        expected: delve_core::ColliderShape,
        /// Supplied shape.
        actual: delve_core::ColliderShape,
    },

    /// A value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Umbrella error for the tile world.
#[derive(Error, Debug)]
pub enum DelveError {
    /// Map construction failed.
    #[error(transparent)]
    Map(#[from] MapError),

    /// Configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A barrier rejected its frame.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// The worker pool could not start.
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

/// Result type for tile world operations.
pub type DelveResult<T> = Result<T, DelveError>;
