//! # Tile Types
//!
//! The closed set of terrain kinds a map cell can hold. Everything that
//! depends on the kind (solidity, view templates, collider variant) is a
//! lookup keyed by [`TileType::index`], never a trait object.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Terrain kind of a single map tile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum TileType {
    /// Open floor.
    #[default]
    Empty = 0,
    /// Shallow water, walkable.
    Water = 1,
    /// Diggable earth.
    Earth = 2,
    /// Hard rock.
    Stone = 3,
    /// Gold vein.
    Gold = 4,
    /// Gem vein.
    Gems = 5,
    /// Claimed floor.
    Tile = 6,
    /// Claimed wall.
    Wall = 7,
}

/// Error returned when a tile type name is not recognized.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown tile type: {0}")]
pub struct ParseTileTypeError(pub String);

impl TileType {
    /// Number of tile types.
    pub const COUNT: usize = 8;

    /// All tile types in cycle order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Empty,
        Self::Water,
        Self::Earth,
        Self::Stone,
        Self::Gold,
        Self::Gems,
        Self::Tile,
        Self::Wall,
    ];

    /// Whether this kind blocks movement and hides adjacent walls.
    #[inline]
    #[must_use]
    pub const fn is_solid(self) -> bool {
        matches!(
            self,
            Self::Earth | Self::Stone | Self::Gold | Self::Gems | Self::Wall
        )
    }

    /// Position of this kind in [`TileType::ALL`].
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Looks up a kind by its index.
    #[inline]
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        if index < Self::COUNT {
            Some(Self::ALL[index])
        } else {
            None
        }
    }

    /// The next kind in the cyclic order (`Wall` wraps to `Empty`).
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::COUNT]
    }

    /// Applies territory ownership: owned floor becomes `Tile`, owned earth
    /// becomes `Wall`. Everything else is unchanged.
    #[inline]
    #[must_use]
    pub const fn claimed_by(self, owner: i32) -> Self {
        match self {
            Self::Empty if owner > 0 => Self::Tile,
            Self::Earth if owner > 0 => Self::Wall,
            other => other,
        }
    }

    /// Lowercase name, as used in configuration files.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Water => "water",
            Self::Earth => "earth",
            Self::Stone => "stone",
            Self::Gold => "gold",
            Self::Gems => "gems",
            Self::Tile => "tile",
            Self::Wall => "wall",
        }
    }
}

impl fmt::Display for TileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TileType {
    type Err = ParseTileTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseTileTypeError(s.to_owned()))
    }
}
