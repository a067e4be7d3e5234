//! # Map Palette
//!
//! Maps are authored as two images of equal size:
//!
//! - **terrain**: each pixel color selects a tile type
//! - **territory**: each pixel color selects a player (or nobody)
//!
//! Pixel `(x, y)` lives at index `x + y * width`, the same layout as the
//! tile snapshot.
//!
//! ```toml
//! players = ["#ff0000", "#0000ff"]
//!
//! [[terrain]]
//! color = "#000000"
//! type = "empty"
//!
//! [[terrain]]
//! color = "#8b4513"
//! type = "earth"
//! ```

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use delve_core::{TileType, World};

use super::registry::{create_map, TileMapSnapshot};
use crate::error::{ConfigError, MapError};

/// 8-bit RGBA color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct Color32 {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha.
    pub a: u8,
}

impl Color32 {
    /// Creates a color from its channels.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Creates an opaque color.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }
}

impl fmt::Display for Color32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }
}

impl FromStr for Color32 {
    type Err = ConfigError;

    /// Parses `#rrggbb` (opaque) or `#rrggbbaa`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidColor(s.to_owned());
        let hex = s.trim().strip_prefix('#').ok_or_else(invalid)?;
        if !(hex.len() == 6 || hex.len() == 8) || !hex.is_ascii() {
            return Err(invalid());
        }

        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        let alpha = if hex.len() == 8 { channel(6)? } else { 255 };
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?, alpha))
    }
}

impl TryFrom<String> for Color32 {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A decoded image: dimensions plus row-major pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MapImage {
    width: i32,
    height: i32,
    pixels: Vec<Color32>,
}

impl MapImage {
    /// Wraps a pixel buffer.
    ///
    /// # Errors
    ///
    /// [`MapError::InvalidDimensions`] or [`MapError::PixelCountMismatch`].
    pub fn new(width: i32, height: i32, pixels: Vec<Color32>) -> Result<Self, MapError> {
        if width <= 0 || height <= 0 {
            return Err(MapError::InvalidDimensions { width, height });
        }
        if pixels.len() != width as usize * height as usize {
            return Err(MapError::PixelCountMismatch {
                width,
                height,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// An image filled with one color.
    ///
    /// # Errors
    ///
    /// [`MapError::InvalidDimensions`].
    pub fn filled(width: i32, height: i32, color: Color32) -> Result<Self, MapError> {
        if width <= 0 || height <= 0 {
            return Err(MapError::InvalidDimensions { width, height });
        }
        Self::new(width, height, vec![color; width as usize * height as usize])
    }

    /// Image width.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Image height.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// The pixel at `(x, y)`, or `None` outside the image.
    #[must_use]
    pub fn pixel(&self, x: i32, y: i32) -> Option<Color32> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get((x + y * self.width) as usize).copied()
    }

    /// Overwrites the pixel at `(x, y)`. Out-of-range writes are ignored.
    pub fn set_pixel(&mut self, x: i32, y: i32, color: Color32) {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return;
        }
        self.pixels[(x + y * self.width) as usize] = color;
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct PaletteEntry {
    color: Color32,
    #[serde(rename = "type")]
    tile_type: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPalette {
    #[serde(default)]
    terrain: Vec<PaletteEntry>,
    #[serde(default)]
    players: Vec<Color32>,
}

/// Color lookup for terrain types and player territories.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MapPalette {
    terrain: HashMap<Color32, TileType>,
    players: Vec<Color32>,
}

impl MapPalette {
    /// An empty palette.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps `color` to `tile_type` in the terrain image.
    #[must_use]
    pub fn with_terrain(mut self, color: Color32, tile_type: TileType) -> Self {
        self.terrain.insert(color, tile_type);
        self
    }

    /// Appends a player color. The first player is owner 1.
    #[must_use]
    pub fn with_player(mut self, color: Color32) -> Self {
        self.players.push(color);
        self
    }

    /// Terrain type for `color`. Unknown colors log a warning and read as
    /// [`TileType::Empty`].
    #[must_use]
    pub fn terrain(&self, color: Color32) -> TileType {
        if let Some(tile_type) = self.terrain.get(&color) {
            return *tile_type;
        }
        tracing::warn!(%color, "unknown terrain color, using empty");
        TileType::Empty
    }

    /// Owner for `color`: player index + 1, or 0 if no player uses it.
    #[must_use]
    pub fn player(&self, color: Color32) -> i32 {
        self.players
            .iter()
            .position(|player| *player == color)
            .map_or(0, |index| index as i32 + 1)
    }

    /// Decodes a terrain/territory image pair into per-cell tile data.
    ///
    /// # Errors
    ///
    /// [`MapError::ImageSizeMismatch`] if the images differ in size.
    pub fn layout(&self, terrain: &MapImage, territory: &MapImage) -> Result<MapLayout, MapError> {
        if (terrain.width, terrain.height) != (territory.width, territory.height) {
            return Err(MapError::ImageSizeMismatch {
                terrain: (terrain.width, terrain.height),
                territory: (territory.width, territory.height),
            });
        }

        let cells = terrain
            .pixels
            .iter()
            .zip(&territory.pixels)
            .map(|(ground, owner)| (self.terrain(*ground), self.player(*owner)))
            .collect();

        Ok(MapLayout {
            width: terrain.width,
            height: terrain.height,
            cells,
        })
    }

    /// Parses the TOML form shown in the module docs.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`], [`ConfigError::TileType`] or
    /// [`ConfigError::DuplicateColor`].
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let raw: RawPalette = toml::from_str(source)?;
        let mut palette = Self {
            terrain: HashMap::with_capacity(raw.terrain.len()),
            players: raw.players,
        };
        for entry in raw.terrain {
            let tile_type: TileType = entry.tile_type.parse()?;
            if palette.terrain.insert(entry.color, tile_type).is_some() {
                return Err(ConfigError::DuplicateColor(entry.color.to_string()));
            }
        }
        Ok(palette)
    }
}

/// Initial `(type, owner)` per cell, before ownership promotion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MapLayout {
    width: i32,
    height: i32,
    cells: Vec<(TileType, i32)>,
}

impl MapLayout {
    /// Map width.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Map height.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// `(type, owner)` at `(x, y)`; `(Empty, 0)` outside the map.
    #[must_use]
    pub fn cell(&self, x: i32, y: i32) -> (TileType, i32) {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return (TileType::Empty, 0);
        }
        self.cells
            .get((x + y * self.width) as usize)
            .copied()
            .unwrap_or((TileType::Empty, 0))
    }

    /// Spawns the layout's tiles into `world`.
    ///
    /// # Errors
    ///
    /// See [`create_map`].
    pub fn spawn_into(&self, world: &mut World) -> Result<TileMapSnapshot, MapError> {
        create_map(
            world,
            self.width,
            self.height,
            |x, y| self.cell(x, y).0,
            |x, y| self.cell(x, y).1,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use delve_core::MapTile;

    const DIRT: Color32 = Color32::rgb(139, 69, 19);
    const VOID: Color32 = Color32::rgb(0, 0, 0);
    const RED: Color32 = Color32::rgb(255, 0, 0);
    const BLUE: Color32 = Color32::rgb(0, 0, 255);

    #[test]
    fn test_color_parsing() {
        assert_eq!("#8b4513".parse::<Color32>().unwrap(), DIRT);
        assert_eq!(
            "#ff000080".parse::<Color32>().unwrap(),
            Color32::new(255, 0, 0, 128)
        );
        assert!("8b4513".parse::<Color32>().is_err());
        assert!("#8b45".parse::<Color32>().is_err());
        assert!("#zzzzzz".parse::<Color32>().is_err());
        assert_eq!(DIRT.to_string(), "#8b4513ff");
    }

    #[test]
    fn test_palette_lookup() {
        let palette = MapPalette::new()
            .with_terrain(DIRT, TileType::Earth)
            .with_player(RED)
            .with_player(BLUE);

        assert_eq!(palette.terrain(DIRT), TileType::Earth);
        assert_eq!(palette.terrain(Color32::rgb(1, 2, 3)), TileType::Empty);
        assert_eq!(palette.player(RED), 1);
        assert_eq!(palette.player(BLUE), 2);
        assert_eq!(palette.player(VOID), 0);
    }

    #[test]
    fn test_palette_from_toml() {
        let palette = MapPalette::from_toml_str(
            r##"
            players = ["#ff0000"]

            [[terrain]]
            color = "#8b4513"
            type = "earth"

            [[terrain]]
            color = "#000000"
            type = "empty"
            "##,
        )
        .unwrap();
        assert_eq!(palette.terrain(DIRT), TileType::Earth);
        assert_eq!(palette.player(RED), 1);

        let duplicate = r##"
            [[terrain]]
            color = "#000000"
            type = "empty"
            [[terrain]]
            color = "#000000"
            type = "stone"
        "##;
        assert!(matches!(
            MapPalette::from_toml_str(duplicate),
            Err(ConfigError::DuplicateColor(_))
        ));
    }

    #[test]
    fn test_layout_spawns_promoted_tiles() {
        let palette = MapPalette::new()
            .with_terrain(DIRT, TileType::Earth)
            .with_terrain(VOID, TileType::Empty)
            .with_player(RED);

        let terrain = MapImage::new(2, 1, vec![DIRT, VOID]).unwrap();
        let mut territory = MapImage::filled(2, 1, VOID).unwrap();
        territory.set_pixel(0, 0, RED);
        territory.set_pixel(1, 0, RED);

        let layout = palette.layout(&terrain, &territory).unwrap();
        assert_eq!(layout.cell(0, 0), (TileType::Earth, 1));

        let mut world = World::new(8);
        let map = layout.spawn_into(&mut world).unwrap();
        let kind = |x| {
            world
                .get_component::<MapTile>(map.lookup(x, 0).unwrap())
                .map(MapTile::tile_type)
        };
        assert_eq!(kind(0), Some(TileType::Wall));
        assert_eq!(kind(1), Some(TileType::Tile));
    }

    #[test]
    fn test_layout_rejects_mismatched_images() {
        let palette = MapPalette::new();
        let terrain = MapImage::filled(2, 2, VOID).unwrap();
        let territory = MapImage::filled(2, 1, VOID).unwrap();
        assert!(matches!(
            palette.layout(&terrain, &territory),
            Err(MapError::ImageSizeMismatch { .. })
        ));
        assert!(matches!(
            MapImage::new(2, 2, vec![VOID; 3]),
            Err(MapError::PixelCountMismatch { actual: 3, .. })
        ));
    }
}
