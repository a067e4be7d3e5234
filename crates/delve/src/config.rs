//! # Configuration
//!
//! Read-only data loaded once at startup:
//!
//! - [`ViewConfiguration`]: per tile type, up to five fragment templates
//! - [`ColliderAssets`]: the floor and solid collider pair
//! - [`SimulationConfig`]: worker pool, batching, wave and ray parameters
//!
//! ## View configuration format
//!
//! ```toml
//! [earth.top]
//! mesh = 10
//! translation = [0.0, 1.0, 0.0]
//!
//! [earth.north]
//! mesh = 11
//! translation = [0.0, 0.5, 0.5]
//! rotation = [0.0, 1.0, 0.0, 0.0]
//! ```
//!
//! Tile types without a table produce no fragments.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use delve_core::{ColliderAsset, ColliderShape, LocalToParent, MeshRef, TileType};

use crate::error::ConfigError;

// ============================================================================
// VIEW TEMPLATES
// ============================================================================

/// One facet of a tile's visual representation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Facet {
    /// Floor or cap, always spawned when configured.
    Top,
    /// Side facing `(0, +1)`.
    North,
    /// Side facing `(+1, 0)`.
    East,
    /// Side facing `(0, -1)`.
    South,
    /// Side facing `(-1, 0)`.
    West,
}

impl Facet {
    /// Every facet in spawn order.
    pub const ALL: [Self; 5] = [Self::Top, Self::North, Self::East, Self::South, Self::West];

    /// The four sides in spawn order.
    pub const SIDES: [Self; 4] = [Self::North, Self::East, Self::South, Self::West];

    /// Grid offset of the neighbor this facet faces. `None` for the top.
    #[inline]
    #[must_use]
    pub const fn offset(self) -> Option<(i32, i32)> {
        match self {
            Self::Top => None,
            Self::North => Some((0, 1)),
            Self::East => Some((1, 0)),
            Self::South => Some((0, -1)),
            Self::West => Some((-1, 0)),
        }
    }
}

fn identity_rotation() -> [f32; 4] {
    LocalToParent::IDENTITY.rotation
}

fn unit_scale() -> f32 {
    1.0
}

/// Prefab for one view fragment: a mesh and its placement relative to the
/// tile.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ViewTemplate {
    /// Renderer mesh identifier.
    pub mesh: u32,
    /// Offset from the tile origin.
    #[serde(default)]
    pub translation: [f32; 3],
    /// Rotation quaternion `(x, y, z, w)`.
    #[serde(default = "identity_rotation")]
    pub rotation: [f32; 4],
    /// Uniform scale.
    #[serde(default = "unit_scale")]
    pub scale: f32,
}

impl ViewTemplate {
    /// A template for `mesh` with identity placement.
    #[must_use]
    pub const fn new(mesh: u32) -> Self {
        Self {
            mesh,
            translation: [0.0; 3],
            rotation: LocalToParent::IDENTITY.rotation,
            scale: 1.0,
        }
    }

    /// Sets the offset from the tile origin.
    #[must_use]
    pub const fn with_translation(mut self, translation: [f32; 3]) -> Self {
        self.translation = translation;
        self
    }

    /// Sets the rotation quaternion.
    #[must_use]
    pub const fn with_rotation(mut self, rotation: [f32; 4]) -> Self {
        self.rotation = rotation;
        self
    }

    /// Placement component for a fragment built from this template.
    #[inline]
    #[must_use]
    pub const fn local_to_parent(&self) -> LocalToParent {
        LocalToParent {
            translation: self.translation,
            scale: self.scale,
            rotation: self.rotation,
        }
    }

    /// Mesh component for a fragment built from this template.
    #[inline]
    #[must_use]
    pub const fn mesh_ref(&self) -> MeshRef {
        MeshRef { mesh_id: self.mesh }
    }
}

/// Templates for the five facets of one tile type. Missing facets never
/// spawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ViewParts {
    /// Cap or floor.
    #[serde(default)]
    pub top: Option<ViewTemplate>,
    /// Wall towards `(0, +1)`.
    #[serde(default)]
    pub north: Option<ViewTemplate>,
    /// Wall towards `(+1, 0)`.
    #[serde(default)]
    pub east: Option<ViewTemplate>,
    /// Wall towards `(0, -1)`.
    #[serde(default)]
    pub south: Option<ViewTemplate>,
    /// Wall towards `(-1, 0)`.
    #[serde(default)]
    pub west: Option<ViewTemplate>,
}

impl ViewParts {
    /// The template for `facet`, if configured.
    #[inline]
    #[must_use]
    pub const fn get(&self, facet: Facet) -> Option<&ViewTemplate> {
        match facet {
            Facet::Top => self.top.as_ref(),
            Facet::North => self.north.as_ref(),
            Facet::East => self.east.as_ref(),
            Facet::South => self.south.as_ref(),
            Facet::West => self.west.as_ref(),
        }
    }
}

/// Lookup table from tile type to its view parts.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ViewConfiguration {
    parts: [Option<ViewParts>; TileType::COUNT],
}

impl ViewConfiguration {
    /// An empty configuration: no type produces fragments.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`ViewConfiguration::insert`].
    #[must_use]
    pub fn with(mut self, tile_type: TileType, parts: ViewParts) -> Self {
        self.insert(tile_type, parts);
        self
    }

    /// Sets the parts for `tile_type`, replacing earlier ones.
    pub fn insert(&mut self, tile_type: TileType, parts: ViewParts) {
        self.parts[tile_type.index()] = Some(parts);
    }

    /// The parts for `tile_type`, or `None` if the type is unconfigured.
    #[inline]
    #[must_use]
    pub fn get(&self, tile_type: TileType) -> Option<&ViewParts> {
        self.parts[tile_type.index()].as_ref()
    }

    /// Number of configured tile types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parts.iter().flatten().count()
    }

    /// Whether no tile type is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Parses the TOML form shown in the module docs.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] for malformed documents and
    /// [`ConfigError::TileType`] for unknown table names.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let raw: BTreeMap<String, ViewParts> = toml::from_str(source)?;
        let mut config = Self::new();
        for (name, parts) in raw {
            config.insert(name.parse()?, parts);
        }
        Ok(config)
    }

    /// Reads and parses a view configuration file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`ViewConfiguration::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }
}

// ============================================================================
// COLLIDERS
// ============================================================================

/// The two pre-built collider assets every tile chooses between.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColliderAssets {
    floor: ColliderAsset,
    solid: ColliderAsset,
}

impl ColliderAssets {
    /// Pairs a floor quad with a solid box.
    ///
    /// # Errors
    ///
    /// [`ConfigError::ColliderShape`] if either asset has the wrong shape.
    pub fn new(floor: ColliderAsset, solid: ColliderAsset) -> Result<Self, ConfigError> {
        check_shape("floor", floor, ColliderShape::Quad)?;
        check_shape("solid", solid, ColliderShape::Box)?;
        Ok(Self { floor, solid })
    }

    /// The floor quad.
    #[must_use]
    pub const fn floor(&self) -> ColliderAsset {
        self.floor
    }

    /// The solid box.
    #[must_use]
    pub const fn solid(&self) -> ColliderAsset {
        self.solid
    }

    /// `solid` for solid tile types, `floor` otherwise.
    #[inline]
    #[must_use]
    pub const fn for_tile(&self, tile_type: TileType) -> ColliderAsset {
        if tile_type.is_solid() {
            self.solid
        } else {
            self.floor
        }
    }
}

fn check_shape(
    role: &'static str,
    asset: ColliderAsset,
    expected: ColliderShape,
) -> Result<(), ConfigError> {
    if asset.shape() == expected {
        Ok(())
    } else {
        Err(ConfigError::ColliderShape {
            role,
            expected,
            actual: asset.shape(),
        })
    }
}

// ============================================================================
// SIMULATION
// ============================================================================

/// Parameters of the procedural wave animator.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WaveConfig {
    /// Radians of phase per tile of distance from the map center.
    pub frequency: f32,
    /// Multiplier on elapsed seconds.
    pub speed: f32,
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            frequency: 0.8,
            speed: 1.0,
        }
    }
}

/// Runtime parameters of a [`crate::Simulation`].
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Worker threads; 0 uses the machine's available parallelism.
    pub worker_count: usize,
    /// Entities per job batch.
    pub batch_size: usize,
    /// Radius of the block marked dirty around an interacted tile. The
    /// block is clipped to the map, so large values just cover all of it.
    pub interaction_radius: i32,
    /// Ray length for pointer picking, in tiles.
    pub max_ray_distance: f32,
    /// Wave animator parameters.
    pub wave: WaveConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            worker_count: 0,
            batch_size: 64,
            interaction_radius: 1,
            max_ray_distance: 100.0,
            wave: WaveConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid("batch_size must be positive".into()));
        }
        if self.interaction_radius < 0 {
            return Err(ConfigError::Invalid(
                "interaction_radius must not be negative".into(),
            ));
        }
        if !(self.max_ray_distance.is_finite() && self.max_ray_distance > 0.0) {
            return Err(ConfigError::Invalid(
                "max_ray_distance must be a positive number".into(),
            ));
        }
        if !(self.wave.frequency.is_finite() && self.wave.speed.is_finite()) {
            return Err(ConfigError::Invalid("wave parameters must be finite".into()));
        }
        Ok(())
    }

    /// Parses and validates a TOML document. Missing keys keep their
    /// defaults.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] or [`ConfigError::Invalid`].
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a config file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`SimulationConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }
}
