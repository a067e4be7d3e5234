//! # Component System
//!
//! Components are pure data containers with no behavior.
//! They must be Copy and have a fixed size for zero-allocation storage.
//!
//! Two flavours exist:
//! - [`Component`]: has a dense storage slot per entity.
//! - [`Tag`]: zero-size marker, lives only in the entity's component mask.

use bytemuck::{Pod, Zeroable};

use super::entity::{ComponentMask, EntityId};
use super::storage::ComponentStorage;
use super::tile_type::TileType;
use super::world::World;

/// Marker trait for ECS components.
///
/// Components must be:
/// - `Copy`: No heap allocations, bitwise copyable
/// - `Pod`: Plain old data, safe to transmute
/// - `Zeroable`: Can be safely zeroed
/// - `Default`: Must have a default value for pre-allocation
///
/// Each component knows where the [`World`] keeps its storage, which lets
/// generic world accessors stay free of dynamic dispatch.
pub trait Component: Copy + Pod + Zeroable + Default + Send + Sync + 'static {
    /// Unique identifier for this component type (0-63).
    ///
    /// This ID is used for the component bitmask in entities.
    const ID: u8;

    /// The world's storage for this component.
    fn storage(world: &World) -> &ComponentStorage<Self>;

    /// The world's mutable storage for this component.
    fn storage_mut(world: &mut World) -> &mut ComponentStorage<Self>;
}

/// Marker trait for zero-size tags.
pub trait Tag: Send + Sync + 'static {
    /// Unique identifier for this tag (0-63), shared with component IDs.
    const ID: u8;
}

/// Bitmask with only the given component or tag ID set.
#[inline]
#[must_use]
pub const fn mask_of(id: u8) -> ComponentMask {
    1 << id
}

macro_rules! impl_component {
    ($ty:ty, $id:expr, $field:ident) => {
        impl Component for $ty {
            const ID: u8 = $id;

            #[inline]
            fn storage(world: &World) -> &ComponentStorage<Self> {
                &world.$field
            }

            #[inline]
            fn storage_mut(world: &mut World) -> &mut ComponentStorage<Self> {
                &mut world.$field
            }
        }
    };
}

// ============================================================================
// TILE DATA
// ============================================================================

/// Per-tile simulation data.
///
/// The kind is stored as a raw byte so the struct stays `Pod`; use
/// [`MapTile::tile_type`] to read it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct MapTile {
    kind: u8,
    _padding: [u8; 3],
    /// Owning player, 0 = unowned.
    pub owner: i32,
    /// Grid coordinate. Immutable after creation.
    pub position: [i32; 2],
}

impl_component!(MapTile, 0, tiles);

impl MapTile {
    /// Creates tile data for the cell at `(x, y)`.
    #[inline]
    #[must_use]
    pub const fn new(tile_type: TileType, owner: i32, x: i32, y: i32) -> Self {
        Self {
            kind: tile_type as u8,
            _padding: [0; 3],
            owner,
            position: [x, y],
        }
    }

    /// Returns the terrain kind.
    #[inline]
    #[must_use]
    pub const fn tile_type(&self) -> TileType {
        match TileType::from_index(self.kind as usize) {
            Some(kind) => kind,
            None => TileType::Empty,
        }
    }

    /// Replaces the terrain kind.
    #[inline]
    pub fn set_tile_type(&mut self, tile_type: TileType) {
        self.kind = tile_type as u8;
    }

    /// Returns a copy with a different terrain kind.
    #[inline]
    #[must_use]
    pub const fn with_tile_type(mut self, tile_type: TileType) -> Self {
        self.kind = tile_type as u8;
        self
    }

    /// Grid x coordinate.
    #[inline]
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.position[0]
    }

    /// Grid y coordinate.
    #[inline]
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.position[1]
    }
}

// ============================================================================
// TRANSFORMS
// ============================================================================

/// World-space translation of an entity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Translation {
    /// X coordinate in world space.
    pub x: f32,
    /// Y coordinate in world space (up).
    pub y: f32,
    /// Z coordinate in world space.
    pub z: f32,
    /// Padding for alignment (ensures 16-byte alignment for SIMD).
    pub _padding: f32,
}

impl_component!(Translation, 1, translations);

impl Translation {
    /// Creates a new translation.
    #[inline]
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            x,
            y,
            z,
            _padding: 0.0,
        }
    }

    /// Center of grid cell `(x, y)`: grid y maps onto world z.
    #[inline]
    #[must_use]
    pub fn from_grid(x: i32, y: i32) -> Self {
        Self::new(x as f32 + 0.5, 0.0, y as f32 + 0.5)
    }
}

/// Non-owning back-reference from a child entity to its parent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct Parent {
    /// The parent entity.
    pub entity: EntityId,
}

impl_component!(Parent, 2, parents);

/// Placement of a child relative to its parent.
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct LocalToParent {
    /// Offset from the parent origin.
    pub translation: [f32; 3],
    /// Uniform scale.
    pub scale: f32,
    /// Rotation quaternion `(x, y, z, w)`.
    pub rotation: [f32; 4],
}

impl_component!(LocalToParent, 3, local_to_parents);

impl LocalToParent {
    /// No offset, no rotation, unit scale.
    pub const IDENTITY: Self = Self {
        translation: [0.0; 3],
        scale: 1.0,
        rotation: [0.0, 0.0, 0.0, 1.0],
    };
}

impl Default for LocalToParent {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Render mesh reference, resolved by the renderer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct MeshRef {
    /// Mesh identifier in the renderer's asset table.
    pub mesh_id: u32,
}

impl_component!(MeshRef, 4, meshes);

// ============================================================================
// COLLISION
// ============================================================================

/// Shape variant of a pre-built collider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColliderShape {
    /// Flat floor quad.
    Quad,
    /// Full solid box.
    Box,
}

impl ColliderShape {
    /// The variant a tile of the given kind must carry.
    #[inline]
    #[must_use]
    pub const fn for_tile(tile_type: TileType) -> Self {
        if tile_type.is_solid() {
            Self::Box
        } else {
            Self::Quad
        }
    }
}

/// Opaque reference to a collision shape built by the physics collaborator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(C)]
pub struct ColliderAsset {
    asset_id: u32,
    shape: u32,
}

impl ColliderAsset {
    /// Wraps an externally built collider.
    #[inline]
    #[must_use]
    pub const fn new(asset_id: u32, shape: ColliderShape) -> Self {
        Self {
            asset_id,
            shape: match shape {
                ColliderShape::Quad => 0,
                ColliderShape::Box => 1,
            },
        }
    }

    /// Identifier in the physics collaborator's asset table.
    #[inline]
    #[must_use]
    pub const fn asset_id(&self) -> u32 {
        self.asset_id
    }

    /// The shape variant.
    #[inline]
    #[must_use]
    pub const fn shape(&self) -> ColliderShape {
        match self.shape {
            0 => ColliderShape::Quad,
            _ => ColliderShape::Box,
        }
    }
}

/// Collider slot read by the physics layer every frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct PhysicsCollider {
    /// The installed collider.
    pub asset: ColliderAsset,
}

impl_component!(PhysicsCollider, 5, colliders);

// ============================================================================
// TAGS
// ============================================================================

/// Tile decorations are out of sync with its kind or neighbors.
#[derive(Clone, Copy, Debug, Default)]
pub struct UpdateTileView;

impl Tag for UpdateTileView {
    const ID: u8 = 6;
}

/// Entity is a view fragment of some tile.
#[derive(Clone, Copy, Debug, Default)]
pub struct ViewPart;

impl Tag for ViewPart {
    const ID: u8 = 7;
}
