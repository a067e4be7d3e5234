//! # Entity Component System
//!
//! A fixed-capacity ECS for tile worlds.
//!
//! ## Design Philosophy
//!
//! - All storage is pre-allocated at world creation
//! - Components are stored in dense arrays indexed by entity slot
//! - Entity IDs are simple indices with generation counters
//! - Tags are mask bits with no storage
//! - No dynamic dispatch in hot paths

mod component;
mod dirty;
mod entity;
mod storage;
mod tile_type;
mod world;

pub use component::{
    mask_of, ColliderAsset, ColliderShape, Component, LocalToParent, MapTile, MeshRef, Parent,
    PhysicsCollider, Tag, Translation, UpdateTileView, ViewPart,
};
pub use dirty::DirtyTracker;
pub use entity::{ComponentMask, Entity, EntityId};
pub use storage::ComponentStorage;
pub use tile_type::{ParseTileTypeError, TileType};
pub use world::World;
