//! Entity storage core.
//!
//! The modules here form a dependency chain from leaves upward: growable
//! [`Block`]s back everything, the [`IdentityAllocator`] issues and recycles
//! generational [`Entity`] handles, [`EntitySet`] provides versioned
//! membership with set algebra, and [`World`] ties the owning
//! [`WorldRegistry`], [`Component`] tables, and the join/query surface
//! together. All of it is single-threaded by contract; a handle is only
//! meaningful against the world whose registry issued it.

mod allocator;
mod block;
mod component;
mod entity;
mod error;
mod field;
mod registry;
mod set;
mod world;

pub use allocator::IdentityAllocator;
pub use block::Block;
pub use component::{Component, ComponentDef, Row};
pub use entity::{ClassId, ClassRegistry, Entity, Generation};
pub use error::EcsError;
pub use field::{Field, FieldKind, Value};
pub use registry::{EntityRef, WorldRegistry};
pub use set::EntitySet;
pub use world::{ClassSelect, Join, World, WorldId};
