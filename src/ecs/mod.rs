//! Sparse-set Entity-Component-System.
//!
//! Entities are opaque ids ([`entity::Entity`]) managed by
//! [`entity::EntityManager`]; components live in per-type sparse sets
//! ([`component::ComponentArray`]) whose payload storage is drawn from a
//! [`crate::memory::MemoryPool`] under [`crate::tag::MemoryTag::Component`].
//! [`world::World`] ties the three together into the single entry point
//! application code calls.

pub mod component;
pub mod entity;
pub mod world;

pub use component::ComponentArray;
pub use entity::{Entity, EntityManager};
pub use world::{ComponentType, World};

/// Compile-time ceiling on live entities (spec "Constants").
pub const MAX_ENTITIES: usize = 4096;

/// Compile-time ceiling on distinct registered component types.
pub const MAX_COMPONENTS: usize = 256;
