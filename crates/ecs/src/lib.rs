//! Entity-component store: entity identities, one sparse store per component
//! type, and lazy multi-component queries.
//!
//! # Invariants
//! - An entity holds at most one component of each type; a second add replaces the first.
//! - Destroying an entity removes it from every store before `destroy_entity` returns.
//! - Entity ids are never reused.
//! - A query yields exactly the entities present in every queried store, reading
//!   values at iteration time.
//! - Stores cannot be mutated while a query borrows the world; use [`CommandBuffer`].

mod commands;
mod entity;
mod error;
mod query;
mod registry;
mod storage;
mod world;

pub use commands::CommandBuffer;
pub use entity::{Entity, EntityRegistry};
pub use error::EcsError;
pub use query::{Query, QueryIter};
pub use registry::StoreRegistry;
pub use storage::{Component, ComponentStore};
pub use world::World;

pub fn crate_info() -> &'static str {
    "tessel-ecs v0.1.0"
}
