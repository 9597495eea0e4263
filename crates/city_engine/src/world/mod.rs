//! World simulation
//!
//! Everything between the host protocol and the render backends: entities
//! and their proximity detail states, the palette, the error taxonomy, and
//! the facade gluing it all to the dependency graph.

mod city;
mod entity;
mod error;
mod registry;
mod theme;

pub use city::CityWorld;
pub use entity::{DetailState, Dimensions, Entity, EntityKind, EntityMetadata, EntitySpawn};
pub use error::WorldError;
pub use registry::{EntityRegistry, RegistryStats};
pub use theme::Theme;
