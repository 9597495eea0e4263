//! # City Engine
//!
//! The world engine behind a codebase-as-city visualizer: files, modules,
//! classes, and functions become buildings in a navigable 3D city, and the
//! dependencies between them become lines strung across the rooftops.
//!
//! ## Features
//!
//! - **Fixed-Capacity Instancing**: Far entities share one batched draw call
//! - **Proximity Detail**: Entities near the viewer promote to full-detail
//!   drawables and demote again on the way out
//! - **Dependency Graph**: Directed multigraph with O(1) per-entity stats and
//!   roof-grid port assignment
//! - **Tagged Host Protocol**: JSON commands dispatched on a `type` tag
//! - **Themes**: Palette switches restyle the city within a per-tick budget
//!
//! ## Quick Start
//!
//! ```rust
//! use city_engine::prelude::*;
//!
//! let mut world = CityWorld::with_simple_backend(&WorldConfig::default());
//!
//! world.apply_json(
//!     r#"{
//!         "type": "addObject",
//!         "id": "src/lib.rs",
//!         "kind": "file",
//!         "filePath": "src/lib.rs",
//!         "position": {"x": 0.0, "y": 0.0, "z": 0.0}
//!     }"#,
//! );
//!
//! // One call per frame: runs the detail pass and drains restyle work.
//! world.tick(Vec3::new(10.0, 2.0, 10.0));
//! assert_eq!(world.entity_count(), 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod commands;
pub mod config;
pub mod foundation;
pub mod graph;
pub mod render;
pub mod scene;
pub mod world;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        commands::HostCommand,
        config::WorldConfig,
        foundation::{
            color::Color,
            math::{Mat4, Vec3},
        },
        graph::{DependencyGraph, EdgeFilter, EdgeKind, EntityStats},
        scene::{DrawableFactory, Scene, SimpleDrawableFactory, SimpleScene},
        world::{CityWorld, EntityKind, Theme, WorldError},
    };
}
