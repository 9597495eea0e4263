//! Scene attachment and drawable construction boundary
//!
//! The engine decides *what* exists in the world; the host decides *how* it is
//! drawn. These traits are the seam between the two:
//!
//! ```text
//! Entity Registry / Dependency Graph
//!         ↓ build / dispose
//!   DrawableFactory (host-provided)
//!         ↓ handles
//!       Scene (host-provided)
//! ```
//!
//! Handles are opaque: the engine attaches, detaches, moves, and restyles
//! drawables without ever knowing how they are built or rasterized.

use crate::foundation::color::Color;
use crate::foundation::math::Vec3;
use crate::world::{Dimensions, EntityKind, EntityMetadata};

mod simple;

pub use simple::{SimpleDrawableFactory, SimpleScene};

/// Opaque identifier for a drawable owned by the host
///
/// Only meaningful to the factory that issued it. The engine stores and
/// forwards handles; it never interprets the raw value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DrawableHandle(u64);

impl DrawableHandle {
    /// Create a handle from a factory-chosen raw value
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw value this handle was issued with
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Everything a factory needs to build a full-detail drawable for one entity
#[derive(Debug, Clone)]
pub struct DetailRequest {
    /// Entity identifier, for host-side lookups
    pub id: String,
    /// Entity kind, selects the detail geometry
    pub kind: EntityKind,
    /// Visual center of the entity
    pub position: Vec3,
    /// Batched-representation dimensions, a starting point for the detail build
    pub size: Dimensions,
    /// Current display color
    pub color: Color,
    /// Caller-owned annotations (file path, description text)
    pub metadata: EntityMetadata,
}

/// Result of a full-detail build
#[derive(Debug, Clone, Copy)]
pub struct DetailBuild {
    /// Handle to the built drawable
    pub handle: DrawableHandle,
    /// Visual height the factory actually produced, which may differ from the
    /// requested dimensions once labels and trim are added
    pub height: f32,
}

/// Geometry and styling for one dependency edge drawable
#[derive(Debug, Clone, Copy)]
pub struct EdgeLine {
    /// World-space start point (source port)
    pub from: Vec3,
    /// World-space end point (target port)
    pub to: Vec3,
    /// Line width, scaled from the edge weight
    pub width: f32,
    /// Line color
    pub color: Color,
    /// Dashed rendering, used for type-only imports
    pub dashed: bool,
}

/// Drawable container the engine attaches handles to
pub trait Scene {
    /// Make a drawable part of the rendered scene
    fn attach(&mut self, handle: DrawableHandle);

    /// Retract a drawable from the rendered scene
    fn detach(&mut self, handle: DrawableHandle);
}

/// Host-side constructor for full-detail and edge drawables
///
/// The engine calls `dispose` exactly once for every handle it obtained from
/// `build_detail` or `build_edge`; hosts may reclaim resources there.
pub trait DrawableFactory {
    /// Build a full-detail representation for a promoted entity
    fn build_detail(&mut self, request: &DetailRequest) -> DetailBuild;

    /// Build a line drawable for a dependency edge
    fn build_edge(&mut self, line: &EdgeLine) -> DrawableHandle;

    /// Move an existing drawable to a new position
    fn set_transform(&mut self, handle: DrawableHandle, position: Vec3);

    /// Change an existing drawable's color in place
    fn restyle(&mut self, handle: DrawableHandle, color: Color);

    /// Release a drawable and everything backing it
    fn dispose(&mut self, handle: DrawableHandle);
}
