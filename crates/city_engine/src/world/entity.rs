//! Visual entity types

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::foundation::color::Color;
use crate::foundation::math::Vec3;
use crate::render::SlotIndex;
use crate::scene::DrawableHandle;

/// Kind of code construct an entity represents
///
/// Each kind carries its own default footprint and theme color; dispatch is an
/// exhaustive match so adding a kind fails loudly everywhere it matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// A source file, the basic building
    File,
    /// A module or directory grouping
    Module,
    /// A class or type definition
    Class,
    /// A free function
    Function,
    /// A caller-placed landmark with no code behind it
    Marker,
}

impl EntityKind {
    /// Visual extents used when the caller supplies no size
    pub fn default_size(&self) -> Dimensions {
        match self {
            Self::File => Dimensions::new(4.0, 6.0, 4.0),
            Self::Module => Dimensions::new(6.0, 4.0, 6.0),
            Self::Class => Dimensions::new(3.0, 5.0, 3.0),
            Self::Function => Dimensions::new(2.0, 2.5, 2.0),
            Self::Marker => Dimensions::new(1.0, 1.7, 1.0),
        }
    }
}

/// Axis-aligned visual extents of an entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Extent along X
    pub width: f32,
    /// Extent along Y, drives vertical placement and edge ports
    pub height: f32,
    /// Extent along Z
    pub depth: f32,
}

impl Dimensions {
    /// Create dimensions from explicit extents
    pub fn new(width: f32, height: f32, depth: f32) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }

    /// Extents as a scale vector for the instance transform
    pub fn to_scale(self) -> Vec3 {
        Vec3::new(self.width, self.height, self.depth)
    }
}

/// Level-of-detail state, one representation at a time
///
/// The variant payload is the representation's proof of existence: an
/// instanced entity holds its pool slot, a promoted one its drawable handle.
/// Holding both, or neither, cannot be expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailState {
    /// Rendered as one slot of the batched instance draw
    Instanced {
        /// The pool slot mirroring the entity's transform
        slot: SlotIndex,
    },
    /// Rendered as an individually built full-detail drawable
    Promoted {
        /// The factory-built drawable attached to the scene
        handle: DrawableHandle,
    },
}

/// Caller-owned annotations carried by an entity
///
/// Never interpreted by the engine and persists unchanged across detail
/// transitions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityMetadata {
    /// Source file backing the entity
    pub file_path: String,
    /// Human-readable description text
    pub description: Option<String>,
    /// Host-defined freshness tag for the description
    pub description_status: Option<String>,
    /// Host timestamp of the last description update, milliseconds
    pub description_last_updated: Option<u64>,
    /// Free-form key/value annotations
    pub tags: HashMap<String, String>,
}

/// Everything needed to create one entity
#[derive(Debug, Clone)]
pub struct EntitySpawn {
    /// Unique entity id
    pub id: String,
    /// Kind of code construct
    pub kind: EntityKind,
    /// Requested position; Y is clamped to the ground rule
    pub position: Vec3,
    /// Explicit size, or `None` for the kind default
    pub size: Option<Dimensions>,
    /// Explicit color; pins the entity against theme restyles
    pub color: Option<Color>,
    /// Caller-owned annotations
    pub metadata: EntityMetadata,
}

/// One visual entity in the world
///
/// Identity and state fields are registry-owned; external callers read them
/// through the accessors and may only mutate the metadata bag.
#[derive(Debug, Clone)]
pub struct Entity {
    pub(crate) id: String,
    pub(crate) kind: EntityKind,
    pub(crate) position: Vec3,
    pub(crate) size: Dimensions,
    pub(crate) detail: DetailState,
    pub(crate) color: Color,
    pub(crate) explicit_color: bool,
    pub(crate) metadata: EntityMetadata,
}

impl Entity {
    /// Unique entity id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Kind of code construct
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Visual center of the entity
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Current visual extents
    pub fn size(&self) -> Dimensions {
        self.size
    }

    /// Current visual height
    pub fn height(&self) -> f32 {
        self.size.height
    }

    /// Current level-of-detail state
    pub fn detail(&self) -> DetailState {
        self.detail
    }

    /// Current display color
    pub fn color(&self) -> Color {
        self.color
    }

    /// Whether the caller pinned the color explicitly
    pub fn has_explicit_color(&self) -> bool {
        self.explicit_color
    }

    /// Caller-owned annotations
    pub fn metadata(&self) -> &EntityMetadata {
        &self.metadata
    }

    /// Whether the entity renders through the instance pool
    pub fn is_instanced(&self) -> bool {
        matches!(self.detail, DetailState::Instanced { .. })
    }

    /// Whether the entity renders as a full-detail drawable
    pub fn is_promoted(&self) -> bool {
        matches!(self.detail, DetailState::Promoted { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sizes_are_positive() {
        for kind in [
            EntityKind::File,
            EntityKind::Module,
            EntityKind::Class,
            EntityKind::Function,
            EntityKind::Marker,
        ] {
            let size = kind.default_size();
            assert!(size.width > 0.0);
            assert!(size.height > 0.0);
            assert!(size.depth > 0.0);
        }
    }

    #[test]
    fn test_kind_serializes_lowercase() {
        let json = serde_json::to_string(&EntityKind::Function).unwrap();
        assert_eq!(json, "\"function\"");

        let parsed: EntityKind = serde_json::from_str("\"marker\"").unwrap();
        assert_eq!(parsed, EntityKind::Marker);
    }

    #[test]
    fn test_dimensions_to_scale() {
        let scale = Dimensions::new(2.0, 5.0, 3.0).to_scale();
        assert_eq!(scale, Vec3::new(2.0, 5.0, 3.0));
    }
}
