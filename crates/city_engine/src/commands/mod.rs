//! Host command wire format
//!
//! The host application drives the world by sending JSON commands, one per
//! mutation. Commands form a tagged union: the `type` field selects the
//! variant and the remaining fields are the payload, so dispatch after
//! deserialization is a single `match` with no string comparison.
//!
//! Payloads are wire types only. Translation into engine calls happens in
//! [`crate::world::CityWorld::apply`]; nothing here touches world state.
//!
//! # Usage
//!
//! ```
//! use city_engine::commands::HostCommand;
//!
//! let command: HostCommand = serde_json::from_str(
//!     r#"{"type": "removeObject", "id": "src/main.rs"}"#,
//! ).unwrap();
//! assert!(matches!(command, HostCommand::RemoveObject(_)));
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::foundation::math::Vec3;
use crate::graph::{EdgeKind, ImportVariant};
use crate::world::{Dimensions, EntityKind};

/// World-space position as it appears on the wire
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// East-west axis
    pub x: f32,
    /// Vertical axis
    pub y: f32,
    /// North-south axis
    pub z: f32,
}

impl From<Position> for Vec3 {
    fn from(position: Position) -> Self {
        Vec3::new(position.x, position.y, position.z)
    }
}

impl From<Vec3> for Position {
    fn from(v: Vec3) -> Self {
        Self {
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }
}

/// Create one entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddObject {
    /// Unique entity id
    pub id: String,
    /// Entity kind, drives default size and theme color
    pub kind: EntityKind,
    /// Source path the entity represents
    pub file_path: String,
    /// Requested world position; Y may be lifted by the ground rule
    pub position: Position,
    /// Explicit CSS hex color; pins the entity against theme changes
    #[serde(default)]
    pub color: Option<String>,
    /// Explicit dimensions, defaulted per kind when absent
    #[serde(default)]
    pub size: Option<Dimensions>,
    /// Free-form string tags carried on the entity
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    /// Human-readable description
    #[serde(default)]
    pub description: Option<String>,
    /// Generation status of the description
    #[serde(default)]
    pub description_status: Option<String>,
    /// Unix millis of the last description update
    #[serde(default)]
    pub description_last_updated: Option<u64>,
}

/// Delete one entity
///
/// Edges referencing it are kept and become dangling; the host removes them
/// explicitly if it wants them gone.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveObject {
    /// Entity id
    pub id: String,
}

/// Move one entity; edges touching it are rebuilt
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateObjectPosition {
    /// Entity id
    pub id: String,
    /// New position; Y may be lifted by the ground rule
    pub position: Position,
}

/// Create one dependency edge between two existing entities
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddDependency {
    /// Unique edge id; re-sending an id replaces the edge
    pub id: String,
    /// Depending entity id
    pub source: String,
    /// Depended-upon entity id
    pub target: String,
    /// Relationship kind
    pub kind: EdgeKind,
    /// Line weight, defaults to 1
    #[serde(default)]
    pub weight: Option<u32>,
    /// Marks the edge as part of a circular dependency
    #[serde(default)]
    pub is_circular: bool,
    /// Import flavor; type-only imports render dashed
    #[serde(default)]
    pub import_variant: Option<ImportVariant>,
    /// Explicit CSS hex color overriding the themed edge color
    #[serde(default)]
    pub color: Option<String>,
    /// Explicit line opacity
    #[serde(default)]
    pub opacity: Option<f32>,
}

/// Delete one dependency edge
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveDependency {
    /// Edge id
    pub id: String,
}

/// One host mutation, tagged by its `type` field
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HostCommand {
    /// Create an entity
    AddObject(AddObject),
    /// Delete an entity
    RemoveObject(RemoveObject),
    /// Move an entity
    UpdateObjectPosition(UpdateObjectPosition),
    /// Create a dependency edge
    AddDependency(AddDependency),
    /// Delete a dependency edge
    RemoveDependency(RemoveDependency),
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_add_object_full_payload() {
        let json = r##"{
            "type": "addObject",
            "id": "src/parser.rs",
            "kind": "file",
            "filePath": "src/parser.rs",
            "position": {"x": 12.0, "y": 0.0, "z": -4.5},
            "color": "#4ec9b0",
            "size": {"width": 3.0, "height": 9.0, "depth": 3.0},
            "metadata": {"language": "rust"},
            "description": "Recursive descent parser",
            "descriptionStatus": "generated",
            "descriptionLastUpdated": 1724457600000
        }"##;

        let command: HostCommand = serde_json::from_str(json).expect("valid command");
        let HostCommand::AddObject(add) = command else {
            panic!("expected addObject");
        };

        assert_eq!(add.id, "src/parser.rs");
        assert_eq!(add.kind, EntityKind::File);
        assert_eq!(add.file_path, "src/parser.rs");
        assert_relative_eq!(add.position.z, -4.5);
        assert_eq!(add.color.as_deref(), Some("#4ec9b0"));
        assert_relative_eq!(add.size.unwrap().height, 9.0);
        assert_eq!(add.metadata.get("language").map(String::as_str), Some("rust"));
        assert_eq!(add.description_status.as_deref(), Some("generated"));
        assert_eq!(add.description_last_updated, Some(1_724_457_600_000));
    }

    #[test]
    fn test_add_object_minimal_payload() {
        let json = r#"{
            "type": "addObject",
            "id": "m",
            "kind": "module",
            "filePath": "src/net",
            "position": {"x": 0, "y": 0, "z": 0}
        }"#;

        let HostCommand::AddObject(add) = serde_json::from_str(json).expect("valid command")
        else {
            panic!("expected addObject");
        };

        assert!(add.color.is_none());
        assert!(add.size.is_none());
        assert!(add.metadata.is_empty());
        assert!(add.description.is_none());
        assert!(add.description_last_updated.is_none());
    }

    #[test]
    fn test_add_dependency_defaults() {
        let json = r#"{
            "type": "addDependency",
            "id": "e1",
            "source": "a",
            "target": "b",
            "kind": "import"
        }"#;

        let HostCommand::AddDependency(dep) = serde_json::from_str(json).expect("valid command")
        else {
            panic!("expected addDependency");
        };

        assert_eq!(dep.kind, EdgeKind::Import);
        assert!(dep.weight.is_none());
        assert!(!dep.is_circular);
        assert!(dep.import_variant.is_none());
        assert!(dep.opacity.is_none());
    }

    #[test]
    fn test_add_dependency_full_payload() {
        let json = r##"{
            "type": "addDependency",
            "id": "e2",
            "source": "a",
            "target": "b",
            "kind": "import",
            "weight": 4,
            "isCircular": true,
            "importVariant": "type",
            "color": "#ff0000",
            "opacity": 0.5
        }"##;

        let HostCommand::AddDependency(dep) = serde_json::from_str(json).expect("valid command")
        else {
            panic!("expected addDependency");
        };

        assert_eq!(dep.weight, Some(4));
        assert!(dep.is_circular);
        assert_eq!(dep.import_variant, Some(ImportVariant::Type));
        assert_eq!(dep.color.as_deref(), Some("#ff0000"));
        assert_relative_eq!(dep.opacity.unwrap(), 0.5);
    }

    #[test]
    fn test_batch_dispatches_on_tag() {
        let json = r#"[
            {"type": "addObject", "id": "a", "kind": "class",
             "filePath": "src/a.rs", "position": {"x": 0, "y": 0, "z": 0}},
            {"type": "updateObjectPosition", "id": "a",
             "position": {"x": 5, "y": 0, "z": 5}},
            {"type": "removeDependency", "id": "e9"}
        ]"#;

        let batch: Vec<HostCommand> = serde_json::from_str(json).expect("valid batch");
        assert_eq!(batch.len(), 3);
        assert!(matches!(batch[0], HostCommand::AddObject(_)));
        assert!(matches!(batch[1], HostCommand::UpdateObjectPosition(_)));
        assert!(matches!(batch[2], HostCommand::RemoveDependency(_)));
    }

    #[test]
    fn test_unknown_tag_rejected() {
        let json = r#"{"type": "teleportObject", "id": "a"}"#;
        assert!(serde_json::from_str::<HostCommand>(json).is_err());
    }

    #[test]
    fn test_serialized_keys_are_camel_case() {
        let command = HostCommand::AddObject(AddObject {
            id: "a".to_string(),
            kind: EntityKind::Function,
            file_path: "src/a.rs".to_string(),
            position: Position { x: 1.0, y: 2.0, z: 3.0 },
            color: None,
            size: None,
            metadata: HashMap::new(),
            description: None,
            description_status: Some("pending".to_string()),
            description_last_updated: None,
        });

        let value = serde_json::to_value(&command).expect("serializable");
        assert_eq!(value["type"], "addObject");
        assert_eq!(value["kind"], "function");
        assert_eq!(value["filePath"], "src/a.rs");
        assert_eq!(value["descriptionStatus"], "pending");

        let dep = HostCommand::AddDependency(AddDependency {
            id: "e".to_string(),
            source: "a".to_string(),
            target: "b".to_string(),
            kind: EdgeKind::Extends,
            weight: None,
            is_circular: true,
            import_variant: None,
            color: None,
            opacity: None,
        });
        let value = serde_json::to_value(&dep).expect("serializable");
        assert_eq!(value["type"], "addDependency");
        assert_eq!(value["isCircular"], true);
    }

    #[test]
    fn test_position_converts_to_vec3() {
        let position = Position { x: 1.0, y: 2.0, z: 3.0 };
        let v: Vec3 = position.into();
        assert_relative_eq!(v.x, 1.0);
        assert_relative_eq!(v.y, 2.0);
        assert_relative_eq!(v.z, 3.0);
    }
}
