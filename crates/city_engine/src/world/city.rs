//! City world facade
//!
//! Single entry point hosts talk to. Owns every subsystem and threads them
//! through each other per call, so one `&mut CityWorld` drives the whole
//! world without interior mutability or globals.
//!
//! # Architecture
//!
//! ```text
//! CityWorld
//!     ├── Scene            (host-provided attachment point)
//!     ├── DrawableFactory  (host-provided detail and edge builder)
//!     ├── EntityRegistry   (entities, instance pool, LOD, restyle queue)
//!     └── DependencyGraph  (edges, ports, per-entity stats)
//! ```
//!
//! Host commands are applied between render ticks. Every command failure is
//! consumed here and logged; nothing propagates into the tick.

use crate::commands::{
    AddDependency, AddObject, HostCommand, RemoveDependency, RemoveObject, UpdateObjectPosition,
};
use crate::config::WorldConfig;
use crate::foundation::color::Color;
use crate::foundation::math::Vec3;
use crate::graph::{DependencyEdge, DependencyGraph, EdgeFilter, EntityStats};
use crate::render::InstanceData;
use crate::scene::{DrawableFactory, Scene, SimpleDrawableFactory, SimpleScene};

use super::entity::{EntityMetadata, EntitySpawn};
use super::error::WorldError;
use super::registry::EntityRegistry;
use super::theme::Theme;

/// The complete city: entities, dependencies, and the host protocol
pub struct CityWorld<S: Scene, F: DrawableFactory> {
    scene: S,
    factory: F,
    registry: EntityRegistry,
    graph: DependencyGraph,
}

impl<S: Scene, F: DrawableFactory> CityWorld<S, F> {
    /// Create a world around host-provided scene and factory backends
    pub fn new(config: &WorldConfig, scene: S, factory: F) -> Self {
        log::info!("Creating city world");
        Self {
            scene,
            factory,
            registry: EntityRegistry::new(config),
            graph: DependencyGraph::new(),
        }
    }

    /// Apply one host command
    ///
    /// Failures are logged and consumed; callers never see an error. The
    /// world is left exactly as it was before a rejected command.
    pub fn apply(&mut self, command: HostCommand) {
        let result = match command {
            HostCommand::AddObject(cmd) => self.add_object(cmd),
            HostCommand::RemoveObject(cmd) => self.remove_object(cmd),
            HostCommand::UpdateObjectPosition(cmd) => self.update_object_position(cmd),
            HostCommand::AddDependency(cmd) => self.add_dependency(cmd),
            HostCommand::RemoveDependency(cmd) => self.remove_dependency(cmd),
        };
        if let Err(error) = result {
            log::error!("Host command rejected: {}", error);
        }
    }

    /// Parse and apply one JSON-encoded host command
    pub fn apply_json(&mut self, json: &str) {
        match serde_json::from_str::<HostCommand>(json) {
            Ok(command) => self.apply(command),
            Err(error) => log::error!("Unparseable host command: {}", error),
        }
    }

    /// Advance the world one render tick
    ///
    /// Runs the throttled detail pass for the given viewer position, then
    /// drains budgeted restyle work. Safe to call every frame.
    pub fn tick(&mut self, viewer: Vec3) {
        self.registry
            .update_lod(viewer, &mut self.factory, &mut self.scene);
        self.registry.drain_restyle(&mut self.factory);
    }

    /// Switch the palette and queue a restyle of every themed entity
    ///
    /// Existing edges keep the style captured when they were added; only
    /// edges created after the switch pick up the new palette.
    pub fn set_theme(&mut self, theme: Theme) {
        self.registry.apply_theme(theme);
    }

    /// Remove every entity and edge, releasing all GPU-facing resources
    pub fn clear(&mut self) {
        self.graph.clear(&mut self.factory, &mut self.scene);
        self.registry.clear(&mut self.factory, &mut self.scene);
    }

    /// Number of live entities
    pub fn entity_count(&self) -> usize {
        self.registry.entity_count()
    }

    /// Number of live edges
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Number of distinct circular dependencies
    pub fn circular_edge_count(&self) -> usize {
        self.graph.circular_edge_count()
    }

    /// Dependency statistics for one entity
    pub fn stats_for(&self, id: &str) -> EntityStats {
        self.graph.stats_for(id)
    }

    /// Number of edges matching a filter
    pub fn count_matching(&self, filter: EdgeFilter) -> usize {
        self.graph.count_matching(filter)
    }

    /// Instance buffer for upload by the host renderer
    pub fn instance_data(&self) -> &[InstanceData] {
        self.registry.instance_data()
    }

    /// The entity registry
    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    /// The dependency graph
    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// The scene backend
    pub fn scene(&self) -> &S {
        &self.scene
    }

    /// The drawable factory backend
    pub fn factory(&self) -> &F {
        &self.factory
    }

    fn add_object(&mut self, command: AddObject) -> Result<(), WorldError> {
        let color = parse_color(command.color.as_deref(), &command.id);
        self.registry.add_entity(EntitySpawn {
            id: command.id,
            kind: command.kind,
            position: command.position.into(),
            size: command.size,
            color,
            metadata: EntityMetadata {
                file_path: command.file_path,
                description: command.description,
                description_status: command.description_status,
                description_last_updated: command.description_last_updated,
                tags: command.metadata,
            },
        })
    }

    // Edges referencing the removed entity stay in the graph as dangling
    // edges; the host deletes them explicitly when it wants them gone.
    fn remove_object(&mut self, command: RemoveObject) -> Result<(), WorldError> {
        self.registry
            .remove_entity(&command.id, &mut self.factory, &mut self.scene)
    }

    fn update_object_position(&mut self, command: UpdateObjectPosition) -> Result<(), WorldError> {
        self.registry
            .update_position(&command.id, command.position.into(), &mut self.factory)?;
        self.graph.update_for_moved_entity(
            &command.id,
            &self.registry,
            &mut self.factory,
            &mut self.scene,
        );
        Ok(())
    }

    fn add_dependency(&mut self, command: AddDependency) -> Result<(), WorldError> {
        let override_color = parse_color(command.color.as_deref(), &command.id);
        let edge = DependencyEdge {
            id: command.id,
            source: command.source,
            target: command.target,
            kind: command.kind,
            weight: command.weight.unwrap_or(1).max(1),
            is_circular: command.is_circular,
            import_variant: command.import_variant.unwrap_or_default(),
        };
        let style = self
            .registry
            .theme()
            .edge_style(&edge, override_color, command.opacity);
        self.graph
            .add_edge(edge, style, &self.registry, &mut self.factory, &mut self.scene)
    }

    fn remove_dependency(&mut self, command: RemoveDependency) -> Result<(), WorldError> {
        self.graph
            .remove_edge(&command.id, &mut self.factory, &mut self.scene)
    }
}

impl CityWorld<SimpleScene, SimpleDrawableFactory> {
    /// World wired to the built-in bookkeeping backends
    ///
    /// Useful for tests and for hosts that only need the simulation side.
    pub fn with_simple_backend(config: &WorldConfig) -> Self {
        Self::new(config, SimpleScene::new(), SimpleDrawableFactory::new())
    }
}

/// Parse an optional CSS hex color, warning and falling back on failure
fn parse_color(hex: Option<&str>, owner: &str) -> Option<Color> {
    let hex = hex?;
    let parsed = Color::from_hex(hex);
    if parsed.is_none() {
        log::warn!(
            "Unparseable color '{}' on '{}', falling back to theme",
            hex,
            owner
        );
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Position;
    use crate::graph::EdgeKind;
    use crate::world::entity::EntityKind;
    use approx::assert_relative_eq;
    use std::collections::HashMap;

    fn world() -> CityWorld<SimpleScene, SimpleDrawableFactory> {
        let config = WorldConfig {
            pool_capacity: 64,
            // Disable throttling so every tick runs a detail pass.
            lod_interval_ms: 0,
            ..WorldConfig::default()
        };
        CityWorld::with_simple_backend(&config)
    }

    fn add_object(id: &str, x: f32, z: f32) -> HostCommand {
        HostCommand::AddObject(AddObject {
            id: id.to_string(),
            kind: EntityKind::File,
            file_path: format!("src/{}.rs", id),
            position: Position { x, y: 0.0, z },
            color: None,
            size: None,
            metadata: HashMap::new(),
            description: None,
            description_status: None,
            description_last_updated: None,
        })
    }

    fn add_dependency(id: &str, source: &str, target: &str) -> HostCommand {
        HostCommand::AddDependency(AddDependency {
            id: id.to_string(),
            source: source.to_string(),
            target: target.to_string(),
            kind: EdgeKind::Import,
            weight: None,
            is_circular: false,
            import_variant: None,
            color: None,
            opacity: None,
        })
    }

    #[test]
    fn test_add_object_from_json_carries_metadata() {
        let mut world = world();
        world.apply_json(
            r##"{
                "type": "addObject",
                "id": "src/parser.rs",
                "kind": "file",
                "filePath": "src/parser.rs",
                "position": {"x": 4.0, "y": 0.0, "z": -2.0},
                "color": "#4ec9b0",
                "description": "Recursive descent parser"
            }"##,
        );

        assert_eq!(world.entity_count(), 1);
        let entity = world.registry().entity("src/parser.rs").unwrap();
        assert!(entity.has_explicit_color());
        assert_relative_eq!(entity.color().r, 78.0 / 255.0, epsilon = 1e-6);
        assert_eq!(entity.metadata().file_path, "src/parser.rs");
        assert_eq!(
            entity.metadata().description.as_deref(),
            Some("Recursive descent parser")
        );
    }

    #[test]
    fn test_bad_color_falls_back_to_theme() {
        let mut world = world();
        let mut command = add_object("a", 0.0, 0.0);
        if let HostCommand::AddObject(ref mut add) = command {
            add.color = Some("#nothex".to_string());
        }
        world.apply(command);

        let entity = world.registry().entity("a").unwrap();
        assert!(!entity.has_explicit_color());
        assert_eq!(entity.color(), Theme::default().file);
    }

    #[test]
    fn test_duplicate_add_is_consumed() {
        let mut world = world();
        world.apply(add_object("a", 0.0, 0.0));
        world.apply(add_object("a", 9.0, 9.0));

        assert_eq!(world.entity_count(), 1);
        // The original position survives the rejected duplicate.
        assert_relative_eq!(world.registry().entity("a").unwrap().position().x, 0.0);
    }

    #[test]
    fn test_dependency_wiring_and_stats() {
        let mut world = world();
        world.apply(add_object("a", 0.0, 0.0));
        world.apply(add_object("b", 20.0, 0.0));
        world.apply(add_dependency("e1", "a", "b"));

        assert_eq!(world.edge_count(), 1);
        assert_eq!(world.stats_for("a").outgoing, 1);
        assert_eq!(world.stats_for("b").incoming, 1);
        assert_eq!(world.count_matching(EdgeFilter::IMPORT), 1);
        // One drawable was built for the edge line.
        assert_eq!(world.factory().built_count(), 1);
    }

    #[test]
    fn test_dangling_dependency_is_consumed() {
        let mut world = world();
        world.apply(add_object("a", 0.0, 0.0));
        world.apply(add_dependency("e1", "a", "ghost"));

        assert_eq!(world.edge_count(), 0);
        assert_eq!(world.factory().built_count(), 0);
    }

    #[test]
    fn test_move_rebuilds_touching_edges() {
        let mut world = world();
        world.apply(add_object("a", 0.0, 0.0));
        world.apply(add_object("b", 20.0, 0.0));
        world.apply(add_dependency("e1", "a", "b"));

        world.apply(HostCommand::UpdateObjectPosition(UpdateObjectPosition {
            id: "a".to_string(),
            position: Position { x: -15.0, y: 0.0, z: 5.0 },
        }));

        let entity = world.registry().entity("a").unwrap();
        assert_relative_eq!(entity.position().x, -15.0);
        // The edge drawable was torn down and rebuilt at the new anchors.
        assert_eq!(world.factory().disposed_count(), 1);
        assert_eq!(world.factory().built_count(), 2);
        assert_eq!(world.factory().live_count(), 1);
        assert_eq!(world.edge_count(), 1);
    }

    #[test]
    fn test_remove_object_leaves_edges_dangling() {
        let mut world = world();
        world.apply(add_object("a", 0.0, 0.0));
        world.apply(add_object("b", 20.0, 0.0));
        world.apply(add_dependency("e1", "a", "b"));

        world.apply(HostCommand::RemoveObject(RemoveObject {
            id: "b".to_string(),
        }));

        assert_eq!(world.entity_count(), 1);
        assert_eq!(world.edge_count(), 1);

        // Moving the surviving endpoint keeps the dangling edge with its
        // stale geometry instead of deleting or rebuilding it.
        world.apply(HostCommand::UpdateObjectPosition(UpdateObjectPosition {
            id: "a".to_string(),
            position: Position { x: 3.0, y: 0.0, z: 3.0 },
        }));
        assert_eq!(world.edge_count(), 1);
        assert_eq!(world.factory().disposed_count(), 0);
    }

    #[test]
    fn test_remove_dependency_disposes_drawable() {
        let mut world = world();
        world.apply(add_object("a", 0.0, 0.0));
        world.apply(add_object("b", 20.0, 0.0));
        world.apply(add_dependency("e1", "a", "b"));

        world.apply(HostCommand::RemoveDependency(RemoveDependency {
            id: "e1".to_string(),
        }));

        assert_eq!(world.edge_count(), 0);
        assert_eq!(world.factory().live_count(), 0);
        assert_eq!(world.stats_for("a").outgoing, 0);
    }

    #[test]
    fn test_circular_dependency_counting() {
        let mut world = world();
        world.apply(add_object("a", 0.0, 0.0));
        world.apply(add_object("b", 20.0, 0.0));

        for (id, source, target) in [("e1", "a", "b"), ("e2", "b", "a")] {
            world.apply(HostCommand::AddDependency(AddDependency {
                id: id.to_string(),
                source: source.to_string(),
                target: target.to_string(),
                kind: EdgeKind::Import,
                weight: None,
                is_circular: true,
                import_variant: None,
                color: None,
                opacity: None,
            }));
        }

        // Two flagged halves are one circular dependency.
        assert_eq!(world.circular_edge_count(), 1);
    }

    #[test]
    fn test_tick_promotes_and_demotes() {
        let mut world = world();
        world.apply(add_object("a", 0.0, 0.0));
        let home = world.registry().entity("a").unwrap().position();

        world.tick(home);
        assert!(world.registry().entity("a").unwrap().is_promoted());
        assert_eq!(world.scene().attached_count(), 1);

        world.tick(home + Vec3::new(100.0, 0.0, 0.0));
        assert!(world.registry().entity("a").unwrap().is_instanced());
        assert_eq!(world.scene().attached_count(), 0);
    }

    #[test]
    fn test_set_theme_restyles_entities_only() {
        let mut world = world();
        world.apply(add_object("a", 0.0, 0.0));
        world.apply(add_object("b", 20.0, 0.0));
        world.apply(add_dependency("e1", "a", "b"));

        let theme = Theme {
            file: Color::rgb(1.0, 0.2, 0.2),
            ..Theme::default()
        };
        world.set_theme(theme);
        let far_away = Vec3::new(500.0, 0.0, 500.0);
        while world.registry().pending_restyle_count() > 0 {
            world.tick(far_away);
        }

        assert_relative_eq!(world.registry().entity("a").unwrap().color().r, 1.0);
        // The edge kept its captured style: never disposed, never rebuilt.
        assert_eq!(world.factory().disposed_count(), 0);
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut world = world();
        world.apply(add_object("a", 0.0, 0.0));
        world.apply(add_object("b", 20.0, 0.0));
        world.apply(add_dependency("e1", "a", "b"));
        let home = world.registry().entity("a").unwrap().position();
        world.tick(home);

        world.clear();

        assert_eq!(world.entity_count(), 0);
        assert_eq!(world.edge_count(), 0);
        assert_eq!(world.factory().live_count(), 0);
        assert_eq!(world.scene().attached_count(), 0);
    }

    #[test]
    fn test_malformed_json_is_consumed() {
        let mut world = world();
        world.apply_json("not json at all");
        world.apply_json(r#"{"type": "addObject"}"#);
        assert_eq!(world.entity_count(), 0);
    }
}
