//! Directed dependency multigraph with incremental statistics
//!
//! Edges reference entities by id only; the graph never owns or borrows an
//! entity. Endpoint positions resolve through [`EntityLookup`] at the moment
//! geometry is needed, so a dangling id degrades to a failed lookup instead of
//! a dangling pointer.
//!
//! # Architecture
//!
//! ```text
//! DependencyGraph
//!         ├── edges  (edge id → record: edge, style, drawable, ports)
//!         ├── stats  (entity id → outgoing/incoming/circular partners)
//!         └── circular tally (flagged edges, reported as matched pairs)
//! ```
//!
//! Statistics are maintained incrementally on insert/remove, never recomputed
//! by scanning, so per-entity queries stay O(1) at any graph size.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::foundation::color::Color;
use crate::foundation::math::Vec3;
use crate::scene::{DrawableFactory, DrawableHandle, EdgeLine, Scene};
use crate::world::WorldError;

/// Ports per grid row on an entity's roof
const PORTS_PER_ROW: usize = 4;

/// Grid rows before port positions repeat
const PORT_ROWS: usize = 4;

/// World-space spacing between adjacent ports
const PORT_SPACING: f32 = 0.35;

/// Kind of relationship an edge represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    /// Module import
    Import,
    /// Class inheritance
    Extends,
    /// Function call
    Calls,
}

/// Cosmetic flavor of an import edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportVariant {
    /// Ordinary value import
    Value,
    /// Type-only import, rendered dashed
    Type,
    /// Re-export
    Reexport,
}

impl Default for ImportVariant {
    fn default() -> Self {
        Self::Value
    }
}

/// One directed dependency between two entities
///
/// `source` and `target` are entity ids, not references; they are allowed to
/// stop resolving after the edge exists.
#[derive(Debug, Clone)]
pub struct DependencyEdge {
    /// Unique edge id
    pub id: String,
    /// Id of the depending entity
    pub source: String,
    /// Id of the depended-upon entity
    pub target: String,
    /// Relationship kind
    pub kind: EdgeKind,
    /// Positive weight, drives line width
    pub weight: u32,
    /// Circular flag supplied by upstream analysis; the graph only tallies it
    pub is_circular: bool,
    /// Cosmetic import flavor
    pub import_variant: ImportVariant,
}

/// Resolved styling for one edge drawable
///
/// Captured at insertion so rebuilds after an endpoint moves reproduce the
/// same look without consulting the theme again.
#[derive(Debug, Clone, Copy)]
pub struct EdgeStyle {
    /// Line color, alpha included
    pub color: Color,
    /// Line width
    pub width: f32,
    /// Dashed rendering
    pub dashed: bool,
}

/// World-space anchor of an entity for edge attachment
#[derive(Debug, Clone, Copy)]
pub struct EdgeAnchor {
    /// Visual center of the entity
    pub position: Vec3,
    /// Visual height of the entity
    pub height: f32,
}

/// Resolves entity ids to world-space anchors
///
/// Implemented by the entity registry; the graph stays ignorant of how
/// entities are stored.
pub trait EntityLookup {
    /// Anchor for an entity id, `None` when the id does not resolve
    fn anchor(&self, id: &str) -> Option<EdgeAnchor>;
}

bitflags::bitflags! {
    /// Mask selecting edge kinds, with an optional circular-only restriction
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct EdgeFilter: u8 {
        /// Import edges
        const IMPORT = 1 << 0;
        /// Extends edges
        const EXTENDS = 1 << 1;
        /// Calls edges
        const CALLS = 1 << 2;
        /// Restrict matches to circular-flagged edges
        const CIRCULAR_ONLY = 1 << 3;
        /// Every edge kind, no circular restriction
        const ALL_KINDS = Self::IMPORT.bits() | Self::EXTENDS.bits() | Self::CALLS.bits();
    }
}

impl EdgeFilter {
    /// Filter matching exactly one edge kind
    pub fn for_kind(kind: EdgeKind) -> Self {
        match kind {
            EdgeKind::Import => Self::IMPORT,
            EdgeKind::Extends => Self::EXTENDS,
            EdgeKind::Calls => Self::CALLS,
        }
    }

    fn matches(self, edge: &DependencyEdge) -> bool {
        if !self.contains(Self::for_kind(edge.kind)) {
            return false;
        }
        if self.contains(Self::CIRCULAR_ONLY) && !edge.is_circular {
            return false;
        }
        true
    }
}

/// Per-entity edge statistics, derived view
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityStats {
    /// Edges with this entity as source
    pub outgoing: usize,
    /// Edges with this entity as target
    pub incoming: usize,
    /// Opposite endpoints of circular edges touching this entity, sorted
    pub circular_partners: Vec<String>,
}

/// Everything stored per live edge
#[derive(Debug)]
struct EdgeRecord {
    edge: DependencyEdge,
    style: EdgeStyle,
    drawable: DrawableHandle,
    source_port: usize,
    target_port: usize,
}

/// Incrementally maintained counters for one entity id
///
/// Circular partners are refcounted: two circular edges to the same partner
/// keep the partner listed until both are gone.
#[derive(Debug, Default)]
struct StatsRecord {
    outgoing: usize,
    incoming: usize,
    circular_partners: HashMap<String, usize>,
}

impl StatsRecord {
    fn is_empty(&self) -> bool {
        self.outgoing == 0 && self.incoming == 0 && self.circular_partners.is_empty()
    }
}

/// World-space position of a port on an entity's roof grid
///
/// Ports spread edge endpoints across a small grid offset from the entity's
/// top center so parallel edges stay distinguishable. Positions repeat after
/// 16 ports.
fn port_position(anchor: EdgeAnchor, port: usize) -> Vec3 {
    let slot = port % (PORTS_PER_ROW * PORT_ROWS);
    let col = (slot % PORTS_PER_ROW) as f32;
    let row = (slot / PORTS_PER_ROW) as f32;
    let centering = (PORTS_PER_ROW as f32 - 1.0) / 2.0;

    Vec3::new(
        anchor.position.x + (col - centering) * PORT_SPACING,
        anchor.position.y + anchor.height / 2.0,
        anchor.position.z + (row - centering) * PORT_SPACING,
    )
}

/// Directed multigraph of dependency edges keyed by edge id
#[derive(Debug, Default)]
pub struct DependencyGraph {
    edges: HashMap<String, EdgeRecord>,
    stats: HashMap<String, StatsRecord>,
    circular_flagged: usize,
}

impl DependencyGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an edge, building and attaching its drawable
    ///
    /// Both endpoints must resolve; otherwise the edge is dropped with a
    /// warning and nothing changes. A dropped edge is not retried: a later
    /// entity addition does not resurrect it. Inserting an id that already
    /// exists replaces the previous edge, drawable included.
    ///
    /// Port indices come from the endpoint counters at insertion time: the
    /// source port is the source's prior outgoing count, the target port the
    /// target's prior incoming count.
    pub fn add_edge(
        &mut self,
        edge: DependencyEdge,
        style: EdgeStyle,
        lookup: &impl EntityLookup,
        factory: &mut impl DrawableFactory,
        scene: &mut impl Scene,
    ) -> Result<(), WorldError> {
        let Some(source_anchor) = lookup.anchor(&edge.source) else {
            log::warn!(
                "Edge '{}' dropped: source entity '{}' does not exist",
                edge.id,
                edge.source
            );
            return Err(WorldError::DanglingEndpoint {
                edge: edge.id,
                endpoint: edge.source,
            });
        };
        let Some(target_anchor) = lookup.anchor(&edge.target) else {
            log::warn!(
                "Edge '{}' dropped: target entity '{}' does not exist",
                edge.id,
                edge.target
            );
            return Err(WorldError::DanglingEndpoint {
                edge: edge.id,
                endpoint: edge.target,
            });
        };

        if let Some(previous) = self.edges.remove(&edge.id) {
            log::debug!("Edge '{}' replaced", edge.id);
            scene.detach(previous.drawable);
            factory.dispose(previous.drawable);
            self.decrement_stats(&previous.edge);
        }

        self.insert_record(edge, style, source_anchor, target_anchor, factory, scene);
        Ok(())
    }

    /// Remove an edge, detaching and disposing its drawable
    ///
    /// Port indices of surviving edges are never repacked.
    pub fn remove_edge(
        &mut self,
        id: &str,
        factory: &mut impl DrawableFactory,
        scene: &mut impl Scene,
    ) -> Result<(), WorldError> {
        let Some(record) = self.edges.remove(id) else {
            log::debug!("Remove of unknown edge '{}'", id);
            return Err(WorldError::NotFound(id.to_string()));
        };

        scene.detach(record.drawable);
        factory.dispose(record.drawable);
        self.decrement_stats(&record.edge);
        Ok(())
    }

    /// Rebuild the geometry of every edge touching a moved entity
    ///
    /// Edge ids, kinds, weights, flags, and styles are preserved; ports are
    /// reassigned from current counters. An edge whose other endpoint no
    /// longer resolves keeps its stale geometry rather than being deleted.
    /// Returns the number of edges rebuilt.
    pub fn update_for_moved_entity(
        &mut self,
        id: &str,
        lookup: &impl EntityLookup,
        factory: &mut impl DrawableFactory,
        scene: &mut impl Scene,
    ) -> usize {
        let touching: Vec<String> = self
            .edges
            .values()
            .filter(|record| record.edge.source == id || record.edge.target == id)
            .map(|record| record.edge.id.clone())
            .collect();

        let mut rebuilt = 0;
        for edge_id in touching {
            let Some((source, target)) = self
                .edges
                .get(&edge_id)
                .map(|record| (record.edge.source.clone(), record.edge.target.clone()))
            else {
                continue;
            };

            let (Some(source_anchor), Some(target_anchor)) =
                (lookup.anchor(&source), lookup.anchor(&target))
            else {
                log::debug!(
                    "Edge '{}' kept with stale geometry: an endpoint no longer resolves",
                    edge_id
                );
                continue;
            };

            if let Some(record) = self.edges.remove(&edge_id) {
                scene.detach(record.drawable);
                factory.dispose(record.drawable);
                self.decrement_stats(&record.edge);
                self.insert_record(
                    record.edge,
                    record.style,
                    source_anchor,
                    target_anchor,
                    factory,
                    scene,
                );
                rebuilt += 1;
            }
        }

        log::trace!("Rebuilt {} edges for moved entity '{}'", rebuilt, id);
        rebuilt
    }

    /// Per-entity statistics, O(1) from maintained counters
    pub fn stats_for(&self, id: &str) -> EntityStats {
        self.stats.get(id).map_or_else(EntityStats::default, |record| {
            let mut partners: Vec<String> = record.circular_partners.keys().cloned().collect();
            partners.sort();
            EntityStats {
                outgoing: record.outgoing,
                incoming: record.incoming,
                circular_partners: partners,
            }
        })
    }

    /// Rough count of circular dependencies
    ///
    /// Counts circular-flagged edges and halves the tally, assuming cycles
    /// arrive as matched pairs of opposite-direction edges. Cycles through
    /// three or more entities are under-counted; treat this as a coarse
    /// signal, not an exact cycle count.
    pub fn circular_edge_count(&self) -> usize {
        self.circular_flagged / 2
    }

    /// Number of edges matching a filter
    pub fn count_matching(&self, filter: EdgeFilter) -> usize {
        self.edges
            .values()
            .filter(|record| filter.matches(&record.edge))
            .count()
    }

    /// Ids of edges matching a filter, sorted
    pub fn edge_ids_matching(&self, filter: EdgeFilter) -> Vec<String> {
        let mut ids: Vec<String> = self
            .edges
            .values()
            .filter(|record| filter.matches(&record.edge))
            .map(|record| record.edge.id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Total number of edges
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Whether an edge with this id exists
    pub fn contains_edge(&self, id: &str) -> bool {
        self.edges.contains_key(id)
    }

    /// The edge stored under an id
    pub fn edge(&self, id: &str) -> Option<&DependencyEdge> {
        self.edges.get(id).map(|record| &record.edge)
    }

    /// Roof-grid port indices assigned to an edge at insertion
    pub fn edge_ports(&self, id: &str) -> Option<(usize, usize)> {
        self.edges
            .get(id)
            .map(|record| (record.source_port, record.target_port))
    }

    /// Remove every edge and all derived statistics
    pub fn clear(&mut self, factory: &mut impl DrawableFactory, scene: &mut impl Scene) {
        let count = self.edges.len();
        for (_, record) in self.edges.drain() {
            scene.detach(record.drawable);
            factory.dispose(record.drawable);
        }
        self.stats.clear();
        self.circular_flagged = 0;
        log::info!("Cleared dependency graph ({} edges)", count);
    }

    fn insert_record(
        &mut self,
        edge: DependencyEdge,
        style: EdgeStyle,
        source_anchor: EdgeAnchor,
        target_anchor: EdgeAnchor,
        factory: &mut impl DrawableFactory,
        scene: &mut impl Scene,
    ) {
        let source_port = self.stats.get(&edge.source).map_or(0, |s| s.outgoing);
        let target_port = self.stats.get(&edge.target).map_or(0, |s| s.incoming);

        let line = EdgeLine {
            from: port_position(source_anchor, source_port),
            to: port_position(target_anchor, target_port),
            width: style.width,
            color: style.color,
            dashed: style.dashed,
        };
        let drawable = factory.build_edge(&line);
        scene.attach(drawable);

        self.stats.entry(edge.source.clone()).or_default().outgoing += 1;
        self.stats.entry(edge.target.clone()).or_default().incoming += 1;
        if edge.is_circular {
            self.circular_flagged += 1;
            *self
                .stats
                .entry(edge.source.clone())
                .or_default()
                .circular_partners
                .entry(edge.target.clone())
                .or_insert(0) += 1;
            *self
                .stats
                .entry(edge.target.clone())
                .or_default()
                .circular_partners
                .entry(edge.source.clone())
                .or_insert(0) += 1;
        }

        log::trace!(
            "Edge '{}' inserted: {} -> {} (ports {}/{})",
            edge.id,
            edge.source,
            edge.target,
            source_port,
            target_port
        );
        self.edges.insert(
            edge.id.clone(),
            EdgeRecord {
                edge,
                style,
                drawable,
                source_port,
                target_port,
            },
        );
    }

    fn decrement_stats(&mut self, edge: &DependencyEdge) {
        if let Some(record) = self.stats.get_mut(&edge.source) {
            record.outgoing = record.outgoing.saturating_sub(1);
        }
        if let Some(record) = self.stats.get_mut(&edge.target) {
            record.incoming = record.incoming.saturating_sub(1);
        }
        if edge.is_circular {
            self.circular_flagged = self.circular_flagged.saturating_sub(1);
            Self::drop_partner(&mut self.stats, &edge.source, &edge.target);
            Self::drop_partner(&mut self.stats, &edge.target, &edge.source);
        }
        self.prune(&edge.source);
        self.prune(&edge.target);
    }

    fn drop_partner(stats: &mut HashMap<String, StatsRecord>, owner: &str, partner: &str) {
        if let Some(record) = stats.get_mut(owner) {
            if let Some(count) = record.circular_partners.get_mut(partner) {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    record.circular_partners.remove(partner);
                }
            }
        }
    }

    fn prune(&mut self, id: &str) {
        if self.stats.get(id).is_some_and(StatsRecord::is_empty) {
            self.stats.remove(id);
        }
    }
}
