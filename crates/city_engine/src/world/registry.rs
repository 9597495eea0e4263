//! Entity registry and proximity state machine
//!
//! Owns every entity and the instance pool exclusively. All mutations are
//! synchronous and single-threaded; mutual exclusion comes from never
//! yielding mid-mutation, so no locking is involved anywhere.
//!
//! # Architecture
//!
//! ```text
//! EntityRegistry
//!         ├── entities      (id → Entity)
//!         ├── InstancePool  (batched far representation)
//!         ├── LOD throttle  (distance pass at most once per interval)
//!         └── restyle queue (theme work drained on a per-tick budget)
//! ```
//!
//! Far entities live in the instance pool; entities close to the viewer are
//! promoted to factory-built full-detail drawables and demoted back when the
//! viewer leaves. The two representations are mutually exclusive by
//! construction (see [`DetailState`]).

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use crate::config::WorldConfig;
use crate::foundation::math::{distance, Vec3};
use crate::foundation::time::{Stopwatch, Throttle};
use crate::graph::{EdgeAnchor, EntityLookup};
use crate::render::{InstancePool, PoolStats};
use crate::scene::{DetailRequest, DrawableFactory, Scene};

use super::entity::{DetailState, Entity, EntityMetadata, EntitySpawn};
use super::error::WorldError;
use super::theme::Theme;

/// Statistics for registry activity
#[derive(Debug, Default, Clone)]
pub struct RegistryStats {
    /// Total promotions to full detail
    pub promotions: u64,
    /// Total demotions back to the instance pool
    pub demotions: u64,
    /// Entities restyled by theme passes
    pub restyled: u64,
    /// Detail-level passes actually run (throttled calls excluded)
    pub lod_passes: u64,
}

/// Owner of all entities and the instance pool
pub struct EntityRegistry {
    /// Entity arena keyed by id
    entities: HashMap<String, Entity>,

    /// Batched representation storage
    pool: InstancePool,

    /// Active palette
    theme: Theme,

    /// Rate limiter for the detail-level pass
    lod_throttle: Throttle,

    /// Distance below which entities promote
    promotion_radius: f32,

    /// Ground plane height
    ground_y: f32,

    /// Minimum visual height for new entities
    min_spawn_height: f32,

    /// Per-tick restyle time budget
    restyle_budget: Duration,

    /// Entity ids awaiting restyle, drained across ticks
    restyle_queue: VecDeque<String>,

    /// Activity statistics
    stats: RegistryStats,
}

impl EntityRegistry {
    /// Create a registry from configuration
    pub fn new(config: &WorldConfig) -> Self {
        log::info!(
            "Creating EntityRegistry with {} instance slots, promotion radius {}",
            config.pool_capacity,
            config.promotion_radius
        );

        Self {
            entities: HashMap::new(),
            pool: InstancePool::new(config.pool_capacity),
            theme: Theme::default(),
            lod_throttle: Throttle::new(Duration::from_millis(config.lod_interval_ms)),
            promotion_radius: config.promotion_radius,
            ground_y: config.ground_y,
            min_spawn_height: config.min_spawn_height,
            restyle_budget: Duration::from_millis(config.restyle_budget_ms),
            restyle_queue: VecDeque::new(),
            stats: RegistryStats::default(),
        }
    }

    /// Create an entity in `Instanced` state
    ///
    /// Fails with `DuplicateId` before touching the pool, and with
    /// `CapacityExceeded` when no slot is free; in both cases nothing is
    /// created. New entities get at least the minimum spawn height and are
    /// lifted so they never sink below the ground plane.
    pub fn add_entity(&mut self, spawn: EntitySpawn) -> Result<(), WorldError> {
        if self.entities.contains_key(&spawn.id) {
            log::warn!("Entity '{}' already exists, addition rejected", spawn.id);
            return Err(WorldError::DuplicateId(spawn.id));
        }

        let mut size = spawn.size.unwrap_or_else(|| spawn.kind.default_size());
        size.height = size.height.max(self.min_spawn_height);

        let mut position = spawn.position;
        position.y = position.y.max(self.ground_y + size.height / 2.0);

        let (color, explicit_color) = match spawn.color {
            Some(color) => (color, true),
            None => (self.theme.entity_color(spawn.kind), false),
        };

        let Some(slot) = self.pool.allocate(&spawn.id) else {
            return Err(WorldError::CapacityExceeded {
                allocated: self.pool.allocated_count(),
                capacity: self.pool.capacity(),
            });
        };
        self.pool.update(slot, position, size.to_scale(), color);

        log::trace!("Added entity '{}' ({:?}) at {:?}", spawn.id, spawn.kind, position);
        self.entities.insert(
            spawn.id.clone(),
            Entity {
                id: spawn.id,
                kind: spawn.kind,
                position,
                size,
                detail: DetailState::Instanced { slot },
                color,
                explicit_color,
                metadata: spawn.metadata,
            },
        );
        Ok(())
    }

    /// Destroy an entity and whichever representation it holds
    ///
    /// Promoted entities release their full-detail handle before deletion; no
    /// slot is ever allocated on this path.
    pub fn remove_entity(
        &mut self,
        id: &str,
        factory: &mut impl DrawableFactory,
        scene: &mut impl Scene,
    ) -> Result<(), WorldError> {
        let Some(entity) = self.entities.remove(id) else {
            log::debug!("Remove of unknown entity '{}'", id);
            return Err(WorldError::NotFound(id.to_string()));
        };

        match entity.detail {
            DetailState::Promoted { handle } => {
                scene.detach(handle);
                factory.dispose(handle);
            }
            DetailState::Instanced { slot } => {
                self.pool.release(slot);
            }
        }

        log::trace!("Removed entity '{}'", id);
        Ok(())
    }

    /// Move an entity, clamping Y to the ground rule
    ///
    /// Writes through to whichever representation is live. The caller is
    /// responsible for rebuilding edges that touch the moved entity.
    pub fn update_position(
        &mut self,
        id: &str,
        position: Vec3,
        factory: &mut impl DrawableFactory,
    ) -> Result<(), WorldError> {
        let Some(entity) = self.entities.get_mut(id) else {
            log::debug!("Position update for unknown entity '{}'", id);
            return Err(WorldError::NotFound(id.to_string()));
        };

        let mut position = position;
        position.y = position.y.max(self.ground_y + entity.size.height / 2.0);
        entity.position = position;

        match entity.detail {
            DetailState::Promoted { handle } => factory.set_transform(handle, position),
            DetailState::Instanced { slot } => {
                self.pool
                    .update(slot, position, entity.size.to_scale(), entity.color);
            }
        }
        Ok(())
    }

    /// Run the distance-driven promotion/demotion pass
    ///
    /// Rate-limited: calls inside the throttle window are complete no-ops, so
    /// calling this every tick is safe at any entity count. Entities already
    /// in their target state are untouched.
    pub fn update_lod(
        &mut self,
        viewer: Vec3,
        factory: &mut impl DrawableFactory,
        scene: &mut impl Scene,
    ) {
        if !self.lod_throttle.ready() {
            return;
        }
        self.stats.lod_passes += 1;

        let mut to_promote = Vec::new();
        let mut to_demote = Vec::new();
        for entity in self.entities.values() {
            let dist = distance(entity.position, viewer);
            match entity.detail {
                DetailState::Instanced { .. } if dist < self.promotion_radius => {
                    to_promote.push(entity.id.clone());
                }
                DetailState::Promoted { .. } if dist >= self.promotion_radius => {
                    to_demote.push(entity.id.clone());
                }
                _ => {}
            }
        }

        if to_promote.is_empty() && to_demote.is_empty() {
            return;
        }
        log::debug!(
            "Detail pass: {} promotions, {} demotions",
            to_promote.len(),
            to_demote.len()
        );

        for id in to_promote {
            self.promote(&id, factory, scene);
        }
        for id in to_demote {
            self.demote(&id, factory, scene);
        }
    }

    /// Switch the active palette and queue a restyle of every themed entity
    ///
    /// Replaces any still-pending restyle queue wholesale; replacement is the
    /// cancellation mechanism. Entities with explicit caller colors are never
    /// queued.
    pub fn apply_theme(&mut self, theme: Theme) {
        self.theme = theme;
        self.restyle_queue = self
            .entities
            .values()
            .filter(|entity| !entity.explicit_color)
            .map(|entity| entity.id.clone())
            .collect();
        log::info!("Queued restyle of {} entities", self.restyle_queue.len());
    }

    /// Work through pending restyles within the per-tick budget
    ///
    /// Each entity is one unit of work and runs to completion before the
    /// budget is checked; this is cooperative chunking, not preemption.
    pub fn drain_restyle(&mut self, factory: &mut impl DrawableFactory) {
        if self.restyle_queue.is_empty() {
            return;
        }

        let watch = Stopwatch::start_new();
        let mut processed = 0;
        while let Some(id) = self.restyle_queue.pop_front() {
            self.restyle_one(&id, factory);
            processed += 1;
            if watch.elapsed() >= self.restyle_budget {
                break;
            }
        }

        log::trace!(
            "Restyled {} entities, {} pending",
            processed,
            self.restyle_queue.len()
        );
    }

    /// Restyle units still waiting to be drained
    pub fn pending_restyle_count(&self) -> usize {
        self.restyle_queue.len()
    }

    /// Read-only view of an entity
    pub fn entity(&self, id: &str) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// Mutable access to the caller-owned metadata bag only
    pub fn metadata_mut(&mut self, id: &str) -> Option<&mut EntityMetadata> {
        self.entities.get_mut(id).map(|entity| &mut entity.metadata)
    }

    /// Iterate over all entities
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Number of live entities
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Whether an entity with this id exists
    pub fn contains(&self, id: &str) -> bool {
        self.entities.contains_key(id)
    }

    /// Instance pool usage statistics
    pub fn pool_stats(&self) -> &PoolStats {
        self.pool.stats()
    }

    /// Full instance buffer view for upload by the host renderer
    pub fn instance_data(&self) -> &[crate::render::InstanceData] {
        self.pool.instance_data()
    }

    /// Registry activity statistics
    pub fn stats(&self) -> &RegistryStats {
        &self.stats
    }

    /// The active palette
    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Destroy every entity and release both representations
    pub fn clear(&mut self, factory: &mut impl DrawableFactory, scene: &mut impl Scene) {
        let count = self.entities.len();
        for entity in self.entities.values() {
            if let DetailState::Promoted { handle } = entity.detail {
                scene.detach(handle);
                factory.dispose(handle);
            }
        }
        self.entities.clear();
        self.pool.clear();
        self.restyle_queue.clear();
        log::info!("Cleared entity registry ({} entities)", count);
    }

    fn promote(&mut self, id: &str, factory: &mut impl DrawableFactory, scene: &mut impl Scene) {
        let Some(entity) = self.entities.get_mut(id) else {
            return;
        };
        let DetailState::Instanced { slot } = entity.detail else {
            return;
        };

        // Hide before releasing so the freed slot cannot draw one stale frame.
        self.pool.set_visible(slot, false);
        self.pool.release(slot);

        let build = factory.build_detail(&DetailRequest {
            id: entity.id.clone(),
            kind: entity.kind,
            position: entity.position,
            size: entity.size,
            color: entity.color,
            metadata: entity.metadata.clone(),
        });

        // Adopt the height the factory actually produced; non-positive
        // reports are ignored. A taller build may push the entity up to keep
        // it above ground.
        if build.height > 0.0 && (build.height - entity.size.height).abs() > f32::EPSILON {
            entity.size.height = build.height;
            let floor_y = self.ground_y + entity.size.height / 2.0;
            if entity.position.y < floor_y {
                entity.position.y = floor_y;
                factory.set_transform(build.handle, entity.position);
            }
        }

        scene.attach(build.handle);
        entity.detail = DetailState::Promoted {
            handle: build.handle,
        };
        self.stats.promotions += 1;
        log::trace!("Promoted entity '{}'", id);
    }

    fn demote(&mut self, id: &str, factory: &mut impl DrawableFactory, scene: &mut impl Scene) {
        let Some(entity) = self.entities.get_mut(id) else {
            return;
        };
        let DetailState::Promoted { handle } = entity.detail else {
            return;
        };

        // Re-acquire the slot before letting go of the detail drawable, so a
        // failure leaves the entity fully promoted instead of representation-
        // less. Cannot fail in practice: the entity count is bounded by the
        // capacity and a promoted entity holds no slot.
        let Some(slot) = self.pool.allocate(&entity.id) else {
            debug_assert!(false, "no free slot while demoting");
            log::error!("No free slot while demoting '{}'; keeping it promoted", id);
            return;
        };

        scene.detach(handle);
        factory.dispose(handle);

        self.pool
            .update(slot, entity.position, entity.size.to_scale(), entity.color);
        entity.detail = DetailState::Instanced { slot };
        self.stats.demotions += 1;
        log::trace!("Demoted entity '{}'", id);
    }

    fn restyle_one(&mut self, id: &str, factory: &mut impl DrawableFactory) {
        let Some(entity) = self.entities.get_mut(id) else {
            // Removed since it was queued.
            return;
        };
        if entity.explicit_color {
            // Re-created with a pinned color since it was queued.
            return;
        }

        let color = self.theme.entity_color(entity.kind);
        entity.color = color;
        match entity.detail {
            DetailState::Instanced { slot } => {
                self.pool
                    .update(slot, entity.position, entity.size.to_scale(), color);
            }
            DetailState::Promoted { handle } => factory.restyle(handle, color),
        }
        self.stats.restyled += 1;
    }
}

impl EntityLookup for EntityRegistry {
    fn anchor(&self, id: &str) -> Option<EdgeAnchor> {
        self.entities.get(id).map(|entity| EdgeAnchor {
            position: entity.position,
            height: entity.size.height,
        })
    }
}
