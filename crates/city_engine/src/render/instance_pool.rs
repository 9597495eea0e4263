//! Fixed-capacity instance slot pool
//!
//! Pre-allocates every slot of the batched draw up front to eliminate runtime
//! allocation and keep render cost predictable regardless of entity count.
//!
//! # Architecture
//!
//! ```text
//! InstancePool
//!         ├── instances  (Vec<InstanceData>, length == capacity, never resized)
//!         ├── owners     (entity id per allocated slot)
//!         └── free stack (released indices, reused before fresh ones)
//!                     ↓
//!            O(1) Allocation/Release
//! ```
//!
//! # Usage
//!
//! ```rust
//! use city_engine::render::InstancePool;
//! use city_engine::foundation::color::Color;
//! use city_engine::foundation::math::Vec3;
//!
//! let mut pool = InstancePool::new(100);
//!
//! let slot = pool.allocate("src/main.rs").expect("pool has room");
//! pool.update(slot, Vec3::new(4.0, 1.0, 0.0), Vec3::new(2.0, 2.0, 2.0), Color::WHITE);
//!
//! // Hidden slots collapse to zero scale; the batched draw skips them.
//! pool.set_visible(slot, false);
//!
//! pool.release(slot);
//! ```

use crate::foundation::color::Color;
use crate::foundation::math::{instance_matrix, Vec3};

/// Zero-scale matrix written into hidden and unallocated slots
const COLLAPSED: [[f32; 4]; 4] = [[0.0; 4]; 4];

/// Index of one slot in the instance pool
///
/// Issued by [`InstancePool::allocate`] and meaningless outside the pool that
/// issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotIndex {
    index: u32,
}

impl SlotIndex {
    fn new(index: u32) -> Self {
        Self { index }
    }

    /// Position of the slot in the instance buffer
    pub fn index(&self) -> u32 {
        self.index
    }
}

/// Per-slot data laid out for direct upload to the instanced draw
///
/// Must match the host's instance buffer layout exactly.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct InstanceData {
    /// Model transformation matrix (4x4, column-major)
    pub model: [[f32; 4]; 4],
    /// Instance color (RGBA)
    pub color: [f32; 4],
}

unsafe impl bytemuck::Pod for InstanceData {}
unsafe impl bytemuck::Zeroable for InstanceData {}

impl InstanceData {
    fn new(position: Vec3, scale: Vec3, color: Color) -> Self {
        Self {
            model: instance_matrix(position, scale).into(),
            color: color.to_array(),
        }
    }

    fn collapsed() -> Self {
        Self {
            model: COLLAPSED,
            color: [0.0; 4],
        }
    }
}

/// Statistics for instance pool usage
#[derive(Debug, Default, Clone)]
pub struct PoolStats {
    /// Number of slots currently allocated
    pub allocated: usize,
    /// Maximum number of slots allocated simultaneously
    pub peak_allocated: usize,
    /// Allocation attempts rejected because every slot was taken
    pub exhaustions: usize,
    /// Allocations served by reusing a previously released slot
    pub reused: usize,
}

/// Fixed-capacity pool of instance slots with owner tracking
///
/// Released indices go on a free stack and are handed out again before any
/// fresh slot, so a long promote/demote churn never grows past the peak
/// entity count.
pub struct InstancePool {
    /// Instance data for every slot, allocated or not
    instances: Vec<InstanceData>,
    /// Owning entity id per slot, `None` when free
    owners: Vec<Option<String>>,
    /// Released indices awaiting reuse
    free: Vec<u32>,
    /// First slot index that has never been handed out
    next_fresh: u32,
    /// Usage statistics
    stats: PoolStats,
}

impl InstancePool {
    /// Create a pool with a fixed number of slots
    ///
    /// Every slot starts collapsed so unallocated slots never draw.
    pub fn new(capacity: usize) -> Self {
        log::info!("Created InstancePool with {} slots", capacity);

        Self {
            instances: vec![InstanceData::collapsed(); capacity],
            owners: vec![None; capacity],
            free: Vec::new(),
            next_fresh: 0,
            stats: PoolStats::default(),
        }
    }

    /// Allocate a slot for an entity
    ///
    /// Reuses a released slot when one exists, otherwise takes the next fresh
    /// one. Returns `None` when every slot is taken; nothing changes in that
    /// case. The slot starts collapsed; callers write a real transform with
    /// [`update`](Self::update).
    pub fn allocate(&mut self, owner: &str) -> Option<SlotIndex> {
        let index = if let Some(index) = self.free.pop() {
            self.stats.reused += 1;
            index
        } else if (self.next_fresh as usize) < self.instances.len() {
            let index = self.next_fresh;
            self.next_fresh += 1;
            index
        } else {
            self.stats.exhaustions += 1;
            log::warn!(
                "Instance pool exhausted ({} slots), allocation for '{}' rejected",
                self.instances.len(),
                owner
            );
            return None;
        };

        self.instances[index as usize] = InstanceData::collapsed();
        self.owners[index as usize] = Some(owner.to_string());
        self.stats.allocated += 1;
        self.stats.peak_allocated = self.stats.peak_allocated.max(self.stats.allocated);

        Some(SlotIndex::new(index))
    }

    /// Release a slot back to the pool
    ///
    /// The slot collapses immediately so it can never draw stale data while
    /// waiting on the free stack.
    pub fn release(&mut self, slot: SlotIndex) {
        if !self.is_allocated(slot) {
            debug_assert!(false, "release of unallocated slot {}", slot.index());
            log::error!("Release of unallocated slot {}", slot.index());
            return;
        }

        let index = slot.index() as usize;
        self.owners[index] = None;
        self.instances[index] = InstanceData::collapsed();
        self.free.push(slot.index());
        self.stats.allocated = self.stats.allocated.saturating_sub(1);
    }

    /// Write a slot's transform and color
    ///
    /// Allocation-free; safe to call every tick. `scale.y` carries the
    /// entity's visual height.
    pub fn update(&mut self, slot: SlotIndex, position: Vec3, scale: Vec3, color: Color) {
        if !self.is_allocated(slot) {
            debug_assert!(false, "update of unallocated slot {}", slot.index());
            log::error!("Update of unallocated slot {}", slot.index());
            return;
        }

        self.instances[slot.index() as usize] = InstanceData::new(position, scale, color);
    }

    /// Show or hide a slot
    ///
    /// The batched draw has no per-slot visibility toggle, so hiding collapses
    /// the slot's matrix to zero scale. Un-hiding does not restore the matrix;
    /// callers must follow with [`update`](Self::update).
    pub fn set_visible(&mut self, slot: SlotIndex, visible: bool) {
        if !self.is_allocated(slot) {
            debug_assert!(false, "visibility change on unallocated slot {}", slot.index());
            log::error!("Visibility change on unallocated slot {}", slot.index());
            return;
        }

        if !visible {
            self.instances[slot.index() as usize].model = COLLAPSED;
        }
    }

    /// Whether a slot is currently allocated
    pub fn is_allocated(&self, slot: SlotIndex) -> bool {
        self.owners
            .get(slot.index() as usize)
            .is_some_and(|owner| owner.is_some())
    }

    /// Entity id that owns a slot, if allocated
    pub fn owner(&self, slot: SlotIndex) -> Option<&str> {
        self.owners.get(slot.index() as usize)?.as_deref()
    }

    /// Total number of slots
    pub fn capacity(&self) -> usize {
        self.instances.len()
    }

    /// Number of slots currently allocated
    pub fn allocated_count(&self) -> usize {
        self.stats.allocated
    }

    /// Number of slots available for allocation
    pub fn available_count(&self) -> usize {
        self.instances.len() - self.stats.allocated
    }

    /// Usage statistics
    pub fn stats(&self) -> &PoolStats {
        &self.stats
    }

    /// Full instance buffer view for upload, hidden and free slots included
    pub fn instance_data(&self) -> &[InstanceData] {
        &self.instances
    }

    /// Release every slot and collapse every instance
    ///
    /// Cumulative statistics (peak, exhaustions, reuse) survive; only the live
    /// allocation count resets.
    pub fn clear(&mut self) {
        for instance in &mut self.instances {
            *instance = InstanceData::collapsed();
        }
        for owner in &mut self.owners {
            *owner = None;
        }
        self.free.clear();
        self.next_fresh = 0;
        self.stats.allocated = 0;
    }
}
