//! Batched rendering support
//!
//! Far-away entities render as slots of one instanced draw call rather than as
//! individual drawables. This module owns the slot pool and the per-slot data
//! laid out for upload; the host renderer consumes `instance_data()` as-is.

mod instance_pool;

pub use instance_pool::{InstanceData, InstancePool, PoolStats, SlotIndex};
