//! Handle-keyed storage

pub use slotmap::{DefaultKey, SlotMap};

/// Arena whose keys stay valid across unrelated insertions and removals
pub type HandleMap<T> = SlotMap<DefaultKey, T>;

/// Key issued by a [`HandleMap`]
pub type Handle = DefaultKey;
