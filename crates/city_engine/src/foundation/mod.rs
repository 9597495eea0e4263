//! Shared low-level utilities
//!
//! Self-contained helpers with no world semantics of their own:
//! - Math aliases and transform builders
//! - Color representation and hex parsing
//! - Handle-keyed collections
//! - Stopwatches and rate limiting
//! - Logging setup

pub mod collections;
pub mod color;
pub mod logging;
pub mod math;
pub mod time;
