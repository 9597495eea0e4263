//! Logging setup shared by hosts and demo binaries
//!
//! Thin wrapper over `env_logger` so every binary initializes the same way:
//! the given level sets the baseline verbosity, and per-module `RUST_LOG`
//! directives refine it.

pub use log::{debug, error, info, trace, warn, LevelFilter};

/// Initialize logging at a baseline level
pub fn init(default_level: LevelFilter) {
    env_logger::Builder::from_default_env()
        .filter_level(default_level)
        .init();
}
