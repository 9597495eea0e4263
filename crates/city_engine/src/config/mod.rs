//! Configuration loading
//!
//! World tuning lives in small TOML or RON files next to the host binary.
//! Every field has a default, so partial files work and old files stay valid
//! as new knobs appear.

use std::path::Path;

pub use serde::{Deserialize, Serialize};

/// File-backed configuration with the format chosen by extension
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Read a configuration file, `.toml` or `.ron` by extension
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        match extension(path) {
            Some("toml") => {
                toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            Some("ron") => ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Write the configuration, `.toml` or `.ron` by extension
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = match extension(path) {
            Some("toml") => {
                toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
            }
            Some("ron") => ron::ser::to_string_pretty(self, Default::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
            _ => return Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|ext| ext.to_str())
}

/// Failures loading or saving configuration files
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The file could not be read or written
    #[error("config file error: {0}")]
    Io(#[from] std::io::Error),

    /// The contents did not parse as the expected type
    #[error("config parse error: {0}")]
    Parse(String),

    /// The value could not be serialized
    #[error("config serialize error: {0}")]
    Serialize(String),

    /// The path has no recognized configuration extension
    #[error("unsupported config format: {0}")]
    UnsupportedFormat(String),
}

/// World tuning knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Maximum number of instanced entities
    pub pool_capacity: usize,

    /// Distance below which entities promote to full detail
    pub promotion_radius: f32,

    /// Minimum milliseconds between detail-level passes
    pub lod_interval_ms: u64,

    /// Per-tick restyle time budget in milliseconds
    pub restyle_budget_ms: u64,

    /// Y coordinate of the ground plane
    pub ground_y: f32,

    /// Minimum visual height for newly spawned entities
    pub min_spawn_height: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            pool_capacity: 1024,
            promotion_radius: 40.0,
            lod_interval_ms: 200,
            restyle_budget_ms: 2,
            ground_y: 0.0,
            min_spawn_height: 1.7,
        }
    }
}

impl Config for WorldConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_world_config() {
        let config = WorldConfig::default();
        assert_eq!(config.pool_capacity, 1024);
        assert_eq!(config.lod_interval_ms, 200);
        assert!((config.promotion_radius - 40.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = WorldConfig {
            pool_capacity: 64,
            ..WorldConfig::default()
        };
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: WorldConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.pool_capacity, 64);
        assert_eq!(parsed.restyle_budget_ms, config.restyle_budget_ms);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed: WorldConfig = toml::from_str("pool_capacity = 16").unwrap();
        assert_eq!(parsed.pool_capacity, 16);
        assert_eq!(parsed.lod_interval_ms, 200);
    }

    #[test]
    fn test_file_round_trip() {
        let path = std::env::temp_dir().join("city_engine_config_round_trip.toml");
        let config = WorldConfig {
            pool_capacity: 32,
            ..WorldConfig::default()
        };
        config.save_to_file(&path).unwrap();
        let loaded = WorldConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.pool_capacity, 32);
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let result = WorldConfig::default().save_to_file("world.yaml");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }
}
