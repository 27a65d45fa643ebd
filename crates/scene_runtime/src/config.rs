//! Capability configuration
//!
//! The optional engine features (audio speakers, skeletal skinning, particle
//! binding, voxel invalidation on scene switch) are gated by a runtime
//! capability struct rather than compile-time flags, so one build can serve
//! differently-equipped titles.

use serde::{Deserialize, Serialize};

/// Configuration trait with dual-format file loading
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from a `.toml` or `.ron` file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to a `.toml` or `.ron` file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, Default::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Optional capability toggles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Capabilities {
    /// Instantiate speaker nodes
    pub audio: bool,
    /// Bind armatures to skinned meshes
    pub skin: bool,
    /// Attach particle systems to mesh objects
    pub particles: bool,
    /// Flag voxel data for rebuild when the active scene changes
    pub voxels: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            audio: true,
            skin: true,
            particles: true,
            voxels: false,
        }
    }
}

impl Config for Capabilities {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_feature_paths() {
        let caps = Capabilities::default();
        assert!(caps.audio && caps.skin && caps.particles);
        assert!(!caps.voxels);
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let caps: Capabilities = toml::from_str("audio = false\n").expect("parse");
        assert!(!caps.audio);
        assert!(caps.skin);
    }
}
