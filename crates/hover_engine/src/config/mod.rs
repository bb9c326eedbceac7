//! Configuration system
//!
//! Tuning structs implement [`Config`] to be loaded from or saved to TOML or
//! RON files, the format being picked from the file extension.

use std::path::Path;

pub use serde::{Serialize, Deserialize};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        match extension(path) {
            Some("toml") => toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
            Some("ron") => ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = match extension(path) {
            Some("toml") => toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?,
            Some("ron") => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
            _ => return Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|ext| ext.to_str())
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vehicle::VehicleTuning;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("hover_engine_config_{}_{name}", std::process::id()))
    }

    #[test]
    fn test_toml_roundtrip() {
        let path = temp_path("tuning.toml");
        let mut tuning = VehicleTuning::default();
        tuning.hover_height = 3.5;
        tuning.save_to_file(&path).unwrap();

        let loaded = VehicleTuning::load_from_file(&path).unwrap();
        assert_eq!(loaded, tuning);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_ron_roundtrip() {
        let path = temp_path("tuning.ron");
        let tuning = VehicleTuning::default();
        tuning.save_to_file(&path).unwrap();

        let loaded = VehicleTuning::load_from_file(&path).unwrap();
        assert_eq!(loaded, tuning);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let result = VehicleTuning::default().save_to_file(temp_path("tuning.json"));
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }
}
