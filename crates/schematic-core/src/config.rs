//! # Configuration
//!
//! An explicit configuration value, constructed once by the caller and
//! passed by reference into each entry point. Nothing in schematic reads
//! process-wide configuration state.
//!
//! ## File Format
//!
//! ```yaml
//! model:
//!   location: tests/data/example.model.jsonld
//! manifest:
//!   title: example
//!   data_type:
//!     - Patient
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Root configuration value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchematicConfig {
    /// Location of the metadata model.
    pub model: ModelConfig,
    /// Manifest defaults.
    #[serde(default)]
    pub manifest: ManifestConfig,
}

/// Where the JSON-LD metadata model lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Path to a local `.jsonld` file.
    pub location: PathBuf,
}

/// Defaults applied when a manifest command omits them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestConfig {
    /// Manifest title used in generated artifacts.
    #[serde(default)]
    pub title: Option<String>,
    /// Components a manifest is validated against when none is given.
    #[serde(default)]
    pub data_type: Vec<String>,
}

impl SchematicConfig {
    /// Build a configuration pointing at a model file, with empty defaults.
    pub fn for_model(location: impl Into<PathBuf>) -> Self {
        Self {
            model: ModelConfig {
                location: location.into(),
            },
            manifest: ManifestConfig::default(),
        }
    }

    /// Parse a configuration from YAML text.
    ///
    /// Relative model locations are kept as written; callers resolve them.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Yaml` if the text does not match the expected shape.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Load a configuration file.
    ///
    /// A relative `model.location` is resolved against the directory that
    /// contains the configuration file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if the file cannot be read and
    /// `ConfigError::Yaml` if it cannot be parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut config = Self::from_yaml_str(&text)?;
        if config.model.location.is_relative() {
            if let Some(dir) = path.parent() {
                config.model.location = dir.join(&config.model.location);
            }
        }
        Ok(config)
    }

    /// The model location, checked to name a `.jsonld` document.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotJsonLd` for any other extension.
    pub fn model_location(&self) -> Result<&Path, ConfigError> {
        let location = self.model.location.as_path();
        match location.extension().and_then(|e| e.to_str()) {
            Some("jsonld") => Ok(location),
            _ => Err(ConfigError::NotJsonLd(location.display().to_string())),
        }
    }

    /// The first configured component, if any.
    pub fn default_data_type(&self) -> Option<&str> {
        self.manifest.data_type.first().map(String::as_str)
    }
}
