//! # schematic-cli: Command-Line Front End
//!
//! Provides the `schematic` binary, a thin layer over `schematic-model`.
//!
//! ## Subcommands
//!
//! - `schematic validate`: validate a manifest against a component.
//! - `schematic submit`: validate (optionally) and store a manifest.
//! - `schematic schema`: print the compiled validation schema.
//! - `schematic order`: print a component's attributes, prerequisites first.
//! - `schematic requirements`: print the components a component requires.
//!
//! ```bash
//! schematic --config config.yml validate --manifest-path patients.csv --data-type Patient
//! schematic submit --manifest-path patients.csv --dataset-id syn123 \
//!     --validate-component Patient --store-dir ./datasets
//! ```

pub mod query;
pub mod submit;
pub mod validate;

use std::path::Path;

use anyhow::{Context, Result};

use schematic_core::SchematicConfig;
use schematic_model::MetadataModel;

/// Configuration file read when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "config.yml";

/// Load the configuration file and the model it points at.
pub fn load_model(config_path: &Path) -> Result<(SchematicConfig, MetadataModel)> {
    let config = SchematicConfig::load(config_path)
        .with_context(|| format!("failed to load configuration {}", config_path.display()))?;
    let model = MetadataModel::from_config(&config).with_context(|| {
        format!(
            "failed to load metadata model {}",
            config.model.location.display()
        )
    })?;
    Ok((config, model))
}
