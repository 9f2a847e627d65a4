//! # Validate Subcommand
//!
//! Validates a CSV manifest against a component of the metadata model.
//!
//! ## Usage
//!
//! ```bash
//! # Validate against the component named in the config's data_type:
//! schematic validate --manifest-path patients.csv
//!
//! # Validate against an explicit component:
//! schematic validate --manifest-path samples.csv --data-type Biospecimen
//!
//! # Validate against a hand-written JSON Schema instead of the compiled one:
//! schematic validate --manifest-path patients.csv --json-schema patient.schema.json
//! ```
//!
//! Exits 0 when the manifest is valid and 1 when errors are found. The
//! error list is printed as JSON `[row, column, message, value]` tuples.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;

use schematic_core::SchematicConfig;
use schematic_model::{MetadataModel, ValidationError};

/// Message printed for a manifest without errors.
pub const VALID_MANIFEST_MESSAGE: &str = "Your manifest has been validated successfully. \
     There are no errors in your manifest, and it can be submitted without any modifications.";

/// Arguments for `schematic validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to the CSV manifest.
    #[arg(long)]
    pub manifest_path: PathBuf,

    /// Component to validate against; defaults to the first configured data type.
    #[arg(long)]
    pub data_type: Option<String>,

    /// JSON Schema document to use instead of the compiled one.
    #[arg(long)]
    pub json_schema: Option<PathBuf>,
}

/// Execute the validate subcommand.
pub fn run_validate(args: &ValidateArgs, model: &MetadataModel, config: &SchematicConfig) -> Result<u8> {
    let root = resolve_data_type(args.data_type.as_deref(), config)?;

    let errors = match &args.json_schema {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read JSON schema {}", path.display()))?;
            let schema: Value = serde_json::from_str(&text)
                .with_context(|| format!("invalid JSON in {}", path.display()))?;
            model.validate_with_schema(&args.manifest_path, root, &schema)
        }
        None => model.validate_manifest(&args.manifest_path, root),
    }
    .with_context(|| format!("failed to validate {}", args.manifest_path.display()))?;

    report(&errors)
}

/// Print the outcome and choose the exit code.
pub(crate) fn report(errors: &[ValidationError]) -> Result<u8> {
    if errors.is_empty() {
        println!("{VALID_MANIFEST_MESSAGE}");
        return Ok(0);
    }
    println!("{}", serde_json::to_string_pretty(errors)?);
    eprintln!("{} error(s) found in manifest", errors.len());
    Ok(1)
}

fn resolve_data_type<'a>(explicit: Option<&'a str>, config: &'a SchematicConfig) -> Result<&'a str> {
    explicit
        .or_else(|| config.default_data_type())
        .context("no component given: pass --data-type or set manifest.data_type in the config")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_model;
    use crate::test_support::{write_config, write_manifest};

    fn args(manifest_path: PathBuf) -> ValidateArgs {
        ValidateArgs {
            manifest_path,
            data_type: None,
            json_schema: None,
        }
    }

    #[test]
    fn valid_manifest_exits_zero() {
        let dir = tempfile::tempdir().unwrap();
        let (config, model) = load_model(&write_config(dir.path(), &["Patient"])).unwrap();
        let manifest = write_manifest(dir.path(), "PatientID,Sex,Component\np1,Male,Patient\n");
        assert_eq!(run_validate(&args(manifest), &model, &config).unwrap(), 0);
    }

    #[test]
    fn invalid_manifest_exits_one() {
        let dir = tempfile::tempdir().unwrap();
        let (config, model) = load_model(&write_config(dir.path(), &["Patient"])).unwrap();
        let manifest = write_manifest(dir.path(), "PatientID,Sex\n,Male\n");
        assert_eq!(run_validate(&args(manifest), &model, &config).unwrap(), 1);
    }

    #[test]
    fn explicit_data_type_overrides_config() {
        let dir = tempfile::tempdir().unwrap();
        let (config, model) = load_model(&write_config(dir.path(), &["Patient"])).unwrap();
        let manifest = write_manifest(dir.path(), "PatientID\np1\n");
        let mut args = args(manifest);
        args.data_type = Some("Biospecimen".into());
        assert_eq!(run_validate(&args, &model, &config).unwrap(), 0);
    }

    #[test]
    fn missing_data_type_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let (config, model) = load_model(&write_config(dir.path(), &[])).unwrap();
        let manifest = write_manifest(dir.path(), "PatientID\np1\n");
        assert!(run_validate(&args(manifest), &model, &config).is_err());
    }

    #[test]
    fn json_schema_override() {
        let dir = tempfile::tempdir().unwrap();
        let (config, model) = load_model(&write_config(dir.path(), &["Patient"])).unwrap();
        let manifest = write_manifest(dir.path(), "PatientID\np1\n");
        let schema_path = dir.path().join("custom.schema.json");
        std::fs::write(&schema_path, r#"{"type": "object", "required": ["PatientID"]}"#).unwrap();
        let mut args = args(manifest);
        args.json_schema = Some(schema_path);
        assert_eq!(run_validate(&args, &model, &config).unwrap(), 0);
    }
}
