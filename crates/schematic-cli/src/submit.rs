//! # Submit Subcommand
//!
//! Associates a manifest with a dataset in a local manifest store,
//! validating it first when a component is given.
//!
//! ```bash
//! schematic submit --manifest-path patients.csv --dataset-id syn123 \
//!     --validate-component Patient --store-dir ./datasets
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use schematic_model::{LocalManifestStore, MetadataModel, SubmitError};

use crate::validate::report;

/// Arguments for `schematic submit`.
#[derive(Args, Debug)]
pub struct SubmitArgs {
    /// Path to the CSV manifest.
    #[arg(long)]
    pub manifest_path: PathBuf,

    /// Dataset the manifest is associated with.
    #[arg(long)]
    pub dataset_id: String,

    /// Validate against this component before storing.
    #[arg(long)]
    pub validate_component: Option<String>,

    /// Root directory of the manifest store.
    #[arg(long)]
    pub store_dir: PathBuf,
}

/// Execute the submit subcommand.
pub fn run_submit(args: &SubmitArgs, model: &MetadataModel) -> Result<u8> {
    let store = LocalManifestStore::new(&args.store_dir);
    match model.submit(
        &store,
        &args.manifest_path,
        &args.dataset_id,
        args.validate_component.as_deref(),
    ) {
        Ok(()) => {
            println!(
                "Manifest {} associated with dataset {}",
                args.manifest_path.display(),
                args.dataset_id
            );
            Ok(0)
        }
        Err(SubmitError::ValidationFailed { errors }) => report(&errors),
        Err(e) => Err(e).with_context(|| {
            format!("failed to submit {}", args.manifest_path.display())
        }),
    }
}
