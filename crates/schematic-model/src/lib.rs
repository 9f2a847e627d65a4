//! # schematic-model: Manifest Validation & Submission
//!
//! Validates tabular metadata manifests against components of the
//! metadata model and gates their submission to a dataset store.
//!
//! ## Modules
//!
//! - [`manifest`]: CSV and in-memory sources, cleaning and normalization.
//! - [`validator`]: component consistency and per-row draft-07 checks,
//!   producing row/column-precise [`ValidationError`]s.
//! - [`submit`]: the [`ManifestStore`] collaborator trait, a local
//!   filesystem store, and [`submit_manifest`].
//! - [`model`]: [`MetadataModel`], the facade built from a
//!   [`SchematicConfig`](schematic_core::SchematicConfig).
//!
//! ## Crate Policy
//!
//! - Validation findings are values, not errors. Only submission turns a
//!   non-empty list into [`SubmitError::ValidationFailed`].
//! - Store errors are propagated, never retried.

pub mod manifest;
pub mod model;
pub mod submit;
pub mod validator;

pub use manifest::{CsvManifest, ManifestRow, ManifestSource, ManifestTable, RawTable};
pub use model::MetadataModel;
pub use submit::{submit_manifest, LocalManifestStore, ManifestStore, StoreError, SubmitError};
pub use validator::{
    ManifestValidator, ValidateError, ValidationError, COMPONENT_COLUMN, MAX_MESSAGE_CHARS,
    WRONG_SCHEMA,
};
