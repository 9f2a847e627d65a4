//! # Manifest Submission
//!
//! Sequences the checks that gate a manifest's association with a dataset,
//! then hands the manifest to a [`ManifestStore`].
//!
//! Store failures are opaque: they are wrapped once in
//! [`SubmitError::Storage`] and otherwise propagated untouched.

use std::path::{Path, PathBuf};

use thiserror::Error;

use schematic_graph::SchemaGraph;

use crate::manifest::CsvManifest;
use crate::validator::{ManifestValidator, ValidateError, ValidationError};

/// Error type returned by storage collaborators.
pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

/// Destination that can associate a manifest with a dataset.
///
/// Implementations must be `Send + Sync` so one store can serve
/// concurrent submissions.
pub trait ManifestStore: Send + Sync {
    /// Associate the manifest at `manifest_path` with `dataset_id`.
    ///
    /// # Errors
    ///
    /// Any failure of the underlying store.
    fn associate(&self, manifest_path: &Path, dataset_id: &str) -> Result<(), StoreError>;
}

/// A store that files manifests under `<root>/<dataset_id>/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalManifestStore {
    root: PathBuf,
}

impl LocalManifestStore {
    /// A store rooted at `root`; directories are created on first use.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the manifests of `dataset_id`.
    pub fn dataset_dir(&self, dataset_id: &str) -> PathBuf {
        self.root.join(dataset_id)
    }
}

impl ManifestStore for LocalManifestStore {
    fn associate(&self, manifest_path: &Path, dataset_id: &str) -> Result<(), StoreError> {
        if dataset_id.is_empty() || dataset_id.contains(['/', '\\']) || dataset_id == ".." {
            return Err(format!("invalid dataset id '{dataset_id}'").into());
        }
        let file_name = manifest_path
            .file_name()
            .ok_or_else(|| format!("manifest path '{}' has no file name", manifest_path.display()))?;
        let dir = self.dataset_dir(dataset_id);
        std::fs::create_dir_all(&dir)?;
        let target = dir.join(file_name);
        std::fs::copy(manifest_path, &target)?;
        tracing::info!(dataset_id, target = %target.display(), "stored manifest");
        Ok(())
    }
}

/// Submission failed before or during association.
#[derive(Error, Debug)]
pub enum SubmitError {
    /// The component to validate against is not in the schema.
    #[error("The component {component} could not be found in the schema.")]
    UnknownComponent {
        /// Requested component.
        component: String,
    },

    /// Validation produced errors; nothing was stored.
    #[error("manifest failed validation with {} error(s)", .errors.len())]
    ValidationFailed {
        /// Every defect found.
        errors: Vec<ValidationError>,
    },

    /// The manifest could not be validated.
    #[error(transparent)]
    Validate(#[from] ValidateError),

    /// The store rejected the manifest.
    #[error("storage error: {0}")]
    Storage(#[source] StoreError),
}

/// Validate (optionally) and associate a manifest with a dataset.
///
/// With `validate_component` set, the component must exist and the
/// manifest must validate cleanly before the store is called. Without it
/// the manifest is associated as-is.
///
/// # Errors
///
/// See [`SubmitError`].
pub fn submit_manifest(
    graph: &SchemaGraph,
    store: &dyn ManifestStore,
    manifest_path: &Path,
    dataset_id: &str,
    validate_component: Option<&str>,
) -> Result<(), SubmitError> {
    if let Some(component) = validate_component {
        let validator =
            ManifestValidator::new(graph, component).map_err(|_| SubmitError::UnknownComponent {
                component: component.to_string(),
            })?;
        let errors = validator.validate(&CsvManifest::new(manifest_path))?;
        if !errors.is_empty() {
            tracing::warn!(component, errors = errors.len(), "submission blocked by validation errors");
            return Err(SubmitError::ValidationFailed { errors });
        }
    } else {
        tracing::debug!("submitting manifest without validation");
    }

    store
        .associate(manifest_path, dataset_id)
        .map_err(SubmitError::Storage)?;
    tracing::info!(manifest = %manifest_path.display(), dataset_id, "manifest submitted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingStore {
        calls: Mutex<Vec<(PathBuf, String)>>,
    }

    impl ManifestStore for RecordingStore {
        fn associate(&self, manifest_path: &Path, dataset_id: &str) -> Result<(), StoreError> {
            self.calls
                .lock()
                .unwrap()
                .push((manifest_path.to_path_buf(), dataset_id.to_string()));
            Ok(())
        }
    }

    struct FailingStore;

    impl ManifestStore for FailingStore {
        fn associate(&self, _: &Path, _: &str) -> Result<(), StoreError> {
            Err("permission denied".into())
        }
    }

    fn graph() -> SchemaGraph {
        SchemaGraph::from_json_str(
            r#"{
                "@context": {"bts": "http://schema.biothings.io/", "sms": "http://sms.io/"},
                "@graph": [
                    {"@id": "bts:Patient", "rdfs:label": "Patient",
                     "sms:requiresDependency": [{"@id": "bts:PatientID"}]},
                    {"@id": "bts:PatientID", "rdfs:label": "PatientID", "sms:required": "sms:true"}
                ]
            }"#,
        )
        .unwrap()
    }

    fn write_manifest(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("manifest.csv");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_submit_without_validation_calls_store() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_manifest(tmp.path(), "PatientID\n\n");
        let store = RecordingStore::default();
        submit_manifest(&graph(), &store, &path, "syn123", None).unwrap();
        assert_eq!(store.calls.lock().unwrap().as_slice(), [(path, "syn123".to_string())]);
    }

    #[test]
    fn test_submit_unknown_component() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_manifest(tmp.path(), "PatientID\np1\n");
        let store = RecordingStore::default();
        let err = submit_manifest(&graph(), &store, &path, "syn123", Some("Biospecimen")).unwrap_err();
        assert_eq!(err.to_string(), "The component Biospecimen could not be found in the schema.");
        assert!(store.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_submit_blocked_by_validation() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_manifest(tmp.path(), "PatientID,Other\n,x\n");
        let store = RecordingStore::default();
        let err = submit_manifest(&graph(), &store, &path, "syn123", Some("Patient")).unwrap_err();
        match err {
            SubmitError::ValidationFailed { errors } => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].column, "PatientID");
            }
            other => panic!("Expected ValidationFailed, got: {other}"),
        }
        assert!(store.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_submit_valid_manifest() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_manifest(tmp.path(), "PatientID\np1\n");
        let store = RecordingStore::default();
        submit_manifest(&graph(), &store, &path, "syn123", Some("Patient")).unwrap();
        assert_eq!(store.calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_storage_failure_propagates() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_manifest(tmp.path(), "PatientID\np1\n");
        let err = submit_manifest(&graph(), &FailingStore, &path, "syn123", None).unwrap_err();
        match err {
            SubmitError::Storage(inner) => assert_eq!(inner.to_string(), "permission denied"),
            other => panic!("Expected Storage, got: {other}"),
        }
    }

    #[test]
    fn test_local_store_copies_manifest() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_manifest(tmp.path(), "PatientID\np1\n");
        let store = LocalManifestStore::new(tmp.path().join("store"));
        store.associate(&path, "syn123").unwrap();
        let copied = store.dataset_dir("syn123").join("manifest.csv");
        assert_eq!(std::fs::read_to_string(copied).unwrap(), "PatientID\np1\n");
    }

    #[test]
    fn test_local_store_rejects_path_like_dataset_ids() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_manifest(tmp.path(), "PatientID\np1\n");
        let store = LocalManifestStore::new(tmp.path().join("store"));
        assert!(store.associate(&path, "../escape").is_err());
        assert!(store.associate(&path, "").is_err());
    }
}
