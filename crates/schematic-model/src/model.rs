//! # Metadata Model
//!
//! Entry point bundling a loaded schema graph with the operations callers
//! run against it.

use std::path::Path;

use serde_json::Value;

use schematic_core::config::SchematicConfig;
use schematic_core::error::SchematicError;
use schematic_graph::{GraphError, SchemaGraph};
use schematic_schema::{CompileError, ValidationSchema};

use crate::manifest::CsvManifest;
use crate::submit::{submit_manifest, ManifestStore, SubmitError};
use crate::validator::{ManifestValidator, ValidateError, ValidationError};

/// A metadata model loaded from a JSON-LD document.
///
/// Read-only after construction; share it freely between callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataModel {
    graph: SchemaGraph,
}

impl MetadataModel {
    /// Load the model named by `config.model.location`.
    ///
    /// # Errors
    ///
    /// Returns `SchematicError::Config` if the location is not a `.jsonld`
    /// file, and IO or format errors if the document cannot be loaded.
    pub fn from_config(config: &SchematicConfig) -> Result<Self, SchematicError> {
        let location = config.model_location()?;
        let graph = SchemaGraph::from_path(location)?;
        tracing::info!(
            location = %location.display(),
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "loaded metadata model"
        );
        Ok(Self { graph })
    }

    /// Wrap an already loaded graph.
    pub fn from_graph(graph: SchemaGraph) -> Self {
        Self { graph }
    }

    /// The underlying schema graph.
    pub fn graph(&self) -> &SchemaGraph {
        &self.graph
    }

    /// Prerequisite-first order of the nodes under `root` for `relationship`.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::NodeNotFound` for an unknown root and
    /// `GraphError::Cycle` if the relation subgraph is cyclic.
    pub fn ordered_model_nodes(&self, root: &str, relationship: &str) -> Result<Vec<String>, GraphError> {
        self.graph.ordered_model_nodes(root, relationship)
    }

    /// Components required by `source_component`.
    ///
    /// # Errors
    ///
    /// Same as [`MetadataModel::ordered_model_nodes`].
    pub fn component_requirements(&self, source_component: &str) -> Result<Vec<String>, GraphError> {
        self.graph.component_requirements(source_component)
    }

    /// Compile the validation schema for `root`.
    ///
    /// # Errors
    ///
    /// Returns `CompileError::Graph` if `root` is absent or its
    /// dependencies are cyclic.
    pub fn validation_schema(&self, root: &str) -> Result<ValidationSchema, CompileError> {
        ValidationSchema::compile(&self.graph, root)
    }

    /// Validate a CSV manifest against `root`.
    ///
    /// # Errors
    ///
    /// Returns `ValidateError` for an unreadable manifest or unknown root.
    pub fn validate_manifest(
        &self,
        manifest_path: &Path,
        root: &str,
    ) -> Result<Vec<ValidationError>, ValidateError> {
        ManifestValidator::new(&self.graph, root)?.validate(&CsvManifest::new(manifest_path))
    }

    /// Validate a CSV manifest against a caller-supplied schema document.
    ///
    /// # Errors
    ///
    /// Returns `ValidateError` for an unreadable manifest, an unknown root,
    /// or a document that is not a valid draft-07 schema.
    pub fn validate_with_schema(
        &self,
        manifest_path: &Path,
        root: &str,
        schema: &Value,
    ) -> Result<Vec<ValidationError>, ValidateError> {
        ManifestValidator::new(&self.graph, root)?
            .validate_with_schema(&CsvManifest::new(manifest_path), schema)
    }

    /// Validate (optionally) and store a manifest.
    ///
    /// # Errors
    ///
    /// See [`submit_manifest`].
    pub fn submit(
        &self,
        store: &dyn ManifestStore,
        manifest_path: &Path,
        dataset_id: &str,
        validate_component: Option<&str>,
    ) -> Result<(), SubmitError> {
        submit_manifest(&self.graph, store, manifest_path, dataset_id, validate_component)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schematic_core::error::ConfigError;

    #[test]
    fn test_from_config_rejects_non_jsonld() {
        let config = SchematicConfig::for_model("model.csv");
        let err = MetadataModel::from_config(&config).unwrap_err();
        assert!(matches!(err, SchematicError::Config(ConfigError::NotJsonLd(_))));
    }

    #[test]
    fn test_from_config_missing_file() {
        let config = SchematicConfig::for_model("/nonexistent/model.jsonld");
        assert!(MetadataModel::from_config(&config).is_err());
    }

    #[test]
    fn test_from_config_loads_graph() {
        let tmp = tempfile::tempdir().unwrap();
        let location = tmp.path().join("tiny.model.jsonld");
        std::fs::write(
            &location,
            r#"{"@context": {"bts": "http://schema.biothings.io/"},
                "@graph": [{"@id": "bts:Patient", "rdfs:label": "Patient"}]}"#,
        )
        .unwrap();
        let model = MetadataModel::from_config(&SchematicConfig::for_model(&location)).unwrap();
        assert!(model.graph().is_class_in_schema("Patient"));
    }
}
