//! # Error Types: Structured Error Hierarchy
//!
//! Defines the error types shared by every schematic crate. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Taxonomy
//!
//! - **Structural** (`SchemaFormatError`, `NameExtractionError`,
//!   `ManifestReadError`): malformed input documents. Fatal for the call
//!   and never retried internally.
//! - **Lookup** (`NodeNotFoundError`): a referenced root or component is
//!   absent from the loaded graph.
//! - **Configuration** (`ConfigError`): the caller-supplied configuration
//!   could not be read or points at an unsupported model location.
//!
//! Manifest validation findings are not errors. They are returned as a
//! plain list by the validator and only become an error at submission time.

use thiserror::Error;

/// Top-level error type for schematic.
#[derive(Error, Debug)]
pub enum SchematicError {
    /// The JSON-LD schema document is malformed.
    #[error("schema format error: {0}")]
    SchemaFormat(#[from] SchemaFormatError),

    /// A name could not be derived from a URI or curie.
    #[error("name extraction error: {0}")]
    NameExtraction(#[from] NameExtractionError),

    /// A referenced node does not exist in the schema graph.
    #[error("lookup error: {0}")]
    NodeNotFound(#[from] NodeNotFoundError),

    /// The tabular manifest could not be read.
    #[error("manifest read error: {0}")]
    ManifestRead(#[from] ManifestReadError),

    /// The configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// The JSON-LD schema document does not have the expected shape.
#[derive(Error, Debug)]
pub enum SchemaFormatError {
    /// The document is not valid JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A required top-level key (`@context` or `@graph`) is absent.
    #[error("document is missing the top-level '{key}' key")]
    MissingKey {
        /// The missing key.
        key: &'static str,
    },

    /// A top-level key is present but has the wrong JSON type.
    #[error("top-level '{key}' must be {expected}")]
    WrongType {
        /// The offending key.
        key: &'static str,
        /// Human-readable description of the expected type.
        expected: &'static str,
    },

    /// A `@graph` record is malformed.
    #[error("record #{index} in @graph is invalid: {reason}")]
    InvalidRecord {
        /// Zero-based position of the record in `@graph`.
        index: usize,
        /// Reason the record was rejected.
        reason: String,
    },

    /// Two records resolve to the same node identifier.
    #[error("duplicate node identifier '{id}'")]
    DuplicateId {
        /// The identifier that occurs more than once.
        id: String,
    },

    /// A dependency-bearing relation references a node that is not defined.
    #[error("node '{source_node}' references unknown node '{target}' via '{relationship}'")]
    DanglingReference {
        /// Node carrying the reference.
        source_node: String,
        /// Name of the relation property.
        relationship: String,
        /// Referenced identifier that has no record.
        target: String,
    },

    /// A node or reference identifier could not be reduced to a name.
    #[error(transparent)]
    Name(#[from] NameExtractionError),
}

/// A URI or curie that yields no usable name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot extract a name from URI or curie '{item}'")]
pub struct NameExtractionError {
    /// The input that could not be reduced.
    pub item: String,
}

/// A node referenced by the caller is absent from the schema graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("node '{node}' not found in the schema graph")]
pub struct NodeNotFoundError {
    /// The requested node identifier.
    pub node: String,
}

impl NodeNotFoundError {
    /// Build an error for the given identifier.
    pub fn new(node: impl Into<String>) -> Self {
        Self { node: node.into() }
    }
}

/// The tabular manifest could not be materialized.
#[derive(Error, Debug)]
pub enum ManifestReadError {
    /// The manifest file could not be opened or read.
    #[error("cannot read manifest '{path}': {source}")]
    Io {
        /// Path of the manifest.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The tabular content is malformed.
    #[error("malformed manifest '{source_name}': {reason}")]
    Malformed {
        /// Path or descriptive name of the source.
        source_name: String,
        /// Reason the content was rejected.
        reason: String,
    },
}

/// The configuration value could not be produced.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read configuration '{path}': {source}")]
    Io {
        /// Path of the configuration file.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid YAML for the expected shape.
    #[error("invalid configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The model location does not name a JSON-LD document.
    #[error("model location '{0}' must be a .jsonld file")]
    NotJsonLd(String),
}
