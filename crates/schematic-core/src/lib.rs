//! # schematic-core: Foundational Types
//!
//! The leaf of the schematic crate DAG. Every other crate depends on
//! `schematic-core`; it depends on nothing internal.
//!
//! ## Contents
//!
//! - [`curie`]: curie expansion against a JSON-LD `@context` and name
//!   extraction from URIs and curies.
//! - [`error`]: the shared error taxonomy (structural, lookup, config).
//! - [`config`]: the explicit configuration value passed into entry points.
//!
//! ## Crate Policy
//!
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod config;
pub mod curie;
pub mod error;

pub use config::{ManifestConfig, ModelConfig, SchematicConfig};
pub use curie::{expand_curie, extract_name, Context, PREFIXES_NOT_EXPANDED};
pub use error::{
    ConfigError, ManifestReadError, NameExtractionError, NodeNotFoundError, SchemaFormatError,
    SchematicError,
};
