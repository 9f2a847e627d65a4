//! # schematic-schema: Validation Schema Compiler & Record Checking
//!
//! Turns a component of the metadata graph into a draft-07 JSON Schema
//! document and checks manifest records against it.
//!
//! ## Compilation (`compile`)
//!
//! [`ValidationSchema::compile`] walks the root's `requiresDependency`
//! subgraph. Each dependency becomes a required column whose value shape
//! is a [`ValueConstraint`]; permissible values that pull in further
//! attributes become `allOf` if/then entries.
//!
//! ## Checking (`check`)
//!
//! [`RecordChecker`] wraps a draft-07 validator and reports every
//! [`Violation`] of a record, most relevant first. It accepts any schema
//! document, so callers can bypass compilation with their own.
//!
//! ## Crate Policy
//!
//! - Depends on `schematic-core` and `schematic-graph` only.
//! - Compiled documents are disposable: rebuild whenever the graph changes.
//! - Remote `$ref`s are never fetched.

pub mod check;
pub mod compile;

pub use check::{RecordChecker, Violation};
pub use compile::{
    CompileError, ConditionalRule, PropertyRule, ValidationSchema, ValueConstraint,
    DRAFT7_SCHEMA_URI,
};
