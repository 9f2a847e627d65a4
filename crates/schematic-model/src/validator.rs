//! # Manifest Validator
//!
//! Checks a normalized manifest against one root component.
//!
//! ## Passes
//!
//! 1. **Component consistency.** When the manifest has a `Component`
//!    column, every non-empty value must name the root. Any disagreement
//!    short-circuits: one error per offending row, no schema checks.
//! 2. **Per-row schema checks.** Each row is checked as a single JSON
//!    record against the draft-07 document. Errors for a row are ordered
//!    by relevance and appended in row order.
//!
//! Findings are returned as a plain list; an empty list means the
//! manifest is valid. Only unreadable input or an unknown root is an
//! `Err`.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use schematic_core::error::{ManifestReadError, NodeNotFoundError};
use schematic_graph::{SchemaGraph, SchemaNode};
use schematic_schema::{CompileError, RecordChecker, ValidationSchema, Violation};

use crate::manifest::{ManifestRow, ManifestSource, ManifestTable, RawTable};

/// Column that names the intended root component.
pub const COMPONENT_COLUMN: &str = "Component";

/// Column and value reported for violations not tied to a single field.
pub const WRONG_SCHEMA: &str = "Wrong schema";

/// Messages longer than this many characters are cut.
pub const MAX_MESSAGE_CHARS: usize = 500;

/// A manifest could not be validated at all.
#[derive(Error, Debug)]
pub enum ValidateError {
    /// The manifest could not be read.
    #[error(transparent)]
    Read(#[from] ManifestReadError),

    /// The root is missing or its schema could not be compiled.
    #[error(transparent)]
    Compile(#[from] CompileError),
}

impl From<NodeNotFoundError> for ValidateError {
    fn from(err: NodeNotFoundError) -> Self {
        Self::Compile(err.into())
    }
}

/// One defect found in a manifest.
///
/// Serializes as the tuple `[row, column, message, value]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "ErrorTuple", from = "ErrorTuple")]
pub struct ValidationError {
    /// Spreadsheet row number (header is row 1).
    pub row: usize,
    /// Offending column, or [`WRONG_SCHEMA`].
    pub column: String,
    /// Validator message, at most [`MAX_MESSAGE_CHARS`] characters.
    pub message: String,
    /// Offending value, or [`WRONG_SCHEMA`].
    pub value: Value,
}

type ErrorTuple = (usize, String, String, Value);

impl From<ValidationError> for ErrorTuple {
    fn from(e: ValidationError) -> Self {
        (e.row, e.column, e.message, e.value)
    }
}

impl From<ErrorTuple> for ValidationError {
    fn from((row, column, message, value): ErrorTuple) -> Self {
        Self {
            row,
            column,
            message,
            value,
        }
    }
}

impl ValidationError {
    fn from_violation(row: usize, violation: Violation) -> Self {
        let message = truncate_message(&violation.message);
        match violation.path.last() {
            Some(column) => Self {
                row,
                column: column.clone(),
                message,
                value: violation.instance,
            },
            None => Self {
                row,
                column: WRONG_SCHEMA.to_string(),
                message,
                value: Value::String(WRONG_SCHEMA.to_string()),
            },
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {}, column '{}': {}", self.row, self.column, self.message)
    }
}

/// Cut `message` to at most [`MAX_MESSAGE_CHARS`] characters.
pub fn truncate_message(message: &str) -> String {
    message.chars().take(MAX_MESSAGE_CHARS).collect()
}

/// Validates manifests for one root component of a graph.
#[derive(Debug, Clone, Copy)]
pub struct ManifestValidator<'g> {
    graph: &'g SchemaGraph,
    root: &'g SchemaNode,
}

impl<'g> ManifestValidator<'g> {
    /// Bind a validator to `root` (id or display name).
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFoundError` if the root is absent.
    pub fn new(graph: &'g SchemaGraph, root: &str) -> Result<Self, NodeNotFoundError> {
        let root = graph.resolve(root).ok_or_else(|| NodeNotFoundError::new(root))?;
        Ok(Self { graph, root })
    }

    /// The component manifests are checked against.
    pub fn root(&self) -> &SchemaNode {
        self.root
    }

    /// Validate against the schema compiled for the root.
    ///
    /// # Errors
    ///
    /// Returns `ValidateError` if the source cannot be read or the root's
    /// dependency graph cannot be compiled.
    pub fn validate(&self, source: &dyn ManifestSource) -> Result<Vec<ValidationError>, ValidateError> {
        let schema = ValidationSchema::compile(self.graph, &self.root.id)?;
        self.validate_with_schema(source, &schema.to_json())
    }

    /// Validate against a caller-supplied draft-07 document.
    ///
    /// # Errors
    ///
    /// Returns `ValidateError` if the source cannot be read or the
    /// document is not a valid schema.
    pub fn validate_with_schema(
        &self,
        source: &dyn ManifestSource,
        schema: &Value,
    ) -> Result<Vec<ValidationError>, ValidateError> {
        let raw = source.read_table()?;
        raw.check_headers(&source.name())?;
        let checker = RecordChecker::new(schema)?;
        let table = self.normalize(raw);
        let errors = self.validate_table(&table, &checker);
        tracing::info!(
            manifest = %source.name(),
            root = %self.root.id,
            rows = table.len(),
            errors = errors.len(),
            "validated manifest"
        );
        Ok(errors)
    }

    /// Normalize a raw table, exploding columns whose node is list-valued.
    pub fn normalize(&self, raw: RawTable) -> ManifestTable {
        let list_columns: HashSet<String> = raw
            .headers
            .iter()
            .map(|h| h.trim())
            .filter(|h| self.graph.resolve(h).is_some_and(SchemaNode::is_list))
            .map(str::to_string)
            .collect();
        ManifestTable::normalize(raw, &list_columns)
    }

    /// Run both passes over a normalized table.
    pub fn validate_table(&self, table: &ManifestTable, checker: &RecordChecker) -> Vec<ValidationError> {
        let mismatches = self.component_mismatches(table);
        if !mismatches.is_empty() {
            tracing::warn!(
                root = %self.root.id,
                rows = mismatches.len(),
                "manifest rows name a different component"
            );
            return mismatches;
        }
        table
            .rows()
            .iter()
            .flat_map(|row| check_row(row, checker))
            .collect()
    }

    fn component_mismatches(&self, table: &ManifestTable) -> Vec<ValidationError> {
        if !table.has_column(COMPONENT_COLUMN) {
            return Vec::new();
        }
        table
            .rows()
            .iter()
            .filter_map(|row| {
                let component = row.get(COMPONENT_COLUMN)?.as_str()?;
                if component.is_empty() || self.names_root(component) {
                    return None;
                }
                Some(ValidationError {
                    row: row.row_number(),
                    column: COMPONENT_COLUMN.to_string(),
                    message: format!(
                        "Component value provided is: '{component}', whereas the Template Type is: '{}'",
                        self.root.id
                    ),
                    value: Value::from(vec![component.to_string(), self.root.id.clone()]),
                })
            })
            .collect()
    }

    fn names_root(&self, name: &str) -> bool {
        name == self.root.id || name == self.root.display_name
    }
}

fn check_row(row: &ManifestRow, checker: &RecordChecker) -> Vec<ValidationError> {
    let number = row.row_number();
    checker
        .check(&row.to_record())
        .into_iter()
        .map(|violation| ValidationError::from_violation(number, violation))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn graph() -> SchemaGraph {
        SchemaGraph::load(&json!({
            "@context": {"bts": "http://schema.biothings.io/", "sms": "http://sms.io/", "schema": "http://schema.org/"},
            "@graph": [
                {
                    "@id": "bts:Patient",
                    "rdfs:label": "Patient",
                    "sms:requiresDependency": [{"@id": "bts:PatientID"}, {"@id": "bts:Sex"}, {"@id": "bts:Tags"}]
                },
                {"@id": "bts:PatientID", "rdfs:label": "PatientID", "sms:required": "sms:true"},
                {
                    "@id": "bts:Sex",
                    "rdfs:label": "Sex",
                    "sms:required": "sms:true",
                    "schema:rangeIncludes": [{"@id": "bts:Female"}, {"@id": "bts:Male"}]
                },
                {"@id": "bts:Female", "rdfs:label": "Female"},
                {"@id": "bts:Male", "rdfs:label": "Male"},
                {
                    "@id": "bts:Tags",
                    "rdfs:label": "Tags",
                    "sms:required": "sms:false",
                    "sms:validationRules": ["list"]
                }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_valid_rows_have_no_errors() {
        let graph = graph();
        let validator = ManifestValidator::new(&graph, "Patient").unwrap();
        let raw = RawTable::from_strings(
            ["PatientID", "Sex", "Tags", "Component"],
            [["p1", "Female", "a, b", "Patient"], ["p2", "Male", "", "Patient"]],
        );
        assert!(validator.validate(&raw).unwrap().is_empty());
    }

    #[test]
    fn test_blank_required_value_reports_column() {
        let graph = graph();
        let validator = ManifestValidator::new(&graph, "Patient").unwrap();
        let raw = RawTable::from_strings(["PatientID", "Sex", "Tags"], [["", "Female", ""]]);
        let errors = validator.validate(&raw).unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].row, 2);
        assert_eq!(errors[0].column, "PatientID");
        assert_eq!(errors[0].value, json!(""));
    }

    #[test]
    fn test_missing_column_reports_wrong_schema() {
        let graph = graph();
        let validator = ManifestValidator::new(&graph, "Patient").unwrap();
        let raw = RawTable::from_strings(["PatientID", "Tags"], [["p1", "a"]]);
        let errors = validator.validate(&raw).unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].column, WRONG_SCHEMA);
        assert_eq!(errors[0].value, json!(WRONG_SCHEMA));
        assert!(errors[0].message.contains("Sex"));
    }

    #[test]
    fn test_unflagged_dependency_rejects_blank_value() {
        let graph = SchemaGraph::load(&json!({
            "@context": {"bts": "http://schema.biothings.io/", "sms": "http://sms.io/", "schema": "http://schema.org/"},
            "@graph": [
                {"@id": "bts:Patient", "rdfs:label": "Patient",
                 "sms:requiresDependency": [{"@id": "bts:PatientID"}, {"@id": "bts:Sex"}]},
                {"@id": "bts:PatientID", "rdfs:label": "PatientID"},
                {"@id": "bts:Sex", "rdfs:label": "Sex",
                 "schema:rangeIncludes": [{"@id": "bts:Female"}, {"@id": "bts:Male"}]},
                {"@id": "bts:Female", "rdfs:label": "Female"},
                {"@id": "bts:Male", "rdfs:label": "Male"}
            ]
        }))
        .unwrap();
        let validator = ManifestValidator::new(&graph, "Patient").unwrap();
        let raw = RawTable::from_strings(["PatientID", "Sex"], [["", "Female"]]);
        let errors = validator.validate(&raw).unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].row, 2);
        assert_eq!(errors[0].column, "PatientID");
        assert_eq!(errors[0].value, json!(""));
    }

    #[test]
    fn test_duplicate_headers_are_rejected() {
        let graph = graph();
        let validator = ManifestValidator::new(&graph, "Patient").unwrap();
        let raw = RawTable::from_strings(["PatientID", "Sex", "Sex "], [["p1", "Bad", "Female"]]);
        let err = validator.validate(&raw).unwrap_err();
        assert!(matches!(err, ValidateError::Read(ManifestReadError::Malformed { .. })));
    }

    #[test]
    fn test_component_mismatch_short_circuits() {
        let graph = graph();
        let validator = ManifestValidator::new(&graph, "Patient").unwrap();
        let raw = RawTable::from_strings(
            ["PatientID", "Sex", "Tags", "Component"],
            [["", "Female", "", "Patient"], ["p2", "Other", "", "Biospecimen"]],
        );
        let errors = validator.validate(&raw).unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].row, 3);
        assert_eq!(errors[0].column, COMPONENT_COLUMN);
        assert_eq!(
            errors[0].message,
            "Component value provided is: 'Biospecimen', whereas the Template Type is: 'Patient'"
        );
        assert_eq!(errors[0].value, json!(["Biospecimen", "Patient"]));
    }

    #[test]
    fn test_list_item_error_reports_index_column() {
        let graph = SchemaGraph::load(&json!({
            "@context": {"bts": "http://schema.biothings.io/", "sms": "http://sms.io/", "schema": "http://schema.org/"},
            "@graph": [
                {"@id": "bts:Sample", "rdfs:label": "Sample", "sms:requiresDependency": [{"@id": "bts:Color"}]},
                {
                    "@id": "bts:Color",
                    "rdfs:label": "Color",
                    "sms:validationRules": ["list"],
                    "schema:rangeIncludes": [{"@id": "bts:Red"}, {"@id": "bts:Blue"}]
                },
                {"@id": "bts:Red", "rdfs:label": "Red"},
                {"@id": "bts:Blue", "rdfs:label": "Blue"}
            ]
        }))
        .unwrap();
        let validator = ManifestValidator::new(&graph, "Sample").unwrap();
        let raw = RawTable::from_strings(["Color"], [["Red, Green"]]);
        let errors = validator.validate(&raw).unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].column, "1");
        assert_eq!(errors[0].value, json!("Green"));
    }

    #[test]
    fn test_unknown_root() {
        let graph = graph();
        let err = ManifestValidator::new(&graph, "Biospecimen").unwrap_err();
        assert_eq!(err.node, "Biospecimen");
    }

    #[test]
    fn test_truncate_message_counts_chars() {
        let long = "é".repeat(600);
        assert_eq!(truncate_message(&long).chars().count(), MAX_MESSAGE_CHARS);
        assert_eq!(truncate_message("short"), "short");
    }

    #[test]
    fn test_error_serializes_as_tuple() {
        let error = ValidationError {
            row: 2,
            column: "PatientID".into(),
            message: "blank".into(),
            value: json!(""),
        };
        let encoded = serde_json::to_value(&error).unwrap();
        assert_eq!(encoded, json!([2, "PatientID", "blank", ""]));
        let decoded: ValidationError = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, error);
    }
}
