//! # Record Checking
//!
//! Runs single JSON records against a draft-07 validation document and
//! returns every violation, ordered by relevance.
//!
//! ## Relevance
//!
//! Violations at deeper instance paths come first. Among equal depths,
//! violations raised by the weak combinators (`anyOf`, `oneOf`) precede
//! the rest. The sort is stable, so ties keep the validator's own order.
//!
//! ## Reference Resolution
//!
//! Compiled schemas carry no `$ref`s. Caller-supplied documents may; any
//! remote reference resolves to a permissive schema rather than triggering
//! a network request.

use std::cmp::Reverse;
use std::fmt;

use jsonschema::{Retrieve, Uri, ValidationOptions, Validator};
use serde_json::Value;

use crate::compile::CompileError;

/// Keywords whose failures are least specific.
const WEAK_KEYWORDS: &[&str] = &["anyOf", "oneOf"];

/// Retriever that never leaves the process.
struct OfflineRetriever;

impl Retrieve for OfflineRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        tracing::warn!(uri = uri.as_str(), "remote $ref not fetched; treating as permissive");
        Ok(serde_json::json!({}))
    }
}

/// A single violation with structured context.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    /// Unescaped segments of the instance path (property names, indices).
    pub path: Vec<String>,
    /// JSON Pointer path within the schema that triggered the error.
    pub schema_path: String,
    /// Human-readable description of the violation.
    pub message: String,
    /// The offending part of the instance.
    pub instance: Value,
}

impl Violation {
    /// The keyword that raised the violation.
    pub fn keyword(&self) -> &str {
        self.schema_path.rsplit('/').next().unwrap_or("")
    }

    fn is_weak(&self) -> bool {
        WEAK_KEYWORDS.contains(&self.keyword())
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "  (root): {}", self.message)
        } else {
            write!(f, "  /{}: {}", self.path.join("/"), self.message)
        }
    }
}

/// A compiled draft-07 validator for one schema document.
///
/// `Send + Sync`; build once and check many records.
pub struct RecordChecker {
    title: String,
    validator: Validator,
}

impl fmt::Debug for RecordChecker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordChecker")
            .field("title", &self.title)
            .finish_non_exhaustive()
    }
}

impl RecordChecker {
    /// Compile a schema document under draft 7.
    ///
    /// # Errors
    ///
    /// Returns `CompileError::ValidatorBuild` if the document is not a valid schema.
    pub fn new(schema: &Value) -> Result<Self, CompileError> {
        let title = schema
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or("<untitled>")
            .to_string();
        let validator = build_options()
            .build(schema)
            .map_err(|e| CompileError::ValidatorBuild {
                title: title.clone(),
                reason: e.to_string(),
            })?;
        Ok(Self { title, validator })
    }

    /// Title of the underlying schema.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Every violation of `instance`, most relevant first.
    pub fn check(&self, instance: &Value) -> Vec<Violation> {
        let mut violations: Vec<Violation> = self
            .validator
            .iter_errors(instance)
            .map(|e| Violation {
                path: pointer_segments(&e.instance_path.to_string()),
                schema_path: e.schema_path.to_string(),
                message: e.to_string(),
                instance: e.instance.into_owned(),
            })
            .collect();
        violations.sort_by_key(|v| (Reverse(v.path.len()), !v.is_weak()));
        violations
    }

    /// Whether `instance` satisfies the schema.
    pub fn is_valid(&self, instance: &Value) -> bool {
        self.validator.is_valid(instance)
    }
}

fn build_options() -> ValidationOptions {
    let mut opts = jsonschema::options();
    opts.with_draft(jsonschema::Draft::Draft7);
    opts.with_retriever(OfflineRetriever);
    opts
}

/// Split a JSON Pointer into unescaped reference tokens.
fn pointer_segments(pointer: &str) -> Vec<String> {
    if pointer.is_empty() {
        return Vec::new();
    }
    pointer
        .trim_start_matches('/')
        .split('/')
        .map(|token| token.replace("~1", "/").replace("~0", "~"))
        .collect()
}
