//! # Curie and URI Handling
//!
//! Compact URIs ("curies", `prefix:suffix`) appear throughout JSON-LD
//! schema documents. They are expanded against the document's `@context`
//! before node and edge identifiers are built.
//!
//! ## Rules
//!
//! - A string is a curie when splitting on `:` yields exactly two parts.
//! - Prefixes in [`PREFIXES_NOT_EXPANDED`] are never expanded, so
//!   `rdfs:label` and friends stay in their compact form.
//! - A curie whose prefix is absent from the context is returned unchanged.
//! - [`extract_name`] reduces a curie or URI to its local name.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::{NameExtractionError, SchemaFormatError};

/// Prefixes that are left compact even when the context defines them.
pub const PREFIXES_NOT_EXPANDED: &[&str] = &["rdf", "rdfs", "xsd"];

/// Prefix-to-URI mapping taken from a document's `@context`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    prefixes: BTreeMap<String, String>,
}

impl Context {
    /// Build a context from an explicit prefix map.
    pub fn new(prefixes: BTreeMap<String, String>) -> Self {
        Self { prefixes }
    }

    /// Parse the value of a document's `@context` key.
    ///
    /// String values map directly. Object values contribute their `@id`
    /// member when it is a string. Any other value is ignored.
    ///
    /// # Errors
    ///
    /// Returns `SchemaFormatError::WrongType` if the value is not an object.
    pub fn from_json(value: &Value) -> Result<Self, SchemaFormatError> {
        let obj = value.as_object().ok_or(SchemaFormatError::WrongType {
            key: "@context",
            expected: "an object",
        })?;
        let prefixes = obj
            .iter()
            .filter_map(|(prefix, uri)| {
                let uri = match uri {
                    Value::String(s) => s.clone(),
                    Value::Object(o) => o.get("@id")?.as_str()?.to_string(),
                    _ => return None,
                };
                Some((prefix.clone(), uri))
            })
            .collect();
        Ok(Self { prefixes })
    }

    /// Look up the URI bound to a prefix.
    pub fn get(&self, prefix: &str) -> Option<&str> {
        self.prefixes.get(prefix).map(String::as_str)
    }

    /// Number of prefixes in the context.
    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    /// Whether the context defines no prefixes.
    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    /// Expand a curie against this context. See [`expand_curie`].
    pub fn expand(&self, curie: &str) -> String {
        expand_curie(curie, self)
    }
}

/// Expand a curie into a full URI using `context`.
///
/// Inputs that are not curies, curies with a non-expanding prefix, and
/// curies whose prefix is unknown are returned unchanged.
pub fn expand_curie(curie: &str, context: &Context) -> String {
    let mut parts = curie.split(':');
    if let (Some(prefix), Some(value), None) = (parts.next(), parts.next(), parts.next()) {
        if !PREFIXES_NOT_EXPANDED.contains(&prefix) {
            if let Some(base) = context.get(prefix) {
                return format!("{base}{value}");
            }
        }
    }
    curie.to_string()
}

/// Extract the local name from a URI or curie.
///
/// `bts:Patient` yields `Patient`; `http://schema.biothings.io/Patient`
/// yields `Patient`.
///
/// # Errors
///
/// Returns `NameExtractionError` when neither form applies or the
/// resulting name is empty.
pub fn extract_name(item: &str) -> Result<String, NameExtractionError> {
    let fail = || NameExtractionError {
        item: item.to_string(),
    };

    if !item.contains("http") {
        let mut parts = item.split(':');
        if let (Some(_), Some(name), None) = (parts.next(), parts.next(), parts.next()) {
            return non_empty(name).ok_or_else(fail);
        }
    }

    let path = item.rsplit("//").next().unwrap_or(item);
    let mut segments = path.split('/');
    let first = segments.next();
    match (first, segments.last()) {
        (Some(_), Some(last)) => non_empty(last).ok_or_else(fail),
        _ => Err(fail()),
    }
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn biothings() -> Context {
        Context::from_json(&json!({
            "bts": "http://schema.biothings.io/",
            "rdfs": "http://www.w3.org/2000/01/rdf-schema#",
            "schema": {"@id": "http://schema.org/", "@prefix": true},
            "ignored": 42
        }))
        .unwrap()
    }

    #[test]
    fn test_context_from_json_accepts_strings_and_id_objects() {
        let ctx = biothings();
        assert_eq!(ctx.len(), 3);
        assert_eq!(ctx.get("bts"), Some("http://schema.biothings.io/"));
        assert_eq!(ctx.get("schema"), Some("http://schema.org/"));
        assert_eq!(ctx.get("ignored"), None);
    }

    #[test]
    fn test_context_must_be_object() {
        let err = Context::from_json(&json!(["bts"])).unwrap_err();
        assert!(matches!(err, SchemaFormatError::WrongType { key: "@context", .. }));
    }

    #[test]
    fn test_expand_known_prefix() {
        assert_eq!(
            expand_curie("bts:Patient", &biothings()),
            "http://schema.biothings.io/Patient"
        );
    }

    #[test]
    fn test_expand_skips_protected_prefixes() {
        assert_eq!(expand_curie("rdfs:label", &biothings()), "rdfs:label");
    }

    #[test]
    fn test_expand_unknown_prefix_unchanged() {
        assert_eq!(expand_curie("sms:required", &biothings()), "sms:required");
    }

    #[test]
    fn test_expand_non_curie_unchanged() {
        let ctx = biothings();
        assert_eq!(expand_curie("Patient", &ctx), "Patient");
        assert_eq!(expand_curie("a:b:c", &ctx), "a:b:c");
    }

    #[test]
    fn test_extract_name_from_curie() {
        assert_eq!(extract_name("bts:Patient").unwrap(), "Patient");
    }

    #[test]
    fn test_extract_name_from_uri() {
        assert_eq!(
            extract_name("http://schema.biothings.io/Patient").unwrap(),
            "Patient"
        );
        assert_eq!(
            extract_name("https://schema.org/about/Thing").unwrap(),
            "Thing"
        );
    }

    #[test]
    fn test_extract_name_failures() {
        assert!(extract_name("Patient").is_err());
        assert!(extract_name("http://example.com").is_err());
        assert!(extract_name("http://example.com/").is_err());
        assert!(extract_name("bts:").is_err());
    }
}
