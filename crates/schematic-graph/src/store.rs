//! # Schema Graph Store
//!
//! Loads a JSON-LD schema document into an explicit directed graph of
//! [`SchemaNode`]s and relation-labelled [`SchemaEdge`]s.
//!
//! ## Loading
//!
//! 1. `@context` is parsed into a prefix map and every key, string value
//!    and `{"@id": ..}` reference in `@graph` is curie-expanded.
//! 2. Each record's `@id` is reduced to a local name, which becomes the
//!    node identifier. Identifiers must be unique.
//! 3. Every property whose value is an `@id` reference (or an array of
//!    them) becomes one edge per reference, labelled with the property's
//!    local name. Relations are open-ended; the graph does not restrict
//!    them to a fixed set.
//!
//! ## Edge Direction
//!
//! `A requiresDependency B` is stored as `A → B`: A needs B. The same holds
//! for `requiresComponent` and `rangeIncludes`. `subClassOf` and
//! `domainIncludes` point upward in the document (child to parent,
//! property to class) and are stored reversed so that descendant traversal
//! always flows from a component towards its attributes.
//!
//! ## Invariants
//!
//! - Node identifiers are unique.
//! - Every edge's endpoints exist as nodes.
//! - The graph is immutable after [`SchemaGraph::load`] returns.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Serialize;
use serde_json::{Map, Value};

use schematic_core::curie::{extract_name, Context};
use schematic_core::error::{SchemaFormatError, SchematicError};

/// Well-known relation labels.
pub mod relationship {
    /// A node requires another node to be specified.
    pub const REQUIRES_DEPENDENCY: &str = "requiresDependency";
    /// A component requires another component.
    pub const REQUIRES_COMPONENT: &str = "requiresComponent";
    /// A property accepts the target as one of its values.
    pub const RANGE_INCLUDES: &str = "rangeIncludes";
    /// Stored class → property.
    pub const DOMAIN_INCLUDES: &str = "domainIncludes";
    /// Stored parent → child.
    pub const SUBCLASS_OF: &str = "subClassOf";

    /// Relations whose references must resolve to a defined node.
    pub const STRICT: &[&str] = &[REQUIRES_DEPENDENCY, REQUIRES_COMPONENT, RANGE_INCLUDES];

    /// Relations stored in the reverse of their document direction.
    pub const REVERSED: &[&str] = &[SUBCLASS_OF, DOMAIN_INCLUDES];
}

/// Validation rule tag that marks a multi-valued attribute.
pub const LIST_RULE: &str = "list";

/// A class or property of the metadata model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaNode {
    /// Local name extracted from the expanded `@id`.
    pub id: String,
    /// Expanded `@id`.
    pub uri: String,
    /// `rdfs:label`, falling back to the identifier.
    pub label: String,
    /// `sms:displayName`, falling back to the label.
    pub display_name: String,
    /// `rdfs:comment`, if present.
    pub comment: Option<String>,
    /// `sms:required`, if the record carries it.
    pub required: Option<bool>,
    /// Free-form validation rule tags (`sms:validationRules`).
    pub validation_rules: Vec<String>,
    /// Display names of `rangeIncludes` targets, in document order.
    pub permissible_values: Vec<String>,
}

impl SchemaNode {
    /// Whether the node carries the given rule tag.
    pub fn has_rule(&self, rule: &str) -> bool {
        self.validation_rules.iter().any(|r| r == rule)
    }

    /// Whether values of this node are comma-separated lists.
    pub fn is_list(&self) -> bool {
        self.has_rule(LIST_RULE)
    }

    /// Whether the record explicitly marks the attribute as not required.
    /// An absent flag leaves the attribute required.
    pub fn is_optional(&self) -> bool {
        self.required == Some(false)
    }
}

/// A directed, relation-labelled edge between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SchemaEdge {
    /// Source node identifier.
    pub source: String,
    /// Target node identifier.
    pub target: String,
    /// Relation label.
    pub relationship: String,
}

/// The full metadata model graph.
///
/// Read-only after load; `Send + Sync` so concurrent queries may share it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaGraph {
    pub(crate) nodes: Vec<SchemaNode>,
    pub(crate) index: HashMap<String, usize>,
    pub(crate) edges: Vec<SchemaEdge>,
    /// Outgoing edge indices per node, in insertion order.
    pub(crate) outgoing: Vec<Vec<usize>>,
}

/// A record after curie expansion, keyed by property local name.
struct ExpandedRecord {
    id: String,
    uri: String,
    properties: Vec<(String, Value)>,
}

impl SchemaGraph {
    /// Load a parsed JSON-LD document.
    ///
    /// # Errors
    ///
    /// Returns `SchemaFormatError` if `@context` or `@graph` is missing or
    /// mistyped, a record lacks a string `@id`, an identifier repeats, a
    /// name cannot be extracted, or a dependency-bearing relation points at
    /// an undefined node.
    pub fn load(document: &Value) -> Result<Self, SchemaFormatError> {
        let obj = document.as_object().ok_or(SchemaFormatError::WrongType {
            key: "document",
            expected: "a JSON object",
        })?;
        let context = Context::from_json(
            obj.get("@context")
                .ok_or(SchemaFormatError::MissingKey { key: "@context" })?,
        )?;
        let records = obj
            .get("@graph")
            .ok_or(SchemaFormatError::MissingKey { key: "@graph" })?
            .as_array()
            .ok_or(SchemaFormatError::WrongType {
                key: "@graph",
                expected: "an array",
            })?;

        let expanded = records
            .iter()
            .enumerate()
            .map(|(index, record)| expand_record(index, record, &context))
            .collect::<Result<Vec<_>, _>>()?;

        let mut graph = Self {
            nodes: Vec::with_capacity(expanded.len()),
            index: HashMap::with_capacity(expanded.len()),
            edges: Vec::new(),
            outgoing: Vec::with_capacity(expanded.len()),
        };

        for record in &expanded {
            if graph.index.contains_key(&record.id) {
                return Err(SchemaFormatError::DuplicateId {
                    id: record.id.clone(),
                });
            }
            graph.index.insert(record.id.clone(), graph.nodes.len());
            graph.nodes.push(node_from_record(record));
            graph.outgoing.push(Vec::new());
        }

        let mut seen: HashSet<SchemaEdge> = HashSet::new();
        for record in &expanded {
            for (property, value) in &record.properties {
                let strict = relationship::STRICT.contains(&property.as_str());
                for reference in references(value) {
                    let target = match extract_name(&reference) {
                        Ok(name) => name,
                        Err(err) if !strict => {
                            tracing::debug!(
                                node = %record.id,
                                relationship = %property,
                                %err,
                                "skipping unnamed reference"
                            );
                            continue;
                        }
                        Err(err) => return Err(err.into()),
                    };
                    if !graph.index.contains_key(&target) {
                        if strict {
                            return Err(SchemaFormatError::DanglingReference {
                                source_node: record.id.clone(),
                                relationship: property.clone(),
                                target,
                            });
                        }
                        tracing::debug!(
                            node = %record.id,
                            relationship = %property,
                            target = %target,
                            "skipping reference to undefined node"
                        );
                        continue;
                    }
                    let (source, target) = if relationship::REVERSED.contains(&property.as_str()) {
                        (target, record.id.clone())
                    } else {
                        (record.id.clone(), target)
                    };
                    let edge = SchemaEdge {
                        source,
                        target,
                        relationship: property.clone(),
                    };
                    if seen.insert(edge.clone()) {
                        graph.push_edge(edge);
                    }
                }
            }
        }

        graph.resolve_permissible_values();

        tracing::debug!(
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            "loaded schema graph"
        );
        Ok(graph)
    }

    /// Parse and load a JSON-LD document from text.
    ///
    /// # Errors
    ///
    /// Returns `SchemaFormatError::Json` for invalid JSON, otherwise as [`load`](Self::load).
    pub fn from_json_str(text: &str) -> Result<Self, SchemaFormatError> {
        let value: Value = serde_json::from_str(text)?;
        Self::load(&value)
    }

    /// Read and load a JSON-LD file.
    ///
    /// The file handle is released once the bytes are read.
    ///
    /// # Errors
    ///
    /// Returns `SchematicError::Io` if the file cannot be read, or
    /// `SchematicError::SchemaFormat` if it cannot be loaded.
    pub fn from_path(path: &Path) -> Result<Self, SchematicError> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::from_json_str(&text)?)
    }

    fn push_edge(&mut self, edge: SchemaEdge) {
        if let Some(&source) = self.index.get(&edge.source) {
            self.outgoing[source].push(self.edges.len());
            self.edges.push(edge);
        }
    }

    fn resolve_permissible_values(&mut self) {
        let values: Vec<Vec<String>> = (0..self.nodes.len())
            .map(|i| {
                self.outgoing[i]
                    .iter()
                    .map(|&e| &self.edges[e])
                    .filter(|e| e.relationship == relationship::RANGE_INCLUDES)
                    .filter_map(|e| self.node(&e.target))
                    .map(|n| n.display_name.clone())
                    .collect()
            })
            .collect();
        for (node, permissible) in self.nodes.iter_mut().zip(values) {
            node.permissible_values = permissible;
        }
    }

    /// All nodes, in document order.
    pub fn nodes(&self) -> &[SchemaNode] {
        &self.nodes
    }

    /// All edges, in insertion order.
    pub fn edges(&self) -> &[SchemaEdge] {
        &self.edges
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Look up a node by identifier.
    pub fn node(&self, id: &str) -> Option<&SchemaNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    /// Look up a node by display name.
    pub fn node_by_display_name(&self, display_name: &str) -> Option<&SchemaNode> {
        self.nodes.iter().find(|n| n.display_name == display_name)
    }

    /// Look up a node by identifier, then by display name.
    pub fn resolve(&self, name: &str) -> Option<&SchemaNode> {
        self.node(name).or_else(|| self.node_by_display_name(name))
    }

    /// Whether a class or property with this identifier is defined.
    pub fn is_class_in_schema(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Validation rule tags for a node given by identifier or display name.
    ///
    /// Unknown names have no rules.
    pub fn node_validation_rules(&self, name: &str) -> &[String] {
        self.resolve(name)
            .map(|n| n.validation_rules.as_slice())
            .unwrap_or(&[])
    }

    /// Outgoing edges of a node restricted to one relation.
    pub fn edges_from<'g>(
        &'g self,
        id: &str,
        relationship: &'g str,
    ) -> impl Iterator<Item = &'g SchemaEdge> + 'g {
        self.index
            .get(id)
            .map(|&i| self.outgoing[i].as_slice())
            .unwrap_or(&[])
            .iter()
            .map(move |&e| &self.edges[e])
            .filter(move |e| e.relationship == relationship)
    }
}

fn expand_record(
    index: usize,
    record: &Value,
    context: &Context,
) -> Result<ExpandedRecord, SchemaFormatError> {
    let invalid = |reason: &str| SchemaFormatError::InvalidRecord {
        index,
        reason: reason.to_string(),
    };
    let obj = record.as_object().ok_or_else(|| invalid("not an object"))?;
    let raw_id = obj
        .get("@id")
        .ok_or_else(|| invalid("missing '@id'"))?
        .as_str()
        .ok_or_else(|| invalid("'@id' is not a string"))?;
    let uri = context.expand(raw_id);
    let id = extract_name(&uri)?;

    let properties = obj
        .iter()
        .filter(|(key, _)| !key.starts_with('@'))
        .map(|(key, value)| {
            let expanded_key = context.expand(key);
            let name = extract_name(&expanded_key).unwrap_or(expanded_key);
            (name, expand_value(value, context))
        })
        .collect();

    Ok(ExpandedRecord {
        id,
        uri,
        properties,
    })
}

fn expand_value(value: &Value, context: &Context) -> Value {
    match value {
        Value::String(s) => Value::String(context.expand(s)),
        Value::Array(items) => Value::Array(items.iter().map(|v| expand_value(v, context)).collect()),
        Value::Object(obj) => match obj.get("@id").and_then(Value::as_str) {
            Some(id) => {
                let mut out = Map::new();
                out.insert("@id".to_string(), Value::String(context.expand(id)));
                Value::Object(out)
            }
            None => value.clone(),
        },
        other => other.clone(),
    }
}

/// `@id` references carried by a property value.
fn references(value: &Value) -> Vec<String> {
    match value {
        Value::Object(obj) => obj
            .get("@id")
            .and_then(Value::as_str)
            .map(|s| vec![s.to_string()])
            .unwrap_or_default(),
        Value::Array(items) => items.iter().flat_map(references).collect(),
        _ => Vec::new(),
    }
}

fn property<'r>(record: &'r ExpandedRecord, name: &str) -> Option<&'r Value> {
    record
        .properties
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value)
}

fn string_property(record: &ExpandedRecord, name: &str) -> Option<String> {
    match property(record, name)? {
        Value::String(s) => Some(s.clone()),
        Value::Object(obj) => obj.get("@value").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

fn is_true(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => extract_name(s).map_or(s == "true", |name| name == "true"),
        _ => false,
    }
}

fn node_from_record(record: &ExpandedRecord) -> SchemaNode {
    let label = string_property(record, "label").unwrap_or_else(|| record.id.clone());
    let display_name = string_property(record, "displayName").unwrap_or_else(|| label.clone());
    let validation_rules = match property(record, "validationRules") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Some(Value::String(s)) if !s.is_empty() => vec![s.clone()],
        _ => Vec::new(),
    };
    SchemaNode {
        id: record.id.clone(),
        uri: record.uri.clone(),
        label,
        display_name,
        comment: string_property(record, "comment"),
        required: property(record, "required").map(is_true),
        validation_rules,
        permissible_values: Vec::new(),
    }
}
