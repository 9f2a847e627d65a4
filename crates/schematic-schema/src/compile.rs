//! # Schema-to-ValidationSchema Compiler
//!
//! Derives a draft-07 JSON Schema document for one root component from the
//! root's `requiresDependency` subgraph.
//!
//! ## Derivation Rules
//!
//! Every dependency of the root becomes a property. Its value constraint
//! is decided once per node:
//!
//! | Node                          | Constraint                              |
//! |-------------------------------|-----------------------------------------|
//! | tagged `list`                 | array of strings (or of enum values)    |
//! | has `rangeIncludes` values    | string restricted to those values       |
//! | otherwise                     | string                                  |
//!
//! A dependency is required unless its node carries `sms:required` false.
//! Required properties are listed under `required` (the column must be
//! present) and reject blank values: scalars carry `minLength: 1`, lists
//! `minItems: 1`. Optional properties may be absent or blank, so optional
//! enumerations also accept the empty string.
//!
//! ## Conditional Dependencies
//!
//! When a permissible value V of property P itself requires attributes D,
//! an `allOf` entry `if P = V then D are required` is emitted. D's own
//! permissible values are processed the same way.

use std::collections::HashSet;

use serde::Serialize;
use serde_json::{json, Map, Value};
use thiserror::Error;

use schematic_core::error::NodeNotFoundError;
use schematic_graph::{relationship, GraphError, SchemaGraph, SchemaNode};

/// JSON Schema dialect of every compiled document.
pub const DRAFT7_SCHEMA_URI: &str = "http://json-schema.org/draft-07/schema#";

/// Error while producing or preparing a validation schema.
#[derive(Error, Debug)]
pub enum CompileError {
    /// A graph query failed (missing root, cyclic dependencies).
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// The schema document could not be compiled into a validator.
    #[error("validator build error for schema '{title}': {reason}")]
    ValidatorBuild {
        /// Schema title or identifier.
        title: String,
        /// Reason the validator could not be built.
        reason: String,
    },
}

impl From<NodeNotFoundError> for CompileError {
    fn from(err: NodeNotFoundError) -> Self {
        Self::Graph(GraphError::NodeNotFound(err))
    }
}

/// The value shape accepted for one attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "values", rename_all = "snake_case")]
pub enum ValueConstraint {
    /// Any string.
    Scalar,
    /// One of a fixed set of strings.
    ScalarEnum(Vec<String>),
    /// A sequence whose elements satisfy the inner constraint.
    ListOf(Box<ValueConstraint>),
}

impl ValueConstraint {
    /// Decide the constraint for a node from its rules and permissible values.
    pub fn for_node(node: &SchemaNode) -> Self {
        let element = if node.permissible_values.is_empty() {
            Self::Scalar
        } else {
            Self::ScalarEnum(node.permissible_values.clone())
        };
        if node.is_list() {
            Self::ListOf(Box::new(element))
        } else {
            element
        }
    }

    /// Whether values are sequences.
    pub fn is_list(&self) -> bool {
        matches!(self, Self::ListOf(_))
    }

    /// JSON Schema fragment; `non_blank` forbids empty values.
    pub fn to_json(&self, non_blank: bool) -> Value {
        match (self, non_blank) {
            (Self::Scalar, true) => json!({"type": "string", "minLength": 1}),
            (Self::Scalar, false) => json!({"type": "string"}),
            (Self::ScalarEnum(values), true) => json!({"type": "string", "enum": values}),
            (Self::ScalarEnum(values), false) => json!({
                "anyOf": [
                    {"type": "string", "enum": values},
                    {"type": "string", "maxLength": 0}
                ]
            }),
            (Self::ListOf(inner), true) => {
                json!({"type": "array", "items": inner.item_json(), "minItems": 1})
            }
            (Self::ListOf(inner), false) => json!({"type": "array", "items": inner.item_json()}),
        }
    }

    /// Fragment for one list element; elements are never blank-exempt.
    fn item_json(&self) -> Value {
        match self {
            Self::ScalarEnum(values) => json!({"type": "string", "enum": values}),
            _ => json!({"type": "string"}),
        }
    }
}

/// One attribute of the compiled schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyRule {
    /// Column / property name (the node's display name).
    pub name: String,
    /// Graph node identifier.
    pub node_id: String,
    /// Accepted value shape.
    pub constraint: ValueConstraint,
    /// Whether a blank value is rejected.
    pub non_blank: bool,
    /// Node comment, carried into `description`.
    pub description: Option<String>,
}

impl PropertyRule {
    fn from_node(node: &SchemaNode, non_blank: bool) -> Self {
        Self {
            name: node.display_name.clone(),
            node_id: node.id.clone(),
            constraint: ValueConstraint::for_node(node),
            non_blank,
            description: node.comment.clone(),
        }
    }

    fn to_json(&self) -> Value {
        let mut fragment = self.constraint.to_json(self.non_blank);
        if let (Some(description), Value::Object(obj)) = (&self.description, &mut fragment) {
            obj.insert("description".into(), Value::String(description.clone()));
        }
        fragment
    }
}

/// Attributes that become mandatory when a property takes a given value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConditionalRule {
    /// Property whose value triggers the rule.
    pub property: String,
    /// Whether the triggering property is list-valued.
    pub property_is_list: bool,
    /// Triggering value.
    pub value: String,
    /// Attributes required (non-blank) when triggered.
    pub then_required: Vec<PropertyRule>,
}

impl ConditionalRule {
    fn to_json(&self) -> Value {
        let trigger = if self.property_is_list {
            json!({"contains": {"const": self.value}})
        } else {
            json!({"enum": [self.value]})
        };
        let mut then_properties = Map::new();
        for rule in &self.then_required {
            then_properties.insert(rule.name.clone(), rule.to_json());
        }
        let then_names: Vec<&str> = self.then_required.iter().map(|r| r.name.as_str()).collect();
        let mut if_properties = Map::new();
        if_properties.insert(self.property.clone(), trigger);
        json!({
            "if": {
                "properties": if_properties,
                "required": [self.property]
            },
            "then": {
                "properties": then_properties,
                "required": then_names
            }
        })
    }
}

/// A compiled, disposable validation document for one root component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationSchema {
    /// Root node identifier.
    pub root: String,
    /// Schema title, `<root>_validation`.
    pub title: String,
    /// Attributes in dependency order.
    pub properties: Vec<PropertyRule>,
    /// Value-triggered requirements.
    pub conditionals: Vec<ConditionalRule>,
}

impl ValidationSchema {
    /// Compile the validation schema for `root`.
    ///
    /// Deterministic for a given graph and root.
    ///
    /// # Errors
    ///
    /// Returns `CompileError::Graph` if `root` is absent or its dependency
    /// subgraph is cyclic.
    pub fn compile(graph: &SchemaGraph, root: &str) -> Result<Self, CompileError> {
        let dependencies = dependency_nodes(graph, root)?;

        let properties: Vec<PropertyRule> = dependencies
            .iter()
            .map(|node| PropertyRule::from_node(node, !node.is_optional()))
            .collect();

        let mut conditionals = Vec::new();
        let mut visited: HashSet<&str> = HashSet::from([root]);
        let mut pending: Vec<&SchemaNode> = dependencies;
        while let Some(property) = pending.pop() {
            if !visited.insert(property.id.as_str()) {
                continue;
            }
            for edge in graph.edges_from(&property.id, relationship::RANGE_INCLUDES) {
                let triggered = dependency_nodes(graph, &edge.target)?;
                if triggered.is_empty() {
                    continue;
                }
                let Some(value) = graph.node(&edge.target) else {
                    continue;
                };
                conditionals.push(ConditionalRule {
                    property: property.display_name.clone(),
                    property_is_list: property.is_list(),
                    value: value.display_name.clone(),
                    then_required: triggered
                        .iter()
                        .map(|node| PropertyRule::from_node(node, true))
                        .collect(),
                });
                pending.extend(triggered);
            }
        }
        conditionals.sort_by(|a, b| (&a.property, &a.value).cmp(&(&b.property, &b.value)));

        tracing::debug!(
            root,
            properties = properties.len(),
            conditionals = conditionals.len(),
            "compiled validation schema"
        );

        Ok(Self {
            root: root.to_string(),
            title: format!("{root}_validation"),
            properties,
            conditionals,
        })
    }

    /// Look up a property by name.
    pub fn property(&self, name: &str) -> Option<&PropertyRule> {
        self.properties
            .iter()
            .chain(self.conditionals.iter().flat_map(|c| c.then_required.iter()))
            .find(|p| p.name == name)
    }

    /// Names of the required (non-blank) columns, in dependency order.
    pub fn required(&self) -> Vec<&str> {
        self.properties
            .iter()
            .filter(|p| p.non_blank)
            .map(|p| p.name.as_str())
            .collect()
    }

    /// Names of list-valued properties, including conditional ones.
    pub fn list_columns(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.properties
            .iter()
            .chain(self.conditionals.iter().flat_map(|c| c.then_required.iter()))
            .filter(|p| p.constraint.is_list())
            .map(|p| p.name.as_str())
            .filter(|name| seen.insert(*name))
            .collect()
    }

    /// Render the draft-07 JSON Schema document.
    pub fn to_json(&self) -> Value {
        let mut properties = Map::new();
        for rule in &self.properties {
            properties.insert(rule.name.clone(), rule.to_json());
        }
        let mut doc = json!({
            "$schema": DRAFT7_SCHEMA_URI,
            "$id": format!("http://example.com/{}", self.title),
            "title": self.title,
            "type": "object",
            "properties": properties,
            "required": self.required()
        });
        // draft-07 requires a non-empty `allOf`.
        if !self.conditionals.is_empty() {
            let all_of: Vec<Value> = self.conditionals.iter().map(ConditionalRule::to_json).collect();
            if let Value::Object(obj) = &mut doc {
                obj.insert("allOf".into(), Value::Array(all_of));
            }
        }
        doc
    }
}

/// `requiresDependency` descendants of `root`, topologically ordered, root excluded.
fn dependency_nodes<'g>(
    graph: &'g SchemaGraph,
    root: &str,
) -> Result<Vec<&'g SchemaNode>, CompileError> {
    let ids = graph.descendants_by_edge_type(root, relationship::REQUIRES_DEPENDENCY, true, true)?;
    Ok(ids
        .iter()
        .filter(|id| id.as_str() != root)
        .filter_map(|id| graph.node(id))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> SchemaGraph {
        SchemaGraph::load(&json!({
            "@context": {
                "bts": "http://schema.biothings.io/",
                "sms": "http://sms.io/",
                "schema": "http://schema.org/"
            },
            "@graph": [
                {
                    "@id": "bts:Patient",
                    "rdfs:label": "Patient",
                    "sms:requiresDependency": [
                        {"@id": "bts:PatientID"},
                        {"@id": "bts:Sex"},
                        {"@id": "bts:Diagnosis"},
                        {"@id": "bts:Tags"}
                    ]
                },
                {
                    "@id": "bts:PatientID",
                    "rdfs:label": "PatientID",
                    "rdfs:comment": "Unique patient identifier",
                    "sms:required": "sms:true"
                },
                {
                    "@id": "bts:Sex",
                    "rdfs:label": "Sex",
                    "sms:required": "sms:true",
                    "schema:rangeIncludes": [{"@id": "bts:Female"}, {"@id": "bts:Male"}]
                },
                {"@id": "bts:Female", "rdfs:label": "Female"},
                {"@id": "bts:Male", "rdfs:label": "Male"},
                {
                    "@id": "bts:Diagnosis",
                    "rdfs:label": "Diagnosis",
                    "sms:required": "sms:false",
                    "schema:rangeIncludes": [{"@id": "bts:Healthy"}, {"@id": "bts:Cancer"}]
                },
                {"@id": "bts:Healthy", "rdfs:label": "Healthy"},
                {
                    "@id": "bts:Cancer",
                    "rdfs:label": "Cancer",
                    "sms:requiresDependency": [{"@id": "bts:CancerType"}]
                },
                {"@id": "bts:CancerType", "rdfs:label": "CancerType", "sms:displayName": "Cancer Type"},
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
    fn test_constraint_variants() {
        let graph = model();
        assert_eq!(
            ValueConstraint::for_node(graph.node("PatientID").unwrap()),
            ValueConstraint::Scalar
        );
        assert_eq!(
            ValueConstraint::for_node(graph.node("Sex").unwrap()),
            ValueConstraint::ScalarEnum(vec!["Female".into(), "Male".into()])
        );
        assert_eq!(
            ValueConstraint::for_node(graph.node("Tags").unwrap()),
            ValueConstraint::ListOf(Box::new(ValueConstraint::Scalar))
        );
    }

    #[test]
    fn test_compile_properties_and_required() {
        let schema = ValidationSchema::compile(&model(), "Patient").unwrap();
        assert_eq!(schema.title, "Patient_validation");
        assert_eq!(schema.required(), ["PatientID", "Sex"]);
        assert_eq!(schema.properties.len(), 4);
        assert!(schema.property("PatientID").unwrap().non_blank);
        assert!(!schema.property("Diagnosis").unwrap().non_blank);
        assert_eq!(schema.list_columns(), ["Tags"]);
    }

    #[test]
    fn test_json_document_shape() {
        let doc = ValidationSchema::compile(&model(), "Patient").unwrap().to_json();
        assert_eq!(doc["$schema"], DRAFT7_SCHEMA_URI);
        assert_eq!(doc["$id"], "http://example.com/Patient_validation");
        assert_eq!(doc["type"], "object");
        assert_eq!(
            doc["properties"]["PatientID"],
            json!({"type": "string", "minLength": 1, "description": "Unique patient identifier"})
        );
        assert_eq!(
            doc["properties"]["Sex"],
            json!({"type": "string", "enum": ["Female", "Male"]})
        );
        assert_eq!(
            doc["properties"]["Tags"],
            json!({"type": "array", "items": {"type": "string"}})
        );
        assert!(doc["properties"]["Diagnosis"]["anyOf"].is_array());
    }

    #[test]
    fn test_conditional_dependency() {
        let schema = ValidationSchema::compile(&model(), "Patient").unwrap();
        assert_eq!(schema.conditionals.len(), 1);
        let rule = &schema.conditionals[0];
        assert_eq!(rule.property, "Diagnosis");
        assert_eq!(rule.value, "Cancer");
        assert_eq!(rule.then_required[0].name, "Cancer Type");
        assert!(rule.then_required[0].non_blank);

        let doc = schema.to_json();
        let entry = &doc["allOf"][0];
        assert_eq!(entry["if"]["properties"]["Diagnosis"], json!({"enum": ["Cancer"]}));
        assert_eq!(entry["then"]["required"], json!(["Cancer Type"]));
        assert!(schema.property("Cancer Type").is_some());
        assert!(!schema.required().contains(&"Cancer Type"));
    }

    #[test]
    fn test_compile_missing_root() {
        let err = ValidationSchema::compile(&model(), "Biospecimen").unwrap_err();
        assert!(matches!(err, CompileError::Graph(GraphError::NodeNotFound(_))));
    }

    #[test]
    fn test_compile_leaf_root_is_empty() {
        let schema = ValidationSchema::compile(&model(), "PatientID").unwrap();
        assert!(schema.properties.is_empty());
        assert_eq!(schema.to_json()["required"], json!([]));
    }

    #[test]
    fn test_unflagged_dependencies_are_required() {
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
        let doc = ValidationSchema::compile(&graph, "Patient").unwrap().to_json();
        assert_eq!(doc["required"], json!(["PatientID", "Sex"]));
        assert_eq!(doc["properties"]["PatientID"], json!({"type": "string", "minLength": 1}));
        assert!(doc.get("allOf").is_none());
    }

    #[test]
    fn test_compile_is_deterministic() {
        let graph = model();
        let a = ValidationSchema::compile(&graph, "Patient").unwrap().to_json();
        let b = ValidationSchema::compile(&graph, "Patient").unwrap().to_json();
        assert_eq!(a, b);
    }

    #[test]
    fn test_required_list_needs_an_item() {
        let fragment = ValueConstraint::ListOf(Box::new(ValueConstraint::ScalarEnum(vec![
            "a".into(),
        ])))
        .to_json(true);
        assert_eq!(
            fragment,
            json!({"type": "array", "items": {"type": "string", "enum": ["a"]}, "minItems": 1})
        );
    }
}
