//! # schematic-graph: Schema Graph Store & Query Engine
//!
//! Loads a JSON-LD metadata model into an explicit directed graph and
//! answers the traversal queries the rest of schematic is built on.
//!
//! ## Store (`store`)
//!
//! - [`SchemaGraph::load`]: curie-expands the document and builds
//!   [`SchemaNode`]s and relation-labelled [`SchemaEdge`]s.
//!
//! ## Queries (`query`)
//!
//! - [`SchemaGraph::descendants_by_edge_type`]: relation subgraph under a
//!   root, optionally connected and topologically ordered.
//! - [`SchemaGraph::ordered_model_nodes`]: prerequisites-first ordering.
//! - [`SchemaGraph::component_requirements`]: components a component needs.
//!
//! ## Crate Policy
//!
//! - Depends only on `schematic-core` internally.
//! - The graph is immutable once loaded; no mutation API is exposed.

pub mod query;
pub mod store;

pub use query::GraphError;
pub use store::{relationship, SchemaEdge, SchemaGraph, SchemaNode, LIST_RULE};
