//! # Graph Query Engine
//!
//! Descendant subgraphs, topological ordering and component requirements
//! over a loaded [`SchemaGraph`].
//!
//! ## Subgraph Extraction
//!
//! Given a root and a relation label:
//!
//! 1. Collect the root and everything reachable from it over edges of any
//!    relation.
//! 2. Keep only the edges of the requested relation whose endpoints both
//!    lie in that set. The relation subgraph's nodes are the endpoints of
//!    those edges.
//! 3. When `connected` is requested, narrow to the nodes reachable from
//!    the root over relation edges alone (root included).
//!
//! ## Ordering
//!
//! Kahn's algorithm. Among nodes whose predecessors are all emitted, the
//! one discovered first (breadth-first from the root, edges in document
//! order) is emitted next. The result is deterministic and independent of
//! hash ordering.
//!
//! For `A requiresDependency B` (stored `A → B`) the raw order lists A
//! before B. [`SchemaGraph::ordered_model_nodes`] reverses it, so
//! prerequisites come first and the root comes last.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use thiserror::Error;

use schematic_core::error::NodeNotFoundError;

use crate::store::{relationship, SchemaGraph};

/// Error from a graph query.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// The root node is not in the graph.
    #[error(transparent)]
    NodeNotFound(#[from] NodeNotFoundError),

    /// The relation subgraph contains a cycle and has no topological order.
    #[error("relation '{relationship}' contains a cycle through: {}", .nodes.join(", "))]
    Cycle {
        /// The relation being ordered.
        relationship: String,
        /// Nodes left unordered when the sort stalled.
        nodes: Vec<String>,
    },
}

/// A relation-restricted subgraph with node indices in discovery order.
struct RelationSubgraph {
    nodes: Vec<usize>,
    edges: Vec<(usize, usize)>,
}

impl SchemaGraph {
    fn require(&self, id: &str) -> Result<usize, NodeNotFoundError> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| NodeNotFoundError::new(id))
    }

    /// Breadth-first discovery from `root`, following edges accepted by `follow`.
    fn discover(&self, root: usize, follow: impl Fn(usize) -> bool) -> Vec<usize> {
        let mut seen = HashSet::from([root]);
        let mut order = vec![root];
        let mut queue = VecDeque::from([root]);
        while let Some(node) = queue.pop_front() {
            for &e in &self.outgoing[node] {
                if !follow(e) {
                    continue;
                }
                let target = self.index[&self.edges[e].target];
                if seen.insert(target) {
                    order.push(target);
                    queue.push_back(target);
                }
            }
        }
        order
    }

    fn relation_subgraph(&self, root: usize, relationship: &str) -> RelationSubgraph {
        let reachable = self.discover(root, |_| true);
        let members: HashSet<usize> = reachable.iter().copied().collect();

        let mut nodes = Vec::new();
        let mut in_nodes = HashSet::new();
        let mut edges = Vec::new();
        for &source in &reachable {
            for &e in &self.outgoing[source] {
                let edge = &self.edges[e];
                if edge.relationship != relationship {
                    continue;
                }
                let target = self.index[&edge.target];
                if !members.contains(&target) {
                    continue;
                }
                for n in [source, target] {
                    if in_nodes.insert(n) {
                        nodes.push(n);
                    }
                }
                edges.push((source, target));
            }
        }
        RelationSubgraph { nodes, edges }
    }

    /// Kahn's algorithm over `nodes`, breaking ties by position in `nodes`.
    fn topological_order(
        &self,
        nodes: &[usize],
        edges: &[(usize, usize)],
        relationship: &str,
    ) -> Result<Vec<usize>, GraphError> {
        let position: HashMap<usize, usize> =
            nodes.iter().enumerate().map(|(pos, &n)| (n, pos)).collect();
        let mut indegree = vec![0usize; nodes.len()];
        let mut successors: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
        for (source, target) in edges {
            if let (Some(&s), Some(&t)) = (position.get(source), position.get(target)) {
                successors[s].push(t);
                indegree[t] += 1;
            }
        }

        let mut ready: BTreeSet<usize> = (0..nodes.len()).filter(|&p| indegree[p] == 0).collect();
        let mut order = Vec::with_capacity(nodes.len());
        while let Some(pos) = ready.pop_first() {
            order.push(nodes[pos]);
            for &next in &successors[pos] {
                indegree[next] -= 1;
                if indegree[next] == 0 {
                    ready.insert(next);
                }
            }
        }

        if order.len() < nodes.len() {
            let stalled = (0..nodes.len())
                .filter(|&p| indegree[p] > 0)
                .map(|p| self.nodes[nodes[p]].id.clone())
                .collect();
            return Err(GraphError::Cycle {
                relationship: relationship.to_string(),
                nodes: stalled,
            });
        }
        Ok(order)
    }

    fn ids(&self, indices: impl IntoIterator<Item = usize>) -> Vec<String> {
        indices
            .into_iter()
            .map(|i| self.nodes[i].id.clone())
            .collect()
    }

    /// Descendants of `root` in the subgraph of one relation.
    ///
    /// With `connected`, only nodes reachable from `root` over the relation
    /// itself are returned (root included, or nothing when the root has no
    /// such edge). Without it, every endpoint of a relation edge inside the
    /// root's descendant subgraph is returned. With `ordered`, the result is
    /// a topological order; otherwise it is discovery order.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::NodeNotFound` if `root` is absent and
    /// `GraphError::Cycle` if an ordering is requested over a cyclic subgraph.
    pub fn descendants_by_edge_type(
        &self,
        root: &str,
        relationship: &str,
        connected: bool,
        ordered: bool,
    ) -> Result<Vec<String>, GraphError> {
        let root = self.require(root)?;
        let sub = self.relation_subgraph(root, relationship);
        if sub.nodes.is_empty() {
            return Ok(Vec::new());
        }

        let nodes = if connected {
            if !sub.nodes.contains(&root) {
                return Ok(Vec::new());
            }
            self.discover(root, |e| self.edges[e].relationship == relationship)
        } else {
            sub.nodes
        };

        if ordered {
            let order = self.topological_order(&nodes, &sub.edges, relationship)?;
            Ok(self.ids(order))
        } else {
            Ok(self.ids(nodes))
        }
    }

    /// Nodes under `root` for one relation, prerequisites first.
    ///
    /// The reverse of the connected topological order: for `A → B`, B
    /// precedes A, and the root is last.
    ///
    /// # Errors
    ///
    /// As [`descendants_by_edge_type`](Self::descendants_by_edge_type).
    pub fn ordered_model_nodes(
        &self,
        root: &str,
        relationship: &str,
    ) -> Result<Vec<String>, GraphError> {
        let mut nodes = self.descendants_by_edge_type(root, relationship, true, true)?;
        nodes.reverse();
        Ok(nodes)
    }

    /// Components required, directly or transitively, by `source_component`.
    ///
    /// Ordered topologically (requirers before what they require), with the
    /// source itself removed.
    ///
    /// # Errors
    ///
    /// As [`descendants_by_edge_type`](Self::descendants_by_edge_type).
    pub fn component_requirements(&self, source_component: &str) -> Result<Vec<String>, GraphError> {
        let mut components = self.descendants_by_edge_type(
            source_component,
            relationship::REQUIRES_COMPONENT,
            true,
            true,
        )?;
        components.retain(|c| c != source_component);
        Ok(components)
    }

    /// Direct `requiresDependency` targets of a node, in document order.
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFoundError` if `id` is absent.
    pub fn dependencies(&self, id: &str) -> Result<Vec<String>, NodeNotFoundError> {
        self.require(id)?;
        Ok(self
            .edges_from(id, relationship::REQUIRES_DEPENDENCY)
            .map(|e| e.target.clone())
            .collect())
    }
}
