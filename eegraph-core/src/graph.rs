//! Immutable weighted graphs assembled from node and edge records.

use std::collections::HashSet;

use serde::Serialize;
use tracing::instrument;

use crate::{error::GraphError, recording::SubjectId, signal::NodeFeatures};

/// One channel of one subject.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Node {
    index: usize,
    channel: String,
    subject_id: SubjectId,
    features: NodeFeatures,
}

impl Node {
    /// Creates a node record.
    #[must_use]
    pub fn new(
        subject_id: SubjectId,
        index: usize,
        channel: impl Into<String>,
        features: NodeFeatures,
    ) -> Self {
        Self {
            index,
            channel: channel.into(),
            subject_id,
            features,
        }
    }

    /// Stable node index taken from the input channel order.
    #[must_use]
    #[rustfmt::skip]
    pub fn index(&self) -> usize { self.index }

    /// Channel label.
    #[must_use]
    #[rustfmt::skip]
    pub fn channel(&self) -> &str { &self.channel }

    /// Subject the channel belongs to.
    #[must_use]
    #[rustfmt::skip]
    pub fn subject_id(&self) -> &SubjectId { &self.subject_id }

    /// Derived signal descriptors.
    #[must_use]
    #[rustfmt::skip]
    pub fn features(&self) -> &NodeFeatures { &self.features }
}

/// Undirected weighted connection between two nodes of one subject.
///
/// Endpoints are stored canonically with `source <= target`.
///
/// # Examples
/// ```
/// use eegraph_core::{Edge, SubjectId};
///
/// let edge = Edge::new(SubjectId::new("s1"), 4, 1, 0.5);
/// assert_eq!((edge.source(), edge.target()), (1, 4));
/// ```
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Edge {
    subject_id: SubjectId,
    source: usize,
    target: usize,
    weight: f64,
}

impl Edge {
    /// Creates an edge, ordering the endpoints canonically.
    #[must_use]
    pub fn new(subject_id: SubjectId, left: usize, right: usize, weight: f64) -> Self {
        Self {
            subject_id,
            source: left.min(right),
            target: left.max(right),
            weight,
        }
    }

    /// Lower endpoint.
    #[must_use]
    #[rustfmt::skip]
    pub fn source(&self) -> usize { self.source }

    /// Upper endpoint.
    #[must_use]
    #[rustfmt::skip]
    pub fn target(&self) -> usize { self.target }

    /// Connectivity weight.
    #[must_use]
    #[rustfmt::skip]
    pub fn weight(&self) -> f64 { self.weight }

    /// Subject the edge belongs to.
    #[must_use]
    #[rustfmt::skip]
    pub fn subject_id(&self) -> &SubjectId { &self.subject_id }
}

/// Validated, read-only weighted graph of one subject.
///
/// # Examples
/// ```
/// use eegraph_core::{Edge, Graph, Node, NodeFeatures, SubjectId};
///
/// let subject = SubjectId::new("s1");
/// let nodes = (0..3)
///     .map(|i| Node::new(subject.clone(), i, format!("ch{i}"), NodeFeatures::default()))
///     .collect();
/// let edges = vec![Edge::new(subject.clone(), 0, 1, 0.5), Edge::new(subject.clone(), 1, 2, 1.0)];
/// let graph = Graph::assemble(subject, nodes, edges).expect("graph is valid");
///
/// assert_eq!(graph.order(), 3);
/// assert_eq!(graph.size(), 2);
/// assert_eq!(graph.degree(1), 1.5);
/// assert_eq!(graph.total_weight(), 1.5);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Graph {
    subject_id: SubjectId,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    adjacency: Vec<Vec<(usize, f64)>>,
    degrees: Vec<f64>,
    total_weight: f64,
}

impl Graph {
    /// Validates node and edge records and builds the graph.
    ///
    /// Nodes must be indexed `0..n` in order; edges are sorted by
    /// `(source, target)`.
    ///
    /// # Errors
    /// Returns [`GraphError`] when a node is out of order, an endpoint is
    /// unknown, an edge is a self-loop or duplicate, a weight is negative or
    /// not finite, or an element belongs to another subject.
    #[instrument(
        name = "core.assemble",
        err,
        skip(subject_id, nodes, edges),
        fields(subject = %subject_id, order = nodes.len(), size = edges.len()),
    )]
    pub fn assemble(
        subject_id: SubjectId,
        nodes: Vec<Node>,
        mut edges: Vec<Edge>,
    ) -> Result<Self, GraphError> {
        for (position, node) in nodes.iter().enumerate() {
            if node.subject_id != subject_id {
                return Err(GraphError::SubjectMismatch {
                    expected: subject_id,
                    found: node.subject_id.clone(),
                });
            }
            if node.index != position {
                return Err(GraphError::NodeIndexMismatch {
                    position,
                    index: node.index,
                });
            }
        }

        let order = nodes.len();
        let mut seen = HashSet::with_capacity(edges.len());
        for edge in &edges {
            validate_edge(&subject_id, order, edge)?;
            if !seen.insert((edge.source, edge.target)) {
                return Err(GraphError::DuplicateEdge {
                    source_node: edge.source,
                    target_node: edge.target,
                });
            }
        }
        edges.sort_by_key(|edge| (edge.source, edge.target));

        Ok(Self::from_validated(subject_id, nodes, edges))
    }

    fn from_validated(subject_id: SubjectId, nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        let order = nodes.len();
        let mut adjacency = vec![Vec::new(); order];
        let mut degrees = vec![0.0; order];
        let mut total_weight = 0.0;
        for edge in &edges {
            if let Some(list) = adjacency.get_mut(edge.source) {
                list.push((edge.target, edge.weight));
            }
            if let Some(list) = adjacency.get_mut(edge.target) {
                list.push((edge.source, edge.weight));
            }
            for endpoint in [edge.source, edge.target] {
                if let Some(degree) = degrees.get_mut(endpoint) {
                    *degree += edge.weight;
                }
            }
            total_weight += edge.weight;
        }
        for list in &mut adjacency {
            list.sort_by_key(|&(neighbour, _)| neighbour);
        }
        Self {
            subject_id,
            nodes,
            edges,
            adjacency,
            degrees,
            total_weight,
        }
    }

    /// Subject the graph belongs to.
    #[must_use]
    #[rustfmt::skip]
    pub fn subject_id(&self) -> &SubjectId { &self.subject_id }

    /// Number of nodes.
    #[must_use]
    #[rustfmt::skip]
    pub fn order(&self) -> usize { self.nodes.len() }

    /// Number of edges.
    #[must_use]
    #[rustfmt::skip]
    pub fn size(&self) -> usize { self.edges.len() }

    /// Nodes in index order.
    #[must_use]
    #[rustfmt::skip]
    pub fn nodes(&self) -> &[Node] { &self.nodes }

    /// Edges sorted by `(source, target)`.
    #[must_use]
    #[rustfmt::skip]
    pub fn edges(&self) -> &[Edge] { &self.edges }

    /// Sum of all edge weights.
    #[must_use]
    #[rustfmt::skip]
    pub fn total_weight(&self) -> f64 { self.total_weight }

    /// Weighted degree of `node`, zero for unknown nodes.
    #[must_use]
    pub fn degree(&self, node: usize) -> f64 {
        self.degrees.get(node).copied().unwrap_or(0.0)
    }

    /// Weighted degrees in node order.
    #[must_use]
    pub fn degrees(&self) -> &[f64] {
        &self.degrees
    }

    /// Neighbours of `node` with edge weights, sorted by neighbour index.
    pub fn neighbours(&self, node: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.adjacency
            .get(node)
            .into_iter()
            .flat_map(|list| list.iter().copied())
    }

    /// Copy of the graph keeping every node and only edges with
    /// `weight >= min_weight`.
    #[must_use]
    pub fn filtered(&self, min_weight: f64) -> Self {
        let edges = self
            .edges
            .iter()
            .filter(|edge| edge.weight >= min_weight)
            .cloned()
            .collect();
        Self::from_validated(self.subject_id.clone(), self.nodes.clone(), edges)
    }
}

fn validate_edge(subject_id: &SubjectId, order: usize, edge: &Edge) -> Result<(), GraphError> {
    if edge.subject_id != *subject_id {
        return Err(GraphError::SubjectMismatch {
            expected: subject_id.clone(),
            found: edge.subject_id.clone(),
        });
    }
    if edge.target >= order {
        return Err(GraphError::UnknownEndpoint {
            source_node: edge.source,
            target_node: edge.target,
            order,
        });
    }
    if edge.source == edge.target {
        return Err(GraphError::SelfLoop { node: edge.source });
    }
    if !edge.weight.is_finite() || edge.weight < 0.0 {
        return Err(GraphError::InvalidWeight {
            source_node: edge.source,
            target_node: edge.target,
            weight: edge.weight,
        });
    }
    Ok(())
}
