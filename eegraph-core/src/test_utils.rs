//! Shared test utilities for `eegraph-core`.

use crate::{
    graph::{Edge, Graph, Node},
    recording::SubjectId,
    signal::NodeFeatures,
};

/// Nodes `0..order` for `subject` with default features.
#[must_use]
pub(crate) fn nodes_for(subject: &SubjectId, order: usize) -> Vec<Node> {
    (0..order)
        .map(|index| {
            Node::new(
                subject.clone(),
                index,
                format!("ch{index}"),
                NodeFeatures::default(),
            )
        })
        .collect()
}

/// Assembles a graph for subject `s1` from `(left, right, weight)` triples.
///
/// # Panics
/// Panics when the triples do not describe a valid graph.
#[must_use]
pub(crate) fn graph_from_edges(order: usize, edges: &[(usize, usize, f64)]) -> Graph {
    let subject = SubjectId::new("s1");
    let edges = edges
        .iter()
        .map(|&(left, right, weight)| Edge::new(subject.clone(), left, right, weight))
        .collect();
    Graph::assemble(subject.clone(), nodes_for(&subject, order), edges)
        .expect("test graph should be valid")
}
