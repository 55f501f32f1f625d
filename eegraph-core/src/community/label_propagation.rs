//! Deterministic weighted label propagation.

use std::{collections::BTreeMap, num::NonZeroUsize};

use super::Outcome;
use crate::graph::Graph;

const WEIGHT_EPSILON: f64 = 1e-12;

/// Sweeps nodes in index order. A node keeps its label while that label is
/// among the heaviest in its neighbourhood; otherwise it adopts the heaviest
/// neighbouring label, the lowest one on ties. Stops after a sweep without
/// changes or when `cap` sweeps have run.
pub(crate) fn label_propagation(graph: &Graph, cap: NonZeroUsize) -> Outcome {
    let order = graph.order();
    let mut labels: Vec<usize> = (0..order).collect();

    for sweep in 1..=cap.get() {
        let mut changed = false;
        for node in 0..order {
            let mut weights: BTreeMap<usize, f64> = BTreeMap::new();
            for (neighbour, weight) in graph.neighbours(node) {
                if weight > 0.0 {
                    *weights.entry(labels[neighbour]).or_insert(0.0) += weight;
                }
            }
            let Some(heaviest) = weights.values().copied().reduce(f64::max) else {
                continue;
            };
            let own = weights.get(&labels[node]).copied().unwrap_or(f64::NEG_INFINITY);
            if own >= heaviest - WEIGHT_EPSILON {
                continue;
            }
            if let Some((&label, _)) = weights
                .iter()
                .find(|(_, weight)| **weight >= heaviest - WEIGHT_EPSILON)
            {
                labels[node] = label;
                changed = true;
            }
        }
        if !changed {
            return Outcome {
                labels,
                passes: sweep,
                converged: true,
            };
        }
    }

    Outcome {
        labels,
        passes: cap.get(),
        converged: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{community::partition::compact, test_utils::graph_from_edges};

    fn cap(value: usize) -> NonZeroUsize {
        NonZeroUsize::new(value).expect("cap is non-zero")
    }

    #[test]
    fn separated_triangles_form_two_communities() {
        let graph = graph_from_edges(
            6,
            &[
                (0, 1, 1.0),
                (1, 2, 1.0),
                (0, 2, 1.0),
                (3, 4, 1.0),
                (4, 5, 1.0),
                (3, 5, 1.0),
            ],
        );

        let outcome = label_propagation(&graph, cap(50));

        assert!(outcome.converged);
        assert_eq!(compact(&outcome.labels).0, [0, 0, 0, 1, 1, 1]);
    }

    #[test]
    fn heavier_neighbourhood_wins() {
        // Node 2 is pulled towards 3 by the heavier edge.
        let graph = graph_from_edges(4, &[(0, 1, 1.0), (1, 2, 0.2), (2, 3, 0.9)]);

        let outcome = label_propagation(&graph, cap(50));

        assert!(outcome.converged);
        assert_eq!(compact(&outcome.labels).0, [0, 0, 1, 1]);
    }

    #[test]
    fn isolated_nodes_keep_their_labels() {
        let graph = graph_from_edges(3, &[]);

        let outcome = label_propagation(&graph, cap(5));

        assert!(outcome.converged);
        assert_eq!(outcome.passes, 1);
        assert_eq!(outcome.labels, [0, 1, 2]);
    }

    #[test]
    fn exhausted_cap_reports_partial_labels() {
        let graph = graph_from_edges(3, &[(0, 1, 1.0), (1, 2, 1.0)]);

        let outcome = label_propagation(&graph, cap(1));

        assert!(!outcome.converged);
        assert_eq!(outcome.passes, 1);
        assert_eq!(outcome.labels.len(), 3);
    }
}
