//! Working copy of a graph used by the partitioning algorithms.
//!
//! Aggregation collapses communities into super-nodes whose internal weight
//! is kept as a self-loop, so modularity is preserved across levels.

use std::collections::BTreeMap;

use crate::graph::Graph;

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Network {
    /// Neighbours of each node, excluding the node itself, sorted by index.
    neighbours: Vec<Vec<(usize, f64)>>,
    /// Weight of each node's self-loop.
    self_loops: Vec<f64>,
    /// Weighted degree; a self-loop counts twice.
    degrees: Vec<f64>,
    /// Sum of all edge weights, `m`.
    total_weight: f64,
}

impl Network {
    pub(crate) fn from_graph(graph: &Graph) -> Self {
        let order = graph.order();
        let neighbours = (0..order)
            .map(|node| graph.neighbours(node).collect())
            .collect();
        Self {
            neighbours,
            self_loops: vec![0.0; order],
            degrees: graph.degrees().to_vec(),
            total_weight: graph.total_weight(),
        }
    }

    #[rustfmt::skip]
    pub(crate) fn order(&self) -> usize { self.neighbours.len() }

    #[rustfmt::skip]
    pub(crate) fn total_weight(&self) -> f64 { self.total_weight }

    pub(crate) fn degree(&self, node: usize) -> f64 {
        self.degrees.get(node).copied().unwrap_or(0.0)
    }

    pub(crate) fn neighbours(&self, node: usize) -> &[(usize, f64)] {
        self.neighbours.get(node).map(Vec::as_slice).unwrap_or_default()
    }

    /// Collapses nodes sharing a community into one super-node.
    ///
    /// `membership` must hold contiguous identifiers below `communities`.
    pub(crate) fn aggregate(&self, membership: &[usize], communities: usize) -> Self {
        let mut links: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); communities];
        let mut self_loops = vec![0.0; communities];
        let mut degrees = vec![0.0; communities];

        for (node, &community) in membership.iter().enumerate() {
            if let Some(degree) = degrees.get_mut(community) {
                *degree += self.degree(node);
            }
            if let Some(internal) = self_loops.get_mut(community) {
                *internal += self.self_loops.get(node).copied().unwrap_or(0.0);
            }
            for &(neighbour, weight) in self.neighbours(node) {
                let Some(&other) = membership.get(neighbour) else {
                    continue;
                };
                if other == community {
                    // Each internal edge is seen from both endpoints.
                    if let Some(internal) = self_loops.get_mut(community) {
                        *internal += weight / 2.0;
                    }
                } else if let Some(map) = links.get_mut(community) {
                    *map.entry(other).or_insert(0.0) += weight;
                }
            }
        }

        Self {
            neighbours: links
                .into_iter()
                .map(|map| map.into_iter().collect())
                .collect(),
            self_loops,
            degrees,
            total_weight: self.total_weight,
        }
    }

    /// Modularity of `membership` with resolution `gamma`.
    pub(crate) fn modularity(&self, membership: &[usize], gamma: f64) -> f64 {
        self.contributions(membership, gamma).iter().sum()
    }

    /// Per-community terms `L_c / m - gamma (d_c / 2m)^2`; all zero when the
    /// network has no weight.
    pub(crate) fn contributions(&self, membership: &[usize], gamma: f64) -> Vec<f64> {
        let communities = membership.iter().copied().max().map_or(0, |max| max + 1);
        let m = self.total_weight;
        if m <= 0.0 {
            return vec![0.0; communities];
        }
        let mut internal = vec![0.0; communities];
        let mut totals = vec![0.0; communities];
        for (node, &community) in membership.iter().enumerate() {
            if let Some(total) = totals.get_mut(community) {
                *total += self.degree(node);
            }
            let mut inside = self.self_loops.get(node).copied().unwrap_or(0.0);
            for &(neighbour, weight) in self.neighbours(node) {
                if membership.get(neighbour) == Some(&community) {
                    inside += weight / 2.0;
                }
            }
            if let Some(slot) = internal.get_mut(community) {
                *slot += inside;
            }
        }
        internal
            .iter()
            .zip(&totals)
            .map(|(l_c, d_c)| l_c / m - gamma * (d_c / (2.0 * m)).powi(2))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::graph_from_edges;

    #[test]
    fn aggregation_preserves_modularity() {
        let graph = graph_from_edges(
            6,
            &[
                (0, 1, 1.0),
                (1, 2, 1.0),
                (0, 2, 1.0),
                (3, 4, 2.0),
                (4, 5, 1.0),
                (2, 3, 0.5),
            ],
        );
        let network = Network::from_graph(&graph);
        let membership = [0, 0, 0, 1, 1, 1];

        let collapsed = network.aggregate(&membership, 2);

        let before = network.modularity(&membership, 1.0);
        let after = collapsed.modularity(&[0, 1], 1.0);
        assert!((before - after).abs() < 1e-12);
        assert_eq!(collapsed.order(), 2);
        assert_eq!(collapsed.neighbours(0), [(1, 0.5)]);
        assert!((collapsed.degree(1) - 6.5).abs() < 1e-12);
    }

    #[test]
    fn modularity_of_the_empty_graph_is_zero() {
        let network = Network::from_graph(&graph_from_edges(3, &[]));
        assert_eq!(network.modularity(&[0, 1, 2], 1.0), 0.0);
    }

    #[test]
    fn singletons_on_a_triangle_score_minus_a_third() {
        let network = Network::from_graph(&graph_from_edges(
            3,
            &[(0, 1, 1.0), (1, 2, 1.0), (0, 2, 1.0)],
        ));
        assert!((network.modularity(&[0, 1, 2], 1.0) + 1.0 / 3.0).abs() < 1e-12);
        assert!(network.modularity(&[0, 0, 0], 1.0).abs() < 1e-12);
    }
}
