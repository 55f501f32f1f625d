//! Deterministic Louvain modularity optimisation.
//!
//! Each level runs local moving over the nodes in index order until no node
//! moves, then collapses the communities into super-nodes. Levels repeat
//! until one produces no merge or modularity stops improving.

use std::{collections::BTreeMap, num::NonZeroUsize};

use super::{Outcome, network::Network, partition::compact};
use crate::graph::Graph;

/// Smallest modularity improvement that keeps a pass or level going.
const MIN_GAIN: f64 = 1e-7;
/// Tolerance separating a real gain from rounding noise.
const MOVE_EPSILON: f64 = 1e-12;

struct Level {
    membership: Vec<usize>,
    passes: usize,
    converged: bool,
}

pub(crate) fn louvain(graph: &Graph, resolution: f64, cap: NonZeroUsize) -> Outcome {
    let mut network = Network::from_graph(graph);
    let mut labels: Vec<usize> = (0..network.order()).collect();
    let mut current = network.modularity(&labels, resolution);
    let mut passes = 0;

    loop {
        let level = local_moving(&network, resolution, cap);
        passes += level.passes;
        let (membership, communities) = compact(&level.membership);
        if !level.converged {
            compose(&mut labels, &membership);
            return Outcome {
                labels,
                passes,
                converged: false,
            };
        }
        let modularity = network.modularity(&membership, resolution);
        if communities == network.order() || modularity - current < MIN_GAIN {
            break;
        }
        compose(&mut labels, &membership);
        current = modularity;
        network = network.aggregate(&membership, communities);
    }

    Outcome {
        labels,
        passes,
        converged: true,
    }
}

/// Maps every original node through the membership of its super-node.
fn compose(labels: &mut [usize], membership: &[usize]) {
    for label in labels.iter_mut() {
        if let Some(&community) = membership.get(*label) {
            *label = community;
        }
    }
}

fn local_moving(network: &Network, gamma: f64, cap: NonZeroUsize) -> Level {
    let order = network.order();
    let mut membership: Vec<usize> = (0..order).collect();
    let two_m = 2.0 * network.total_weight();
    if two_m <= 0.0 {
        return Level {
            membership,
            passes: 0,
            converged: true,
        };
    }
    let mut totals: Vec<f64> = (0..order).map(|node| network.degree(node)).collect();
    let mut current = network.modularity(&membership, gamma);

    for pass in 1..=cap.get() {
        let mut moved = false;
        for node in 0..order {
            let home = membership[node];
            let degree = network.degree(node);
            let mut links: BTreeMap<usize, f64> = BTreeMap::new();
            for &(neighbour, weight) in network.neighbours(node) {
                *links.entry(membership[neighbour]).or_insert(0.0) += weight;
            }

            totals[home] -= degree;
            let gain = |community: usize, weight: f64| -> f64 {
                weight - gamma * totals[community] * degree / two_m
            };
            let stay = gain(home, links.get(&home).copied().unwrap_or(0.0));
            // Ascending iteration with a strict comparison keeps the lowest id on ties.
            let mut best: Option<(usize, f64)> = None;
            for (&community, &weight) in &links {
                if community == home {
                    continue;
                }
                let candidate = gain(community, weight);
                if best.is_none_or(|(_, top)| candidate > top) {
                    best = Some((community, candidate));
                }
            }
            let target = match best {
                Some((community, top)) if top > stay + MOVE_EPSILON => community,
                _ => home,
            };

            totals[target] += degree;
            if target != home {
                membership[node] = target;
                moved = true;
            }
        }

        let modularity = network.modularity(&membership, gamma);
        let improvement = modularity - current;
        current = modularity;
        if !moved || improvement < MIN_GAIN {
            return Level {
                membership,
                passes: pass,
                converged: true,
            };
        }
    }

    Level {
        membership,
        passes: cap.get(),
        converged: false,
    }
}
