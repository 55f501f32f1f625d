//! Behaviour of community detection on hand-built and generated graphs.

use eegraph_core::{
    Algorithm, CommunityDetector, Edge, Graph, Node, NodeFeatures, SubjectId, modularity,
    modularity_contributions,
};
use eegraph_test_support::ci::property_suite::suite_config;
use proptest::prelude::*;
use rstest::rstest;

/// Graph of `order` nodes for subject `s1` built from weighted pairs.
fn graph(order: usize, edges: &[(usize, usize, f64)]) -> Graph {
    let subject = SubjectId::new("s1");
    let nodes = (0..order)
        .map(|i| Node::new(subject.clone(), i, format!("ch{i}"), NodeFeatures::default()))
        .collect();
    let edges = edges
        .iter()
        .map(|&(a, b, w)| Edge::new(subject.clone(), a, b, w))
        .collect();
    Graph::assemble(subject, nodes, edges).expect("fixture graph is valid")
}

#[test]
fn triangle_with_isolated_node() {
    // A-B, B-C, A-C with weight 1; D has no edges.
    let triangle = graph(4, &[(0, 1, 1.0), (1, 2, 1.0), (0, 2, 1.0)]);

    let partition = CommunityDetector::default()
        .detect(&triangle, Algorithm::Louvain, false)
        .expect("converges");

    assert_eq!(partition.members(), vec![vec![0, 1, 2], vec![3]]);
    let terms = modularity_contributions(&triangle, &partition, 1.0);
    assert!(terms[0].abs() < 1e-12);
    assert_eq!(terms[1], 0.0);
    assert!(partition.modularity() > -1.0 / 3.0);
}

#[rstest]
#[case(Algorithm::Louvain)]
#[case(Algorithm::LabelPropagation)]
fn edgeless_graphs_give_singletons(#[case] algorithm: Algorithm) {
    let partition = CommunityDetector::default()
        .detect(&graph(3, &[]), algorithm, false)
        .expect("converges");

    assert_eq!(partition.members(), vec![vec![0], vec![1], vec![2]]);
    assert_eq!(partition.modularity(), 0.0);
}

#[test]
fn ring_of_cliques_splits_at_the_bridges() {
    let mut edges = Vec::new();
    for clique in 0..4 {
        let base = clique * 4;
        for a in 0..4 {
            for b in a + 1..4 {
                edges.push((base + a, base + b, 1.0));
            }
        }
        edges.push((base + 3, (base + 4) % 16, 0.1));
    }
    let ring = graph(16, &edges);

    let partition = CommunityDetector::default()
        .detect(&ring, Algorithm::Louvain, false)
        .expect("converges");

    assert_eq!(partition.community_count(), 4);
    for members in partition.members() {
        assert_eq!(members.len(), 4);
        assert!(members.iter().all(|m| m / 4 == members[0] / 4));
    }
}

fn graphs() -> impl Strategy<Value = Graph> {
    (1_usize..12).prop_flat_map(|order| {
        let pairs = order * (order - 1) / 2;
        prop::collection::vec(prop::option::of(0.05_f64..1.0), pairs).prop_map(move |weights| {
            let subject = SubjectId::new("p");
            let nodes = (0..order)
                .map(|i| Node::new(subject.clone(), i, format!("ch{i}"), NodeFeatures::default()))
                .collect();
            let mut weights = weights.into_iter();
            let mut edges = Vec::new();
            for a in 0..order {
                for b in a + 1..order {
                    if let Some(Some(w)) = weights.next() {
                        edges.push(Edge::new(subject.clone(), a, b, w));
                    }
                }
            }
            Graph::assemble(subject, nodes, edges).expect("generated graph is valid")
        })
    })
}

fn algorithms() -> impl Strategy<Value = Algorithm> {
    prop::sample::select(Algorithm::ALL.to_vec())
}

proptest! {
    #![proptest_config(suite_config(64))]

    #[test]
    fn partitions_cover_every_node_once(graph in graphs(), algorithm in algorithms()) {
        let detector = CommunityDetector::default();
        let partition = detector
            .detect(&graph, algorithm, false)
            .unwrap_or_else(|err| err.into_partial());

        prop_assert_eq!(partition.order(), graph.order());
        let mut seen: Vec<usize> = partition.members().concat();
        seen.sort_unstable();
        prop_assert_eq!(seen, (0..graph.order()).collect::<Vec<_>>());
        prop_assert!(partition.members().iter().all(|m| !m.is_empty()));
    }

    #[test]
    fn detection_is_deterministic(graph in graphs(), algorithm in algorithms(), flagged: bool) {
        let detector = CommunityDetector::default();
        let run = || {
            detector
                .detect(&graph, algorithm, flagged)
                .unwrap_or_else(|err| err.into_partial())
                .assignments()
                .to_vec()
        };

        prop_assert_eq!(run(), run());
    }

    #[test]
    fn reported_modularity_matches_recomputation(graph in graphs()) {
        let partition = CommunityDetector::default()
            .detect(&graph, Algorithm::Louvain, false)
            .unwrap_or_else(|err| err.into_partial());

        let recomputed = modularity(&graph, &partition, 1.0);
        prop_assert!((recomputed - partition.modularity()).abs() < 1e-9);
        prop_assert!(partition.modularity() <= 1.0);
    }
}
