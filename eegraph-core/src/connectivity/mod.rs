//! Pairwise connectivity estimation.
//!
//! Every unordered pair of distinct channels is weighted exactly once, in
//! parallel, and an [`InclusionPolicy`] decides which pairs become edges.
//! Edges are emitted in canonical `(source, target)` order.

mod measure;

use std::collections::HashSet;

use rayon::prelude::*;
use tracing::{Span, debug, field, instrument};

pub use self::measure::{ConnectivityMeasure, DEFAULT_BAND_POWER_SCALE};
use crate::{
    error::{ConfigError, ConnectivityError},
    graph::{Edge, Node},
    recording::Recording,
};

/// Default weight threshold for [`InclusionPolicy::Threshold`].
pub const DEFAULT_INCLUSION_THRESHOLD: f64 = 0.15;

/// Predicate deciding which weighted pairs become edges.
///
/// # Examples
/// ```
/// use eegraph_core::InclusionPolicy;
///
/// assert_eq!(InclusionPolicy::default(), InclusionPolicy::Threshold(0.15));
/// assert_eq!(InclusionPolicy::TopK(3).as_str(), "top-k");
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
#[non_exhaustive]
pub enum InclusionPolicy {
    /// Keep every pair.
    All,
    /// Keep pairs whose weight is at least the threshold.
    Threshold(f64),
    /// Keep a pair when it ranks among the `k` heaviest pairs of either
    /// endpoint; ties rank the lower neighbour index first.
    TopK(usize),
}

impl Default for InclusionPolicy {
    fn default() -> Self {
        Self::Threshold(DEFAULT_INCLUSION_THRESHOLD)
    }
}

impl InclusionPolicy {
    /// Stable identifier of the policy.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Threshold(_) => "threshold",
            Self::TopK(_) => "top-k",
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            Self::All => Ok(()),
            Self::Threshold(threshold) if !threshold.is_finite() || threshold < 0.0 => {
                Err(ConfigError::InvalidThreshold {
                    name: "inclusion threshold",
                    got: threshold,
                })
            }
            Self::Threshold(_) => Ok(()),
            Self::TopK(0) => Err(ConfigError::InvalidTopK),
            Self::TopK(_) => Ok(()),
        }
    }

    fn select(&self, order: usize, pairs: &[(usize, usize)], weights: &[f64]) -> Vec<bool> {
        match *self {
            Self::All => vec![true; pairs.len()],
            Self::Threshold(threshold) => weights.iter().map(|w| *w >= threshold).collect(),
            Self::TopK(k) => {
                let mut ranked: Vec<Vec<(usize, f64)>> = vec![Vec::new(); order];
                for (&(a, b), &weight) in pairs.iter().zip(weights) {
                    if let Some(list) = ranked.get_mut(a) {
                        list.push((b, weight));
                    }
                    if let Some(list) = ranked.get_mut(b) {
                        list.push((a, weight));
                    }
                }
                let mut kept = HashSet::new();
                for (node, list) in ranked.iter_mut().enumerate() {
                    list.sort_by(|x, y| y.1.total_cmp(&x.1).then(x.0.cmp(&y.0)));
                    for &(neighbour, _) in list.iter().take(k) {
                        kept.insert((node.min(neighbour), node.max(neighbour)));
                    }
                }
                pairs.iter().map(|pair| kept.contains(pair)).collect()
            }
        }
    }
}

/// Computes weighted edges between the channels of one recording.
///
/// # Examples
/// ```
/// use eegraph_core::{
///     Channel, ConnectivityEstimator, ConnectivityMeasure, DescriptorExtractor,
///     InMemoryRecording, InclusionPolicy,
/// };
///
/// let rec = InMemoryRecording::new(
///     "s1",
///     64.0,
///     vec![
///         Channel::new("A", vec![1.0, 2.0, 3.0, 4.0]),
///         Channel::new("B", vec![2.0, 4.0, 6.0, 8.0]),
///         Channel::new("C", vec![1.0, -1.0, -1.0, 1.0]),
///     ],
/// );
/// let nodes = DescriptorExtractor::default().extract(&rec).expect("valid");
/// let estimator = ConnectivityEstimator::new(ConnectivityMeasure::Pearson, InclusionPolicy::Threshold(0.5));
/// let edges = estimator.estimate(&rec, &nodes).expect("enough samples");
///
/// assert_eq!(edges.len(), 1);
/// assert_eq!((edges[0].source(), edges[0].target()), (0, 1));
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConnectivityEstimator {
    measure: ConnectivityMeasure,
    inclusion: InclusionPolicy,
}

impl ConnectivityEstimator {
    /// Creates an estimator from a measure and an inclusion policy.
    #[must_use]
    pub fn new(measure: ConnectivityMeasure, inclusion: InclusionPolicy) -> Self {
        Self { measure, inclusion }
    }

    /// Configured measure.
    #[must_use]
    #[rustfmt::skip]
    pub fn measure(&self) -> &ConnectivityMeasure { &self.measure }

    /// Configured inclusion policy.
    #[must_use]
    #[rustfmt::skip]
    pub fn inclusion(&self) -> InclusionPolicy { self.inclusion }

    /// Weights every unordered pair of `nodes` and returns the included edges.
    ///
    /// # Errors
    /// Returns [`ConnectivityError::InsufficientData`] when a channel is
    /// shorter than the measure requires, and the other
    /// [`ConnectivityError`] variants when `nodes` do not describe
    /// `recording`.
    #[instrument(
        name = "core.estimate_edges",
        err,
        skip(self, recording, nodes),
        fields(
            subject = %recording.subject_id(),
            measure = self.measure.as_str(),
            inclusion = self.inclusion.as_str(),
            pairs = field::Empty,
            edges = field::Empty,
        ),
    )]
    pub fn estimate<R: Recording + ?Sized + Sync>(
        &self,
        recording: &R,
        nodes: &[Node],
    ) -> Result<Vec<Edge>, ConnectivityError> {
        let subject = recording.subject_id();
        let required = self.measure.min_samples(recording.sampling_rate());
        let mut signals = Vec::with_capacity(nodes.len());
        for node in nodes {
            if node.subject_id() != subject {
                return Err(ConnectivityError::SubjectMismatch {
                    nodes: node.subject_id().clone(),
                    recording: subject.clone(),
                });
            }
            let samples =
                recording
                    .samples(node.index())
                    .ok_or_else(|| ConnectivityError::MissingChannel {
                        subject: subject.clone(),
                        index: node.index(),
                    })?;
            if samples.len() < required {
                return Err(ConnectivityError::InsufficientData {
                    subject: subject.clone(),
                    channel: node.channel().to_owned(),
                    measure: self.measure.as_str(),
                    samples: samples.len(),
                    required,
                });
            }
            signals.push(samples);
        }

        let order = nodes.len();
        let prepared = self
            .measure
            .prepare(recording.sampling_rate(), nodes, signals);
        let pairs: Vec<(usize, usize)> = (0..order)
            .flat_map(|i| (i + 1..order).map(move |j| (i, j)))
            .collect();
        let weights: Vec<f64> = pairs
            .par_iter()
            .map(|&(i, j)| prepared.weight(i, j))
            .collect();
        let keep = self.inclusion.select(order, &pairs, &weights);

        let edges: Vec<Edge> = pairs
            .iter()
            .zip(&weights)
            .zip(&keep)
            .filter(|(_, keep)| **keep)
            .filter_map(|((&(i, j), &weight), _)| {
                let (a, b) = (nodes.get(i)?, nodes.get(j)?);
                Some(Edge::new(subject.clone(), a.index(), b.index(), weight))
            })
            .collect();

        let span = Span::current();
        span.record("pairs", pairs.len());
        span.record("edges", edges.len());
        debug!(pairs = pairs.len(), edges = edges.len(), "connectivity estimated");
        Ok(edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        recording::{Channel, InMemoryRecording},
        signal::DescriptorExtractor,
    };
    use eegraph_test_support::ci::property_suite::suite_config;
    use proptest::prelude::*;
    use rstest::rstest;

    fn recording(channels: Vec<Vec<f64>>) -> InMemoryRecording {
        InMemoryRecording::new(
            "s1",
            64.0,
            channels
                .into_iter()
                .enumerate()
                .map(|(i, samples)| Channel::new(format!("ch{i}"), samples))
                .collect(),
        )
    }

    fn estimate(
        rec: &InMemoryRecording,
        measure: ConnectivityMeasure,
        inclusion: InclusionPolicy,
    ) -> Result<Vec<Edge>, ConnectivityError> {
        let nodes = DescriptorExtractor::default()
            .extract(rec)
            .expect("recording is valid");
        ConnectivityEstimator::new(measure, inclusion).estimate(rec, &nodes)
    }

    fn pairs(edges: &[Edge]) -> Vec<(usize, usize)> {
        edges.iter().map(|e| (e.source(), e.target())).collect()
    }

    #[test]
    fn all_policy_emits_every_pair_in_canonical_order() {
        let rec = recording(vec![
            vec![1.0, 2.0, 3.0, 5.0],
            vec![2.0, 1.0, 0.0, 1.0],
            vec![0.0, 3.0, 1.0, 2.0],
            vec![4.0, 4.0, 1.0, 0.0],
        ]);

        let edges = estimate(&rec, ConnectivityMeasure::Pearson, InclusionPolicy::All)
            .expect("signals are long enough");

        assert_eq!(pairs(&edges), [(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)]);
    }

    #[test]
    fn threshold_policy_keeps_heavy_pairs() {
        let rec = recording(vec![
            vec![1.0, 2.0, 3.0, 4.0],
            vec![2.0, 4.0, 6.0, 8.1],
            vec![1.0, -1.0, -1.0, 1.0],
        ]);

        let edges = estimate(&rec, ConnectivityMeasure::Pearson, InclusionPolicy::Threshold(0.9))
            .expect("signals are long enough");

        assert_eq!(pairs(&edges), [(0, 1)]);
        assert!(edges[0].weight() > 0.99);
    }

    #[test]
    fn top_k_keeps_each_nodes_strongest_link() {
        // 0 and 1 are near-identical; 2 and 3 correlate with each other only.
        let rec = recording(vec![
            vec![1.0, 2.0, 3.0, 4.0, 5.0],
            vec![1.1, 2.0, 3.1, 4.0, 5.1],
            vec![5.0, -3.0, 4.0, -2.0, 1.0],
            vec![5.2, -2.9, 4.1, -2.2, 1.0],
        ]);

        let edges = estimate(&rec, ConnectivityMeasure::Pearson, InclusionPolicy::TopK(1))
            .expect("signals are long enough");

        assert_eq!(pairs(&edges), [(0, 1), (2, 3)]);
    }

    #[test]
    fn top_k_ties_prefer_the_lower_neighbour() {
        let policy = InclusionPolicy::TopK(1);
        let pairs = [(0, 1), (0, 2), (1, 2)];

        let keep = policy.select(3, &pairs, &[0.5, 0.5, 0.1]);

        // Node 0 ranks 1 before 2; nodes 1 and 2 both pick 0.
        assert_eq!(keep, [true, true, false]);
    }

    #[rstest]
    #[case::pearson(ConnectivityMeasure::Pearson, 2)]
    #[case::band_power(ConnectivityMeasure::band_power(), 7)]
    #[case::one_coherence_segment(ConnectivityMeasure::coherence(), 128)]
    #[case::coherence(ConnectivityMeasure::coherence(), 319)]
    fn short_channels_report_insufficient_data(
        #[case] measure: ConnectivityMeasure,
        #[case] len: usize,
    ) {
        let rec = recording(vec![vec![0.5; len], vec![0.25; len]]);

        let err = estimate(&rec, measure, InclusionPolicy::All).expect_err("channels are too short");

        assert_eq!(err.code().as_str(), "CONNECTIVITY_INSUFFICIENT_DATA");
    }

    #[test]
    fn coherence_links_channels_sharing_a_rhythm() {
        let fs = 64.0;
        let tone = |freq: f64, phase: f64| -> Vec<f64> {
            (0..1024)
                .map(|n| (std::f64::consts::TAU * freq * n as f64 / fs + phase).sin())
                .collect()
        };
        let noise: Vec<f64> = (0..1024_u64)
            .map(|n| ((n.wrapping_mul(2_654_435_761) % 1000) as f64 / 500.0) - 1.0)
            .collect();
        let mixed = |base: Vec<f64>| -> Vec<f64> {
            base.iter().zip(&noise).map(|(s, e)| s + 0.2 * e).collect()
        };
        let rec = recording(vec![
            mixed(tone(10.0, 0.0)),
            mixed(tone(10.0, 1.0)),
            tone(3.0, 0.0),
        ]);

        let edges = estimate(&rec, ConnectivityMeasure::coherence(), InclusionPolicy::All)
            .expect("signals cover several segments");

        assert_eq!(edges.len(), 3);
        assert!(edges.iter().all(|e| (0.0..=1.0).contains(&e.weight())));
    }

    fn xorshift_noise(mut state: u64, len: usize) -> Vec<f64> {
        (0..len)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                (state >> 11) as f64 / (1_u64 << 53) as f64 - 0.5
            })
            .collect()
    }

    #[rstest]
    #[case::shortest(320)]
    #[case::long(1024)]
    fn independent_noise_is_weakly_coherent(#[case] len: usize) {
        let rec = recording(vec![
            xorshift_noise(0x9E37_79B9_7F4A_7C15, len),
            xorshift_noise(0xD1B5_4A32_D192_ED03, len),
        ]);

        let edges = estimate(&rec, ConnectivityMeasure::coherence(), InclusionPolicy::All)
            .expect("signals cover the minimum segments");

        let weight = edges.first().map(Edge::weight).expect("one pair");
        assert!(weight < 0.6, "coherence of independent noise was {weight}");
    }

    #[test]
    fn foreign_nodes_are_rejected() {
        let rec = recording(vec![vec![1.0, 2.0, 3.0], vec![3.0, 2.0, 1.0]]);
        let other = InMemoryRecording::new("s2", 64.0, rec.channels().to_vec());
        let nodes = DescriptorExtractor::default().extract(&other).expect("valid");

        let err = ConnectivityEstimator::default()
            .estimate(&rec, &nodes)
            .expect_err("nodes belong to another subject");

        assert!(matches!(err, ConnectivityError::SubjectMismatch { .. }));
    }

    proptest! {
        #![proptest_config(suite_config(64))]

        #[test]
        fn edges_are_canonical_and_unique(
            channels in (2_usize..8, 3_usize..32).prop_flat_map(|(count, len)| {
                prop::collection::vec(prop::collection::vec(-50.0_f64..50.0, len), count)
            }),
            threshold in 0.0_f64..1.0,
        ) {
            let rec = recording(channels);
            let edges = estimate(&rec, ConnectivityMeasure::Pearson, InclusionPolicy::Threshold(threshold))
                .expect("signals are long enough");

            let mut seen = HashSet::new();
            for edge in &edges {
                prop_assert!(edge.source() < edge.target());
                prop_assert!(seen.insert((edge.source(), edge.target())));
                prop_assert!(edge.weight() >= threshold);
            }
            let listed = pairs(&edges);
            let mut sorted = listed.clone();
            sorted.sort_unstable();
            prop_assert_eq!(listed, sorted);
        }
    }
}
