//! Partition results produced by community detection.

use std::{collections::HashMap, time::Duration};

use serde::{Serialize, Serializer};
use thiserror::Error;

use super::Algorithm;

/// Identifier assigned to a community.
///
/// # Examples
/// ```
/// use eegraph_core::CommunityId;
///
/// let id = CommunityId::new(4);
/// assert_eq!(id.get(), 4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CommunityId(u64);

impl CommunityId {
    /// Creates a new community identifier.
    #[rustfmt::skip]
    #[must_use]
    pub fn new(id: u64) -> Self { Self(id) }

    /// Returns the underlying numeric identifier.
    #[rustfmt::skip]
    #[must_use]
    pub fn get(self) -> u64 { self.0 }
}

/// Whether a detection run finished within its iteration cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Convergence {
    /// The algorithm reached a fixed point.
    Converged,
    /// The iteration cap stopped the algorithm; the partition is the best
    /// found so far.
    Partial,
}

/// Error returned when community identifiers are not numbered in order of
/// first appearance starting at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NonCanonicalCommunityIds {
    /// The first node is not in community `0`.
    #[error("the first node must belong to community 0")]
    MissingZero,
    /// A node introduces an identifier other than the next unused one.
    #[error("node {index} introduces community {id} but {expected} is next")]
    OutOfOrder {
        /// Node position introducing the identifier.
        index: usize,
        /// Identifier found.
        id: u64,
        /// Next unused identifier.
        expected: u64,
    },
}

/// Measurements attached to a [`Partition`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartitionMetrics {
    /// Modularity of the partition on the graph it was computed from.
    pub modularity: f64,
    /// Wall-clock time spent partitioning.
    pub runtime: Duration,
    /// Algorithm that produced the partition.
    pub algorithm: Algorithm,
    /// Whether low-weight edges were filtered out first.
    pub flagged: bool,
    /// Optimisation passes performed across all levels.
    pub passes: usize,
    /// Whether the run converged.
    pub convergence: Convergence,
}

/// Assignment of every node to exactly one community.
///
/// Identifiers are contiguous and numbered by first appearance over the node
/// order, so identical groupings always compare equal.
///
/// # Examples
/// ```
/// use std::time::Duration;
///
/// use eegraph_core::{Algorithm, CommunityId, Convergence, Partition, PartitionMetrics};
///
/// let partition = Partition::try_new(
///     [0, 0, 1].map(CommunityId::new).to_vec(),
///     PartitionMetrics {
///         modularity: 0.1,
///         runtime: Duration::from_millis(2),
///         algorithm: Algorithm::Louvain,
///         flagged: false,
///         passes: 2,
///         convergence: Convergence::Converged,
///     },
/// )
/// .expect("identifiers are canonical");
/// assert_eq!(partition.order(), 3);
/// assert_eq!(partition.community_count(), 2);
/// assert_eq!(partition.members(), vec![vec![0, 1], vec![2]]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Partition {
    assignments: Vec<CommunityId>,
    community_count: usize,
    modularity: f64,
    #[serde(rename = "runtime_seconds", serialize_with = "serialize_seconds")]
    runtime: Duration,
    algorithm: Algorithm,
    flagged: bool,
    passes: usize,
    convergence: Convergence,
}

impl Partition {
    /// Builds a partition after checking the identifiers are canonical.
    ///
    /// # Errors
    /// Returns [`NonCanonicalCommunityIds`] when the first node is not in
    /// community `0` or a node introduces an identifier out of order.
    pub fn try_new(
        assignments: Vec<CommunityId>,
        metrics: PartitionMetrics,
    ) -> Result<Self, NonCanonicalCommunityIds> {
        let mut next = 0_u64;
        for (index, id) in assignments.iter().enumerate() {
            let value = id.get();
            if value < next {
                continue;
            }
            if value > next {
                return Err(if index == 0 {
                    NonCanonicalCommunityIds::MissingZero
                } else {
                    NonCanonicalCommunityIds::OutOfOrder {
                        index,
                        id: value,
                        expected: next,
                    }
                });
            }
            next += 1;
        }
        Ok(Self::from_canonical(assignments, next as usize, metrics))
    }

    pub(crate) fn from_canonical(
        assignments: Vec<CommunityId>,
        community_count: usize,
        metrics: PartitionMetrics,
    ) -> Self {
        Self {
            assignments,
            community_count,
            modularity: metrics.modularity,
            runtime: metrics.runtime,
            algorithm: metrics.algorithm,
            flagged: metrics.flagged,
            passes: metrics.passes,
            convergence: metrics.convergence,
        }
    }

    /// Community of every node in node order.
    #[must_use]
    pub fn assignments(&self) -> &[CommunityId] {
        &self.assignments
    }

    /// Community of `node`.
    #[must_use]
    pub fn community_of(&self, node: usize) -> Option<CommunityId> {
        self.assignments.get(node).copied()
    }

    /// Number of nodes covered.
    #[must_use]
    pub fn order(&self) -> usize {
        self.assignments.len()
    }

    /// Number of distinct communities.
    #[must_use]
    #[rustfmt::skip]
    pub fn community_count(&self) -> usize { self.community_count }

    /// Modularity on the graph the partition was computed from.
    #[must_use]
    #[rustfmt::skip]
    pub fn modularity(&self) -> f64 { self.modularity }

    /// Wall-clock time spent partitioning.
    #[must_use]
    #[rustfmt::skip]
    pub fn runtime(&self) -> Duration { self.runtime }

    /// Algorithm that produced the partition.
    #[must_use]
    #[rustfmt::skip]
    pub fn algorithm(&self) -> Algorithm { self.algorithm }

    /// Whether low-weight edges were filtered out first.
    #[must_use]
    #[rustfmt::skip]
    pub fn flagged(&self) -> bool { self.flagged }

    /// Optimisation passes performed.
    #[must_use]
    #[rustfmt::skip]
    pub fn passes(&self) -> usize { self.passes }

    /// Convergence state.
    #[must_use]
    #[rustfmt::skip]
    pub fn convergence(&self) -> Convergence { self.convergence }

    /// Returns whether the iteration cap cut the run short.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.convergence == Convergence::Partial
    }

    /// Node indices grouped by community, in community order.
    #[must_use]
    pub fn members(&self) -> Vec<Vec<usize>> {
        let mut groups = vec![Vec::new(); self.community_count];
        for (node, id) in self.assignments.iter().enumerate() {
            if let Some(group) = usize::try_from(id.get())
                .ok()
                .and_then(|slot| groups.get_mut(slot))
            {
                group.push(node);
            }
        }
        groups
    }
}

fn serialize_seconds<S: Serializer>(runtime: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(runtime.as_secs_f64())
}

/// Relabels `labels` as `0..count` in order of first appearance.
pub(crate) fn compact(labels: &[usize]) -> (Vec<usize>, usize) {
    let mut mapping = HashMap::new();
    let compacted = labels
        .iter()
        .map(|label| {
            let next = mapping.len();
            *mapping.entry(*label).or_insert(next)
        })
        .collect();
    (compacted, mapping.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn metrics() -> PartitionMetrics {
        PartitionMetrics {
            modularity: 0.0,
            runtime: Duration::ZERO,
            algorithm: Algorithm::Louvain,
            flagged: false,
            passes: 1,
            convergence: Convergence::Converged,
        }
    }

    fn ids(values: &[u64]) -> Vec<CommunityId> {
        values.iter().copied().map(CommunityId::new).collect()
    }

    #[rstest]
    #[case::empty(&[], 0)]
    #[case::single(&[0], 1)]
    #[case::revisits(&[0, 1, 0, 2, 1], 3)]
    fn canonical_assignments_are_accepted(#[case] values: &[u64], #[case] count: usize) {
        let partition = Partition::try_new(ids(values), metrics()).expect("canonical");
        assert_eq!(partition.community_count(), count);
        assert_eq!(partition.order(), values.len());
    }

    #[rstest]
    #[case::missing_zero(&[1, 0], NonCanonicalCommunityIds::MissingZero)]
    #[case::gap(&[0, 2], NonCanonicalCommunityIds::OutOfOrder { index: 1, id: 2, expected: 1 })]
    #[case::reversed(&[0, 0, 3, 2, 1], NonCanonicalCommunityIds::OutOfOrder { index: 2, id: 3, expected: 1 })]
    fn non_canonical_assignments_are_rejected(
        #[case] values: &[u64],
        #[case] expected: NonCanonicalCommunityIds,
    ) {
        let err = Partition::try_new(ids(values), metrics()).expect_err("not canonical");
        assert_eq!(err, expected);
    }

    #[test]
    fn compact_follows_first_appearance() {
        let (labels, count) = compact(&[7, 3, 7, 9, 3]);
        assert_eq!(labels, [0, 1, 0, 2, 1]);
        assert_eq!(count, 3);
    }

    #[test]
    fn serialises_runtime_in_seconds() {
        let mut m = metrics();
        m.runtime = Duration::from_millis(1500);
        let partition = Partition::try_new(ids(&[0, 1]), m).expect("canonical");

        let json = serde_json::to_value(&partition).expect("serialisable");

        assert_eq!(json["runtime_seconds"], 1.5);
        assert_eq!(json["algorithm"], "louvain");
        assert_eq!(json["convergence"], "converged");
        assert_eq!(json["assignments"], serde_json::json!([0, 1]));
    }
}
