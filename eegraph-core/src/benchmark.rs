//! Per-(order, algorithm, flag) aggregation of detection runs.
//!
//! Workers record straight into a sharded map, so aggregation only ever adds
//! to sums and counts and the final records do not depend on scheduling.

use std::{cmp::Ordering, time::Duration};

use dashmap::DashMap;
use serde::{Serialize, Serializer};

use crate::{
    community::{Algorithm, Partition},
    error::PartitionNotConverged,
};

/// Grouping key of a [`BenchmarkRecord`].
///
/// Keys sort by order, then algorithm identifier, then flag state with
/// unflagged first.
///
/// # Examples
/// ```
/// use eegraph_core::{Algorithm, BenchmarkKey};
///
/// let mut keys = vec![
///     BenchmarkKey::new(10, Algorithm::Louvain, true),
///     BenchmarkKey::new(10, Algorithm::Louvain, false),
///     BenchmarkKey::new(4, Algorithm::Louvain, true),
/// ];
/// keys.sort();
/// assert_eq!(keys[0].order(), 4);
/// assert!(!keys[1].flagged());
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct BenchmarkKey {
    order: usize,
    algorithm: Algorithm,
    flagged: bool,
}

impl BenchmarkKey {
    /// Creates a key.
    #[must_use]
    pub fn new(order: usize, algorithm: Algorithm, flagged: bool) -> Self {
        Self {
            order,
            algorithm,
            flagged,
        }
    }

    /// Key under which `partition` is aggregated.
    #[must_use]
    pub fn of(partition: &Partition) -> Self {
        Self::new(partition.order(), partition.algorithm(), partition.flagged())
    }

    /// Graph order.
    #[must_use]
    #[rustfmt::skip]
    pub fn order(&self) -> usize { self.order }

    /// Algorithm.
    #[must_use]
    #[rustfmt::skip]
    pub fn algorithm(&self) -> Algorithm { self.algorithm }

    /// Flag state.
    #[must_use]
    #[rustfmt::skip]
    pub fn flagged(&self) -> bool { self.flagged }
}

impl Ord for BenchmarkKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.order
            .cmp(&other.order)
            .then_with(|| self.algorithm.as_str().cmp(other.algorithm.as_str()))
            .then_with(|| self.flagged.cmp(&other.flagged))
    }
}

impl PartialOrd for BenchmarkKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct Accumulator {
    modularity: f64,
    runtime: Duration,
    communities: usize,
    samples: usize,
    partial: usize,
    failures: usize,
}

/// Finalised statistics for one [`BenchmarkKey`].
///
/// Means are `None` when every run under the key failed.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BenchmarkRecord {
    order: usize,
    algorithm: Algorithm,
    #[serde(rename = "flag")]
    flagged: bool,
    mean_modularity: Option<f64>,
    #[serde(serialize_with = "serialize_seconds")]
    mean_runtime: Option<Duration>,
    sample_count: usize,
    partial_count: usize,
    failure_count: usize,
    mean_community_count: Option<f64>,
}

impl BenchmarkRecord {
    fn finalise(key: BenchmarkKey, acc: &Accumulator) -> Self {
        let samples = acc.samples;
        let divisor = u32::try_from(samples).ok().filter(|n| *n > 0);
        Self {
            order: key.order,
            algorithm: key.algorithm,
            flagged: key.flagged,
            mean_modularity: divisor.map(|n| acc.modularity / f64::from(n)),
            mean_runtime: divisor.map(|n| acc.runtime / n),
            sample_count: samples,
            partial_count: acc.partial,
            failure_count: acc.failures,
            mean_community_count: divisor.map(|n| acc.communities as f64 / f64::from(n)),
        }
    }

    /// Key of the record.
    #[must_use]
    pub fn key(&self) -> BenchmarkKey {
        BenchmarkKey::new(self.order, self.algorithm, self.flagged)
    }

    /// Graph order.
    #[must_use]
    #[rustfmt::skip]
    pub fn order(&self) -> usize { self.order }

    /// Algorithm.
    #[must_use]
    #[rustfmt::skip]
    pub fn algorithm(&self) -> Algorithm { self.algorithm }

    /// Flag state.
    #[must_use]
    #[rustfmt::skip]
    pub fn flagged(&self) -> bool { self.flagged }

    /// Arithmetic mean of the recorded modularity values.
    #[must_use]
    #[rustfmt::skip]
    pub fn mean_modularity(&self) -> Option<f64> { self.mean_modularity }

    /// Arithmetic mean of the recorded runtimes.
    #[must_use]
    #[rustfmt::skip]
    pub fn mean_runtime(&self) -> Option<Duration> { self.mean_runtime }

    /// Partitions recorded, partial ones included.
    #[must_use]
    #[rustfmt::skip]
    pub fn sample_count(&self) -> usize { self.sample_count }

    /// Partitions that hit the iteration cap.
    #[must_use]
    #[rustfmt::skip]
    pub fn partial_count(&self) -> usize { self.partial_count }

    /// Subjects that failed before a partition was produced.
    #[must_use]
    #[rustfmt::skip]
    pub fn failure_count(&self) -> usize { self.failure_count }

    /// Mean number of communities per partition.
    #[must_use]
    #[rustfmt::skip]
    pub fn mean_community_count(&self) -> Option<f64> { self.mean_community_count }

    /// Share of recorded partitions that converged, or `None` without
    /// samples.
    #[must_use]
    pub fn convergence_rate(&self) -> Option<f64> {
        (self.sample_count > 0).then(|| {
            (self.sample_count - self.partial_count) as f64 / self.sample_count as f64
        })
    }
}

fn serialize_seconds<S: Serializer>(
    runtime: &Option<Duration>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match runtime {
        Some(runtime) => serializer.serialize_some(&runtime.as_secs_f64()),
        None => serializer.serialize_none(),
    }
}

/// Accumulates running sums and counts per [`BenchmarkKey`].
///
/// Safe to share across worker threads; every update touches one shard.
///
/// # Examples
/// ```
/// use std::time::Duration;
///
/// use eegraph_core::{
///     Algorithm, BenchmarkAggregator, BenchmarkKey, CommunityId, Convergence, Partition,
///     PartitionMetrics,
/// };
///
/// let partition = |runtime| {
///     Partition::try_new(
///         vec![CommunityId::new(0); 10],
///         PartitionMetrics {
///             modularity: 0.0,
///             runtime,
///             algorithm: Algorithm::Louvain,
///             flagged: false,
///             passes: 1,
///             convergence: Convergence::Converged,
///         },
///     )
///     .expect("canonical")
/// };
/// let aggregator = BenchmarkAggregator::new();
/// aggregator.record_partition(&partition(Duration::from_millis(2)));
/// aggregator.record_partition(&partition(Duration::from_millis(4)));
///
/// let record = aggregator
///     .record_for(BenchmarkKey::new(10, Algorithm::Louvain, false))
///     .expect("key was recorded");
/// assert_eq!(record.sample_count(), 2);
/// assert_eq!(record.mean_runtime(), Some(Duration::from_millis(3)));
/// ```
#[derive(Debug, Default)]
pub struct BenchmarkAggregator {
    entries: DashMap<BenchmarkKey, Accumulator>,
}

impl BenchmarkAggregator {
    /// Creates an empty aggregator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one partition's statistics under its key. Partial partitions
    /// also increment the partial count.
    pub fn record_partition(&self, partition: &Partition) {
        let key = BenchmarkKey::of(partition);
        {
            let mut entry = self.entries.entry(key).or_default();
            entry.modularity += partition.modularity();
            entry.runtime += partition.runtime();
            entry.communities += partition.community_count();
            entry.samples += 1;
            if partition.is_partial() {
                entry.partial += 1;
            }
        }
        #[cfg(feature = "metrics")]
        emit_partition_metrics(key, partition);
    }

    /// Records a detection outcome, keeping the partial partition of a
    /// non-converged run.
    pub fn record_outcome(&self, outcome: &Result<Partition, PartitionNotConverged>) {
        match outcome {
            Ok(partition) => self.record_partition(partition),
            Err(err) => self.record_partition(err.partial()),
        }
    }

    /// Counts a failed run under `key`. `code` identifies the failure in
    /// metrics.
    pub fn record_failure(&self, key: BenchmarkKey, code: &'static str) {
        self.entries.entry(key).or_default().failures += 1;
        #[cfg(feature = "metrics")]
        metrics::counter!(
            "eegraph_failures_total",
            "algorithm" => key.algorithm.as_str(),
            "flag" => flag_label(key.flagged),
            "order" => key.order.to_string(),
            "code" => code,
        )
        .increment(1);
        #[cfg(not(feature = "metrics"))]
        let _ = code;
    }

    /// Number of distinct keys seen.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Finalised record for `key`.
    #[must_use]
    pub fn record_for(&self, key: BenchmarkKey) -> Option<BenchmarkRecord> {
        self.entries
            .get(&key)
            .map(|entry| BenchmarkRecord::finalise(key, entry.value()))
    }

    /// Finalised records sorted by key.
    #[must_use]
    pub fn records(&self) -> Vec<BenchmarkRecord> {
        let mut records: Vec<BenchmarkRecord> = self
            .entries
            .iter()
            .map(|entry| BenchmarkRecord::finalise(*entry.key(), entry.value()))
            .collect();
        records.sort_by_key(BenchmarkRecord::key);
        records
    }
}

#[cfg(feature = "metrics")]
fn flag_label(flagged: bool) -> &'static str {
    if flagged { "flagged" } else { "unflagged" }
}

#[cfg(feature = "metrics")]
fn emit_partition_metrics(key: BenchmarkKey, partition: &Partition) {
    use metrics::Label;

    let labels = vec![
        Label::new("algorithm", key.algorithm.as_str()),
        Label::new("flag", flag_label(key.flagged)),
        Label::new("order", key.order.to_string()),
    ];
    metrics::counter!("eegraph_partitions_total", labels.clone()).increment(1);
    if partition.is_partial() {
        metrics::counter!("eegraph_partial_partitions_total", labels.clone()).increment(1);
    }
    metrics::histogram!("eegraph_partition_runtime_seconds", labels)
        .record(partition.runtime().as_secs_f64());
}
