//! Community detection over assembled graphs.
//!
//! [`CommunityDetector`] dispatches to one of the closed set of
//! [`Algorithm`]s, optionally after filtering weak edges (flag mode), and
//! reports the partition together with its modularity and runtime.

mod label_propagation;
mod louvain;
mod network;
mod partition;

use std::{fmt, num::NonZeroUsize, str::FromStr, time::Instant};

use serde::Serialize;
use thiserror::Error;
use tracing::{Span, field, instrument, warn};

use self::network::Network;
pub use self::partition::{
    CommunityId, Convergence, NonCanonicalCommunityIds, Partition, PartitionMetrics,
};
use crate::{
    error::{ConfigError, PartitionNotConverged},
    graph::Graph,
};

/// Default resolution parameter.
pub const DEFAULT_RESOLUTION: f64 = 1.0;
/// Default cap on local-moving passes per level or propagation sweeps.
pub const DEFAULT_ITERATION_CAP: usize = 100;
/// Default weight below which flag mode drops edges.
pub const DEFAULT_FLAG_THRESHOLD: f64 = 0.5;

/// Community-detection algorithms, dispatched by identifier.
///
/// # Examples
/// ```
/// use eegraph_core::Algorithm;
///
/// assert_eq!(Algorithm::default(), Algorithm::Louvain);
/// assert_eq!("label-propagation".parse(), Ok(Algorithm::LabelPropagation));
/// assert_eq!(Algorithm::Louvain.to_string(), "louvain");
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub enum Algorithm {
    /// Two-phase modularity optimisation with aggregation.
    #[default]
    Louvain,
    /// Weighted label propagation.
    LabelPropagation,
}

impl Algorithm {
    /// Every supported algorithm.
    pub const ALL: [Self; 2] = [Self::Louvain, Self::LabelPropagation];

    /// Stable identifier of the algorithm.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Louvain => "louvain",
            Self::LabelPropagation => "label-propagation",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown algorithm identifier.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[error("unknown community-detection algorithm `{0}`")]
pub struct UnknownAlgorithm(pub String);

impl FromStr for Algorithm {
    type Err = UnknownAlgorithm;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|algorithm| algorithm.as_str() == value)
            .ok_or_else(|| UnknownAlgorithm(value.to_owned()))
    }
}

/// Raw labels produced by an algorithm before renumbering.
pub(crate) struct Outcome {
    labels: Vec<usize>,
    passes: usize,
    converged: bool,
}

impl Outcome {
    fn singletons(order: usize) -> Self {
        Self {
            labels: (0..order).collect(),
            passes: 0,
            converged: true,
        }
    }
}

/// Runs community detection with a fixed resolution, iteration cap, and
/// flag threshold.
///
/// # Examples
/// ```
/// use eegraph_core::{Algorithm, CommunityDetector, Edge, Graph, Node, NodeFeatures, SubjectId};
///
/// let subject = SubjectId::new("s1");
/// let nodes = (0..4)
///     .map(|i| Node::new(subject.clone(), i, format!("ch{i}"), NodeFeatures::default()))
///     .collect();
/// let edges = [(0, 1), (1, 2), (0, 2)]
///     .into_iter()
///     .map(|(a, b)| Edge::new(subject.clone(), a, b, 1.0))
///     .collect();
/// let graph = Graph::assemble(subject, nodes, edges).expect("graph is valid");
///
/// let partition = CommunityDetector::default()
///     .detect(&graph, Algorithm::Louvain, false)
///     .expect("small graphs converge");
/// assert_eq!(partition.members(), vec![vec![0, 1, 2], vec![3]]);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CommunityDetector {
    resolution: f64,
    iteration_cap: NonZeroUsize,
    flag_threshold: f64,
}

impl Default for CommunityDetector {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
            iteration_cap: NonZeroUsize::new(DEFAULT_ITERATION_CAP).unwrap_or(NonZeroUsize::MIN),
            flag_threshold: DEFAULT_FLAG_THRESHOLD,
        }
    }
}

impl CommunityDetector {
    /// Creates a detector after validating its parameters.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidResolution`] unless the resolution is
    /// finite and positive, [`ConfigError::InvalidIterationCap`] for a zero
    /// cap, and [`ConfigError::InvalidThreshold`] unless the flag threshold
    /// is finite and non-negative.
    pub fn new(
        resolution: f64,
        iteration_cap: usize,
        flag_threshold: f64,
    ) -> Result<Self, ConfigError> {
        if !resolution.is_finite() || resolution <= 0.0 {
            return Err(ConfigError::InvalidResolution { got: resolution });
        }
        let iteration_cap = NonZeroUsize::new(iteration_cap)
            .ok_or(ConfigError::InvalidIterationCap { got: iteration_cap })?;
        if !flag_threshold.is_finite() || flag_threshold < 0.0 {
            return Err(ConfigError::InvalidThreshold {
                name: "flag threshold",
                got: flag_threshold,
            });
        }
        Ok(Self {
            resolution,
            iteration_cap,
            flag_threshold,
        })
    }

    /// Resolution parameter `gamma`.
    #[must_use]
    #[rustfmt::skip]
    pub fn resolution(&self) -> f64 { self.resolution }

    /// Maximum passes per level or sweeps.
    #[must_use]
    #[rustfmt::skip]
    pub fn iteration_cap(&self) -> NonZeroUsize { self.iteration_cap }

    /// Weight below which flag mode drops edges.
    #[must_use]
    #[rustfmt::skip]
    pub fn flag_threshold(&self) -> f64 { self.flag_threshold }

    /// Partitions `graph` with `algorithm`.
    ///
    /// With `flagged` set, edges lighter than the flag threshold are removed
    /// first and modularity is measured on the filtered graph. A graph
    /// without edges yields singletons with modularity 0.
    ///
    /// # Errors
    /// Returns [`PartitionNotConverged`], carrying the best partition found,
    /// when the iteration cap is exhausted.
    #[instrument(
        name = "core.detect",
        skip(self, graph, algorithm),
        fields(
            subject = %graph.subject_id(),
            order = graph.order(),
            algorithm = algorithm.as_str(),
            communities = field::Empty,
            modularity = field::Empty,
        ),
    )]
    pub fn detect(
        &self,
        graph: &Graph,
        algorithm: Algorithm,
        flagged: bool,
    ) -> Result<Partition, PartitionNotConverged> {
        let started = Instant::now();
        let filtered;
        let working = if flagged {
            filtered = graph.filtered(self.flag_threshold);
            &filtered
        } else {
            graph
        };

        let outcome = if working.size() == 0 {
            Outcome::singletons(working.order())
        } else {
            match algorithm {
                Algorithm::Louvain => {
                    louvain::louvain(working, self.resolution, self.iteration_cap)
                }
                Algorithm::LabelPropagation => {
                    label_propagation::label_propagation(working, self.iteration_cap)
                }
            }
        };
        let (compacted, communities) = partition::compact(&outcome.labels);
        let modularity = Network::from_graph(working).modularity(&compacted, self.resolution);
        let assignments = compacted
            .iter()
            .map(|&community| CommunityId::new(community as u64))
            .collect();
        let runtime = started.elapsed();

        let span = Span::current();
        span.record("communities", communities);
        span.record("modularity", modularity);

        let partition = Partition::from_canonical(
            assignments,
            communities,
            PartitionMetrics {
                modularity,
                runtime,
                algorithm,
                flagged,
                passes: outcome.passes,
                convergence: if outcome.converged {
                    Convergence::Converged
                } else {
                    Convergence::Partial
                },
            },
        );
        if outcome.converged {
            Ok(partition)
        } else {
            warn!(
                algorithm = algorithm.as_str(),
                cap = self.iteration_cap.get(),
                "iteration cap reached; returning partial partition"
            );
            Err(PartitionNotConverged::new(self.iteration_cap, partition))
        }
    }
}

/// Modularity of `partition` on `graph` with resolution `gamma`.
///
/// # Examples
/// ```
/// use std::time::Duration;
///
/// use eegraph_core::{
///     Algorithm, CommunityId, Convergence, Edge, Graph, Node, NodeFeatures, Partition,
///     PartitionMetrics, SubjectId, modularity,
/// };
///
/// let subject = SubjectId::new("s1");
/// let nodes = (0..2)
///     .map(|i| Node::new(subject.clone(), i, format!("ch{i}"), NodeFeatures::default()))
///     .collect();
/// let graph = Graph::assemble(subject.clone(), nodes, vec![Edge::new(subject, 0, 1, 1.0)])
///     .expect("graph is valid");
/// let singletons = Partition::try_new(
///     [0, 1].map(CommunityId::new).to_vec(),
///     PartitionMetrics {
///         modularity: 0.0,
///         runtime: Duration::ZERO,
///         algorithm: Algorithm::Louvain,
///         flagged: false,
///         passes: 0,
///         convergence: Convergence::Converged,
///     },
/// )
/// .expect("canonical");
/// assert_eq!(modularity(&graph, &singletons, 1.0), -0.5);
/// ```
#[must_use]
pub fn modularity(graph: &Graph, partition: &Partition, resolution: f64) -> f64 {
    modularity_contributions(graph, partition, resolution)
        .iter()
        .sum()
}

/// Per-community modularity terms `L_c / m - gamma (d_c / 2m)^2`, indexed
/// by community identifier.
#[must_use]
pub fn modularity_contributions(graph: &Graph, partition: &Partition, resolution: f64) -> Vec<f64> {
    let membership: Vec<usize> = partition
        .assignments()
        .iter()
        .map(|id| id.get() as usize)
        .collect();
    Network::from_graph(graph).contributions(&membership, resolution)
}
