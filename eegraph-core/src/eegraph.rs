//! Pipeline orchestration for the eegraph library.
//!
//! [`Eegraph`] chains descriptor extraction, connectivity estimation, graph
//! assembly, and community detection for each subject, and folds the
//! results of many subjects into [`BenchmarkRecord`]s.

use std::num::NonZeroUsize;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{Span, field, info, instrument, warn};

use crate::{
    Result,
    benchmark::{BenchmarkAggregator, BenchmarkKey, BenchmarkRecord},
    builder::ExecutionStrategy,
    community::{Algorithm, CommunityDetector, Partition},
    connectivity::ConnectivityEstimator,
    error::{PartitionNotConverged, SubjectError},
    graph::{Graph, Node},
    recording::{Recording, SubjectId},
    signal::DescriptorExtractor,
};

/// One detection run of a subject.
#[derive(Clone, Debug, PartialEq)]
pub struct Run {
    /// Algorithm used.
    pub algorithm: Algorithm,
    /// Whether flag mode filtered the graph first.
    pub flagged: bool,
    /// Zero-based repetition number.
    pub repetition: usize,
    /// Converged partition, or the partial one carried by the error.
    pub outcome: core::result::Result<Partition, PartitionNotConverged>,
}

/// Graph and detection runs of one subject.
#[derive(Clone, Debug, PartialEq)]
pub struct SubjectAnalysis {
    graph: Graph,
    runs: Vec<Run>,
}

impl SubjectAnalysis {
    /// Assembled graph.
    #[must_use]
    #[rustfmt::skip]
    pub fn graph(&self) -> &Graph { &self.graph }

    /// Runs in algorithm, then flag, then repetition order.
    #[must_use]
    #[rustfmt::skip]
    pub fn runs(&self) -> &[Run] { &self.runs }
}

/// A subject that was skipped during a benchmark.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SubjectFailure {
    subject: SubjectId,
    order: usize,
    code: &'static str,
    detail: &'static str,
    message: String,
}

impl SubjectFailure {
    fn new(subject: SubjectId, order: usize, error: &SubjectError) -> Self {
        Self {
            subject,
            order,
            code: error.code().as_str(),
            detail: error.detail_code(),
            message: error.to_string(),
        }
    }

    /// Subject that failed.
    #[must_use]
    #[rustfmt::skip]
    pub fn subject(&self) -> &SubjectId { &self.subject }

    /// Channel count of the failed recording, used as the benchmark order.
    #[must_use]
    #[rustfmt::skip]
    pub fn order(&self) -> usize { self.order }

    /// Code of the [`SubjectError`] variant.
    #[must_use]
    #[rustfmt::skip]
    pub fn code(&self) -> &'static str { self.code }

    /// Code of the stage error underneath.
    #[must_use]
    #[rustfmt::skip]
    pub fn detail(&self) -> &'static str { self.detail }

    /// Human-readable description.
    #[must_use]
    #[rustfmt::skip]
    pub fn message(&self) -> &str { &self.message }
}

/// Outcome of [`Eegraph::benchmark`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BenchmarkReport {
    records: Vec<BenchmarkRecord>,
    subject_count: usize,
    failures: Vec<SubjectFailure>,
}

impl BenchmarkReport {
    /// Records sorted by order, algorithm, and flag.
    #[must_use]
    #[rustfmt::skip]
    pub fn records(&self) -> &[BenchmarkRecord] { &self.records }

    /// Subjects submitted.
    #[must_use]
    #[rustfmt::skip]
    pub fn subject_count(&self) -> usize { self.subject_count }

    /// Subjects skipped, in input order.
    #[must_use]
    #[rustfmt::skip]
    pub fn failures(&self) -> &[SubjectFailure] { &self.failures }
}

/// Entry point for running the pipeline.
///
/// # Examples
/// ```
/// use eegraph_core::{Channel, EegraphBuilder, InMemoryRecording, InclusionPolicy};
///
/// let wave = |phase: f64| -> Vec<f64> {
///     (0..256).map(|n| (n as f64 * 0.3 + phase).sin()).collect()
/// };
/// let recording = InMemoryRecording::new(
///     "s1",
///     128.0,
///     vec![
///         Channel::new("Fp1", wave(0.0)),
///         Channel::new("Fp2", wave(0.05)),
///         Channel::new("O1", wave(1.5)),
///     ],
/// );
/// let eegraph = EegraphBuilder::new()
///     .with_inclusion(InclusionPolicy::All)
///     .build()
///     .expect("configuration is valid");
///
/// let graph = eegraph.build_graph(&recording).expect("recording is valid");
/// assert_eq!(graph.order(), 3);
/// assert_eq!(graph.size(), 3);
///
/// let report = eegraph.benchmark(&[recording]);
/// assert_eq!(report.records()[0].sample_count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Eegraph {
    extractor: DescriptorExtractor,
    estimator: ConnectivityEstimator,
    detector: CommunityDetector,
    algorithms: Vec<Algorithm>,
    flag_states: Vec<bool>,
    repetitions: NonZeroUsize,
    execution_strategy: ExecutionStrategy,
}

impl Eegraph {
    pub(crate) fn new(
        extractor: DescriptorExtractor,
        estimator: ConnectivityEstimator,
        detector: CommunityDetector,
        algorithms: Vec<Algorithm>,
        flag_states: Vec<bool>,
        repetitions: NonZeroUsize,
        execution_strategy: ExecutionStrategy,
    ) -> Self {
        Self {
            extractor,
            estimator,
            detector,
            algorithms,
            flag_states,
            repetitions,
            execution_strategy,
        }
    }

    /// Descriptor extractor.
    #[must_use]
    #[rustfmt::skip]
    pub fn extractor(&self) -> &DescriptorExtractor { &self.extractor }

    /// Connectivity estimator.
    #[must_use]
    #[rustfmt::skip]
    pub fn estimator(&self) -> &ConnectivityEstimator { &self.estimator }

    /// Community detector.
    #[must_use]
    #[rustfmt::skip]
    pub fn detector(&self) -> &CommunityDetector { &self.detector }

    /// Algorithms run for every subject, in configuration order.
    #[must_use]
    #[rustfmt::skip]
    pub fn algorithms(&self) -> &[Algorithm] { &self.algorithms }

    /// Flag states run for every algorithm, unflagged first.
    #[must_use]
    #[rustfmt::skip]
    pub fn flag_states(&self) -> &[bool] { &self.flag_states }

    /// Repetitions of every (algorithm, flag) combination.
    #[must_use]
    #[rustfmt::skip]
    pub fn repetitions(&self) -> NonZeroUsize { self.repetitions }

    /// Subject scheduling strategy.
    #[must_use]
    #[rustfmt::skip]
    pub fn execution_strategy(&self) -> ExecutionStrategy { self.execution_strategy }

    /// Produces one node per channel.
    ///
    /// # Errors
    /// Returns [`SubjectError::MalformedRecording`] for an invalid recording.
    pub fn extract_nodes<R: Recording + ?Sized + Sync>(&self, recording: &R) -> Result<Vec<Node>> {
        Ok(self.extractor.extract(recording)?)
    }

    /// Extracts nodes, estimates edges, and assembles the graph.
    ///
    /// # Errors
    /// Returns [`SubjectError`] naming the stage that rejected the subject.
    #[instrument(
        name = "core.build_graph",
        err,
        skip(self, recording),
        fields(subject = %recording.subject_id(), order = field::Empty, size = field::Empty),
    )]
    pub fn build_graph<R: Recording + ?Sized + Sync>(&self, recording: &R) -> Result<Graph> {
        let nodes = self.extractor.extract(recording)?;
        let edges = self.estimator.estimate(recording, &nodes)?;
        let graph = Graph::assemble(recording.subject_id().clone(), nodes, edges)?;
        let span = Span::current();
        span.record("order", graph.order());
        span.record("size", graph.size());
        Ok(graph)
    }

    /// Partitions `graph` with the configured detector.
    ///
    /// # Errors
    /// Returns [`PartitionNotConverged`] when the iteration cap is reached.
    pub fn detect(
        &self,
        graph: &Graph,
        algorithm: Algorithm,
        flagged: bool,
    ) -> core::result::Result<Partition, PartitionNotConverged> {
        self.detector.detect(graph, algorithm, flagged)
    }

    /// Builds the graph of `recording` and runs every configured
    /// combination of algorithm, flag state, and repetition on it.
    ///
    /// # Errors
    /// Returns [`SubjectError`] when the graph cannot be built. Detection
    /// runs never fail the analysis; non-converged runs keep their partial
    /// partition in [`Run::outcome`].
    pub fn analyse<R: Recording + ?Sized + Sync>(&self, recording: &R) -> Result<SubjectAnalysis> {
        let graph = self.build_graph(recording)?;
        let mut runs = Vec::with_capacity(
            self.algorithms.len() * self.flag_states.len() * self.repetitions.get(),
        );
        for &algorithm in &self.algorithms {
            for &flagged in &self.flag_states {
                for repetition in 0..self.repetitions.get() {
                    runs.push(Run {
                        algorithm,
                        flagged,
                        repetition,
                        outcome: self.detect(&graph, algorithm, flagged),
                    });
                }
            }
        }
        Ok(SubjectAnalysis { graph, runs })
    }

    /// Analyses every recording and aggregates the runs per
    /// (order, algorithm, flag).
    ///
    /// A subject whose graph cannot be built is skipped and counted as a
    /// failure under every key it would have produced, with the recording's
    /// channel count as the order.
    #[instrument(
        name = "core.benchmark",
        skip(self, recordings),
        fields(
            subjects = recordings.len(),
            strategy = ?self.execution_strategy,
            records = field::Empty,
            failures = field::Empty,
        ),
    )]
    pub fn benchmark<R: Recording + Sync>(&self, recordings: &[R]) -> BenchmarkReport {
        let aggregator = BenchmarkAggregator::new();
        let failures: Vec<SubjectFailure> = match self.execution_strategy {
            ExecutionStrategy::Parallel => recordings
                .par_iter()
                .filter_map(|recording| self.benchmark_subject(recording, &aggregator))
                .collect(),
            ExecutionStrategy::Sequential => recordings
                .iter()
                .filter_map(|recording| self.benchmark_subject(recording, &aggregator))
                .collect(),
        };

        let records = aggregator.records();
        let span = Span::current();
        span.record("records", records.len());
        span.record("failures", failures.len());
        info!(
            subjects = recordings.len(),
            records = records.len(),
            failures = failures.len(),
            "benchmark complete"
        );
        BenchmarkReport {
            records,
            subject_count: recordings.len(),
            failures,
        }
    }

    fn benchmark_subject<R: Recording + Sync>(
        &self,
        recording: &R,
        aggregator: &BenchmarkAggregator,
    ) -> Option<SubjectFailure> {
        match self.analyse(recording) {
            Ok(analysis) => {
                for run in analysis.runs() {
                    aggregator.record_outcome(&run.outcome);
                }
                None
            }
            Err(error) => {
                let order = recording.channel_count();
                warn!(
                    subject = %recording.subject_id(),
                    code = error.code().as_str(),
                    detail = error.detail_code(),
                    error = %error,
                    "subject skipped"
                );
                for &algorithm in &self.algorithms {
                    for &flagged in &self.flag_states {
                        let key = BenchmarkKey::new(order, algorithm, flagged);
                        aggregator.record_failure(key, error.detail_code());
                    }
                }
                Some(SubjectFailure::new(
                    recording.subject_id().clone(),
                    order,
                    &error,
                ))
            }
        }
    }
}
