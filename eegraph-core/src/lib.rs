//! eegraph core library.
//!
//! Turns multichannel EEG recordings into weighted channel graphs and
//! benchmarks community-detection algorithms on them. Data flows through
//! five stages:
//!
//! 1. [`DescriptorExtractor`] turns each channel into a [`Node`] carrying
//!    relative band powers, the theta/alpha ratio, and the variance.
//! 2. [`ConnectivityEstimator`] weights every channel pair with a
//!    [`ConnectivityMeasure`] and keeps the pairs an [`InclusionPolicy`]
//!    admits as [`Edge`]s.
//! 3. [`Graph::assemble`] validates the records into an immutable [`Graph`].
//! 4. [`CommunityDetector`] partitions the graph with an [`Algorithm`].
//! 5. [`BenchmarkAggregator`] folds partitions into [`BenchmarkRecord`]s
//!    keyed by order, algorithm, and flag state.
//!
//! [`EegraphBuilder`] configures the whole chain and [`Eegraph::benchmark`]
//! runs it over many subjects.
//!
//! With the `metrics` feature the aggregator emits
//! `eegraph_partitions_total`, `eegraph_partial_partitions_total`,
//! `eegraph_failures_total`, and the `eegraph_partition_runtime_seconds`
//! histogram.
#![cfg_attr(docsrs, feature(doc_cfg))]

mod benchmark;
mod builder;
mod community;
mod connectivity;
mod eegraph;
mod error;
mod graph;
mod recording;
mod signal;

#[cfg(test)]
mod test_utils;

pub use crate::{
    benchmark::{BenchmarkAggregator, BenchmarkKey, BenchmarkRecord},
    builder::{EegraphBuilder, ExecutionStrategy},
    community::{
        Algorithm, CommunityDetector, CommunityId, Convergence, DEFAULT_FLAG_THRESHOLD,
        DEFAULT_ITERATION_CAP, DEFAULT_RESOLUTION, NonCanonicalCommunityIds, Partition,
        PartitionMetrics, UnknownAlgorithm, modularity, modularity_contributions,
    },
    connectivity::{
        ConnectivityEstimator, ConnectivityMeasure, DEFAULT_BAND_POWER_SCALE,
        DEFAULT_INCLUSION_THRESHOLD, InclusionPolicy,
    },
    eegraph::{BenchmarkReport, Eegraph, Run, SubjectAnalysis, SubjectFailure},
    error::{
        ConfigError, ConfigErrorCode, ConnectivityError, ConnectivityErrorCode, GraphError,
        GraphErrorCode, PartitionNotConverged, RecordingError, RecordingErrorCode, Result,
        SubjectError, SubjectErrorCode,
    },
    graph::{Edge, Graph, Node},
    recording::{Channel, InMemoryRecording, Recording, SubjectId},
    signal::{BandPower, BandSet, DescriptorExtractor, FrequencyBand, NodeFeatures},
};
