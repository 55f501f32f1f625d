//! Error types for the eegraph core library.
//!
//! Each stage of the pipeline owns an error enum with a stable
//! machine-readable code. [`SubjectError`] wraps the stage errors that abort a
//! single subject, while [`ConfigError`] is raised when an [`crate::Eegraph`]
//! runtime is built from an invalid configuration.

use std::{fmt, num::NonZeroUsize};

use thiserror::Error;

use crate::{community::Partition, recording::SubjectId};

macro_rules! define_error_codes {
    (
        $(#[$enum_meta:meta])*
        enum $CodeTy:ident for $ErrTy:ident {
            $(
                $(#[$variant_meta:meta])*
                $CodeVariant:ident => $ErrVariant:ident $( { $($pattern:tt)* } )? => $code:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        #[non_exhaustive]
        pub enum $CodeTy {
            $(
                $(#[$variant_meta])*
                $CodeVariant,
            )+
        }

        impl $CodeTy {
            /// Return the stable machine-readable representation of this error code.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$CodeVariant => $code,)+
                }
            }
        }

        impl fmt::Display for $CodeTy {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $ErrTy {
            #[doc = concat!(
                "Retrieve the stable [`",
                stringify!($CodeTy),
                "`] for this error."
            )]
            pub const fn code(&self) -> $CodeTy {
                match self {
                    $(Self::$ErrVariant $( { $($pattern)* } )? => $CodeTy::$CodeVariant,)+
                }
            }
        }
    };
}

/// A recording could not be turned into nodes.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum RecordingError {
    /// The recording exposes no channels at all.
    #[error("recording `{subject}` has no channels")]
    NoChannels {
        /// Subject whose recording was empty.
        subject: SubjectId,
    },
    /// A channel carries zero samples.
    #[error("channel `{channel}` of recording `{subject}` is empty")]
    EmptyChannel {
        /// Subject owning the channel.
        subject: SubjectId,
        /// Label of the empty channel.
        channel: String,
    },
    /// Channel lengths disagree.
    #[error(
        "channel `{channel}` of recording `{subject}` has {actual} samples but {expected} were expected"
    )]
    LengthMismatch {
        /// Subject owning the channel.
        subject: SubjectId,
        /// Label of the first channel whose length differs.
        channel: String,
        /// Length of the first channel.
        expected: usize,
        /// Length of the offending channel.
        actual: usize,
    },
    /// The sampling rate is not a finite positive frequency.
    #[error("recording `{subject}` has invalid sampling rate {rate}")]
    InvalidSamplingRate {
        /// Subject whose recording declared the rate.
        subject: SubjectId,
        /// The rejected rate in hertz.
        rate: f64,
    },
    /// A sample is NaN or infinite.
    #[error("channel `{channel}` of recording `{subject}` has a non-finite sample at {index}")]
    NonFiniteSample {
        /// Subject owning the channel.
        subject: SubjectId,
        /// Label of the channel.
        channel: String,
        /// Position of the first non-finite sample.
        index: usize,
    },
}

define_error_codes! {
    /// Stable codes describing [`RecordingError`] variants.
    enum RecordingErrorCode for RecordingError {
        /// The recording exposes no channels at all.
        NoChannels => NoChannels { .. } => "RECORDING_NO_CHANNELS",
        /// A channel carries zero samples.
        EmptyChannel => EmptyChannel { .. } => "RECORDING_EMPTY_CHANNEL",
        /// Channel lengths disagree.
        LengthMismatch => LengthMismatch { .. } => "RECORDING_LENGTH_MISMATCH",
        /// The sampling rate is not a finite positive frequency.
        InvalidSamplingRate => InvalidSamplingRate { .. } => "RECORDING_INVALID_SAMPLING_RATE",
        /// A sample is NaN or infinite.
        NonFiniteSample => NonFiniteSample { .. } => "RECORDING_NON_FINITE_SAMPLE",
    }
}

/// Pairwise connectivity could not be estimated.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum ConnectivityError {
    /// A channel is shorter than the measure requires.
    #[error(
        "channel `{channel}` of recording `{subject}` has {samples} samples but `{measure}` needs at least {required}"
    )]
    InsufficientData {
        /// Subject owning the channel.
        subject: SubjectId,
        /// Label of the short channel.
        channel: String,
        /// Identifier of the connectivity measure.
        measure: &'static str,
        /// Samples available.
        samples: usize,
        /// Minimum samples required by the measure.
        required: usize,
    },
    /// The node list refers to a channel the recording does not expose.
    #[error("node {index} has no backing channel in recording `{subject}`")]
    MissingChannel {
        /// Subject whose recording was queried.
        subject: SubjectId,
        /// Node index without a channel.
        index: usize,
    },
    /// The recording and the node list belong to different subjects.
    #[error("nodes of `{nodes}` cannot be paired with the recording of `{recording}`")]
    SubjectMismatch {
        /// Subject of the nodes.
        nodes: SubjectId,
        /// Subject of the recording.
        recording: SubjectId,
    },
}

define_error_codes! {
    /// Stable codes describing [`ConnectivityError`] variants.
    enum ConnectivityErrorCode for ConnectivityError {
        /// A channel is shorter than the measure requires.
        InsufficientData => InsufficientData { .. } => "CONNECTIVITY_INSUFFICIENT_DATA",
        /// The node list refers to a channel the recording does not expose.
        MissingChannel => MissingChannel { .. } => "CONNECTIVITY_MISSING_CHANNEL",
        /// The recording and the node list belong to different subjects.
        SubjectMismatch => SubjectMismatch { .. } => "CONNECTIVITY_SUBJECT_MISMATCH",
    }
}

/// Node and edge records violate referential integrity.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum GraphError {
    /// Node indices must follow the input order starting at zero.
    #[error("node at position {position} carries index {index}")]
    NodeIndexMismatch {
        /// Position of the node in the supplied list.
        position: usize,
        /// Index stored on the node.
        index: usize,
    },
    /// An edge endpoint is not one of the graph's nodes.
    #[error("edge ({source_node}, {target_node}) references a node outside 0..{order}")]
    UnknownEndpoint {
        /// Lower endpoint of the edge.
        source_node: usize,
        /// Upper endpoint of the edge.
        target_node: usize,
        /// Number of nodes in the graph.
        order: usize,
    },
    /// An edge connects a node to itself.
    #[error("edge connects node {node} to itself")]
    SelfLoop {
        /// The node referenced twice.
        node: usize,
    },
    /// Two edges share the same unordered endpoint pair.
    #[error("duplicate edge ({source_node}, {target_node})")]
    DuplicateEdge {
        /// Lower endpoint of the pair.
        source_node: usize,
        /// Upper endpoint of the pair.
        target_node: usize,
    },
    /// An edge weight is negative, NaN, or infinite.
    #[error("edge ({source_node}, {target_node}) has invalid weight {weight}")]
    InvalidWeight {
        /// Lower endpoint of the edge.
        source_node: usize,
        /// Upper endpoint of the edge.
        target_node: usize,
        /// The rejected weight.
        weight: f64,
    },
    /// A node or edge belongs to another subject.
    #[error("graph for `{expected}` received an element of `{found}`")]
    SubjectMismatch {
        /// Subject the graph is being assembled for.
        expected: SubjectId,
        /// Subject carried by the offending element.
        found: SubjectId,
    },
}

define_error_codes! {
    /// Stable codes describing [`GraphError`] variants.
    enum GraphErrorCode for GraphError {
        /// Node indices must follow the input order starting at zero.
        NodeIndexMismatch => NodeIndexMismatch { .. } => "GRAPH_NODE_INDEX_MISMATCH",
        /// An edge endpoint is not one of the graph's nodes.
        UnknownEndpoint => UnknownEndpoint { .. } => "GRAPH_UNKNOWN_ENDPOINT",
        /// An edge connects a node to itself.
        SelfLoop => SelfLoop { .. } => "GRAPH_SELF_LOOP",
        /// Two edges share the same unordered endpoint pair.
        DuplicateEdge => DuplicateEdge { .. } => "GRAPH_DUPLICATE_EDGE",
        /// An edge weight is negative, NaN, or infinite.
        InvalidWeight => InvalidWeight { .. } => "GRAPH_INVALID_WEIGHT",
        /// A node or edge belongs to another subject.
        SubjectMismatch => SubjectMismatch { .. } => "GRAPH_SUBJECT_MISMATCH",
    }
}

/// Failure that aborts the processing of one subject.
///
/// The benchmark keeps running when a subject fails; the failure is counted
/// under every key the subject would have produced.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum SubjectError {
    /// The recording could not be turned into nodes.
    #[error("malformed recording: {error}")]
    MalformedRecording {
        /// Underlying extraction failure.
        #[from]
        error: RecordingError,
    },
    /// A channel was too short for the connectivity measure.
    #[error("insufficient data: {error}")]
    InsufficientData {
        /// Underlying connectivity failure.
        #[from]
        error: ConnectivityError,
    },
    /// Node and edge records failed graph validation.
    #[error("invalid graph: {error}")]
    InvalidGraph {
        /// Underlying validation failure.
        #[from]
        error: GraphError,
    },
}

define_error_codes! {
    /// Stable codes describing [`SubjectError`] variants.
    enum SubjectErrorCode for SubjectError {
        /// The recording could not be turned into nodes.
        MalformedRecording => MalformedRecording { .. } => "SUBJECT_MALFORMED_RECORDING",
        /// A channel was too short for the connectivity measure.
        InsufficientData => InsufficientData { .. } => "SUBJECT_INSUFFICIENT_DATA",
        /// Node and edge records failed graph validation.
        InvalidGraph => InvalidGraph { .. } => "SUBJECT_INVALID_GRAPH",
    }
}

impl SubjectError {
    /// Retrieve the code of the stage error wrapped by this failure.
    pub const fn detail_code(&self) -> &'static str {
        match self {
            Self::MalformedRecording { error } => error.code().as_str(),
            Self::InsufficientData { error } => error.code().as_str(),
            Self::InvalidGraph { error } => error.code().as_str(),
        }
    }
}

/// A detection run hit its iteration cap before converging.
///
/// The error is recoverable: it carries the best partition found so far,
/// marked as partial.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("{algorithm} did not converge within {cap} passes; partial partition retained")]
pub struct PartitionNotConverged {
    algorithm: &'static str,
    cap: NonZeroUsize,
    partial: Box<Partition>,
}

impl PartitionNotConverged {
    pub(crate) fn new(cap: NonZeroUsize, partial: Partition) -> Self {
        Self {
            algorithm: partial.algorithm().as_str(),
            cap,
            partial: Box::new(partial),
        }
    }

    /// Stable machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        "PARTITION_NOT_CONVERGED"
    }

    /// Iteration cap that was exhausted.
    #[must_use]
    pub const fn cap(&self) -> NonZeroUsize {
        self.cap
    }

    /// Best partition found before the cap was reached.
    #[must_use]
    pub fn partial(&self) -> &Partition {
        &self.partial
    }

    /// Consume the error and return the partial partition.
    #[must_use]
    pub fn into_partial(self) -> Partition {
        *self.partial
    }
}

/// Error raised when an [`crate::EegraphBuilder`] holds an invalid configuration.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConfigError {
    /// Resolution must be finite and strictly positive.
    #[error("resolution must be finite and positive (got {got})")]
    InvalidResolution {
        /// The rejected resolution.
        got: f64,
    },
    /// The iteration cap must allow at least one pass.
    #[error("iteration cap must be at least 1 (got {got})")]
    InvalidIterationCap {
        /// The rejected cap.
        got: usize,
    },
    /// The repetition count must be at least one.
    #[error("repetitions must be at least 1 (got {got})")]
    InvalidRepetitions {
        /// The rejected repetition count.
        got: usize,
    },
    /// A threshold or scale parameter is not a finite, non-negative number.
    #[error("{name} must be finite and non-negative (got {got})")]
    InvalidThreshold {
        /// Name of the parameter.
        name: &'static str,
        /// The rejected value.
        got: f64,
    },
    /// Top-k inclusion requires `k >= 1`.
    #[error("top-k inclusion requires k >= 1")]
    InvalidTopK,
    /// At least one algorithm must be selected.
    #[error("at least one community-detection algorithm must be selected")]
    NoAlgorithms,
    /// A frequency band has invalid edges.
    #[error("band `{name}` must satisfy 0 <= low < high (got {low}..{high})")]
    InvalidBand {
        /// Band name.
        name: String,
        /// Lower edge in hertz.
        low: f64,
        /// Upper edge in hertz.
        high: f64,
    },
    /// A band required by the connectivity measure is not configured.
    #[error("connectivity measure `{measure}` requires the `{band}` band")]
    MissingBand {
        /// Identifier of the measure.
        measure: &'static str,
        /// Name of the missing band.
        band: &'static str,
    },
}

define_error_codes! {
    /// Stable codes describing [`ConfigError`] variants.
    enum ConfigErrorCode for ConfigError {
        /// Resolution must be finite and strictly positive.
        InvalidResolution => InvalidResolution { .. } => "CONFIG_INVALID_RESOLUTION",
        /// The iteration cap must allow at least one pass.
        InvalidIterationCap => InvalidIterationCap { .. } => "CONFIG_INVALID_ITERATION_CAP",
        /// The repetition count must be at least one.
        InvalidRepetitions => InvalidRepetitions { .. } => "CONFIG_INVALID_REPETITIONS",
        /// A threshold or scale parameter is invalid.
        InvalidThreshold => InvalidThreshold { .. } => "CONFIG_INVALID_THRESHOLD",
        /// Top-k inclusion requires `k >= 1`.
        InvalidTopK => InvalidTopK => "CONFIG_INVALID_TOP_K",
        /// At least one algorithm must be selected.
        NoAlgorithms => NoAlgorithms => "CONFIG_NO_ALGORITHMS",
        /// A frequency band has invalid edges.
        InvalidBand => InvalidBand { .. } => "CONFIG_INVALID_BAND",
        /// A band required by the connectivity measure is not configured.
        MissingBand => MissingBand { .. } => "CONFIG_MISSING_BAND",
    }
}

/// Convenient alias for results returned by the core API.
pub type Result<T, E = SubjectError> = core::result::Result<T, E>;
