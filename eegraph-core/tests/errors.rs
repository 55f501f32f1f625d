//! Stable error codes exposed by the core crate.

use eegraph_core::{
    ConfigError, ConfigErrorCode, ConnectivityError, GraphError, GraphErrorCode, RecordingError,
    RecordingErrorCode, SubjectError, SubjectErrorCode, SubjectId,
};
use rstest::rstest;

fn subject() -> SubjectId {
    SubjectId::new("s1")
}

#[rstest]
#[case(RecordingError::NoChannels { subject: subject() }, RecordingErrorCode::NoChannels)]
#[case(
    RecordingError::EmptyChannel { subject: subject(), channel: "Fz".into() },
    RecordingErrorCode::EmptyChannel,
)]
#[case(
    RecordingError::LengthMismatch { subject: subject(), channel: "Cz".into(), expected: 4, actual: 3 },
    RecordingErrorCode::LengthMismatch,
)]
#[case(
    RecordingError::InvalidSamplingRate { subject: subject(), rate: 0.0 },
    RecordingErrorCode::InvalidSamplingRate,
)]
#[case(
    RecordingError::NonFiniteSample { subject: subject(), channel: "Pz".into(), index: 2 },
    RecordingErrorCode::NonFiniteSample,
)]
fn recording_errors_expose_codes(
    #[case] error: RecordingError,
    #[case] expected: RecordingErrorCode,
) {
    assert_eq!(error.code(), expected);
    assert!(error.code().as_str().starts_with("RECORDING_"));
}

#[rstest]
#[case(GraphError::SelfLoop { node: 1 }, GraphErrorCode::SelfLoop)]
#[case(
    GraphError::DuplicateEdge { source_node: 0, target_node: 1 },
    GraphErrorCode::DuplicateEdge,
)]
#[case(
    GraphError::UnknownEndpoint { source_node: 0, target_node: 9, order: 3 },
    GraphErrorCode::UnknownEndpoint,
)]
#[case(
    GraphError::InvalidWeight { source_node: 0, target_node: 1, weight: f64::NAN },
    GraphErrorCode::InvalidWeight,
)]
fn graph_errors_expose_codes(#[case] error: GraphError, #[case] expected: GraphErrorCode) {
    assert_eq!(error.code(), expected);
}

#[rstest]
#[case(
    SubjectError::from(RecordingError::NoChannels { subject: subject() }),
    SubjectErrorCode::MalformedRecording,
    "RECORDING_NO_CHANNELS",
)]
#[case(
    SubjectError::from(ConnectivityError::InsufficientData {
        subject: subject(),
        channel: "Fz".into(),
        measure: "pearson",
        samples: 2,
        required: 3,
    }),
    SubjectErrorCode::InsufficientData,
    "CONNECTIVITY_INSUFFICIENT_DATA",
)]
#[case(
    SubjectError::from(GraphError::SelfLoop { node: 0 }),
    SubjectErrorCode::InvalidGraph,
    "GRAPH_SELF_LOOP",
)]
fn subject_errors_wrap_stage_codes(
    #[case] error: SubjectError,
    #[case] expected: SubjectErrorCode,
    #[case] detail: &str,
) {
    assert_eq!(error.code(), expected);
    assert_eq!(error.detail_code(), detail);
}

#[rstest]
#[case(ConfigError::InvalidResolution { got: -1.0 }, ConfigErrorCode::InvalidResolution)]
#[case(ConfigError::InvalidIterationCap { got: 0 }, ConfigErrorCode::InvalidIterationCap)]
#[case(ConfigError::InvalidTopK, ConfigErrorCode::InvalidTopK)]
#[case(ConfigError::NoAlgorithms, ConfigErrorCode::NoAlgorithms)]
fn config_errors_expose_codes(#[case] error: ConfigError, #[case] expected: ConfigErrorCode) {
    assert_eq!(error.code(), expected);
    assert!(error.code().to_string().starts_with("CONFIG_"));
}
