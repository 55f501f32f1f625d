//! Tests for the planted recording generator.

use super::{PlantedConfig, PlantedRecording, SyntheticError};
use eegraph_core::Recording;
use rstest::rstest;

#[rstest]
fn channels_are_laid_out_group_by_group() {
    let config = PlantedConfig {
        group_sizes: vec![2, 3],
        ..PlantedConfig::default()
    };
    let planted = PlantedRecording::generate("s1", &config).expect("valid configuration");

    assert_eq!(planted.labels(), [0, 0, 1, 1, 1]);
    let recording = planted.recording();
    assert_eq!(recording.channel_count(), 5);
    assert_eq!(recording.channel_label(2), Some("G1C2"));
    assert_eq!(recording.samples(4).map(<[f64]>::len), Some(512));
    assert_eq!(recording.sampling_rate(), 128.0);
}

#[rstest]
fn generation_is_deterministic_per_seed() {
    let config = PlantedConfig::default();
    let first = PlantedRecording::generate("s1", &config).expect("valid configuration");
    let second = PlantedRecording::generate("s1", &config).expect("valid configuration");
    let reseeded = PlantedRecording::generate(
        "s1",
        &PlantedConfig {
            seed: 7,
            ..config
        },
    )
    .expect("valid configuration");

    assert_eq!(first.recording(), second.recording());
    assert_ne!(first.recording(), reseeded.recording());
}

#[rstest]
fn noiseless_channels_stay_within_unit_amplitude() {
    let config = PlantedConfig {
        noise: 0.0,
        ..PlantedConfig::default()
    };
    let planted = PlantedRecording::generate("s1", &config).expect("valid configuration");
    let (recording, labels) = planted.into_parts();

    assert_eq!(labels.len(), 8);
    for channel in 0..recording.channel_count() {
        let samples = recording.samples(channel).expect("channel exists");
        assert!(samples.iter().all(|s| s.abs() <= 1.0));
    }
}

#[rstest]
#[case::no_groups(PlantedConfig { group_sizes: vec![], ..PlantedConfig::default() }, SyntheticError::ZeroGroups)]
#[case::empty_group(PlantedConfig { group_sizes: vec![3, 0], ..PlantedConfig::default() }, SyntheticError::EmptyGroup { index: 1 })]
#[case::no_samples(PlantedConfig { samples: 0, ..PlantedConfig::default() }, SyntheticError::ZeroSamples)]
#[case::bad_rate(PlantedConfig { sampling_rate: f64::NAN, ..PlantedConfig::default() }, SyntheticError::InvalidFloatParameter { parameter: "sampling_rate" })]
#[case::bad_noise(PlantedConfig { noise: -1.0, ..PlantedConfig::default() }, SyntheticError::InvalidFloatParameter { parameter: "noise" })]
#[case::nyquist(
    PlantedConfig { sampling_rate: 16.0, group_sizes: vec![1, 1, 1], ..PlantedConfig::default() },
    SyntheticError::ToneAboveNyquist { index: 2, frequency: 10.0, nyquist: 8.0 }
)]
fn invalid_configurations_are_rejected(
    #[case] config: PlantedConfig,
    #[case] expected: SyntheticError,
) {
    let err = PlantedRecording::generate("s1", &config).expect_err("configuration is invalid");
    assert_eq!(err, expected);
}
