//! Planted-group recording generator.

use std::f64::consts::TAU;

use eegraph_core::{Channel, InMemoryRecording, SubjectId};
use rand::{Rng, SeedableRng, rngs::SmallRng};

use super::SyntheticError;

/// Frequency of the first group's tone in hertz.
const BASE_TONE_HZ: f64 = 4.0;

/// Spacing between consecutive group tones in hertz.
const TONE_SPACING_HZ: f64 = 3.0;

/// Largest phase offset of a channel relative to its group tone, in radians.
const MAX_PHASE_JITTER: f64 = 0.3;

/// Configuration of a planted recording.
#[derive(Clone, Debug)]
pub struct PlantedConfig {
    /// Channels per group; group `g` shares a tone at `4 + 3g` Hz.
    pub group_sizes: Vec<usize>,
    /// Sampling rate in hertz.
    pub sampling_rate: f64,
    /// Samples per channel.
    pub samples: usize,
    /// Amplitude of the uniform noise added to every sample.
    pub noise: f64,
    /// RNG seed for reproducibility.
    pub seed: u64,
}

impl Default for PlantedConfig {
    fn default() -> Self {
        Self {
            group_sizes: vec![4, 4],
            sampling_rate: 128.0,
            samples: 512,
            noise: 0.1,
            seed: 42,
        }
    }
}

/// A synthetic recording with its ground-truth channel groups.
#[derive(Clone, Debug)]
pub struct PlantedRecording {
    recording: InMemoryRecording,
    labels: Vec<usize>,
}

impl PlantedRecording {
    /// Generates a recording whose channel `i` belongs to the group
    /// `labels()[i]`. Channels are laid out group by group.
    ///
    /// # Errors
    /// Returns [`SyntheticError`] when no groups or samples are requested, a
    /// group is empty, the sampling rate or noise is invalid, or a group
    /// tone does not fit below the Nyquist frequency.
    ///
    /// # Examples
    /// ```
    /// use eegraph_benches::source::{PlantedConfig, PlantedRecording};
    /// use eegraph_core::Recording;
    ///
    /// let planted = PlantedRecording::generate("s1", &PlantedConfig::default())
    ///     .expect("default configuration is valid");
    /// assert_eq!(planted.recording().channel_count(), 8);
    /// assert_eq!(planted.labels(), [0, 0, 0, 0, 1, 1, 1, 1]);
    /// ```
    pub fn generate(
        subject: impl Into<SubjectId>,
        config: &PlantedConfig,
    ) -> Result<Self, SyntheticError> {
        validate(config)?;
        let mut rng = SmallRng::seed_from_u64(config.seed);
        let mut channels = Vec::new();
        let mut labels = Vec::new();
        for (group, &size) in config.group_sizes.iter().enumerate() {
            let frequency = group_tone(group);
            for _ in 0..size {
                let phase = rng.gen_range(0.0..MAX_PHASE_JITTER);
                let samples = tone(config, frequency, phase, &mut rng);
                channels.push(Channel::new(format!("G{group}C{}", channels.len()), samples));
                labels.push(group);
            }
        }
        Ok(Self {
            recording: InMemoryRecording::new(subject, config.sampling_rate, channels),
            labels,
        })
    }

    /// Generated recording.
    #[must_use]
    #[rustfmt::skip]
    pub fn recording(&self) -> &InMemoryRecording { &self.recording }

    /// Planted group of every channel.
    #[must_use]
    #[rustfmt::skip]
    pub fn labels(&self) -> &[usize] { &self.labels }

    /// Splits into the recording and its labels.
    #[must_use]
    pub fn into_parts(self) -> (InMemoryRecording, Vec<usize>) {
        (self.recording, self.labels)
    }
}

fn validate(config: &PlantedConfig) -> Result<(), SyntheticError> {
    if config.group_sizes.is_empty() {
        return Err(SyntheticError::ZeroGroups);
    }
    if let Some(index) = config.group_sizes.iter().position(|&size| size == 0) {
        return Err(SyntheticError::EmptyGroup { index });
    }
    if config.samples == 0 {
        return Err(SyntheticError::ZeroSamples);
    }
    if !config.sampling_rate.is_finite() || config.sampling_rate <= 0.0 {
        return Err(SyntheticError::InvalidFloatParameter {
            parameter: "sampling_rate",
        });
    }
    if !config.noise.is_finite() || config.noise < 0.0 {
        return Err(SyntheticError::InvalidFloatParameter { parameter: "noise" });
    }
    let nyquist = half(config.sampling_rate);
    let index = config.group_sizes.len().saturating_sub(1);
    let frequency = group_tone(index);
    if frequency >= nyquist {
        return Err(SyntheticError::ToneAboveNyquist {
            index,
            frequency,
            nyquist,
        });
    }
    Ok(())
}

#[expect(clippy::float_arithmetic, reason = "Nyquist frequency is half the rate")]
const fn half(value: f64) -> f64 {
    value / 2.0
}

#[expect(
    clippy::float_arithmetic,
    clippy::cast_precision_loss,
    reason = "group tones are spaced linearly from the base tone"
)]
fn group_tone(group: usize) -> f64 {
    TONE_SPACING_HZ.mul_add(group as f64, BASE_TONE_HZ)
}

#[expect(
    clippy::float_arithmetic,
    clippy::cast_precision_loss,
    reason = "sinusoid synthesis is defined over sample times"
)]
fn tone(config: &PlantedConfig, frequency: f64, phase: f64, rng: &mut SmallRng) -> Vec<f64> {
    (0..config.samples)
        .map(|n| {
            let t = n as f64 / config.sampling_rate;
            let noise = if config.noise > 0.0 {
                rng.gen_range(-config.noise..config.noise)
            } else {
                0.0
            };
            (TAU * frequency).mul_add(t, phase).sin() + noise
        })
        .collect()
}
