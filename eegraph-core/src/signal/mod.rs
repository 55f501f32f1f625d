//! Per-channel signal descriptors.
//!
//! The extractor validates a [`Recording`] and turns each channel into a
//! [`Node`] carrying relative band powers, the theta/alpha ratio, and the
//! signal variance.

mod bands;
pub(crate) mod welch;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, instrument};

pub use self::bands::{BandSet, FrequencyBand};
use self::welch::Welch;
use crate::{error::RecordingError, graph::Node, recording::Recording};

/// Relative power of one frequency band.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BandPower {
    band: String,
    relative_power: f64,
}

impl BandPower {
    /// Creates a band power entry.
    #[must_use]
    pub fn new(band: impl Into<String>, relative_power: f64) -> Self {
        Self {
            band: band.into(),
            relative_power,
        }
    }

    /// Band name.
    #[must_use]
    #[rustfmt::skip]
    pub fn band(&self) -> &str { &self.band }

    /// Fraction of the normalisation range's power that falls in the band.
    #[must_use]
    #[rustfmt::skip]
    pub fn relative_power(&self) -> f64 { self.relative_power }
}

/// Features derived from one channel.
///
/// # Examples
/// ```
/// use eegraph_core::{BandPower, NodeFeatures};
///
/// let features = NodeFeatures::new(
///     vec![BandPower::new("theta", 0.2), BandPower::new("alpha", 0.4)],
///     Some(0.5),
///     1.5,
/// );
/// assert_eq!(features.band("alpha"), Some(0.4));
/// assert_eq!(features.band("beta"), None);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct NodeFeatures {
    band_powers: Vec<BandPower>,
    theta_alpha_ratio: Option<f64>,
    variance: f64,
}

impl NodeFeatures {
    /// Creates a feature record.
    #[must_use]
    pub fn new(band_powers: Vec<BandPower>, theta_alpha_ratio: Option<f64>, variance: f64) -> Self {
        Self {
            band_powers,
            theta_alpha_ratio,
            variance,
        }
    }

    /// Relative band powers in configuration order.
    #[must_use]
    pub fn band_powers(&self) -> &[BandPower] {
        &self.band_powers
    }

    /// Relative power of the named band.
    #[must_use]
    pub fn band(&self, name: &str) -> Option<f64> {
        self.band_powers
            .iter()
            .find(|power| power.band == name)
            .map(BandPower::relative_power)
    }

    /// Theta over alpha relative power; absent when either band is not
    /// configured or alpha carries no power.
    #[must_use]
    pub fn theta_alpha_ratio(&self) -> Option<f64> {
        self.theta_alpha_ratio
    }

    /// Population variance of the raw samples.
    #[must_use]
    pub fn variance(&self) -> f64 {
        self.variance
    }
}

/// Turns recordings into node records.
///
/// # Examples
/// ```
/// use eegraph_core::{BandSet, Channel, DescriptorExtractor, InMemoryRecording};
///
/// let samples: Vec<f64> = (0..512).map(|n| (n as f64 * 0.7).sin()).collect();
/// let rec = InMemoryRecording::new(
///     "s1",
///     128.0,
///     vec![Channel::new("Fz", samples.clone()), Channel::new("Cz", samples)],
/// );
/// let nodes = DescriptorExtractor::new(BandSet::default())
///     .extract(&rec)
///     .expect("recording is well formed");
/// assert_eq!(nodes.len(), 2);
/// assert_eq!(nodes[1].channel(), "Cz");
/// assert_eq!(nodes[1].index(), 1);
/// ```
#[derive(Clone, Debug, Default)]
pub struct DescriptorExtractor {
    bands: BandSet,
}

impl DescriptorExtractor {
    /// Creates an extractor for the supplied bands.
    #[must_use]
    pub fn new(bands: BandSet) -> Self {
        Self { bands }
    }

    /// Bands summarised for every channel.
    #[must_use]
    pub fn bands(&self) -> &BandSet {
        &self.bands
    }

    /// Produces one node per channel in input order.
    ///
    /// # Errors
    /// Returns [`RecordingError`] when the recording has no channels, an
    /// empty channel, channels of different lengths, a non-finite sample, or
    /// an invalid sampling rate. No nodes are produced in that case.
    #[instrument(
        name = "core.extract_nodes",
        err,
        skip(self, recording),
        fields(subject = %recording.subject_id(), channels = recording.channel_count()),
    )]
    pub fn extract<R: Recording + ?Sized + Sync>(
        &self,
        recording: &R,
    ) -> Result<Vec<Node>, RecordingError> {
        let length = validate(recording)?;
        let welch = Welch::for_signal(recording.sampling_rate(), length);
        let subject = recording.subject_id();
        let nodes: Vec<Node> = (0..recording.channel_count())
            .into_par_iter()
            .map(|index| {
                let samples = recording.samples(index).unwrap_or_default();
                Node::new(
                    subject.clone(),
                    index,
                    channel_label(recording, index),
                    self.describe(&welch, samples),
                )
            })
            .collect();
        debug!(nodes = nodes.len(), segment = welch.segment_len(), "descriptors extracted");
        Ok(nodes)
    }

    fn describe(&self, welch: &Welch, samples: &[f64]) -> NodeFeatures {
        let density = welch.power_density(&welch.transform(samples));
        let power_in = |band: &FrequencyBand| -> f64 {
            welch
                .frequencies()
                .zip(&density)
                .filter(|(frequency, _)| band.contains(*frequency))
                .map(|(_, power)| power)
                .sum()
        };
        let total = power_in(self.bands.total());
        let band_powers: Vec<BandPower> = self
            .bands
            .iter()
            .map(|band| {
                let relative = if total > 0.0 { power_in(band) / total } else { 0.0 };
                BandPower::new(band.name(), relative)
            })
            .collect();
        let mut features = NodeFeatures::new(band_powers, None, variance(samples));
        features.theta_alpha_ratio = match (
            features.band(BandSet::THETA),
            features.band(BandSet::ALPHA),
        ) {
            (Some(theta), Some(alpha)) if alpha > 0.0 => Some(theta / alpha),
            _ => None,
        };
        features
    }
}

/// Validates the recording and returns the shared channel length.
fn validate<R: Recording + ?Sized>(recording: &R) -> Result<usize, RecordingError> {
    let subject = recording.subject_id();
    let rate = recording.sampling_rate();
    if !rate.is_finite() || rate <= 0.0 {
        return Err(RecordingError::InvalidSamplingRate {
            subject: subject.clone(),
            rate,
        });
    }
    if recording.is_empty() {
        return Err(RecordingError::NoChannels {
            subject: subject.clone(),
        });
    }

    let mut expected = None;
    for index in 0..recording.channel_count() {
        let samples = recording.samples(index).unwrap_or_default();
        if samples.is_empty() {
            return Err(RecordingError::EmptyChannel {
                subject: subject.clone(),
                channel: channel_label(recording, index),
            });
        }
        let reference = *expected.get_or_insert(samples.len());
        if samples.len() != reference {
            return Err(RecordingError::LengthMismatch {
                subject: subject.clone(),
                channel: channel_label(recording, index),
                expected: reference,
                actual: samples.len(),
            });
        }
        if let Some(position) = samples.iter().position(|sample| !sample.is_finite()) {
            return Err(RecordingError::NonFiniteSample {
                subject: subject.clone(),
                channel: channel_label(recording, index),
                index: position,
            });
        }
    }
    Ok(expected.unwrap_or_default())
}

fn channel_label<R: Recording + ?Sized>(recording: &R, index: usize) -> String {
    recording
        .channel_label(index)
        .map_or_else(|| format!("ch{index}"), str::to_owned)
}

pub(crate) fn mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f64>() / samples.len() as f64
}

fn variance(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let mean = mean(samples);
    samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / samples.len() as f64
}
