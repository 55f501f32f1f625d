//! Recording abstractions consumed by the eegraph pipeline.

use std::fmt;

use serde::Serialize;

/// Identifier of the subject a recording, node, or edge belongs to.
///
/// # Examples
/// ```
/// use eegraph_core::SubjectId;
///
/// let id = SubjectId::new("sub-01");
/// assert_eq!(id.as_str(), "sub-01");
/// assert_eq!(id.to_string(), "sub-01");
/// ```
#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct SubjectId(String);

impl SubjectId {
    /// Creates an identifier from any string-like value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SubjectId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SubjectId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Multichannel time series for one subject at a fixed sampling rate.
///
/// Channels are addressed by their position; that position becomes the
/// stable node index. Implementations do not need to validate their data:
/// [`crate::DescriptorExtractor`] rejects malformed recordings.
///
/// # Examples
/// ```
/// use eegraph_core::{Recording, SubjectId};
///
/// struct Flat {
///     subject: SubjectId,
///     samples: Vec<f64>,
/// }
///
/// impl Recording for Flat {
///     fn subject_id(&self) -> &SubjectId { &self.subject }
///     fn sampling_rate(&self) -> f64 { 128.0 }
///     fn channel_count(&self) -> usize { 1 }
///     fn channel_label(&self, channel: usize) -> Option<&str> {
///         (channel == 0).then_some("Cz")
///     }
///     fn samples(&self, channel: usize) -> Option<&[f64]> {
///         (channel == 0).then_some(self.samples.as_slice())
///     }
/// }
///
/// let rec = Flat { subject: SubjectId::new("s1"), samples: vec![0.0; 4] };
/// assert_eq!(rec.channel_count(), 1);
/// assert_eq!(rec.channel_label(0), Some("Cz"));
/// assert!(rec.samples(1).is_none());
/// ```
pub trait Recording {
    /// Subject this recording belongs to.
    fn subject_id(&self) -> &SubjectId;

    /// Sampling rate in hertz.
    fn sampling_rate(&self) -> f64;

    /// Number of channels, including empty ones.
    fn channel_count(&self) -> usize;

    /// Label of the channel at `channel`.
    fn channel_label(&self, channel: usize) -> Option<&str>;

    /// Samples of the channel at `channel`.
    fn samples(&self, channel: usize) -> Option<&[f64]>;

    /// Returns whether the recording has no channels.
    #[must_use]
    fn is_empty(&self) -> bool {
        self.channel_count() == 0
    }
}

impl<R: Recording + ?Sized> Recording for &R {
    fn subject_id(&self) -> &SubjectId {
        (**self).subject_id()
    }

    fn sampling_rate(&self) -> f64 {
        (**self).sampling_rate()
    }

    fn channel_count(&self) -> usize {
        (**self).channel_count()
    }

    fn channel_label(&self, channel: usize) -> Option<&str> {
        (**self).channel_label(channel)
    }

    fn samples(&self, channel: usize) -> Option<&[f64]> {
        (**self).samples(channel)
    }
}

/// A labelled channel held by [`InMemoryRecording`].
#[derive(Clone, Debug, PartialEq)]
pub struct Channel {
    label: String,
    samples: Vec<f64>,
}

impl Channel {
    /// Creates a channel from a label and its samples.
    #[must_use]
    pub fn new(label: impl Into<String>, samples: Vec<f64>) -> Self {
        Self {
            label: label.into(),
            samples,
        }
    }

    /// Channel label.
    #[must_use]
    #[rustfmt::skip]
    pub fn label(&self) -> &str { &self.label }

    /// Channel samples.
    #[must_use]
    #[rustfmt::skip]
    pub fn samples(&self) -> &[f64] { &self.samples }
}

/// Owned [`Recording`] used by providers and tests.
///
/// # Examples
/// ```
/// use eegraph_core::{Channel, InMemoryRecording, Recording};
///
/// let rec = InMemoryRecording::new(
///     "s1",
///     256.0,
///     vec![Channel::new("Fz", vec![1.0, 2.0]), Channel::new("Pz", vec![3.0, 4.0])],
/// );
/// assert_eq!(rec.channel_count(), 2);
/// assert_eq!(rec.samples(1), Some(&[3.0, 4.0][..]));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct InMemoryRecording {
    subject: SubjectId,
    sampling_rate: f64,
    channels: Vec<Channel>,
}

impl InMemoryRecording {
    /// Creates a recording from its subject, sampling rate, and channels.
    #[must_use]
    pub fn new(subject: impl Into<SubjectId>, sampling_rate: f64, channels: Vec<Channel>) -> Self {
        Self {
            subject: subject.into(),
            sampling_rate,
            channels,
        }
    }

    /// Returns the stored channels in order.
    #[must_use]
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }
}

impl Recording for InMemoryRecording {
    fn subject_id(&self) -> &SubjectId {
        &self.subject
    }

    fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    fn channel_count(&self) -> usize {
        self.channels.len()
    }

    fn channel_label(&self, channel: usize) -> Option<&str> {
        self.channels.get(channel).map(Channel::label)
    }

    fn samples(&self, channel: usize) -> Option<&[f64]> {
        self.channels.get(channel).map(Channel::samples)
    }
}
