//! Benchmark parameter types.
//!
//! Criterion renders these as benchmark identifiers.

use std::fmt;

use eegraph_core::Algorithm;

/// Size of a synthetic recording.
#[derive(Clone, Debug)]
pub struct RecordingBenchParams {
    /// Number of channels (graph order).
    pub channel_count: usize,
    /// Samples per channel.
    pub samples: usize,
}

impl fmt::Display for RecordingBenchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "channels={},samples={}", self.channel_count, self.samples)
    }
}

/// Parameters for a community-detection benchmark run.
#[derive(Clone, Debug)]
pub struct DetectionBenchParams {
    /// Number of channels (graph order).
    pub channel_count: usize,
    /// Algorithm under test.
    pub algorithm: Algorithm,
    /// Whether flag mode filters the graph first.
    pub flagged: bool,
}

impl fmt::Display for DetectionBenchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},channels={},flag={}",
            self.algorithm, self.channel_count, self.flagged
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_name_every_parameter() {
        let params = DetectionBenchParams {
            channel_count: 32,
            algorithm: Algorithm::LabelPropagation,
            flagged: true,
        };
        assert_eq!(params.to_string(), "label-propagation,channels=32,flag=true");
        let params = RecordingBenchParams {
            channel_count: 8,
            samples: 1024,
        };
        assert_eq!(params.to_string(), "channels=8,samples=1024");
    }
}
