//! Planted-rhythm recordings for the pipeline suite.

use std::f64::consts::TAU;

use eegraph_core::{Channel, InMemoryRecording};

pub const SAMPLING_RATE: f64 = 128.0;
pub const SAMPLES: usize = 1024;

pub fn sine(frequency: f64, amplitude: f64, samples: usize) -> Vec<f64> {
    (0..samples)
        .map(|n| amplitude * (TAU * frequency * n as f64 / SAMPLING_RATE).sin())
        .collect()
}

/// Recording whose channels are split into groups sharing a rhythm.
///
/// Group `g` oscillates at `6 + 5g` Hz; each channel adds a faint tone of
/// its own at `30 + c` Hz, so channels correlate strongly within a group
/// and not at all across groups.
pub fn planted(subject: &str, groups: &[usize]) -> InMemoryRecording {
    let mut channels = Vec::new();
    for (group, &size) in groups.iter().enumerate() {
        let base = sine(6.0 + 5.0 * group as f64, 1.0, SAMPLES);
        for _ in 0..size {
            let index = channels.len();
            let own = sine(30.0 + index as f64, 0.2, SAMPLES);
            let samples = base.iter().zip(&own).map(|(a, b)| a + b).collect();
            channels.push(Channel::new(format!("E{index}"), samples));
        }
    }
    InMemoryRecording::new(subject, SAMPLING_RATE, channels)
}

/// Group membership matching [`planted`].
pub fn planted_members(groups: &[usize]) -> Vec<Vec<usize>> {
    let mut next = 0;
    groups
        .iter()
        .map(|&size| {
            let members = (next..next + size).collect();
            next += size;
            members
        })
        .collect()
}
