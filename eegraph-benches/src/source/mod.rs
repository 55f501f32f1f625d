//! Synthetic EEG recordings for benchmarking.
//!
//! Channels are split into planted groups that share a dominant tone, so a
//! correct community detector should recover the groups exactly.

mod errors;
mod planted;

pub use errors::SyntheticError;
pub use planted::{PlantedConfig, PlantedRecording};

#[cfg(test)]
mod tests;
