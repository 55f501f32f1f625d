//! Benchmark setup error type.
//!
//! Aggregates the failures that may arise while preparing benchmark inputs
//! so setup functions can propagate them with `?`.

use eegraph_core::{ConfigError, SubjectError};

use crate::quality::QualityError;
use crate::source::SyntheticError;

/// Errors that may occur during benchmark setup.
#[derive(Debug, thiserror::Error)]
pub enum BenchSetupError {
    /// Synthetic recording generation failed.
    #[error("synthetic recording generation failed: {0}")]
    Synthetic(#[from] SyntheticError),
    /// The pipeline configuration was rejected.
    #[error("pipeline configuration failed: {0}")]
    Config(#[from] ConfigError),
    /// A planted recording could not be turned into a graph.
    #[error("graph construction failed: {0}")]
    Subject(#[from] SubjectError),
    /// Partition scoring failed.
    #[error("quality scoring failed: {0}")]
    Quality(#[from] QualityError),
    /// Writing the quality report failed.
    #[error("failed to write quality report: {0}")]
    QualityReport(#[source] std::io::Error),
}
