//! Error types for synthetic recording generation.

/// Errors that may occur while generating planted recordings.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SyntheticError {
    /// No channel groups were requested.
    #[error("at least one channel group is required")]
    ZeroGroups,
    /// A channel group had no channels.
    #[error("channel group {index} is empty")]
    EmptyGroup {
        /// Zero-based group index.
        index: usize,
    },
    /// The requested sample count was zero.
    #[error("sample count must be greater than zero")]
    ZeroSamples,
    /// A floating-point generator parameter was invalid.
    #[error("invalid floating-point parameter `{parameter}`")]
    InvalidFloatParameter {
        /// Name of the invalid parameter.
        parameter: &'static str,
    },
    /// A group tone would sit at or above the Nyquist frequency.
    #[error("group {index} tone of {frequency} Hz is not below Nyquist ({nyquist} Hz)")]
    ToneAboveNyquist {
        /// Zero-based group index.
        index: usize,
        /// Tone frequency in hertz.
        frequency: f64,
        /// Half the sampling rate.
        nyquist: f64,
    },
}
