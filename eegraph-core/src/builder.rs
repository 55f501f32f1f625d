//! Builder utilities for configuring the eegraph pipeline.
//!
//! Every parameter is validated once in [`EegraphBuilder::build`]; the
//! resulting [`Eegraph`] runtime is immutable.

use std::num::NonZeroUsize;

use crate::{
    community::{
        Algorithm, CommunityDetector, DEFAULT_FLAG_THRESHOLD, DEFAULT_ITERATION_CAP,
        DEFAULT_RESOLUTION,
    },
    connectivity::{ConnectivityEstimator, ConnectivityMeasure, InclusionPolicy},
    eegraph::Eegraph,
    error::ConfigError,
    signal::{BandSet, DescriptorExtractor},
};

/// How [`Eegraph::benchmark`] schedules subjects.
///
/// Both strategies produce identical records; `Sequential` keeps every span
/// on the calling thread.
///
/// # Examples
/// ```
/// use eegraph_core::ExecutionStrategy;
///
/// assert_eq!(ExecutionStrategy::default(), ExecutionStrategy::Parallel);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExecutionStrategy {
    /// Process subjects on the rayon worker pool.
    #[default]
    Parallel,
    /// Process subjects one after another.
    Sequential,
}

/// Configures and constructs [`Eegraph`] instances.
///
/// # Examples
/// ```
/// use eegraph_core::{Algorithm, EegraphBuilder, ExecutionStrategy, InclusionPolicy};
///
/// let eegraph = EegraphBuilder::new()
///     .with_inclusion(InclusionPolicy::TopK(3))
///     .with_algorithms([Algorithm::Louvain, Algorithm::LabelPropagation])
///     .with_flag_threshold(Some(0.6))
///     .with_execution_strategy(ExecutionStrategy::Sequential)
///     .build()
///     .expect("configuration is valid");
/// assert_eq!(eegraph.flag_states(), [false, true]);
/// assert_eq!(eegraph.algorithms().len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct EegraphBuilder {
    bands: BandSet,
    measure: ConnectivityMeasure,
    inclusion: InclusionPolicy,
    flag_threshold: Option<f64>,
    algorithms: Vec<Algorithm>,
    resolution: f64,
    iteration_cap: usize,
    repetitions: usize,
    execution_strategy: ExecutionStrategy,
}

impl Default for EegraphBuilder {
    fn default() -> Self {
        Self {
            bands: BandSet::default(),
            measure: ConnectivityMeasure::default(),
            inclusion: InclusionPolicy::default(),
            flag_threshold: None,
            algorithms: vec![Algorithm::default()],
            resolution: DEFAULT_RESOLUTION,
            iteration_cap: DEFAULT_ITERATION_CAP,
            repetitions: 1,
            execution_strategy: ExecutionStrategy::default(),
        }
    }
}

impl EegraphBuilder {
    /// Creates a builder populated with default parameters.
    ///
    /// # Examples
    /// ```
    /// use eegraph_core::{EegraphBuilder, ExecutionStrategy};
    ///
    /// let builder = EegraphBuilder::new();
    /// assert_eq!(builder.iteration_cap(), 100);
    /// assert_eq!(builder.flag_threshold(), None);
    /// assert_eq!(builder.execution_strategy(), ExecutionStrategy::Parallel);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the frequency bands summarised per channel.
    #[must_use]
    pub fn with_bands(mut self, bands: BandSet) -> Self {
        self.bands = bands;
        self
    }

    /// Selects the connectivity measure.
    #[must_use]
    pub fn with_measure(mut self, measure: ConnectivityMeasure) -> Self {
        self.measure = measure;
        self
    }

    /// Selects the edge inclusion policy.
    #[must_use]
    pub fn with_inclusion(mut self, inclusion: InclusionPolicy) -> Self {
        self.inclusion = inclusion;
        self
    }

    /// Enables flag mode with the given threshold. With `Some`, every
    /// algorithm runs once unflagged and once flagged; with `None` only the
    /// unflagged run happens.
    #[must_use]
    pub fn with_flag_threshold(mut self, threshold: Option<f64>) -> Self {
        self.flag_threshold = threshold;
        self
    }

    /// Sets the algorithms to run. Duplicates are ignored.
    #[must_use]
    pub fn with_algorithms(mut self, algorithms: impl IntoIterator<Item = Algorithm>) -> Self {
        self.algorithms = algorithms.into_iter().collect();
        self
    }

    /// Sets the modularity resolution `gamma`.
    #[must_use]
    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = resolution;
        self
    }

    /// Caps local-moving passes per level and propagation sweeps.
    #[must_use]
    pub fn with_iteration_cap(mut self, cap: usize) -> Self {
        self.iteration_cap = cap;
        self
    }

    /// Runs every (algorithm, flag) combination this many times per subject.
    #[must_use]
    pub fn with_repetitions(mut self, repetitions: usize) -> Self {
        self.repetitions = repetitions;
        self
    }

    /// Sets how subjects are scheduled.
    #[must_use]
    pub fn with_execution_strategy(mut self, strategy: ExecutionStrategy) -> Self {
        self.execution_strategy = strategy;
        self
    }

    /// Configured iteration cap.
    #[must_use]
    #[rustfmt::skip]
    pub fn iteration_cap(&self) -> usize { self.iteration_cap }

    /// Configured flag threshold.
    #[must_use]
    #[rustfmt::skip]
    pub fn flag_threshold(&self) -> Option<f64> { self.flag_threshold }

    /// Configured execution strategy.
    #[must_use]
    #[rustfmt::skip]
    pub fn execution_strategy(&self) -> ExecutionStrategy { self.execution_strategy }

    /// Validates the configuration and constructs an [`Eegraph`] instance.
    ///
    /// # Errors
    /// Returns [`ConfigError`] when a band is malformed, the measure needs a
    /// band that is not configured, a threshold or scale is negative or not
    /// finite, `top-k` has `k = 0`, no algorithm is selected, or the
    /// resolution, iteration cap, or repetition count is out of range.
    pub fn build(self) -> Result<Eegraph, ConfigError> {
        self.bands.validate()?;
        self.measure.validate(&self.bands)?;
        self.inclusion.validate()?;

        let mut algorithms = Vec::with_capacity(self.algorithms.len());
        for algorithm in self.algorithms {
            if !algorithms.contains(&algorithm) {
                algorithms.push(algorithm);
            }
        }
        if algorithms.is_empty() {
            return Err(ConfigError::NoAlgorithms);
        }

        let detector = CommunityDetector::new(
            self.resolution,
            self.iteration_cap,
            self.flag_threshold.unwrap_or(DEFAULT_FLAG_THRESHOLD),
        )?;
        let repetitions = NonZeroUsize::new(self.repetitions).ok_or(
            ConfigError::InvalidRepetitions {
                got: self.repetitions,
            },
        )?;
        let flag_states = if self.flag_threshold.is_some() {
            vec![false, true]
        } else {
            vec![false]
        };

        Ok(Eegraph::new(
            DescriptorExtractor::new(self.bands),
            ConnectivityEstimator::new(self.measure, self.inclusion),
            detector,
            algorithms,
            flag_states,
            repetitions,
            self.execution_strategy,
        ))
    }
}
