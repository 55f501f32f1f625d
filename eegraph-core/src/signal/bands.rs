//! Frequency bands used to summarise power spectra.

use crate::error::ConfigError;

/// Named frequency interval in hertz, inclusive at both ends.
///
/// # Examples
/// ```
/// use eegraph_core::FrequencyBand;
///
/// let alpha = FrequencyBand::new("alpha", 8.0, 13.0);
/// assert!(alpha.contains(8.0));
/// assert!(alpha.contains(13.0));
/// assert!(!alpha.contains(13.5));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct FrequencyBand {
    name: String,
    low: f64,
    high: f64,
}

impl FrequencyBand {
    /// Creates a band spanning `low..=high` hertz.
    #[must_use]
    pub fn new(name: impl Into<String>, low: f64, high: f64) -> Self {
        Self {
            name: name.into(),
            low,
            high,
        }
    }

    /// Band name.
    #[must_use]
    #[rustfmt::skip]
    pub fn name(&self) -> &str { &self.name }

    /// Lower edge in hertz.
    #[must_use]
    #[rustfmt::skip]
    pub fn low(&self) -> f64 { self.low }

    /// Upper edge in hertz.
    #[must_use]
    #[rustfmt::skip]
    pub fn high(&self) -> f64 { self.high }

    /// Returns whether `frequency` lies within the band.
    #[must_use]
    pub fn contains(&self, frequency: f64) -> bool {
        frequency >= self.low && frequency <= self.high
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        let valid = self.low.is_finite()
            && self.high.is_finite()
            && self.low >= 0.0
            && self.low < self.high;
        if valid {
            Ok(())
        } else {
            Err(ConfigError::InvalidBand {
                name: self.name.clone(),
                low: self.low,
                high: self.high,
            })
        }
    }
}

/// Ordered set of bands plus the range used to normalise band power.
///
/// The default set holds the canonical EEG bands and normalises over
/// 0.5–45 Hz.
///
/// # Examples
/// ```
/// use eegraph_core::BandSet;
///
/// let bands = BandSet::default();
/// let names: Vec<_> = bands.iter().map(|band| band.name()).collect();
/// assert_eq!(names, ["delta", "theta", "alpha", "beta", "gamma"]);
/// assert_eq!(bands.total().low(), 0.5);
/// assert_eq!(bands.total().high(), 45.0);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct BandSet {
    bands: Vec<FrequencyBand>,
    total: FrequencyBand,
}

impl Default for BandSet {
    fn default() -> Self {
        Self::new(vec![
            FrequencyBand::new("delta", 0.5, 4.0),
            FrequencyBand::new("theta", 4.0, 8.0),
            FrequencyBand::new("alpha", 8.0, 13.0),
            FrequencyBand::new("beta", 13.0, 25.0),
            FrequencyBand::new("gamma", 25.0, 45.0),
        ])
    }
}

impl BandSet {
    /// Name of the band used as the theta/alpha ratio numerator.
    pub const THETA: &'static str = "theta";
    /// Name of the band used as the theta/alpha ratio denominator.
    pub const ALPHA: &'static str = "alpha";

    /// Creates a set whose normalisation range spans all supplied bands.
    #[must_use]
    pub fn new(bands: Vec<FrequencyBand>) -> Self {
        let low = bands.iter().map(FrequencyBand::low).fold(f64::INFINITY, f64::min);
        let high = bands
            .iter()
            .map(FrequencyBand::high)
            .fold(f64::NEG_INFINITY, f64::max);
        let total = if bands.is_empty() {
            FrequencyBand::new("total", 0.0, 0.0)
        } else {
            FrequencyBand::new("total", low, high)
        };
        Self { bands, total }
    }

    /// Iterates over the bands in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = &FrequencyBand> {
        self.bands.iter()
    }

    /// Number of configured bands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bands.len()
    }

    /// Returns whether no bands are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    /// Looks up a band by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FrequencyBand> {
        self.bands.iter().find(|band| band.name() == name)
    }

    /// Range whose power normalises every band.
    #[must_use]
    pub fn total(&self) -> &FrequencyBand {
        &self.total
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        self.bands.iter().try_for_each(FrequencyBand::validate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::inverted(FrequencyBand::new("x", 8.0, 4.0))]
    #[case::empty(FrequencyBand::new("x", 4.0, 4.0))]
    #[case::negative(FrequencyBand::new("x", -1.0, 4.0))]
    #[case::infinite(FrequencyBand::new("x", 1.0, f64::INFINITY))]
    fn invalid_bands_are_rejected(#[case] band: FrequencyBand) {
        let err = BandSet::new(vec![band])
            .validate()
            .expect_err("band must be rejected");
        assert!(matches!(err, ConfigError::InvalidBand { .. }));
    }

    #[test]
    fn custom_sets_normalise_over_their_span() {
        let bands = BandSet::new(vec![
            FrequencyBand::new("low", 1.0, 10.0),
            FrequencyBand::new("high", 20.0, 30.0),
        ]);

        assert_eq!(bands.total().low(), 1.0);
        assert_eq!(bands.total().high(), 30.0);
        assert!(bands.get("alpha").is_none());
        assert!(bands.validate().is_ok());
    }
}
