//! Pairwise connectivity measures.

use crate::{
    error::ConfigError,
    graph::Node,
    signal::{
        BandSet, FrequencyBand, mean,
        welch::{
            MIN_SEGMENT_SAMPLES, SegmentSpectra, Welch, coherence_min_samples, nominal_segment_len,
        },
    },
};

/// Default scale applied to band-power distances.
pub const DEFAULT_BAND_POWER_SCALE: f64 = 100.0;

/// Deterministic weight function applied to every unordered channel pair.
///
/// # Examples
/// ```
/// use eegraph_core::ConnectivityMeasure;
///
/// assert_eq!(ConnectivityMeasure::default().as_str(), "pearson");
/// assert_eq!(ConnectivityMeasure::coherence().as_str(), "coherence");
/// assert_eq!(ConnectivityMeasure::band_power().min_samples(256.0), 8);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
#[non_exhaustive]
pub enum ConnectivityMeasure {
    /// Absolute Pearson correlation of the raw signals.
    #[default]
    Pearson,
    /// Mean magnitude-squared coherence over a frequency band.
    Coherence {
        /// Band whose bins are averaged.
        band: FrequencyBand,
    },
    /// `1 / (1 + scale * d)` with `d` the distance between the channels'
    /// theta and alpha relative powers.
    BandPower {
        /// Multiplier applied to the distance.
        scale: f64,
    },
}

impl ConnectivityMeasure {
    /// Coherence averaged over 0.5–45 Hz.
    #[must_use]
    pub fn coherence() -> Self {
        Self::Coherence {
            band: FrequencyBand::new("coherence", 0.5, 45.0),
        }
    }

    /// Band-power similarity with the default scale.
    #[must_use]
    pub fn band_power() -> Self {
        Self::BandPower {
            scale: DEFAULT_BAND_POWER_SCALE,
        }
    }

    /// Stable identifier of the measure.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pearson => "pearson",
            Self::Coherence { .. } => "coherence",
            Self::BandPower { .. } => "band-power",
        }
    }

    /// Minimum channel length for a meaningful weight.
    #[must_use]
    pub fn min_samples(&self, sampling_rate: f64) -> usize {
        match self {
            Self::Pearson => 3,
            Self::Coherence { .. } => coherence_min_samples(sampling_rate),
            Self::BandPower { .. } => MIN_SEGMENT_SAMPLES,
        }
    }

    /// Checks the measure's parameters against the configured `bands`.
    pub(crate) fn validate(&self, bands: &BandSet) -> Result<(), ConfigError> {
        match self {
            Self::Pearson => Ok(()),
            Self::Coherence { band } => band.validate(),
            Self::BandPower { scale } => {
                if !scale.is_finite() || *scale < 0.0 {
                    return Err(ConfigError::InvalidThreshold {
                        name: "band-power scale",
                        got: *scale,
                    });
                }
                for band in [BandSet::THETA, BandSet::ALPHA] {
                    if bands.get(band).is_none() {
                        return Err(ConfigError::MissingBand {
                            measure: self.as_str(),
                            band,
                        });
                    }
                }
                Ok(())
            }
        }
    }

    pub(crate) fn prepare<'a>(
        &self,
        sampling_rate: f64,
        nodes: &[Node],
        signals: Vec<&'a [f64]>,
    ) -> Prepared<'a> {
        match self {
            Self::Pearson => Prepared::Signals(signals),
            Self::Coherence { band } => {
                let welch = Welch::new(sampling_rate, nominal_segment_len(sampling_rate));
                let in_band = welch.frequencies().map(|f| band.contains(f)).collect();
                let spectra = signals.iter().map(|signal| welch.transform(signal)).collect();
                Prepared::Spectra {
                    welch,
                    spectra,
                    in_band,
                }
            }
            Self::BandPower { scale } => Prepared::Features {
                scale: *scale,
                points: nodes
                    .iter()
                    .map(|node| {
                        let features = node.features();
                        (
                            features.band(BandSet::THETA).unwrap_or(0.0),
                            features.band(BandSet::ALPHA).unwrap_or(0.0),
                        )
                    })
                    .collect(),
            },
        }
    }
}

/// Per-channel state computed once before pairs are evaluated.
pub(crate) enum Prepared<'a> {
    Signals(Vec<&'a [f64]>),
    Spectra {
        welch: Welch,
        spectra: Vec<SegmentSpectra>,
        in_band: Vec<bool>,
    },
    Features {
        scale: f64,
        points: Vec<(f64, f64)>,
    },
}

impl Prepared<'_> {
    /// Weight of the pair `(left, right)`, always finite and within `[0, 1]`.
    pub(crate) fn weight(&self, left: usize, right: usize) -> f64 {
        let weight = match self {
            Self::Signals(signals) => match (signals.get(left), signals.get(right)) {
                (Some(a), Some(b)) => pearson(a, b),
                _ => 0.0,
            },
            Self::Spectra {
                welch,
                spectra,
                in_band,
            } => match (spectra.get(left), spectra.get(right)) {
                (Some(a), Some(b)) => band_mean(&welch.coherence(a, b), in_band),
                _ => 0.0,
            },
            Self::Features { scale, points } => match (points.get(left), points.get(right)) {
                (Some(a), Some(b)) => band_power_similarity(*a, *b, *scale),
                _ => 0.0,
            },
        };
        if weight.is_finite() {
            weight.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// Absolute Pearson correlation; zero when either signal is constant.
pub(crate) fn pearson(left: &[f64], right: &[f64]) -> f64 {
    let len = left.len().min(right.len());
    let (left, right) = (&left[..len], &right[..len]);
    let (mean_left, mean_right) = (mean(left), mean(right));
    let mut covariance = 0.0;
    let mut var_left = 0.0;
    let mut var_right = 0.0;
    for (a, b) in left.iter().zip(right) {
        let (da, db) = (a - mean_left, b - mean_right);
        covariance += da * db;
        var_left += da * da;
        var_right += db * db;
    }
    let denom = (var_left * var_right).sqrt();
    if denom > 0.0 {
        (covariance / denom).abs()
    } else {
        0.0
    }
}

fn band_mean(coherence: &[f64], in_band: &[bool]) -> f64 {
    let (sum, count) = coherence
        .iter()
        .zip(in_band)
        .filter(|(_, inside)| **inside)
        .fold((0.0, 0_usize), |(sum, count), (value, _)| (sum + value, count + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

pub(crate) fn band_power_similarity(left: (f64, f64), right: (f64, f64), scale: f64) -> f64 {
    let distance = (left.0 - right.0).hypot(left.1 - right.1);
    1.0 / (1.0 + scale * distance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use eegraph_test_support::ci::property_suite::suite_config;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case::identical(vec![1.0, 2.0, 3.0, 4.0], vec![1.0, 2.0, 3.0, 4.0], 1.0)]
    #[case::inverted(vec![1.0, 2.0, 3.0, 4.0], vec![4.0, 3.0, 2.0, 1.0], 1.0)]
    #[case::constant(vec![1.0, 2.0, 3.0, 4.0], vec![5.0, 5.0, 5.0, 5.0], 0.0)]
    #[case::orthogonal(vec![1.0, -1.0, 1.0, -1.0], vec![1.0, 1.0, -1.0, -1.0], 0.0)]
    fn pearson_matches_known_values(
        #[case] left: Vec<f64>,
        #[case] right: Vec<f64>,
        #[case] expected: f64,
    ) {
        assert!((pearson(&left, &right) - expected).abs() < 1e-12);
    }

    #[test]
    fn band_power_similarity_follows_the_inverse_distance() {
        assert_eq!(band_power_similarity((0.2, 0.4), (0.2, 0.4), 100.0), 1.0);
        let weight = band_power_similarity((0.0, 0.0), (0.03, 0.04), 100.0);
        assert!((weight - 1.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn band_power_requires_theta_and_alpha() {
        let bands = BandSet::new(vec![FrequencyBand::new("theta", 4.0, 8.0)]);

        let err = ConnectivityMeasure::band_power()
            .validate(&bands)
            .expect_err("alpha is missing");

        assert_eq!(
            err,
            ConfigError::MissingBand {
                measure: "band-power",
                band: "alpha",
            }
        );
        assert!(ConnectivityMeasure::band_power().validate(&BandSet::default()).is_ok());
    }

    #[test]
    fn coherence_band_is_validated() {
        let measure = ConnectivityMeasure::Coherence {
            band: FrequencyBand::new("narrow", 10.0, 5.0),
        };
        assert_eq!(
            measure.validate(&BandSet::default()).map_err(|err| err.code().as_str()),
            Err("CONFIG_INVALID_BAND")
        );
    }

    #[test]
    fn band_mean_ignores_bins_outside_the_band() {
        let mean = band_mean(&[1.0, 0.5, 0.0], &[false, true, true]);
        assert!((mean - 0.25).abs() < 1e-12);
        assert_eq!(band_mean(&[1.0], &[false]), 0.0);
    }

    proptest! {
        #![proptest_config(suite_config(128))]

        #[test]
        fn pearson_is_symmetric_and_bounded(
            pair in (3_usize..64).prop_flat_map(|len| (
                prop::collection::vec(-1.0e3_f64..1.0e3, len),
                prop::collection::vec(-1.0e3_f64..1.0e3, len),
            )),
        ) {
            let (left, right) = pair;
            let forward = pearson(&left, &right);
            let backward = pearson(&right, &left);
            prop_assert_eq!(forward.to_bits(), backward.to_bits());
            prop_assert!((0.0..=1.0 + 1e-12).contains(&forward));
        }

        #[test]
        fn band_power_similarity_is_symmetric(
            a in (0.0_f64..1.0, 0.0_f64..1.0),
            b in (0.0_f64..1.0, 0.0_f64..1.0),
            scale in 0.0_f64..500.0,
        ) {
            let forward = band_power_similarity(a, b, scale);
            let backward = band_power_similarity(b, a, scale);
            prop_assert_eq!(forward.to_bits(), backward.to_bits());
            prop_assert!(forward > 0.0 && forward <= 1.0);
        }
    }
}
