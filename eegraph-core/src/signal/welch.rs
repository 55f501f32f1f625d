//! Welch spectral estimation over Hann-windowed, half-overlapping segments.

use std::sync::Arc;

use rustfft::{Fft, FftPlanner, num_complex::Complex};

/// Smallest segment the estimator accepts for connectivity measures.
pub(crate) const MIN_SEGMENT_SAMPLES: usize = 8;

/// Segment length covering two seconds of signal, never below
/// [`MIN_SEGMENT_SAMPLES`].
pub(crate) fn nominal_segment_len(sampling_rate: f64) -> usize {
    let two_seconds = (2.0 * sampling_rate).round();
    if two_seconds.is_finite() && two_seconds > 0.0 {
        // Saturating cast; rates are validated before reaching here.
        (two_seconds as usize).max(MIN_SEGMENT_SAMPLES)
    } else {
        MIN_SEGMENT_SAMPLES
    }
}

/// Segments coherence averages over; with a single segment the estimate is
/// identically one.
pub(crate) const MIN_COHERENCE_SEGMENTS: usize = 4;

/// Samples spanning [`MIN_COHERENCE_SEGMENTS`] half-overlapping nominal
/// segments.
pub(crate) fn coherence_min_samples(sampling_rate: f64) -> usize {
    let segment = nominal_segment_len(sampling_rate);
    let step = (segment - segment / 2).max(1);
    step.saturating_mul(MIN_COHERENCE_SEGMENTS - 1).saturating_add(segment)
}

/// One-sided spectra of every segment of a signal.
pub(crate) type SegmentSpectra = Vec<Vec<Complex<f64>>>;

/// Planned Welch estimator for a fixed segment length.
#[derive(Clone)]
pub(crate) struct Welch {
    sampling_rate: f64,
    segment_len: usize,
    step: usize,
    window: Vec<f64>,
    window_power: f64,
    fft: Arc<dyn Fft<f64>>,
}

impl Welch {
    /// Plans an estimator using `segment_len` samples per segment and 50 %
    /// overlap.
    pub(crate) fn new(sampling_rate: f64, segment_len: usize) -> Self {
        let segment_len = segment_len.max(1);
        let step = (segment_len - segment_len / 2).max(1);
        let window = hann(segment_len);
        let window_power = window.iter().map(|w| w * w).sum();
        let fft = FftPlanner::new().plan_fft_forward(segment_len);
        Self {
            sampling_rate,
            segment_len,
            step,
            window,
            window_power,
            fft,
        }
    }

    /// Plans an estimator for descriptors, clamping the nominal segment to
    /// the signal length.
    pub(crate) fn for_signal(sampling_rate: f64, samples: usize) -> Self {
        Self::new(
            sampling_rate,
            nominal_segment_len(sampling_rate).min(samples),
        )
    }

    #[rustfmt::skip]
    pub(crate) fn segment_len(&self) -> usize { self.segment_len }

    /// Number of one-sided frequency bins.
    pub(crate) fn bins(&self) -> usize {
        self.segment_len / 2 + 1
    }

    /// Centre frequency of every one-sided bin.
    pub(crate) fn frequencies(&self) -> impl Iterator<Item = f64> {
        let resolution = self.sampling_rate / self.segment_len as f64;
        (0..self.bins()).map(move |bin| bin as f64 * resolution)
    }

    /// Detrended, windowed one-sided spectra of every full segment.
    pub(crate) fn transform(&self, signal: &[f64]) -> SegmentSpectra {
        signal
            .windows(self.segment_len)
            .step_by(self.step)
            .map(|segment| self.segment_spectrum(segment))
            .collect()
    }

    fn segment_spectrum(&self, segment: &[f64]) -> Vec<Complex<f64>> {
        let mean = segment.iter().sum::<f64>() / segment.len() as f64;
        let mut buffer: Vec<Complex<f64>> = segment
            .iter()
            .zip(&self.window)
            .map(|(sample, weight)| Complex::new((sample - mean) * weight, 0.0))
            .collect();
        self.fft.process(&mut buffer);
        buffer.truncate(self.bins());
        buffer
    }

    /// Power spectral density averaged across segments.
    pub(crate) fn power_density(&self, spectra: &SegmentSpectra) -> Vec<f64> {
        let mut density = vec![0.0; self.bins()];
        if spectra.is_empty() {
            return density;
        }
        for segment in spectra {
            for (acc, value) in density.iter_mut().zip(segment) {
                *acc += value.norm_sqr();
            }
        }
        let norm = spectra.len() as f64 * self.sampling_rate * self.window_power;
        if norm > 0.0 {
            for (bin, acc) in density.iter_mut().enumerate() {
                *acc = *acc * self.one_sided_factor(bin) / norm;
            }
        }
        density
    }

    /// Magnitude-squared coherence per bin for two channels transformed with
    /// this estimator.
    pub(crate) fn coherence(&self, left: &SegmentSpectra, right: &SegmentSpectra) -> Vec<f64> {
        let bins = self.bins();
        let mut auto_left = vec![0.0; bins];
        let mut auto_right = vec![0.0; bins];
        let mut cross = vec![Complex::new(0.0, 0.0); bins];
        for (a, b) in left.iter().zip(right) {
            for (bin, (x, y)) in a.iter().zip(b).enumerate().take(bins) {
                if let (Some(pl), Some(pr), Some(pc)) = (
                    auto_left.get_mut(bin),
                    auto_right.get_mut(bin),
                    cross.get_mut(bin),
                ) {
                    *pl += x.norm_sqr();
                    *pr += y.norm_sqr();
                    *pc += x.conj() * y;
                }
            }
        }
        auto_left
            .iter()
            .zip(&auto_right)
            .zip(&cross)
            .map(|((pl, pr), pc)| {
                let denom = pl * pr;
                if denom > 0.0 {
                    (pc.norm_sqr() / denom).clamp(0.0, 1.0)
                } else {
                    0.0
                }
            })
            .collect()
    }

    fn one_sided_factor(&self, bin: usize) -> f64 {
        let nyquist = self.segment_len % 2 == 0 && bin == self.segment_len / 2;
        if bin == 0 || nyquist { 1.0 } else { 2.0 }
    }
}

/// Periodic Hann window.
fn hann(len: usize) -> Vec<f64> {
    if len == 1 {
        return vec![1.0];
    }
    (0..len)
        .map(|n| 0.5 - 0.5 * (std::f64::consts::TAU * n as f64 / len as f64).cos())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f64, fs: f64, samples: usize) -> Vec<f64> {
        (0..samples)
            .map(|n| (std::f64::consts::TAU * freq * n as f64 / fs).sin())
            .collect()
    }

    #[test]
    fn nominal_segment_covers_two_seconds() {
        assert_eq!(nominal_segment_len(128.0), 256);
        assert_eq!(nominal_segment_len(1.0), MIN_SEGMENT_SAMPLES);
    }

    #[test]
    fn coherence_needs_several_segments() {
        assert_eq!(coherence_min_samples(64.0), 320);
        let welch = Welch::new(64.0, nominal_segment_len(64.0));
        assert_eq!(
            welch.transform(&vec![0.0; coherence_min_samples(64.0)]).len(),
            MIN_COHERENCE_SEGMENTS
        );
    }

    #[test]
    fn segment_length_is_clamped_to_signal() {
        let welch = Welch::for_signal(256.0, 100);
        assert_eq!(welch.segment_len(), 100);
        assert_eq!(welch.transform(&vec![0.0; 100]).len(), 1);
    }

    #[test]
    fn half_overlap_yields_expected_segment_count() {
        let welch = Welch::new(100.0, 200);
        // Segments start at 0, 100, ..., 800 for 1000 samples.
        assert_eq!(welch.transform(&vec![0.0; 1000]).len(), 9);
    }

    #[test]
    fn power_peaks_at_the_sine_frequency() {
        let fs = 128.0;
        let welch = Welch::for_signal(fs, 1024);
        let density = welch.power_density(&welch.transform(&sine(10.0, fs, 1024)));
        let peak = density
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(bin, _)| bin)
            .expect("density has bins");
        let frequency = welch.frequencies().nth(peak).expect("bin exists");

        assert!((frequency - 10.0).abs() < 0.5, "peak at {frequency} Hz");
    }

    #[test]
    fn constant_signal_has_no_power() {
        let welch = Welch::for_signal(64.0, 256);
        let density = welch.power_density(&welch.transform(&[3.0; 256]));
        assert!(density.iter().all(|value| value.abs() < 1e-18));
    }

    #[test]
    fn identical_signals_are_fully_coherent() {
        let fs = 64.0;
        let signal = sine(6.0, fs, 512);
        let welch = Welch::new(fs, nominal_segment_len(fs));
        let spectra = welch.transform(&signal);
        let coherence = welch.coherence(&spectra, &spectra);
        let peak_bin = 6 * welch.segment_len() / 64;

        let at_peak = coherence.get(peak_bin).copied().expect("bin exists");
        assert!((at_peak - 1.0).abs() < 1e-9);
        assert!(coherence.iter().all(|value| (0.0..=1.0).contains(value)));
    }
}
