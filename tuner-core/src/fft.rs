//! # Fast Fourier Transform (FFT) Module
//!
//! This module turns a windowed analysis buffer into a magnitude spectrum.
//!
//! ## Features
//! - FFT plan and scratch space built once per analysis length (RustFFT)
//! - Mixed-radix support, so lengths like 20480 need no padding
//! - Nyquist-limited magnitude spectrum (first N/2 bins)
//! - Shared frequency axis for the spectrum bins

use std::sync::Arc;

use rustfft::{Fft, FftPlanner, num_complex::Complex};

/// Frequencies (Hz) of the Nyquist-limited spectrum bins.
///
/// Bin `k` sits at `k * sample_rate / n`. The values are shared behind an
/// `Arc` so results can carry the axis without copying it.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyAxis {
    frequencies: Arc<[f32]>,
    bin_width: f32,
}

impl FrequencyAxis {
    /// Builds the axis for an `n`-point transform at `sample_rate` Hz.
    pub fn new(sample_rate: u32, n: usize) -> Self {
        let bin_width = if n == 0 { 0.0 } else { sample_rate as f32 / n as f32 };
        let frequencies = (0..n / 2).map(|k| k as f32 * bin_width).collect();
        Self {
            frequencies,
            bin_width,
        }
    }

    /// Spacing between adjacent bins in Hz.
    pub fn bin_width(&self) -> f32 {
        self.bin_width
    }

    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.frequencies
    }

    /// Cheap handle on the underlying values.
    pub fn shared(&self) -> Arc<[f32]> {
        Arc::clone(&self.frequencies)
    }

    /// Frequency of bin `index`, if it exists.
    pub fn frequency(&self, index: usize) -> Option<f32> {
        self.frequencies.get(index).copied()
    }

    /// Number of leading bins strictly below `hz`.
    pub fn bins_below(&self, hz: f32) -> usize {
        self.frequencies.partition_point(|&f| f < hz)
    }
}

/// Magnitude spectrum of a real-valued buffer of fixed length.
///
/// All working memory is allocated in [`SpectralAnalyzer::new`]; repeated
/// calls to [`SpectralAnalyzer::transform_into`] do not allocate.
pub struct SpectralAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
}

impl std::fmt::Debug for SpectralAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectralAnalyzer")
            .field("len", &self.fft.len())
            .finish()
    }
}

impl SpectralAnalyzer {
    /// Plans a forward FFT for buffers of `len` samples.
    pub fn new(len: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(len);
        let scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];
        Self {
            fft,
            buffer: vec![Complex::new(0.0, 0.0); len],
            scratch,
        }
    }

    /// Input length the analyzer was planned for.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Number of bins produced per transform.
    pub fn spectrum_len(&self) -> usize {
        self.buffer.len() / 2
    }

    /// Transforms `windowed` and returns the first N/2 magnitudes.
    pub fn transform(&mut self, windowed: &[f32]) -> Vec<f32> {
        let mut spectrum = vec![0.0; self.spectrum_len()];
        self.transform_into(windowed, &mut spectrum);
        spectrum
    }

    /// Same as [`SpectralAnalyzer::transform`], writing into `spectrum`.
    ///
    /// # Panics
    /// * If `windowed` is not exactly [`SpectralAnalyzer::len`] samples
    /// * If `spectrum` is not exactly [`SpectralAnalyzer::spectrum_len`] bins
    pub fn transform_into(&mut self, windowed: &[f32], spectrum: &mut [f32]) {
        assert_eq!(
            windowed.len(),
            self.buffer.len(),
            "input length must equal the planned FFT length"
        );
        assert_eq!(spectrum.len(), self.spectrum_len(), "spectrum length must be N/2");

        for (slot, &sample) in self.buffer.iter_mut().zip(windowed) {
            *slot = Complex::new(sample, 0.0);
        }
        self.fft.process_with_scratch(&mut self.buffer, &mut self.scratch);

        // Only the non-redundant half matters for real input.
        for (magnitude, bin) in spectrum.iter_mut().zip(&self.buffer) {
            *magnitude = bin.norm();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::HannWindow;
    use approx::assert_abs_diff_eq;

    fn sine(freq: f32, sample_rate: u32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    #[test]
    fn silence_yields_a_zero_spectrum() {
        let mut analyzer = SpectralAnalyzer::new(1024);
        let spectrum = analyzer.transform(&vec![0.0; 1024]);
        assert_eq!(spectrum.len(), 512);
        assert!(spectrum.iter().all(|&m| m == 0.0));
    }

    #[test]
    fn sine_peaks_within_one_bin() {
        let sample_rate = 44100;
        let n = 4096;
        let freq = 1000.0;
        let window = HannWindow::new(n);
        let mut analyzer = SpectralAnalyzer::new(n);
        let axis = FrequencyAxis::new(sample_rate, n);

        let spectrum = analyzer.transform(&window.apply(&sine(freq, sample_rate, n)));
        let peak = spectrum
            .iter()
            .enumerate()
            .fold((0, f32::MIN), |best, (i, &m)| if m > best.1 { (i, m) } else { best })
            .0;
        let peak_freq = axis.frequency(peak).unwrap();
        assert!((peak_freq - freq).abs() <= axis.bin_width());
    }

    #[test]
    fn handles_non_power_of_two_lengths() {
        // 20480 = 2^12 * 5
        let sample_rate = 44100;
        let n = 20480;
        let freq = 440.0;
        let mut analyzer = SpectralAnalyzer::new(n);
        let axis = FrequencyAxis::new(sample_rate, n);
        let spectrum = analyzer.transform(&HannWindow::new(n).apply(&sine(freq, sample_rate, n)));
        assert_eq!(spectrum.len(), n / 2);

        let peak = (0..spectrum.len())
            .max_by(|&a, &b| spectrum[a].total_cmp(&spectrum[b]))
            .unwrap();
        assert!((axis.as_slice()[peak] - freq).abs() <= axis.bin_width());
    }

    #[test]
    fn repeated_transforms_agree() {
        let mut analyzer = SpectralAnalyzer::new(300);
        let input = sine(50.0, 1000, 300);
        let first = analyzer.transform(&input);
        let second = analyzer.transform(&input);
        assert_eq!(first, second);
    }

    #[test]
    fn axis_is_monotonic_from_zero() {
        let axis = FrequencyAxis::new(44100, 20480);
        assert_eq!(axis.len(), 10240);
        assert_eq!(axis.as_slice()[0], 0.0);
        assert!(axis.as_slice().windows(2).all(|w| w[0] < w[1]));
        assert_abs_diff_eq!(axis.bin_width(), 44100.0 / 20480.0);
        assert_eq!(axis.bins_below(200.0), 93);
    }
}
