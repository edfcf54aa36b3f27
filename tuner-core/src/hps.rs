//! # Harmonic Product Spectrum
//!
//! Reinforces bins whose integer multiples also carry energy. The spectrum is
//! downsampled by each factor `h = 2..=harmonics` and multiplied into the
//! running product, which lifts the fundamental above its overtones and
//! suppresses non-harmonic noise.
//!
//! After combining harmonics, bins below a cutoff (200 Hz by default) are
//! faded out with a logistic taper so DC offset and sub-audio rumble cannot
//! win the peak search.

use crate::fft::FrequencyAxis;

/// HPS combiner with a precomputed low-frequency taper.
#[derive(Debug, Clone, PartialEq)]
pub struct HarmonicReinforcer {
    harmonics: usize,
    taper: Vec<f32>,
}

impl HarmonicReinforcer {
    /// Builds a reinforcer for spectra laid out on `axis`.
    ///
    /// # Arguments
    /// * `harmonics` - Number of harmonics to combine (1 disables the product)
    /// * `axis` - Frequency of every spectrum bin
    /// * `low_cut_hz` - Bins strictly below this frequency are tapered
    /// * `steepness` - The logistic argument spans `[-steepness, steepness]`
    pub fn new(harmonics: usize, axis: &FrequencyAxis, low_cut_hz: f32, steepness: f32) -> Self {
        let taper = logistic_taper(axis.bins_below(low_cut_hz), steepness);
        Self {
            harmonics: harmonics.max(1),
            taper,
        }
    }

    pub fn harmonics(&self) -> usize {
        self.harmonics
    }

    /// Taper gains for the leading bins; later bins are left at unit gain.
    pub fn taper(&self) -> &[f32] {
        &self.taper
    }

    /// Returns the reinforced copy of `spectrum`.
    pub fn reinforce(&self, spectrum: &[f32]) -> Vec<f32> {
        let mut out = vec![0.0; spectrum.len()];
        self.reinforce_into(spectrum, &mut out);
        out
    }

    /// Writes the reinforced spectrum into `out` (same length as `spectrum`).
    ///
    /// The h-th downsampled copy has `ceil(len / h)` bins, so each harmonic
    /// only touches that many leading bins. Bins past the shortest product
    /// have no complete harmonic series and are zeroed.
    pub fn reinforce_into(&self, spectrum: &[f32], out: &mut [f32]) {
        assert_eq!(out.len(), spectrum.len(), "output length must match spectrum");
        out.copy_from_slice(spectrum);

        let mut valid = spectrum.len();
        for h in 2..=self.harmonics {
            let len = spectrum.len().div_ceil(h);
            for (acc, &partial) in out[..len].iter_mut().zip(spectrum.iter().step_by(h)) {
                *acc *= partial;
            }
            valid = len;
        }
        out[valid..].fill(0.0);

        for (bin, gain) in out.iter_mut().zip(&self.taper) {
            *bin *= gain;
        }
    }
}

/// Logistic ramp over `len` bins, from `sigmoid(-steepness)` to `sigmoid(steepness)`.
fn logistic_taper(len: usize, steepness: f32) -> Vec<f32> {
    let step = if len > 1 {
        2.0 * steepness / (len - 1) as f32
    } else {
        0.0
    };
    (0..len)
        .map(|i| {
            let x = -steepness + step * i as f32;
            1.0 / (1.0 + (-x).exp())
        })
        .collect()
}

/// One-shot helper building a [`HarmonicReinforcer`] and applying it.
pub fn reinforce(
    spectrum: &[f32],
    axis: &FrequencyAxis,
    harmonics: usize,
    low_cut_hz: f32,
    steepness: f32,
) -> Vec<f32> {
    HarmonicReinforcer::new(harmonics, axis, low_cut_hz, steepness).reinforce(spectrum)
}
