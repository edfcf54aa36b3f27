//! # Pitch Estimation Module
//!
//! Picks the fundamental out of a harmonically reinforced spectrum.
//!
//! ## Features
//! - Argmax peak picking with a deterministic tie-break (lowest bin wins)
//! - Silence detection: an energy-free spectrum yields `NoPitchDetected`
//! - Optional parabolic interpolation for sub-bin accuracy

use crate::error::{AnalysisError, Result};
use crate::fft::FrequencyAxis;

/// Index of the largest bin, first occurrence on ties.
///
/// Returns `None` when no bin holds positive, finite energy.
pub fn peak_bin(spectrum: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &value) in spectrum.iter().enumerate() {
        if !value.is_finite() || value <= 0.0 {
            continue;
        }
        match best {
            Some((_, max)) if value <= max => {}
            _ => best = Some((i, value)),
        }
    }
    best.map(|(i, _)| i)
}

/// Returns the frequency of the strongest bin of `reinforced`.
///
/// The estimator makes no judgement on musical range; any frequency in
/// `[0, Nyquist)` may come back. An all-zero spectrum is reported as
/// `NoPitchDetected` rather than as 0 Hz.
pub fn estimate(reinforced: &[f32], axis: &FrequencyAxis) -> Result<f32> {
    let peak = peak_bin(reinforced).ok_or(AnalysisError::NoPitchDetected)?;
    axis.frequency(peak).ok_or(AnalysisError::NoPitchDetected)
}

/// Like [`estimate`], then refines the peak with parabolic interpolation
/// over the log magnitudes of its neighbours.
pub fn estimate_interpolated(reinforced: &[f32], axis: &FrequencyAxis) -> Result<f32> {
    let peak = peak_bin(reinforced).ok_or(AnalysisError::NoPitchDetected)?;
    let coarse = axis.frequency(peak).ok_or(AnalysisError::NoPitchDetected)?;
    Ok(interpolate_peak(reinforced, peak)
        .map(|bin| bin * axis.bin_width())
        .unwrap_or(coarse))
}

/// Fractional bin position of the peak at `peak`, if the neighbours allow it.
///
/// Fits a parabola through the log magnitudes of `peak - 1`, `peak` and
/// `peak + 1`. Returns `None` at the spectrum edges or when a neighbour has
/// no energy.
pub fn interpolate_peak(spectrum: &[f32], peak: usize) -> Option<f32> {
    if peak == 0 || peak + 1 >= spectrum.len() {
        return None;
    }

    let y1 = spectrum[peak - 1].ln();
    let y2 = spectrum[peak].ln();
    let y3 = spectrum[peak + 1].ln();
    if !y1.is_finite() || !y2.is_finite() || !y3.is_finite() {
        return None;
    }

    let denominator = 2.0 * y2 - y1 - y3;
    if denominator.abs() < 1e-6 {
        return None;
    }

    let shift = (y3 - y1) / (2.0 * denominator);
    let bin = peak as f32 + shift;
    (bin.is_finite() && bin > 0.0).then_some(bin)
}
