//! # Pipeline Configuration
//!
//! Every tunable of the analysis pipeline lives in [`PipelineConfig`]. The
//! struct deserializes with `#[serde(default)]`, so a configuration file only
//! needs to name the fields it changes.

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

/// Default sample rate in Hz (CD quality).
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// Default number of samples per hardware chunk (~46ms at 44.1kHz).
pub const DEFAULT_CHUNK_SIZE: usize = 2048;

/// Default number of chunks held by the analysis window.
pub const DEFAULT_WINDOW_MULTIPLIER: usize = 10;

/// Default number of harmonics combined by the Harmonic Product Spectrum.
pub const DEFAULT_HARMONICS: usize = 3;

/// Bins below this frequency are faded out by the logistic taper.
pub const DEFAULT_LOW_CUT_HZ: f32 = 200.0;

/// The logistic argument spans `[-steepness, steepness]` across the taper.
pub const DEFAULT_TAPER_STEEPNESS: f32 = 10.0;

/// Configuration consumed by [`crate::AnalysisPipeline`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Sample rate of incoming audio in Hz.
    pub sample_rate: u32,
    /// Samples delivered per chunk.
    pub chunk_size: usize,
    /// Ring capacity expressed in chunks.
    pub window_multiplier: usize,
    /// Harmonics combined by the HPS (1 disables reinforcement).
    pub harmonics: usize,
    /// Upper edge of the low-frequency taper in Hz.
    pub low_cut_hz: f32,
    /// Steepness of the logistic taper.
    pub taper_steepness: f32,
    /// Refine the argmax bin with parabolic interpolation.
    pub interpolate: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            chunk_size: DEFAULT_CHUNK_SIZE,
            window_multiplier: DEFAULT_WINDOW_MULTIPLIER,
            harmonics: DEFAULT_HARMONICS,
            low_cut_hz: DEFAULT_LOW_CUT_HZ,
            taper_steepness: DEFAULT_TAPER_STEEPNESS,
            interpolate: false,
        }
    }
}

impl PipelineConfig {
    /// Number of samples held by the ring (`chunk_size * window_multiplier`).
    pub fn ring_capacity(&self) -> usize {
        self.chunk_size.saturating_mul(self.window_multiplier)
    }

    /// Number of Nyquist-limited spectrum bins (`ring_capacity / 2`).
    pub fn spectrum_len(&self) -> usize {
        self.ring_capacity() / 2
    }

    /// Checks that every field describes a usable pipeline.
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(invalid("sample_rate must be positive"));
        }
        if self.chunk_size == 0 {
            return Err(invalid("chunk_size must be positive"));
        }
        if self.window_multiplier == 0 {
            return Err(invalid("window_multiplier must be positive"));
        }
        if self.harmonics == 0 {
            return Err(invalid("harmonics must be at least 1"));
        }
        if self.chunk_size.checked_mul(self.window_multiplier).is_none() {
            return Err(invalid("chunk_size * window_multiplier overflows"));
        }
        if self.ring_capacity() < 2 {
            return Err(invalid("analysis window must hold at least 2 samples"));
        }
        if !self.low_cut_hz.is_finite() || self.low_cut_hz < 0.0 {
            return Err(invalid("low_cut_hz must be a non-negative number"));
        }
        if !self.taper_steepness.is_finite() || self.taper_steepness <= 0.0 {
            return Err(invalid("taper_steepness must be a positive number"));
        }
        Ok(())
    }
}

fn invalid(msg: &str) -> AnalysisError {
    AnalysisError::InvalidConfig(msg.to_string())
}
