//! # Analysis Pipeline
//!
//! Owns every piece of mutable analysis state and runs one frame of analysis
//! per incoming chunk:
//!
//! 1. Push the chunk into the [`SampleRing`]
//! 2. Apply the Hann window
//! 3. Magnitude spectrum via FFT
//! 4. Harmonic Product Spectrum with the low-frequency taper
//! 5. Peak frequency
//! 6. Nearest note (best effort)
//!
//! Results are packaged as immutable [`AnalysisResult`] snapshots; the
//! working buffers never leave the pipeline.
//!
//! ## States
//! - **Idle**: no chunk received since construction or the last stop
//! - **Streaming**: chunks are arriving; reconfiguration is refused

use tracing::{debug, info};

use crate::config::PipelineConfig;
use crate::error::{AnalysisError, Result};
use crate::fft::{FrequencyAxis, SpectralAnalyzer};
use crate::hps::HarmonicReinforcer;
use crate::ring::SampleRing;
use crate::window::HannWindow;
use crate::{AnalysisResult, Pitch, pitch, tuning};

/// Stream state of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Idle,
    Streaming,
}

/// Everything derived from a [`PipelineConfig`], rebuilt as one unit.
#[derive(Debug)]
struct Stages {
    ring: SampleRing,
    window: HannWindow,
    analyzer: SpectralAnalyzer,
    axis: FrequencyAxis,
    reinforcer: HarmonicReinforcer,
    windowed: Vec<f32>,
    spectrum: Vec<f32>,
    reinforced: Vec<f32>,
}

impl Stages {
    fn build(config: &PipelineConfig) -> Self {
        let n = config.ring_capacity();
        let axis = FrequencyAxis::new(config.sample_rate, n);
        let reinforcer = HarmonicReinforcer::new(
            config.harmonics,
            &axis,
            config.low_cut_hz,
            config.taper_steepness,
        );
        Self {
            ring: SampleRing::new(n),
            window: HannWindow::new(n),
            analyzer: SpectralAnalyzer::new(n),
            axis,
            reinforcer,
            windowed: vec![0.0; n],
            spectrum: vec![0.0; n / 2],
            reinforced: vec![0.0; n / 2],
        }
    }
}

/// Per-chunk orchestration of the analysis stages.
#[derive(Debug)]
pub struct AnalysisPipeline {
    config: PipelineConfig,
    stages: Stages,
    state: StreamState,
    sequence: u64,
}

impl AnalysisPipeline {
    /// Validates `config` and preallocates every buffer.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        info!(
            sample_rate = config.sample_rate,
            window = config.ring_capacity(),
            harmonics = config.harmonics,
            "analysis pipeline configured"
        );
        let stages = Stages::build(&config);
        Ok(Self {
            config,
            stages,
            state: StreamState::Idle,
            sequence: 0,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Frequency of each bin of the spectra carried by results.
    pub fn frequency_axis(&self) -> &FrequencyAxis {
        &self.stages.axis
    }

    /// Current ring contents, oldest sample first.
    pub fn buffer(&self) -> &[f32] {
        self.stages.ring.as_slice()
    }

    /// Processes one chunk of 16-bit PCM delivered at `sample_rate` Hz.
    ///
    /// A sample rate that differs from the configured one is adopted while
    /// Idle. While Streaming it fails with `ReconfigurationWhileStreaming`
    /// and nothing is modified.
    pub fn on_chunk(&mut self, samples: &[i16], sample_rate: u32) -> Result<AnalysisResult> {
        if sample_rate != self.config.sample_rate {
            let config = PipelineConfig {
                sample_rate,
                ..self.config.clone()
            };
            self.reconfigure(config)?;
        }
        self.stages.ring.push_pcm(samples)?;
        Ok(self.analyze())
    }

    /// Processes one chunk of samples already normalized to `[-1, 1]`.
    pub fn push_samples(&mut self, samples: &[f32]) -> Result<AnalysisResult> {
        self.stages.ring.push(samples)?;
        Ok(self.analyze())
    }

    /// Returns to Idle and clears the ring.
    pub fn stop_stream(&mut self) {
        if self.state == StreamState::Streaming {
            debug!(frames = self.sequence, "analysis stream stopped");
        }
        self.state = StreamState::Idle;
        self.stages.ring.clear();
    }

    /// Replaces the configuration, rebuilding all derived state at once.
    ///
    /// Must be called while Idle; the current state is kept on error.
    pub fn reconfigure(&mut self, config: PipelineConfig) -> Result<()> {
        if self.state == StreamState::Streaming {
            return Err(AnalysisError::ReconfigurationWhileStreaming);
        }
        config.validate()?;
        info!(
            sample_rate = config.sample_rate,
            window = config.ring_capacity(),
            harmonics = config.harmonics,
            "analysis pipeline reconfigured"
        );
        self.stages = Stages::build(&config);
        self.config = config;
        Ok(())
    }

    fn analyze(&mut self) -> AnalysisResult {
        if self.state == StreamState::Idle {
            debug!("analysis stream started");
            self.state = StreamState::Streaming;
        }

        let stages = &mut self.stages;
        stages
            .window
            .apply_into(stages.ring.as_slice(), &mut stages.windowed);
        stages
            .analyzer
            .transform_into(&stages.windowed, &mut stages.spectrum);
        stages
            .reinforcer
            .reinforce_into(&stages.spectrum, &mut stages.reinforced);

        let estimate = if self.config.interpolate {
            pitch::estimate_interpolated(&stages.reinforced, &stages.axis)
        } else {
            pitch::estimate(&stages.reinforced, &stages.axis)
        };
        let pitch = match estimate {
            Ok(frequency) => match tuning::map_frequency(frequency) {
                Ok(note) => Pitch::Note { frequency, note },
                Err(_) => Pitch::OutOfRange { frequency },
            },
            Err(_) => Pitch::Silent,
        };

        let sequence = self.sequence;
        self.sequence += 1;
        AnalysisResult {
            sequence,
            buffer: stages.ring.as_slice().to_vec(),
            spectrum: stages.spectrum.clone(),
            reinforced: stages.reinforced.clone(),
            frequencies: stages.axis.shared(),
            pitch,
        }
    }
}
