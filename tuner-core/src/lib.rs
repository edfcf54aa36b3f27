// tuner-core/src/lib.rs

//! The core logic for the real-time pitch tuner.
//! This crate is responsible for sample accumulation, spectral analysis,
//! Harmonic Product Spectrum pitch estimation and note mapping. It is
//! completely headless and contains no presentation code.

use std::sync::Arc;

use serde::Serialize;

pub mod audio;
pub mod config;
pub mod error;
pub mod fft;
pub mod handoff;
pub mod hps;
pub mod pipeline;
pub mod pitch;
pub mod ring;
pub mod tuning;
pub mod window;
pub mod worker;

pub use config::PipelineConfig;
pub use error::{AnalysisError, Result};
pub use handoff::{Delivery, HandoffClosed, ResultPublisher, ResultSubscriber, result_channel};
pub use pipeline::{AnalysisPipeline, StreamState};
pub use tuning::NoteInfo;
pub use worker::AnalysisWorker;

/// Outcome of the pitch search for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Pitch {
    /// The reinforced spectrum carried no energy.
    Silent,
    /// A peak was found but lies outside the piano range.
    OutOfRange { frequency: f32 },
    /// A peak was found and mapped onto a note.
    Note { frequency: f32, note: NoteInfo },
}

impl Pitch {
    /// Detected frequency in Hz, if any.
    pub fn frequency(&self) -> Option<f32> {
        match self {
            Pitch::Silent => None,
            Pitch::OutOfRange { frequency } | Pitch::Note { frequency, .. } => Some(*frequency),
        }
    }

    pub fn note(&self) -> Option<&NoteInfo> {
        match self {
            Pitch::Note { note, .. } => Some(note),
            _ => None,
        }
    }
}

/// Represents the result of a single audio analysis frame.
///
/// Every field is an owned snapshot; nothing aliases the pipeline's
/// working buffers.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    /// Position of the frame in the stream, starting at 0.
    pub sequence: u64,
    /// Ring contents at the time of analysis, oldest sample first.
    pub buffer: Vec<f32>,
    /// Nyquist-limited magnitude spectrum.
    pub spectrum: Vec<f32>,
    /// Harmonically reinforced spectrum used for the pitch search.
    pub reinforced: Vec<f32>,
    /// Frequency (Hz) of each spectrum bin.
    pub frequencies: Arc<[f32]>,
    /// Detected pitch and note.
    pub pitch: Pitch,
}

impl AnalysisResult {
    pub fn frequency(&self) -> Option<f32> {
        self.pitch.frequency()
    }

    pub fn note(&self) -> Option<&NoteInfo> {
        self.pitch.note()
    }
}
