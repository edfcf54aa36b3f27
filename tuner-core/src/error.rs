//! Error types for the analysis core.

use thiserror::Error;

/// Errors raised by the analysis components.
///
/// `InvalidChunkSize`, `ReconfigurationWhileStreaming` and `InvalidConfig`
/// signal misuse by the integrator. `NoPitchDetected` and
/// `FrequencyOutOfRange` depend on the audio content and are folded into
/// [`crate::Pitch`] by the pipeline rather than returned from it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("Chunk of {chunk} samples does not fit a ring of {capacity} samples")]
    InvalidChunkSize { chunk: usize, capacity: usize },

    #[error("No pitch detected: spectrum carries no energy")]
    NoPitchDetected,

    #[error("Frequency {frequency} Hz is outside the 88-key range")]
    FrequencyOutOfRange { frequency: f32 },

    #[error("Cannot reconfigure while the stream is running; stop it first")]
    ReconfigurationWhileStreaming,

    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AnalysisError>;
