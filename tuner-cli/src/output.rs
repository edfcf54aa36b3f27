//! Text and JSON-lines rendering of analysis results.

use anyhow::Result;
use serde::Serialize;
use tuner_core::{AnalysisResult, Pitch};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Compact per-frame record; spectra are left out.
#[derive(Debug, Serialize)]
struct FrameSummary<'a> {
    sequence: u64,
    #[serde(flatten)]
    pitch: &'a Pitch,
}

/// Renders `result`, or returns `None` for frames without a note unless
/// `all_frames` is set.
pub fn render(result: &AnalysisResult, format: OutputFormat, all_frames: bool) -> Result<Option<String>> {
    if result.note().is_none() && !all_frames {
        return Ok(None);
    }
    let line = match format {
        OutputFormat::Text => render_text(result),
        OutputFormat::Json => serde_json::to_string(&FrameSummary {
            sequence: result.sequence,
            pitch: &result.pitch,
        })?,
    };
    Ok(Some(line))
}

fn render_text(result: &AnalysisResult) -> String {
    match &result.pitch {
        Pitch::Silent => format!("{:>6}  ---", result.sequence),
        Pitch::OutOfRange { frequency } => {
            format!("{:>6}  {frequency:>8.2} Hz  (out of range)", result.sequence)
        }
        Pitch::Note { frequency, note } => format!(
            "{:>6}  {frequency:>8.2} Hz  {:<4} {:+6.2} cents",
            result.sequence,
            note.to_string(),
            note.cents
        ),
    }
}
