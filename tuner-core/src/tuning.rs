//! # Musical Tuning Module
//!
//! Maps frequencies onto the 88 keys of a piano in 12-tone equal
//! temperament, anchored at A0 = 27.5 Hz.
//!
//! ## Features
//! - Frequency to note name, octave and cents deviation
//! - Scientific pitch notation (octaves change at C: A0, A#0, B0, C1, ...)
//! - 88-key reference table (A0 to C8) with A4 = 440 Hz

use std::fmt;

use once_cell::sync::Lazy;
use serde::Serialize;

use crate::error::{AnalysisError, Result};

/// Frequency of A0, the lowest piano key.
pub const A0_HZ: f32 = 27.5;

/// Highest frequency accepted by [`map_frequency`].
pub const MAX_FREQUENCY_HZ: f32 = 5000.0;

/// Semitones spanned by the piano keyboard above A0.
const MAX_SEMITONES: f32 = 88.0;

/// Note names of one octave, starting at A.
pub const NOTE_NAMES: [&str; 12] = [
    "A", "A#", "B", "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#",
];

/// Equal-temperament frequencies of the 88 keys, computed once.
static KEY_FREQUENCIES: Lazy<Vec<f32>> = Lazy::new(|| {
    (0..88)
        .map(|i| A0_HZ * 2.0_f32.powf(i as f32 / 12.0))
        .collect()
});

/// The note nearest to a measured frequency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoteInfo {
    /// Natural note letter ("A".."G").
    pub name: &'static str,
    /// `Some('#')` for sharps.
    pub accidental: Option<char>,
    /// Octave in scientific pitch notation.
    pub octave: i32,
    /// Signed deviation from the nearest semitone, in `(-50, 50]`.
    pub cents: f32,
    /// Semitones above A0 (0 = A0, 48 = A4, 87 = C8).
    pub key_index: u8,
}

impl NoteInfo {
    /// Equal-temperament frequency of the note, ignoring the cents offset.
    pub fn target_frequency(&self) -> f32 {
        key_frequency(self.key_index).unwrap_or_else(|| {
            A0_HZ * 2.0_f32.powf(self.key_index as f32 / 12.0)
        })
    }
}

impl fmt::Display for NoteInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(accidental) = self.accidental {
            write!(f, "{accidental}")?;
        }
        write!(f, "{}", self.octave)
    }
}

/// Maps `frequency` onto the nearest piano key.
///
/// # Returns
/// * `Ok(note)` - Nearest note with its cents deviation
/// * `Err(FrequencyOutOfRange)` - Frequency outside 27.5..=5000 Hz, or more
///   than 88 semitones above A0
pub fn map_frequency(frequency: f32) -> Result<NoteInfo> {
    let out_of_range = AnalysisError::FrequencyOutOfRange { frequency };
    if !frequency.is_finite() || !(A0_HZ..=MAX_FREQUENCY_HZ).contains(&frequency) {
        return Err(out_of_range);
    }

    let n = 12.0 * (frequency / A0_HZ).log2();
    if !(0.0..=MAX_SEMITONES).contains(&n) {
        return Err(out_of_range);
    }

    // Ties round down so cents stay within (-50, 50].
    let nearest = (n - 0.5).ceil();
    let cents = (n - nearest) * 100.0;

    let semitones = nearest as i32;
    let (mut octave, note_index) = (semitones.div_euclid(12), semitones.rem_euclid(12) as usize);
    // The table cycles at A, scientific octaves change at C (index 3).
    if note_index > 2 {
        octave += 1;
    }

    let full_name = NOTE_NAMES[note_index];
    let (name, accidental) = match full_name.split_at(1) {
        (letter, "") => (letter, None),
        (letter, rest) => (letter, rest.chars().next()),
    };

    Ok(NoteInfo {
        name,
        accidental,
        octave,
        cents,
        key_index: semitones as u8,
    })
}

/// Frequency of piano key `key_index` (0 = A0, 87 = C8).
pub fn key_frequency(key_index: u8) -> Option<f32> {
    KEY_FREQUENCIES.get(key_index as usize).copied()
}

/// Calculates the deviation from a target frequency in cents.
///
/// Positive values are sharp, negative values flat.
pub fn cents_between(freq: f32, target_freq: f32) -> f32 {
    1200.0 * (freq / target_freq).log2()
}
