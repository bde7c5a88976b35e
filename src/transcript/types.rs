//! Data types for transcript assembly.

use crate::scoring::TimingData;
use std::time::Instant;

/// One incremental speech-recognition result.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionFragment {
    /// Recognized text for this fragment.
    pub text: String,
    /// Final (settled) or interim (provisional) result.
    pub is_final: bool,
    /// Wall-clock time the recognizer produced this fragment.
    pub timestamp: Instant,
}

impl RecognitionFragment {
    /// Creates an interim fragment.
    pub fn interim(text: impl Into<String>, timestamp: Instant) -> Self {
        Self {
            text: text.into(),
            is_final: false,
            timestamp,
        }
    }

    /// Creates a final fragment.
    pub fn final_result(text: impl Into<String>, timestamp: Instant) -> Self {
        Self {
            text: text.into(),
            is_final: true,
            timestamp,
        }
    }
}

/// Lifecycle of one recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecorderState {
    #[default]
    Idle,
    Recording,
    Stopped,
}

/// Mutable transcript state of one recording session.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptState {
    pub finalized_text: String,
    pub pending_interim_text: String,
    pub last_fragment_at: Instant,
    pub session_start: Instant,
    pub accumulated_pause_seconds: f64,
}

impl TranscriptState {
    /// Blank state anchored at `now`.
    pub fn new(now: Instant) -> Self {
        Self {
            finalized_text: String::new(),
            pending_interim_text: String::new(),
            last_fragment_at: now,
            session_start: now,
            accumulated_pause_seconds: 0.0,
        }
    }

    /// Finalized text followed by the provisional tail, trimmed.
    pub fn combined_text(&self) -> String {
        let finalized = self.finalized_text.trim();
        let interim = self.pending_interim_text.trim();
        match (finalized.is_empty(), interim.is_empty()) {
            (_, true) => finalized.to_string(),
            (true, false) => interim.to_string(),
            (false, false) => format!("{finalized} {interim}"),
        }
    }
}

/// Outcome of a stopped recording: the transcript plus its timing.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedTranscript {
    pub text: String,
    pub timing: TimingData,
}

impl RecordedTranscript {
    /// Transcript of a recording that never received a fragment.
    pub fn empty() -> Self {
        Self {
            text: String::new(),
            timing: TimingData::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}
