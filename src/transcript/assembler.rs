//! Transcript assembler: reconciles recognition fragments into one
//! punctuated transcript.
//!
//! Sentence boundaries are inferred from silence alone:
//! - a final fragment after a long gap is preceded by a period
//! - a final fragment after a medium gap is preceded by a comma
//! - a silence timer forces a period when nothing arrives at all
//!
//! The assembler is synchronous and takes explicit timestamps, so every
//! transition can be driven from tests without a clock. `RecordingSession`
//! feeds it from a live fragment stream.

use crate::config::TranscriptConfig;
use crate::scoring::TimingData;
use crate::transcript::types::{
    RecognitionFragment, RecordedTranscript, RecorderState, TranscriptState,
};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Maps inter-fragment gaps to punctuation marks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PunctuationPolicy {
    pub comma_gap: Duration,
    pub period_gap: Duration,
}

impl PunctuationPolicy {
    pub fn from_config(config: &TranscriptConfig) -> Self {
        Self {
            comma_gap: config.comma_gap(),
            period_gap: config.period_gap(),
        }
    }

    /// Mark to insert before a final fragment that arrived after `gap`.
    pub fn mark_for(&self, gap: Duration) -> &'static str {
        if gap > self.period_gap {
            "."
        } else if gap > self.comma_gap {
            ","
        } else {
            ""
        }
    }
}

impl Default for PunctuationPolicy {
    fn default() -> Self {
        Self::from_config(&TranscriptConfig::default())
    }
}

fn ends_sentence(text: &str) -> bool {
    text.trim_end().ends_with(['.', '!', '?'])
}

/// State machine `Idle → Recording → Stopped` over one `TranscriptState`.
#[derive(Debug, Clone)]
pub struct TranscriptAssembler {
    policy: PunctuationPolicy,
    silence_timeout: Duration,
    state: RecorderState,
    transcript: TranscriptState,
    silence_deadline: Option<Instant>,
}

impl TranscriptAssembler {
    /// Creates an idle assembler with default thresholds.
    pub fn new() -> Self {
        Self::with_config(&TranscriptConfig::default())
    }

    /// Creates an idle assembler with custom thresholds.
    pub fn with_config(config: &TranscriptConfig) -> Self {
        Self {
            policy: PunctuationPolicy::from_config(config),
            silence_timeout: config.silence_timeout(),
            state: RecorderState::Idle,
            transcript: TranscriptState::new(Instant::now()),
            silence_deadline: None,
        }
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn transcript(&self) -> &TranscriptState {
        &self.transcript
    }

    /// When the silence timer fires, if armed.
    pub fn silence_deadline(&self) -> Option<Instant> {
        self.silence_deadline
    }

    /// Live view: finalized text plus the provisional tail.
    pub fn display_text(&self) -> String {
        self.transcript.combined_text()
    }

    /// Begins a recording at `now`, discarding any previous session.
    pub fn start(&mut self, now: Instant) {
        if self.state == RecorderState::Recording {
            debug!("restarting transcript session, previous session discarded");
        }
        self.transcript = TranscriptState::new(now);
        self.silence_deadline = None;
        self.state = RecorderState::Recording;
    }

    /// Applies one fragment. Returns false if the assembler is not recording.
    pub fn push(&mut self, fragment: RecognitionFragment) -> bool {
        if self.state != RecorderState::Recording {
            debug!(state = ?self.state, "ignoring fragment outside recording");
            return false;
        }

        if fragment.is_final {
            let gap = fragment
                .timestamp
                .saturating_duration_since(self.transcript.last_fragment_at);
            let mark = self.policy.mark_for(gap);
            trace!(gap_ms = gap.as_millis() as u64, mark, "final fragment");
            self.append_final(fragment.text.trim(), mark);
            self.transcript.pending_interim_text.clear();
            self.transcript.last_fragment_at = fragment.timestamp;
        } else {
            self.transcript.pending_interim_text = fragment.text.trim().to_string();
        }

        // Re-arming replaces the previous deadline, which cancels it.
        self.silence_deadline = Some(fragment.timestamp + self.silence_timeout);
        true
    }

    fn append_final(&mut self, text: &str, mark: &str) {
        if text.is_empty() {
            return;
        }
        let finalized = &mut self.transcript.finalized_text;
        if finalized.is_empty() {
            finalized.push_str(text);
            return;
        }
        if !ends_sentence(finalized) {
            finalized.push_str(mark);
        }
        finalized.push(' ');
        finalized.push_str(text);
    }

    /// Handles the silence timer firing at `now`.
    ///
    /// Returns false when no timer was armed or the assembler is not
    /// recording; the timer is disarmed until the next fragment either way.
    pub fn on_silence_timeout(&mut self, now: Instant) -> bool {
        if self.state != RecorderState::Recording || self.silence_deadline.take().is_none() {
            return false;
        }

        let gap = now.saturating_duration_since(self.transcript.last_fragment_at);
        let finalized = &mut self.transcript.finalized_text;
        if !finalized.is_empty() && !ends_sentence(finalized) {
            finalized.push('.');
        }
        self.transcript.accumulated_pause_seconds += gap.as_secs_f64();
        self.transcript.last_fragment_at = now;
        debug!(
            gap_ms = gap.as_millis() as u64,
            pause_total_s = self.transcript.accumulated_pause_seconds,
            "silence timeout, sentence boundary forced"
        );
        true
    }

    /// Ends the recording and returns the combined transcript with its timing.
    pub fn stop(&mut self, now: Instant) -> RecordedTranscript {
        self.silence_deadline = None;
        if self.state == RecorderState::Recording {
            self.state = RecorderState::Stopped;
        }
        let duration = now.saturating_duration_since(self.transcript.session_start);
        RecordedTranscript {
            text: self.transcript.combined_text(),
            timing: TimingData::new(
                duration.as_secs_f64(),
                self.transcript.accumulated_pause_seconds,
            ),
        }
    }

    /// Returns to `Idle` with a blank transcript.
    pub fn clear(&mut self) {
        self.transcript = TranscriptState::new(Instant::now());
        self.silence_deadline = None;
        self.state = RecorderState::Idle;
    }
}

impl Default for TranscriptAssembler {
    fn default() -> Self {
        Self::new()
    }
}
