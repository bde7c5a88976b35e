//! Transcript statistics and timing metrics feeding the deterministic scorer.

use crate::defaults;
use crate::error::{Result, SpeakscoreError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Recording duration and total pause time, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TimingData {
    #[serde(rename = "duration", alias = "durationSeconds")]
    pub duration_seconds: f64,
    #[serde(rename = "pauseDuration", alias = "pauseDurationSeconds", default)]
    pub pause_duration_seconds: f64,
}

impl TimingData {
    pub fn new(duration_seconds: f64, pause_duration_seconds: f64) -> Self {
        Self {
            duration_seconds,
            pause_duration_seconds,
        }
    }
}

/// Lowercase a word and strip surrounding punctuation.
pub(crate) fn normalize_word(word: &str) -> String {
    word.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'')
        .to_lowercase()
}

/// Statistics computed from the transcript text alone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextFeatures {
    pub word_count: usize,
    pub sentence_count: usize,
    pub avg_sentence_length: f64,
    pub lexical_diversity: f64,
    pub filler_count: usize,
}

impl TextFeatures {
    /// Fails with `EmptyResponse` when the text has no words.
    pub fn from_text(text: &str) -> Result<Self> {
        let words: Vec<&str> = text.split_whitespace().collect();
        let word_count = words.len();
        if word_count == 0 {
            return Err(SpeakscoreError::EmptyResponse);
        }

        let sentence_count = text
            .split(['.', '!', '?'])
            .filter(|s| !s.trim().is_empty())
            .count()
            .max(1);

        let normalized: Vec<String> = words.iter().map(|w| normalize_word(w)).collect();
        let distinct: HashSet<&str> = normalized
            .iter()
            .map(String::as_str)
            .filter(|w| !w.is_empty())
            .collect();

        Ok(Self {
            word_count,
            sentence_count,
            avg_sentence_length: word_count as f64 / sentence_count as f64,
            lexical_diversity: distinct.len() as f64 / word_count as f64,
            filler_count: count_fillers(&normalized),
        })
    }
}

/// Count filler words and phrases. Multi-word fillers match consecutive
/// words and consume them, so "you know" is one filler, not two words.
fn count_fillers(words: &[String]) -> usize {
    let fillers: Vec<Vec<&str>> = defaults::FILLER_WORDS
        .iter()
        .map(|f| f.split_whitespace().collect())
        .collect();

    let mut count = 0;
    let mut i = 0;
    while i < words.len() {
        let matched = fillers
            .iter()
            .filter(|phrase| {
                words.len() - i >= phrase.len()
                    && phrase
                        .iter()
                        .zip(&words[i..])
                        .all(|(expected, word)| expected == word)
            })
            .map(|phrase| phrase.len())
            .max();
        match matched {
            Some(len) => {
                count += 1;
                i += len;
            }
            None => i += 1,
        }
    }
    count
}

/// Rates derived from `TimingData`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimingMetrics {
    /// Words per minute over the whole recording.
    pub speech_rate: f64,
    /// Words per minute of actual speaking time.
    pub articulation_rate: f64,
    /// Fraction of the recording spent paused.
    pub pause_ratio: f64,
}

impl TimingMetrics {
    /// Returns None when the duration is not positive.
    pub fn compute(word_count: usize, timing: &TimingData) -> Option<Self> {
        let duration = timing.duration_seconds;
        if !duration.is_finite() || duration <= 0.0 {
            return None;
        }
        let pause = timing.pause_duration_seconds.max(0.0);
        let words = word_count as f64;
        let speaking = (duration - pause).max(defaults::MIN_SPEAKING_SECONDS);

        Some(Self {
            speech_rate: words / (duration / 60.0),
            articulation_rate: words / (speaking / 60.0),
            pause_ratio: pause / duration,
        })
    }
}
