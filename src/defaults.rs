//! Default configuration constants for speakscore.
//!
//! This module provides shared constants used across different configuration types
//! to ensure consistency and eliminate duplication.

/// Gap (ms) between final fragments above which a comma is inserted.
pub const COMMA_GAP_MS: u64 = 800;

/// Gap (ms) between final fragments above which a period is inserted.
pub const PERIOD_GAP_MS: u64 = 1500;

/// Silence (ms) after the last fragment before a sentence boundary is forced.
///
/// Matches the period gap so that a pause long enough to end a sentence is
/// recorded even when no further fragment arrives.
pub const SILENCE_TIMEOUT_MS: u64 = 1500;

/// Syntax-analysis endpoint (Google Natural Language `analyzeSyntax`).
pub const ANALYZER_ENDPOINT: &str = "https://language.googleapis.com/v1/documents:analyzeSyntax";

/// Upper bound for one syntax-analysis round trip.
pub const ANALYZER_TIMEOUT_MS: u64 = 10_000;

/// Generative-model API base URL.
pub const FEEDBACK_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default generative model used for qualitative feedback.
pub const FEEDBACK_MODEL: &str = "gemini-1.5-flash";

/// Upper bound for one generative-model round trip.
pub const FEEDBACK_TIMEOUT_MS: u64 = 20_000;

/// Highest band score.
pub const MAX_SCORE: f64 = 9.0;

/// Lowest band score.
pub const MIN_SCORE: f64 = 0.0;

/// Fluency starting point before feature adjustments.
pub const FLUENCY_BASELINE: f64 = 7.0;

/// Pronunciation placeholder when AI pronunciation commentary was obtained.
pub const PRONUNCIATION_WITH_COMMENTARY: f64 = 7.5;

/// Pronunciation placeholder without AI commentary.
pub const PRONUNCIATION_BASELINE: f64 = 7.0;

/// Articulation rate band (words per minute of actual speech) considered natural.
pub const ARTICULATION_RATE_RANGE: (f64, f64) = (120.0, 180.0);

/// Floor for speaking time (seconds) when computing articulation rate.
pub const MIN_SPEAKING_SECONDS: f64 = 0.1;

/// Filler words and phrases, lowercase.
pub const FILLER_WORDS: &[&str] = &["um", "uh", "like", "you know", "sort of"];

/// Part identifier used for single practice responses.
pub const PRACTICE_PART: &str = "practice";

/// Clamp a score into the band range. NaN is mapped to the minimum.
pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        return MIN_SCORE;
    }
    score.clamp(MIN_SCORE, MAX_SCORE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comma_gap_below_period_gap() {
        assert!(COMMA_GAP_MS < PERIOD_GAP_MS);
    }

    #[test]
    fn clamp_score_bounds() {
        assert_eq!(clamp_score(12.0), 9.0);
        assert_eq!(clamp_score(-3.0), 0.0);
        assert_eq!(clamp_score(6.5), 6.5);
        assert_eq!(clamp_score(f64::NAN), 0.0);
        assert_eq!(clamp_score(f64::INFINITY), 9.0);
    }

    #[test]
    fn filler_words_are_lowercase() {
        for filler in FILLER_WORDS {
            assert_eq!(*filler, filler.to_lowercase());
        }
    }
}
