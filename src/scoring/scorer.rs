//! Deterministic scoring from transcript statistics, token tags and timing.

use crate::analysis::{PartOfSpeech, Token};
use crate::defaults::{self, clamp_score};
use crate::error::{Result, SpeakscoreError};
use crate::report::{Correction, ScoreSet};
use crate::scoring::features::{TextFeatures, TimingData, TimingMetrics};
use crate::scoring::rules;
use tracing::debug;

/// Everything the deterministic path knows about one response.
#[derive(Debug, Clone, PartialEq)]
pub struct DeterministicAssessment {
    pub features: TextFeatures,
    pub timing: Option<TimingMetrics>,
    /// Pronunciation holds the no-commentary placeholder here.
    pub scores: ScoreSet,
    pub corrections: Vec<Correction>,
    pub suggestions: Vec<String>,
}

/// Stateless scorer; no randomness, same inputs give the same scores.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeterministicScorer;

impl DeterministicScorer {
    pub fn new() -> Self {
        Self
    }

    /// Score one response.
    ///
    /// Fails with `EmptyResponse` when the transcript has no words, before
    /// any division by the word count.
    pub fn assess(
        &self,
        transcript: &str,
        tokens: &[Token],
        timing: Option<&TimingData>,
    ) -> Result<DeterministicAssessment> {
        let features = TextFeatures::from_text(transcript)?;
        if features.word_count == 0 {
            return Err(SpeakscoreError::EmptyResponse);
        }
        let timing = timing.and_then(|t| TimingMetrics::compute(features.word_count, t));

        let scores = ScoreSet::new(
            fluency_score(&features, timing.as_ref()),
            grammar_score(tokens, features.word_count),
            vocabulary_score(tokens, features.word_count),
            pronunciation_score(false),
        );
        debug!(
            words = features.word_count,
            sentences = features.sentence_count,
            fillers = features.filler_count,
            fluency = scores.fluency,
            grammar = scores.grammar,
            vocabulary = scores.vocabulary,
            "deterministic scores"
        );

        Ok(DeterministicAssessment {
            corrections: rules::token_rule_corrections(tokens),
            suggestions: rules::feature_suggestions(&features, timing.as_ref()),
            features,
            timing,
            scores,
        })
    }
}

fn pause_penalty(pause_ratio: f64) -> f64 {
    if pause_ratio < 0.1 {
        0.0
    } else if pause_ratio < 0.2 {
        0.5
    } else if pause_ratio < 0.3 {
        1.0
    } else {
        2.0
    }
}

/// Fluency before blending, clamped to `[0, 9]`.
///
/// Timing terms apply only when timing metrics are available.
pub fn fluency_score(features: &TextFeatures, timing: Option<&TimingMetrics>) -> f64 {
    let mut score = defaults::FLUENCY_BASELINE;

    score += (features.avg_sentence_length / 10.0).min(2.0);
    score -= 0.25 * features.filler_count as f64;
    score += if features.sentence_count > 1 { 1.0 } else { 0.5 };

    if let Some(timing) = timing {
        score -= pause_penalty(timing.pause_ratio);
        let (low, high) = defaults::ARTICULATION_RATE_RANGE;
        score += if (low..=high).contains(&timing.articulation_rate) {
            1.0
        } else {
            -1.0
        };
    }

    if features.lexical_diversity > 0.4 {
        score += 0.5;
        if features.lexical_diversity > 0.6 {
            score += 0.5;
        }
    }

    clamp_score(score)
}

fn tag_fraction(tokens: &[Token], word_count: usize, predicate: impl Fn(PartOfSpeech) -> bool) -> f64 {
    if word_count == 0 {
        return 0.0;
    }
    let count = tokens
        .iter()
        .filter(|t| predicate(t.part_of_speech))
        .count();
    count as f64 / word_count as f64
}

/// Penalizes the share of unclassifiable tokens.
pub fn grammar_score(tokens: &[Token], word_count: usize) -> f64 {
    clamp_score(9.0 - tag_fraction(tokens, word_count, |tag| tag == PartOfSpeech::X) * 8.0)
}

/// Rewards the share of adjectives and adverbs.
pub fn vocabulary_score(tokens: &[Token], word_count: usize) -> f64 {
    clamp_score(6.0 + tag_fraction(tokens, word_count, |tag| tag.is_descriptive()) * 3.0)
}

/// Placeholder signal; no acoustic analysis is performed.
pub fn pronunciation_score(has_ai_commentary: bool) -> f64 {
    if has_ai_commentary {
        defaults::PRONUNCIATION_WITH_COMMENTARY
    } else {
        defaults::PRONUNCIATION_BASELINE
    }
}
