//! Deterministic token-rule corrections and timing/feature suggestions.

use crate::analysis::{PartOfSpeech, Token};
use crate::defaults;
use crate::report::Correction;
use crate::scoring::features::{TextFeatures, TimingMetrics};

/// Pause ratio above which a suggestion about long pauses is given.
const HIGH_PAUSE_RATIO: f64 = 0.2;

/// Scan tokens in order and flag known problem patterns.
///
/// - `PRON` "them": possibly meant "their"
/// - `ADP` directly followed by `DET` "the": awkward phrase
/// - every `X` token: unclear word
pub fn token_rule_corrections(tokens: &[Token]) -> Vec<Correction> {
    let mut corrections = Vec::new();

    for (index, token) in tokens.iter().enumerate() {
        match token.part_of_speech {
            PartOfSpeech::Pron if token.is_word("them") => {
                corrections.push(Correction::token_rule(format!(
                    "Consider 'their' instead of '{}'",
                    token.text
                )));
            }
            PartOfSpeech::Adp => {
                if let Some(next) = tokens.get(index + 1)
                    && next.part_of_speech == PartOfSpeech::Det
                    && next.is_word("the")
                {
                    corrections.push(Correction::token_rule(format!(
                        "Awkward phrase: '{} {}'",
                        token.text, next.text
                    )));
                }
            }
            PartOfSpeech::X => {
                corrections.push(Correction::token_rule(format!(
                    "Unclear word: '{}'",
                    token.text
                )));
            }
            _ => {}
        }
    }

    corrections
}

/// Plain-language suggestions from the same statistics the fluency score uses.
pub fn feature_suggestions(features: &TextFeatures, timing: Option<&TimingMetrics>) -> Vec<String> {
    let mut suggestions = Vec::new();

    if features.filler_count > 0 {
        suggestions.push(format!(
            "You used {} filler word{} (um, uh, like, you know, sort of); try pausing briefly instead.",
            features.filler_count,
            if features.filler_count == 1 { "" } else { "s" }
        ));
    }

    if features.sentence_count <= 1 {
        suggestions.push(
            "Develop your answer over several sentences to show range and coherence.".to_string(),
        );
    }

    if let Some(timing) = timing {
        if timing.pause_ratio >= HIGH_PAUSE_RATIO {
            suggestions.push(format!(
                "Pauses took {:.0}% of your answer; aim for fewer, shorter hesitations.",
                timing.pause_ratio * 100.0
            ));
        }

        let (low, high) = defaults::ARTICULATION_RATE_RANGE;
        if timing.articulation_rate < low {
            suggestions.push(format!(
                "Your pace was {:.0} words per minute; a natural pace is {low:.0}-{high:.0}.",
                timing.articulation_rate
            ));
        } else if timing.articulation_rate > high {
            suggestions.push(format!(
                "Your pace was {:.0} words per minute; slow down slightly for clarity ({low:.0}-{high:.0} is natural).",
                timing.articulation_rate
            ));
        }
    }

    suggestions
}
