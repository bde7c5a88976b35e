//! Scores, corrections and the per-response feedback report.

use crate::analysis::Token;
use crate::defaults::clamp_score;
use serde::{Deserialize, Serialize};

/// Band scores, each in `[0, 9]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreSet {
    pub fluency: f64,
    pub grammar: f64,
    pub vocabulary: f64,
    pub pronunciation: f64,
}

impl ScoreSet {
    /// Builds a score set, clamping every value into the band range.
    pub fn new(fluency: f64, grammar: f64, vocabulary: f64, pronunciation: f64) -> Self {
        Self {
            fluency: clamp_score(fluency),
            grammar: clamp_score(grammar),
            vocabulary: clamp_score(vocabulary),
            pronunciation: clamp_score(pronunciation),
        }
    }

    /// Mean of the four scores.
    pub fn overall(&self) -> f64 {
        (self.fluency + self.grammar + self.vocabulary + self.pronunciation) / 4.0
    }

    pub fn with_fluency(self, fluency: f64) -> Self {
        Self {
            fluency: clamp_score(fluency),
            ..self
        }
    }

    pub fn with_pronunciation(self, pronunciation: f64) -> Self {
        Self {
            pronunciation: clamp_score(pronunciation),
            ..self
        }
    }

    pub fn values(&self) -> [f64; 4] {
        [
            self.fluency,
            self.grammar,
            self.vocabulary,
            self.pronunciation,
        ]
    }
}

/// A correction attached to a response, in the order it was produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum Correction {
    /// Deterministic rule over the tagged tokens.
    TokenRule { message: String },
    /// Commentary from the generative model.
    Ai { message: String },
}

impl Correction {
    pub fn token_rule(message: impl Into<String>) -> Self {
        Correction::TokenRule {
            message: message.into(),
        }
    }

    pub fn ai(message: impl Into<String>) -> Self {
        Correction::Ai {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Correction::TokenRule { message } | Correction::Ai { message } => message,
        }
    }

    pub fn is_ai(&self) -> bool {
        matches!(self, Correction::Ai { .. })
    }
}

/// Feedback for one submitted response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackReport {
    pub part: String,
    pub scores: ScoreSet,
    pub overall: f64,
    pub suggestions: Vec<String>,
    pub corrections: Vec<Correction>,
    pub tokens: Vec<Token>,
}

impl FeedbackReport {
    pub fn new(
        part: impl Into<String>,
        scores: ScoreSet,
        suggestions: Vec<String>,
        corrections: Vec<Correction>,
        tokens: Vec<Token>,
    ) -> Self {
        Self {
            part: part.into(),
            overall: scores.overall(),
            scores,
            suggestions,
            corrections,
            tokens,
        }
    }

    /// Corrections produced by the generative model.
    pub fn ai_corrections(&self) -> impl Iterator<Item = &Correction> {
        self.corrections.iter().filter(|c| c.is_ai())
    }
}
