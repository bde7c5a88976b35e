//! Tagged tokens produced by the syntax-analysis service.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coarse part-of-speech tag, as reported by the upstream tagger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PartOfSpeech {
    Noun,
    Verb,
    Adj,
    Adv,
    Pron,
    Adp,
    Det,
    Conj,
    Num,
    Prt,
    Punct,
    Affix,
    /// Unclassifiable token (foreign word, typo, misrecognition).
    X,
    #[serde(other)]
    Unknown,
}

impl PartOfSpeech {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartOfSpeech::Noun => "NOUN",
            PartOfSpeech::Verb => "VERB",
            PartOfSpeech::Adj => "ADJ",
            PartOfSpeech::Adv => "ADV",
            PartOfSpeech::Pron => "PRON",
            PartOfSpeech::Adp => "ADP",
            PartOfSpeech::Det => "DET",
            PartOfSpeech::Conj => "CONJ",
            PartOfSpeech::Num => "NUM",
            PartOfSpeech::Prt => "PRT",
            PartOfSpeech::Punct => "PUNCT",
            PartOfSpeech::Affix => "AFFIX",
            PartOfSpeech::X => "X",
            PartOfSpeech::Unknown => "UNKNOWN",
        }
    }

    /// Adjectives and adverbs.
    pub fn is_descriptive(&self) -> bool {
        matches!(self, PartOfSpeech::Adj | PartOfSpeech::Adv)
    }
}

impl fmt::Display for PartOfSpeech {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PartOfSpeech {
    type Err = std::convert::Infallible;

    /// Unrecognized tags map to `Unknown`; parsing never fails.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_uppercase().as_str() {
            "NOUN" => PartOfSpeech::Noun,
            "VERB" => PartOfSpeech::Verb,
            "ADJ" => PartOfSpeech::Adj,
            "ADV" => PartOfSpeech::Adv,
            "PRON" => PartOfSpeech::Pron,
            "ADP" => PartOfSpeech::Adp,
            "DET" => PartOfSpeech::Det,
            "CONJ" => PartOfSpeech::Conj,
            "NUM" => PartOfSpeech::Num,
            "PRT" => PartOfSpeech::Prt,
            "PUNCT" => PartOfSpeech::Punct,
            "AFFIX" => PartOfSpeech::Affix,
            "X" => PartOfSpeech::X,
            _ => PartOfSpeech::Unknown,
        })
    }
}

/// A word or punctuation unit with its tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub text: String,
    pub part_of_speech: PartOfSpeech,
}

impl Token {
    pub fn new(text: impl Into<String>, part_of_speech: PartOfSpeech) -> Self {
        Self {
            text: text.into(),
            part_of_speech,
        }
    }

    /// Whether the token text equals `word`, ignoring ASCII case.
    pub fn is_word(&self, word: &str) -> bool {
        self.text.eq_ignore_ascii_case(word)
    }
}
