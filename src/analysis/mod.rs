//! Syntax analysis: tokens tagged by an external part-of-speech tagger.

pub mod analyzer;
#[cfg(feature = "http")]
pub mod google;
pub mod token;

pub use analyzer::{MockAnalyzer, SyntaxAnalyzer, parse_syntax_response};
#[cfg(feature = "http")]
pub use google::GoogleSyntaxAnalyzer;
pub use token::{PartOfSpeech, Token};
