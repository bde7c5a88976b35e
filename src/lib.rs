//! speakscore - IELTS-style speaking practice scorer
//!
//! Assembles punctuated transcripts from live speech recognition and scores
//! them with deterministic heuristics blended with generative-model feedback.

// Enforce error handling discipline
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod analysis;
#[cfg(feature = "cli")]
pub mod app;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod feedback;
#[cfg(feature = "cli")]
pub mod output;
pub mod report;
pub mod scoring;
pub mod transcript;

// Collaborator traits (analyzer → scorer → model)
pub use analysis::{MockAnalyzer, PartOfSpeech, SyntaxAnalyzer, Token};
pub use feedback::{FeedbackModel, MockFeedbackModel};

// Pipeline
pub use feedback::{
    AIFeedbackBlender, FeedbackAggregator, FeedbackSubmission, ResponseOutcome, ResponseRequest,
    TestResult, TestSubmission,
};
pub use report::{Correction, FeedbackReport, ScoreSet};
pub use scoring::{DeterministicScorer, TimingData};
pub use transcript::{RecognitionFragment, RecordedTranscript, Recorder, TranscriptAssembler};

// Error handling
pub use error::{Result, SpeakscoreError};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_string_starts_with_cargo_version() {
        let ver = version_string();
        assert!(
            ver.starts_with(env!("CARGO_PKG_VERSION")),
            "version_string should start with CARGO_PKG_VERSION, got: {}",
            ver
        );
    }

    #[test]
    fn version_string_has_hash_only_when_built_from_git() {
        let ver = version_string();
        match option_env!("GIT_HASH").filter(|h| !h.is_empty()) {
            Some(hash) => assert_eq!(ver, format!("{}+{}", env!("CARGO_PKG_VERSION"), hash)),
            None => assert_eq!(ver, env!("CARGO_PKG_VERSION")),
        }
    }
}
