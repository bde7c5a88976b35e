//! Error types for speakscore.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpeakscoreError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Failed to parse configuration: {message}")]
    ConfigParse { message: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Scoring errors
    /// Blank or whitespace-only transcript, or a transcript with no words.
    #[error("Response is empty")]
    EmptyResponse,

    /// The syntax-analysis service was unreachable or answered with garbage.
    #[error("Syntax analysis failed: {message}")]
    AnalysisFailure { message: String },

    /// The generative model failed or gave no usable score. Absorbed by the
    /// blender; callers never see it.
    #[error("AI feedback unavailable: {message}")]
    AiUnavailable { message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

impl SpeakscoreError {
    /// Short stable identifier used in serialized failure markers.
    pub fn kind(&self) -> &'static str {
        match self {
            SpeakscoreError::ConfigFileNotFound { .. }
            | SpeakscoreError::ConfigParse { .. }
            | SpeakscoreError::ConfigInvalidValue { .. }
            | SpeakscoreError::Config(_) => "config",
            SpeakscoreError::EmptyResponse => "empty_response",
            SpeakscoreError::AnalysisFailure { .. } => "analysis_failure",
            SpeakscoreError::AiUnavailable { .. } => "ai_unavailable",
            SpeakscoreError::Io(_) => "io",
            SpeakscoreError::Json(_) => "json",
            SpeakscoreError::Other(_) => "other",
        }
    }
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, SpeakscoreError>;
