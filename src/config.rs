use crate::defaults;
use crate::error::{Result, SpeakscoreError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub transcript: TranscriptConfig,
    pub analyzer: AnalyzerConfig,
    pub feedback: FeedbackConfig,
}

/// Silence-driven punctuation configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TranscriptConfig {
    pub comma_gap_ms: u64,
    pub period_gap_ms: u64,
    pub silence_timeout_ms: u64,
}

/// Syntax-analysis service configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub timeout_ms: u64,
}

/// Generative feedback model configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FeedbackConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout_ms: u64,
    /// Also request word-by-word pronunciation commentary.
    pub pronunciation_feedback: bool,
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        Self {
            comma_gap_ms: defaults::COMMA_GAP_MS,
            period_gap_ms: defaults::PERIOD_GAP_MS,
            silence_timeout_ms: defaults::SILENCE_TIMEOUT_MS,
        }
    }
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::ANALYZER_ENDPOINT.to_string(),
            api_key: None,
            timeout_ms: defaults::ANALYZER_TIMEOUT_MS,
        }
    }
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::FEEDBACK_ENDPOINT.to_string(),
            model: defaults::FEEDBACK_MODEL.to_string(),
            api_key: None,
            timeout_ms: defaults::FEEDBACK_TIMEOUT_MS,
            pronunciation_feedback: true,
        }
    }
}

impl TranscriptConfig {
    pub fn comma_gap(&self) -> Duration {
        Duration::from_millis(self.comma_gap_ms)
    }

    pub fn period_gap(&self) -> Duration {
        Duration::from_millis(self.period_gap_ms)
    }

    pub fn silence_timeout(&self) -> Duration {
        Duration::from_millis(self.silence_timeout_ms)
    }
}

impl AnalyzerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl FeedbackConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// First non-empty value among the given environment variables.
fn first_env(keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| std::env::var(key).ok())
        .find(|value| !value.is_empty())
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if the file doesn't exist
    ///
    /// Invalid TOML and other I/O failures are still reported.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(SpeakscoreError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - SPEAKSCORE_ANALYZER_KEY, GOOGLE_CLOUD_KEY → analyzer.api_key
    /// - SPEAKSCORE_MODEL_KEY, GEMINI_API_KEY → feedback.api_key
    /// - SPEAKSCORE_MODEL → feedback.model
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(key) = first_env(&["SPEAKSCORE_ANALYZER_KEY", "GOOGLE_CLOUD_KEY"]) {
            self.analyzer.api_key = Some(key);
        }

        if let Some(key) = first_env(&["SPEAKSCORE_MODEL_KEY", "GEMINI_API_KEY"]) {
            self.feedback.api_key = Some(key);
        }

        if let Some(model) = first_env(&["SPEAKSCORE_MODEL"]) {
            self.feedback.model = model;
        }

        self
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        let transcript = &self.transcript;
        if transcript.comma_gap_ms >= transcript.period_gap_ms {
            return Err(SpeakscoreError::ConfigInvalidValue {
                key: "transcript.comma_gap_ms".to_string(),
                message: format!(
                    "must be below period_gap_ms ({})",
                    transcript.period_gap_ms
                ),
            });
        }

        let timeouts = [
            ("transcript.silence_timeout_ms", transcript.silence_timeout_ms),
            ("analyzer.timeout_ms", self.analyzer.timeout_ms),
            ("feedback.timeout_ms", self.feedback.timeout_ms),
        ];
        for (key, value) in timeouts {
            if value == 0 {
                return Err(SpeakscoreError::ConfigInvalidValue {
                    key: key.to_string(),
                    message: "must be greater than zero".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/speakscore/config.toml on Linux
    pub fn default_path() -> Result<PathBuf> {
        let dir = dirs::config_dir()
            .ok_or_else(|| SpeakscoreError::Other("Could not determine config directory".into()))?;
        Ok(dir.join("speakscore").join("config.toml"))
    }
}
