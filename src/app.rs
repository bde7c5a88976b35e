//! Composition root: builds collaborators from config and runs CLI flows.

use crate::analysis::{MockAnalyzer, SyntaxAnalyzer};
use crate::config::{Config, TranscriptConfig};
use crate::error::{Result, SpeakscoreError};
use crate::feedback::{FeedbackAggregator, FeedbackModel, MockFeedbackModel};
use crate::transcript::{RecognitionFragment, RecordedTranscript, Recorder};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Set to `1` or `true` to score with mock collaborators only.
pub const OFFLINE_ENV: &str = "SPEAKSCORE_OFFLINE";

/// Extra wait after the last replayed fragment so a trailing silence timer
/// can fire before the session is stopped.
const REPLAY_SETTLE: Duration = Duration::from_millis(50);

pub fn offline_requested() -> bool {
    std::env::var(OFFLINE_ENV)
        .map(|value| matches!(value.trim(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Load configuration from file or use defaults.
///
/// Priority order:
/// 1. Custom config path from CLI (--config), which must exist
/// 2. Default config path (~/.config/speakscore/config.toml)
/// 3. Built-in defaults
///
/// Environment overrides and the CLI timeout are applied on top, then the
/// result is validated.
pub fn load_config(custom_path: Option<&Path>, timeout: Option<Duration>) -> Result<Config> {
    let config = match custom_path {
        Some(path) if !path.exists() => {
            return Err(SpeakscoreError::ConfigFileNotFound {
                path: path.display().to_string(),
            });
        }
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(&Config::default_path()?)?,
    };

    let mut config = config.with_env_overrides();
    if let Some(timeout) = timeout {
        let millis = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        config.analyzer.timeout_ms = millis;
        config.feedback.timeout_ms = millis;
    }
    config.validate()?;
    Ok(config)
}

fn has_key(key: &Option<String>) -> bool {
    key.as_deref().is_some_and(|k| !k.is_empty())
}

/// Remote analyzer when a key is configured, otherwise the mock.
pub fn build_analyzer(config: &Config, offline: bool) -> Result<Arc<dyn SyntaxAnalyzer>> {
    if offline || !has_key(&config.analyzer.api_key) {
        info!("no analyzer key or offline mode, using mock analyzer");
        return Ok(Arc::new(MockAnalyzer::new()));
    }

    #[cfg(feature = "http")]
    {
        Ok(Arc::new(crate::analysis::GoogleSyntaxAnalyzer::new(
            &config.analyzer,
        )?))
    }
    #[cfg(not(feature = "http"))]
    {
        warn!("built without the http feature, using mock analyzer");
        Ok(Arc::new(MockAnalyzer::new()))
    }
}

/// Remote model when a key is configured, otherwise a mock that never
/// states a score, so only deterministic scores are reported.
pub fn build_model(config: &Config, offline: bool) -> Result<Arc<dyn FeedbackModel>> {
    if offline || !has_key(&config.feedback.api_key) {
        info!("no model key or offline mode, AI feedback disabled");
        return Ok(Arc::new(MockFeedbackModel::new("")));
    }

    #[cfg(feature = "http")]
    {
        Ok(Arc::new(crate::feedback::GeminiFeedbackModel::new(
            &config.feedback,
        )?))
    }
    #[cfg(not(feature = "http"))]
    {
        warn!("built without the http feature, AI feedback disabled");
        Ok(Arc::new(MockFeedbackModel::new("")))
    }
}

/// Aggregator wired from config. Pronunciation commentary is only requested
/// from a real model.
pub fn build_aggregator(config: &Config, offline: bool) -> Result<FeedbackAggregator> {
    let mut config = config.clone();
    if offline || !has_key(&config.feedback.api_key) {
        config.feedback.pronunciation_feedback = false;
    }
    Ok(FeedbackAggregator::from_config(
        build_analyzer(&config, offline)?,
        build_model(&config, offline)?,
        &config,
    ))
}

/// Read a file, or stdin for `-`.
pub fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut input = String::new();
        std::io::stdin().read_to_string(&mut input)?;
        return Ok(input);
    }
    Ok(std::fs::read_to_string(path)?)
}

/// One line of a replay file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReplayFragment {
    pub text: String,
    #[serde(default)]
    pub is_final: bool,
    /// Milliseconds since the start of the recording.
    #[serde(default)]
    pub offset_ms: u64,
}

/// Parse JSON-lines replay input. Blank lines are skipped and offsets must
/// not decrease.
pub fn parse_replay(input: &str) -> Result<Vec<ReplayFragment>> {
    let mut fragments: Vec<ReplayFragment> = Vec::new();

    for (index, line) in input.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let fragment: ReplayFragment = serde_json::from_str(line)
            .map_err(|e| SpeakscoreError::Other(format!("replay line {}: {e}", index + 1)))?;
        if let Some(previous) = fragments.last()
            && fragment.offset_ms < previous.offset_ms
        {
            return Err(SpeakscoreError::Other(format!(
                "replay line {}: offset {}ms is before the previous fragment ({}ms)",
                index + 1,
                fragment.offset_ms,
                previous.offset_ms
            )));
        }
        fragments.push(fragment);
    }

    Ok(fragments)
}

/// Feed `fragments` through a live recording session at their offsets.
pub async fn replay(
    config: &TranscriptConfig,
    fragments: &[ReplayFragment],
) -> Result<RecordedTranscript> {
    let mut recorder = Recorder::new(config.clone());
    let sender = recorder.start();
    let base = tokio::time::Instant::now();

    for fragment in fragments {
        tokio::time::sleep_until(base + Duration::from_millis(fragment.offset_ms)).await;
        let now = tokio::time::Instant::now().into_std();
        let fragment = if fragment.is_final {
            RecognitionFragment::final_result(fragment.text.clone(), now)
        } else {
            RecognitionFragment::interim(fragment.text.clone(), now)
        };
        if sender.send(fragment).await.is_err() {
            warn!("recording session ended before replay finished");
            break;
        }
    }

    debug!(fragments = fragments.len(), "replay sent, waiting for silence");
    tokio::time::sleep(config.silence_timeout() + REPLAY_SETTLE).await;
    recorder.stop().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    // SAFETY: only called with ENV_LOCK held.
    fn set_env(key: &str, value: &str) {
        unsafe { std::env::set_var(key, value) }
    }

    fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) }
    }

    fn fragment(text: &str, is_final: bool, offset_ms: u64) -> ReplayFragment {
        ReplayFragment {
            text: text.to_string(),
            is_final,
            offset_ms,
        }
    }

    #[test]
    fn test_offline_flag_values() {
        let _lock = ENV_LOCK.lock().unwrap();
        remove_env(OFFLINE_ENV);
        assert!(!offline_requested());
        set_env(OFFLINE_ENV, "1");
        assert!(offline_requested());
        set_env(OFFLINE_ENV, "0");
        assert!(!offline_requested());
        remove_env(OFFLINE_ENV);
    }

    #[test]
    fn test_load_config_missing_custom_path_fails() {
        let err = load_config(Some(Path::new("/nonexistent/speakscore.toml")), None).unwrap_err();
        assert!(matches!(err, SpeakscoreError::ConfigFileNotFound { .. }));
    }

    #[test]
    fn test_load_config_applies_timeout_and_validates() {
        let _lock = ENV_LOCK.lock().unwrap();
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[analyzer]\ntimeout_ms = 100").unwrap();

        let config = load_config(Some(file.path()), Some(Duration::from_secs(2))).unwrap();
        assert_eq!(config.analyzer.timeout_ms, 2000);
        assert_eq!(config.feedback.timeout_ms, 2000);

        let mut bad = NamedTempFile::new().unwrap();
        writeln!(bad, "[transcript]\ncomma_gap_ms = 2000").unwrap();
        assert!(load_config(Some(bad.path()), None).is_err());
    }

    #[tokio::test]
    async fn test_offline_collaborators_are_mocks() {
        let mut config = Config::default();
        config.analyzer.api_key = Some("key".into());
        config.feedback.api_key = Some("key".into());

        let analyzer = build_analyzer(&config, true).unwrap();
        assert_eq!(analyzer.name(), "mock");
        let model = build_model(&config, true).unwrap();
        assert_eq!(model.name(), "mock");

        let analyzer = build_analyzer(&Config::default(), false).unwrap();
        assert_eq!(analyzer.name(), "mock");
    }

    #[tokio::test]
    async fn test_offline_aggregator_reports_deterministic_scores() {
        let aggregator = build_aggregator(&Config::default(), true).unwrap();
        let report = aggregator
            .score_response(&crate::feedback::ResponseRequest::new(
                "practice",
                "I enjoy reading books. They relax me.",
            ))
            .await
            .unwrap();
        assert_eq!(report.ai_corrections().count(), 0);
        assert_eq!(report.scores.pronunciation, 7.0);
    }

    #[test]
    fn test_parse_replay_lines() {
        let input = r#"
{"text": "hel", "is_final": false, "offset_ms": 0}
{"text": "hello", "is_final": true, "offset_ms": 200}

{"text": "world", "is_final": true, "offset_ms": 1200}
"#;
        let fragments = parse_replay(input).unwrap();
        assert_eq!(
            fragments,
            vec![
                fragment("hel", false, 0),
                fragment("hello", true, 200),
                fragment("world", true, 1200),
            ]
        );
    }

    #[test]
    fn test_parse_replay_rejects_bad_lines() {
        let err = parse_replay("{\"text\": \"a\"}\nnot json").unwrap_err();
        assert!(err.to_string().contains("line 2"));

        let err = parse_replay(
            "{\"text\": \"a\", \"offset_ms\": 500}\n{\"text\": \"b\", \"offset_ms\": 100}",
        )
        .unwrap_err();
        assert!(err.to_string().contains("before the previous fragment"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_replay_punctuates_by_silence() {
        let fragments = vec![
            fragment("hello", true, 0),
            fragment("world", true, 1000),
            fragment("done", true, 3000),
        ];
        let recorded = replay(&TranscriptConfig::default(), &fragments)
            .await
            .unwrap();

        assert_eq!(recorded.text, "hello, world. done.");
        assert!(recorded.timing.duration_seconds >= 4.5);
        assert!(recorded.timing.pause_duration_seconds >= 3.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_replay_keeps_trailing_interim() {
        let fragments = vec![fragment("good", true, 0), fragment("morn", false, 100)];
        let recorded = replay(&TranscriptConfig::default(), &fragments)
            .await
            .unwrap();
        assert_eq!(recorded.text, "good. morn");
    }
}
