//! Generative feedback through the Gemini `generateContent` API.

use crate::config::FeedbackConfig;
use crate::error::{Result, SpeakscoreError};
use crate::feedback::model::{FeedbackModel, unavailable};
use async_trait::async_trait;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct GeminiFeedbackModel {
    client: reqwest::Client,
    url: String,
    model: String,
    api_key: String,
}

impl GeminiFeedbackModel {
    /// Build a client from config. Requires `feedback.api_key`.
    pub fn new(config: &FeedbackConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| SpeakscoreError::ConfigInvalidValue {
                key: "feedback.api_key".to_string(),
                message: "required for the generative model".to_string(),
            })?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| SpeakscoreError::Other(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: generate_url(&config.endpoint, &config.model),
            model: config.model.clone(),
            api_key,
        })
    }

    pub fn request_body(prompt: &str) -> serde_json::Value {
        serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
        })
    }
}

fn generate_url(endpoint: &str, model: &str) -> String {
    format!(
        "{}/models/{}:generateContent",
        endpoint.trim_end_matches('/'),
        model
    )
}

/// Text of the first candidate's first part.
pub fn parse_generate_response(body: &str) -> Result<String> {
    let json: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| unavailable(format!("response is not JSON: {e}")))?;

    json.pointer("/candidates/0/content/parts/0/text")
        .and_then(|text| text.as_str())
        .map(str::to_string)
        .ok_or_else(|| unavailable("response has no candidate text"))
}

#[async_trait]
impl FeedbackModel for GeminiFeedbackModel {
    async fn generate(&self, prompt: &str) -> Result<String> {
        debug!(model = %self.model, chars = prompt.len(), "requesting model feedback");

        let response = self
            .client
            .post(&self.url)
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .body(Self::request_body(prompt).to_string())
            .send()
            .await
            .map_err(|e| unavailable(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(unavailable(format!("model returned {status}: {body}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| unavailable(format!("failed to read response: {e}")))?;

        parse_generate_response(&body)
    }

    fn name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyed() -> FeedbackConfig {
        FeedbackConfig {
            api_key: Some("key".into()),
            ..FeedbackConfig::default()
        }
    }

    #[test]
    fn test_url_from_endpoint_and_model() {
        let model = GeminiFeedbackModel::new(&keyed()).unwrap();
        assert_eq!(
            model.url,
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
        );
        assert_eq!(generate_url("http://x/", "m"), "http://x/models/m:generateContent");
        assert_eq!(model.name(), "gemini-1.5-flash");
    }

    #[test]
    fn test_new_requires_api_key() {
        let err = GeminiFeedbackModel::new(&FeedbackConfig::default()).unwrap_err();
        assert!(err.to_string().contains("feedback.api_key"));
    }

    #[test]
    fn test_request_body_shape() {
        let body = GeminiFeedbackModel::request_body("rate this");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "rate this");
    }

    #[test]
    fn test_parse_candidate_text() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"Fluency Score: 8/9"}],"role":"model"}}]}"#;
        assert_eq!(parse_generate_response(body).unwrap(), "Fluency Score: 8/9");
    }

    #[test]
    fn test_parse_without_candidates_is_unavailable() {
        for body in [r#"{"candidates":[]}"#, r#"{"error":{"code":400}}"#, "not json"] {
            let err = parse_generate_response(body).unwrap_err();
            assert!(matches!(err, SpeakscoreError::AiUnavailable { .. }));
        }
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_unavailable() {
        let config = FeedbackConfig {
            endpoint: "http://127.0.0.1:9".into(),
            timeout_ms: 500,
            ..keyed()
        };
        let model = GeminiFeedbackModel::new(&config).unwrap();
        let err = model.generate("hello").await.unwrap_err();
        assert!(matches!(err, SpeakscoreError::AiUnavailable { .. }));
    }
}
