//! Syntax analysis through the Google Natural Language API.

use crate::analysis::analyzer::{SyntaxAnalyzer, parse_syntax_response};
use crate::analysis::token::Token;
use crate::config::AnalyzerConfig;
use crate::error::{Result, SpeakscoreError};
use async_trait::async_trait;
use tracing::debug;

/// Client for `documents:analyzeSyntax`.
#[derive(Debug, Clone)]
pub struct GoogleSyntaxAnalyzer {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl GoogleSyntaxAnalyzer {
    /// Build a client from config. Requires `analyzer.api_key`.
    pub fn new(config: &AnalyzerConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| SpeakscoreError::ConfigInvalidValue {
                key: "analyzer.api_key".to_string(),
                message: "required for the Natural Language API".to_string(),
            })?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| SpeakscoreError::Other(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key,
        })
    }

    /// Request body for one plain-text document.
    pub fn request_body(text: &str) -> serde_json::Value {
        serde_json::json!({
            "document": {
                "type": "PLAIN_TEXT",
                "content": text,
            },
            "encodingType": "UTF8",
        })
    }
}

fn transport(message: String) -> SpeakscoreError {
    SpeakscoreError::AnalysisFailure { message }
}

#[async_trait]
impl SyntaxAnalyzer for GoogleSyntaxAnalyzer {
    async fn analyze(&self, text: &str) -> Result<Vec<Token>> {
        debug!(endpoint = %self.endpoint, chars = text.len(), "requesting syntax analysis");

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .body(Self::request_body(text).to_string())
            .send()
            .await
            .map_err(|e| transport(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(transport(format!("service returned {status}: {body}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| transport(format!("failed to read response: {e}")))?;

        parse_syntax_response(&body)
    }

    fn name(&self) -> &str {
        "google-nl"
    }
}
