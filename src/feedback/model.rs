use crate::error::{Result, SpeakscoreError};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Trait for generative text models (prompt in, free text out).
///
/// This trait allows swapping implementations (hosted model vs mock).
#[async_trait]
pub trait FeedbackModel: Send + Sync {
    /// Generate a completion for `prompt`.
    ///
    /// Fails with `AiUnavailable` on any transport or model failure.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Return the name of this model for logging.
    fn name(&self) -> &str;
}

/// Implement FeedbackModel for Arc<T> to allow sharing across requests.
#[async_trait]
impl<T: FeedbackModel + ?Sized> FeedbackModel for Arc<T> {
    async fn generate(&self, prompt: &str) -> Result<String> {
        (**self).generate(prompt).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

pub(crate) fn unavailable(message: impl Into<String>) -> SpeakscoreError {
    SpeakscoreError::AiUnavailable {
        message: message.into(),
    }
}

/// Mock model for tests and offline use.
///
/// Answers with the first reply whose needle occurs in the prompt, or the
/// default reply. Every prompt received is recorded.
#[derive(Debug, Clone, Default)]
pub struct MockFeedbackModel {
    default_reply: String,
    replies: Vec<(String, String)>,
    delay: Option<Duration>,
    should_fail: bool,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockFeedbackModel {
    pub fn new(default_reply: impl Into<String>) -> Self {
        Self {
            default_reply: default_reply.into(),
            ..Self::default()
        }
    }

    /// Reply with `reply` to any prompt containing `needle`.
    pub fn with_reply_for(mut self, needle: impl Into<String>, reply: impl Into<String>) -> Self {
        self.replies.push((needle.into(), reply.into()));
        self
    }

    /// Sleep before answering, to exercise timeouts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Configure the mock to fail on generate
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Prompts received so far, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|prompts| prompts.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl FeedbackModel for MockFeedbackModel {
    async fn generate(&self, prompt: &str) -> Result<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.should_fail {
            return Err(unavailable("mock model failure"));
        }

        let reply = self
            .replies
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, reply)| reply)
            .unwrap_or(&self.default_reply);
        Ok(reply.clone())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
