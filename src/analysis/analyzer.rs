use crate::analysis::token::{PartOfSpeech, Token};
use crate::error::{Result, SpeakscoreError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Trait for syntax analysis (tokenization plus part-of-speech tagging).
///
/// This trait allows swapping implementations (remote tagger vs mock).
/// Implementations must preserve token order exactly as the upstream
/// service reports it.
#[async_trait]
pub trait SyntaxAnalyzer: Send + Sync {
    /// Tokenize and tag `text`.
    ///
    /// Fails with `AnalysisFailure` when the service is unreachable or its
    /// answer is malformed.
    async fn analyze(&self, text: &str) -> Result<Vec<Token>>;

    /// Return the name of this analyzer for logging.
    fn name(&self) -> &str;
}

/// Implement SyntaxAnalyzer for Arc<T> to allow sharing across pipelines.
#[async_trait]
impl<T: SyntaxAnalyzer + ?Sized> SyntaxAnalyzer for Arc<T> {
    async fn analyze(&self, text: &str) -> Result<Vec<Token>> {
        (**self).analyze(text).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

fn malformed(message: impl Into<String>) -> SpeakscoreError {
    SpeakscoreError::AnalysisFailure {
        message: message.into(),
    }
}

/// Project an `analyzeSyntax` JSON response onto the token sequence.
///
/// Expected shape: `{"tokens": [{"text": {"content": ".."}, "partOfSpeech": {"tag": ".."}}]}`.
/// A missing token list or a token without text is malformed; a missing
/// tag maps to `Unknown`.
pub fn parse_syntax_response(body: &str) -> Result<Vec<Token>> {
    let json: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| malformed(format!("response is not JSON: {e}")))?;

    let entries = json
        .get("tokens")
        .and_then(|v| v.as_array())
        .ok_or_else(|| malformed("response has no token list"))?;

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let text = entry
                .get("text")
                .and_then(|t| t.get("content"))
                .and_then(|c| c.as_str())
                .ok_or_else(|| malformed(format!("token {index} has no text")))?;
            let tag = entry
                .get("partOfSpeech")
                .and_then(|p| p.get("tag"))
                .and_then(|t| t.as_str())
                .map(|t| t.parse().unwrap_or(PartOfSpeech::Unknown))
                .unwrap_or(PartOfSpeech::Unknown);
            Ok(Token::new(text, tag))
        })
        .collect()
}

/// Tag a bare word without a tagger: punctuation, plain words, or X.
fn heuristic_tag(word: &str) -> PartOfSpeech {
    if word.chars().all(|c| c.is_ascii_punctuation()) {
        PartOfSpeech::Punct
    } else if word
        .trim_end_matches(|c: char| c.is_ascii_punctuation())
        .chars()
        .all(|c| c.is_alphabetic() || c == '\'' || c == '-')
    {
        PartOfSpeech::Noun
    } else {
        PartOfSpeech::X
    }
}

/// Mock analyzer for tests and offline use.
///
/// Splits on whitespace and tags each word from an explicit table, falling
/// back to a character-class heuristic.
#[derive(Debug, Clone, Default)]
pub struct MockAnalyzer {
    tags: HashMap<String, PartOfSpeech>,
    scripted: Option<Vec<Token>>,
    delay: Option<Duration>,
    should_fail: bool,
}

impl MockAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tag `word` (case-insensitive) with `tag`.
    pub fn with_tag(mut self, word: &str, tag: PartOfSpeech) -> Self {
        self.tags.insert(word.to_lowercase(), tag);
        self
    }

    /// Return exactly these tokens regardless of input.
    pub fn with_tokens(mut self, tokens: Vec<Token>) -> Self {
        self.scripted = Some(tokens);
        self
    }

    /// Sleep before answering, to exercise timeouts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Configure the mock to fail on analyze
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }
}

#[async_trait]
impl SyntaxAnalyzer for MockAnalyzer {
    async fn analyze(&self, text: &str) -> Result<Vec<Token>> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.should_fail {
            return Err(malformed("mock analysis failure"));
        }
        if let Some(tokens) = &self.scripted {
            return Ok(tokens.clone());
        }

        Ok(text
            .split_whitespace()
            .map(|word| {
                let key = word
                    .trim_matches(|c: char| c.is_ascii_punctuation())
                    .to_lowercase();
                let tag = self
                    .tags
                    .get(&key)
                    .copied()
                    .unwrap_or_else(|| heuristic_tag(word));
                Token::new(word, tag)
            })
            .collect())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RESPONSE: &str = r#"{
        "sentences": [{"text": {"content": "I love them.", "beginOffset": 0}}],
        "tokens": [
            {"text": {"content": "I", "beginOffset": 0}, "partOfSpeech": {"tag": "PRON", "number": "SINGULAR"}},
            {"text": {"content": "love", "beginOffset": 2}, "partOfSpeech": {"tag": "VERB"}},
            {"text": {"content": "them", "beginOffset": 7}, "partOfSpeech": {"tag": "PRON"}},
            {"text": {"content": ".", "beginOffset": 11}, "partOfSpeech": {"tag": "PUNCT"}}
        ],
        "language": "en"
    }"#;

    #[test]
    fn test_parse_preserves_order_and_tags() {
        let tokens = parse_syntax_response(SAMPLE_RESPONSE).unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::new("I", PartOfSpeech::Pron),
                Token::new("love", PartOfSpeech::Verb),
                Token::new("them", PartOfSpeech::Pron),
                Token::new(".", PartOfSpeech::Punct),
            ]
        );
    }

    #[test]
    fn test_parse_missing_token_list_fails() {
        let err = parse_syntax_response(r#"{"sentences": []}"#).unwrap_err();
        assert!(matches!(err, SpeakscoreError::AnalysisFailure { .. }));
        assert!(err.to_string().contains("no token list"));
    }

    #[test]
    fn test_parse_non_json_fails() {
        let err = parse_syntax_response("<html>502</html>").unwrap_err();
        assert!(matches!(err, SpeakscoreError::AnalysisFailure { .. }));
    }

    #[test]
    fn test_parse_token_without_text_fails() {
        let body = r#"{"tokens": [{"partOfSpeech": {"tag": "NOUN"}}]}"#;
        let err = parse_syntax_response(body).unwrap_err();
        assert!(err.to_string().contains("token 0"));
    }

    #[test]
    fn test_parse_missing_tag_is_unknown() {
        let body = r#"{"tokens": [{"text": {"content": "hmm"}}]}"#;
        let tokens = parse_syntax_response(body).unwrap();
        assert_eq!(tokens, vec![Token::new("hmm", PartOfSpeech::Unknown)]);
    }

    #[test]
    fn test_parse_empty_token_list() {
        let tokens = parse_syntax_response(r#"{"tokens": []}"#).unwrap();
        assert!(tokens.is_empty());
    }

    #[tokio::test]
    async fn test_mock_uses_tag_table_then_heuristic() {
        let analyzer = MockAnalyzer::new()
            .with_tag("quickly", PartOfSpeech::Adv)
            .with_tag("the", PartOfSpeech::Det);

        let tokens = analyzer.analyze("The dog ran quickly. x7q !").await.unwrap();
        let tags: Vec<PartOfSpeech> = tokens.iter().map(|t| t.part_of_speech).collect();
        assert_eq!(
            tags,
            vec![
                PartOfSpeech::Det,
                PartOfSpeech::Noun,
                PartOfSpeech::Noun,
                PartOfSpeech::Adv,
                PartOfSpeech::X,
                PartOfSpeech::Punct,
            ]
        );
        assert_eq!(tokens[3].text, "quickly.");
    }

    #[tokio::test]
    async fn test_mock_scripted_tokens() {
        let scripted = vec![Token::new("of", PartOfSpeech::Adp)];
        let analyzer = MockAnalyzer::new().with_tokens(scripted.clone());
        assert_eq!(analyzer.analyze("anything").await.unwrap(), scripted);
    }

    #[tokio::test]
    async fn test_mock_failure() {
        let analyzer = MockAnalyzer::new().with_failure();
        let err = analyzer.analyze("hello").await.unwrap_err();
        assert!(matches!(err, SpeakscoreError::AnalysisFailure { .. }));
    }

    #[tokio::test]
    async fn test_arc_analyzer_delegates() {
        let analyzer: Arc<dyn SyntaxAnalyzer> = Arc::new(MockAnalyzer::new());
        assert_eq!(analyzer.name(), "mock");
        assert_eq!(analyzer.analyze("two words").await.unwrap().len(), 2);
    }
}
