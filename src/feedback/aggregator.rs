//! One report per response, and whole-test results grouped by part.

use crate::analysis::SyntaxAnalyzer;
use crate::config::Config;
use crate::defaults;
use crate::error::{Result, SpeakscoreError};
use crate::feedback::blender::AIFeedbackBlender;
use crate::feedback::model::FeedbackModel;
use crate::report::FeedbackReport;
use crate::scoring::{DeterministicScorer, TimingData};
use futures_util::future::join_all;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Everything needed to score one response.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseRequest {
    pub part: String,
    pub response: String,
    pub original: Option<String>,
    pub question: Option<String>,
    pub timing: Option<TimingData>,
}

impl ResponseRequest {
    pub fn new(part: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            part: part.into(),
            response: response.into(),
            original: None,
            question: None,
            timing: None,
        }
    }

    pub fn with_original(mut self, original: impl Into<String>) -> Self {
        self.original = Some(original.into());
        self
    }

    pub fn with_question(mut self, question: impl Into<String>) -> Self {
        self.question = Some(question.into());
        self
    }

    pub fn with_timing(mut self, timing: TimingData) -> Self {
        self.timing = Some(timing);
        self
    }
}

/// Single practice submission: `{ response, original?, timingData? }`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackSubmission {
    pub response: String,
    #[serde(default)]
    pub original: Option<String>,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub part: Option<String>,
    #[serde(default)]
    pub timing_data: Option<TimingData>,
}

impl FeedbackSubmission {
    pub fn into_request(self) -> ResponseRequest {
        ResponseRequest {
            part: self
                .part
                .unwrap_or_else(|| defaults::PRACTICE_PART.to_string()),
            response: self.response,
            original: self.original,
            question: self.question,
            timing: self.timing_data,
        }
    }
}

/// Accept `"questions": "..."` as well as `"questions": ["..", ".."]`.
fn one_or_many<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(question)) => vec![question],
        Some(OneOrMany::Many(questions)) => questions,
    })
}

/// One answered test prompt.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestEntry {
    pub response: String,
    #[serde(default, deserialize_with = "one_or_many")]
    pub questions: Vec<String>,
    /// Overrides the submission-wide timing for this entry.
    #[serde(default)]
    pub timing_data: Option<TimingData>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct TestResponses {
    #[serde(default)]
    pub part1: Vec<TestEntry>,
    #[serde(default)]
    pub part2: Vec<TestEntry>,
    #[serde(default)]
    pub part3: Vec<TestEntry>,
}

/// Whole-test submission: `{ responses: {part1, part2, part3}, timingData? }`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSubmission {
    pub responses: TestResponses,
    #[serde(default)]
    pub timing_data: Option<TimingData>,
}

impl TestSubmission {
    /// Requests in submission order, each tagged with its own part.
    pub fn requests(&self) -> Vec<ResponseRequest> {
        let parts = [
            ("part1", &self.responses.part1),
            ("part2", &self.responses.part2),
            ("part3", &self.responses.part3),
        ];
        parts
            .into_iter()
            .flat_map(|(part, entries)| {
                entries.iter().map(move |entry| {
                    let question = entry.questions.join(" ");
                    ResponseRequest {
                        part: part.to_string(),
                        response: entry.response.clone(),
                        original: None,
                        question: (!question.trim().is_empty()).then_some(question),
                        timing: entry.timing_data.or(self.timing_data),
                    }
                })
            })
            .collect()
    }
}

/// Result of scoring one response inside a test.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseOutcome {
    Scored(FeedbackReport),
    Failed { part: String, kind: String, error: String },
}

impl ResponseOutcome {
    fn from_result(part: &str, result: Result<FeedbackReport>) -> Self {
        match result {
            Ok(report) => ResponseOutcome::Scored(report),
            Err(e) => ResponseOutcome::Failed {
                part: part.to_string(),
                kind: e.kind().to_string(),
                error: e.to_string(),
            },
        }
    }

    pub fn report(&self) -> Option<&FeedbackReport> {
        match self {
            ResponseOutcome::Scored(report) => Some(report),
            ResponseOutcome::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ResponseOutcome::Failed { .. })
    }
}

/// A response that could not be scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseFailure<'a> {
    pub part: &'a str,
    pub index: usize,
    pub kind: &'a str,
    pub error: &'a str,
}

/// Outcomes grouped by part, each list in submission order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TestResult {
    pub part1: Vec<ResponseOutcome>,
    pub part2: Vec<ResponseOutcome>,
    pub part3: Vec<ResponseOutcome>,
}

impl TestResult {
    fn bucket_mut(&mut self, part: &str) -> Option<&mut Vec<ResponseOutcome>> {
        match part {
            "part1" => Some(&mut self.part1),
            "part2" => Some(&mut self.part2),
            "part3" => Some(&mut self.part3),
            _ => None,
        }
    }

    pub fn parts(&self) -> [(&'static str, &[ResponseOutcome]); 3] {
        [
            ("part1", self.part1.as_slice()),
            ("part2", self.part2.as_slice()),
            ("part3", self.part3.as_slice()),
        ]
    }

    pub fn failures(&self) -> Vec<ResponseFailure<'_>> {
        self.parts()
            .into_iter()
            .flat_map(|(part, outcomes)| {
                outcomes
                    .iter()
                    .enumerate()
                    .filter_map(move |(index, outcome)| match outcome {
                        ResponseOutcome::Failed { kind, error, .. } => Some(ResponseFailure {
                            part,
                            index,
                            kind,
                            error,
                        }),
                        ResponseOutcome::Scored(_) => None,
                    })
            })
            .collect()
    }
}

/// Runs analyzer, scorer and blender for each response.
pub struct FeedbackAggregator {
    analyzer: Arc<dyn SyntaxAnalyzer>,
    scorer: DeterministicScorer,
    blender: AIFeedbackBlender,
    analyzer_timeout: Duration,
}

impl FeedbackAggregator {
    pub fn new(
        analyzer: Arc<dyn SyntaxAnalyzer>,
        blender: AIFeedbackBlender,
        analyzer_timeout: Duration,
    ) -> Self {
        Self {
            analyzer,
            scorer: DeterministicScorer::new(),
            blender,
            analyzer_timeout,
        }
    }

    pub fn from_config(
        analyzer: Arc<dyn SyntaxAnalyzer>,
        model: Arc<dyn FeedbackModel>,
        config: &Config,
    ) -> Self {
        Self::new(
            analyzer,
            AIFeedbackBlender::from_config(model, &config.feedback),
            config.analyzer.timeout(),
        )
    }

    /// Score one response.
    ///
    /// Fails with `EmptyResponse` for blank input and `AnalysisFailure` when
    /// the analyzer errors or times out. Model failures never surface.
    pub async fn score_response(&self, request: &ResponseRequest) -> Result<FeedbackReport> {
        let transcript = request.response.trim();
        if transcript.is_empty() {
            return Err(SpeakscoreError::EmptyResponse);
        }

        let tokens = tokio::time::timeout(self.analyzer_timeout, self.analyzer.analyze(transcript))
            .await
            .map_err(|_| SpeakscoreError::AnalysisFailure {
                message: format!(
                    "{} gave no answer within {:?}",
                    self.analyzer.name(),
                    self.analyzer_timeout
                ),
            })??;
        debug!(part = %request.part, tokens = tokens.len(), "tokens tagged");

        let assessment = self
            .scorer
            .assess(transcript, &tokens, request.timing.as_ref())?;
        let blended = self
            .blender
            .blend(
                assessment,
                transcript,
                request.original.as_deref(),
                request.question.as_deref(),
            )
            .await;

        Ok(FeedbackReport::new(
            request.part.clone(),
            blended.scores,
            blended.suggestions,
            blended.corrections,
            tokens,
        ))
    }

    /// Score every entry of a test. A failed entry is recorded in place and
    /// never stops its siblings.
    pub async fn score_test(&self, submission: &TestSubmission) -> TestResult {
        let requests = submission.requests();
        info!(responses = requests.len(), "scoring test");

        let results = join_all(requests.iter().map(|request| self.score_response(request))).await;

        let mut result = TestResult::default();
        for (request, outcome) in requests.iter().zip(results) {
            if let Err(e) = &outcome {
                warn!(part = %request.part, error = %e, "response could not be scored");
            }
            let outcome = ResponseOutcome::from_result(&request.part, outcome);
            if let Some(bucket) = result.bucket_mut(&request.part) {
                bucket.push(outcome);
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{MockAnalyzer, PartOfSpeech};
    use crate::feedback::model::MockFeedbackModel;

    fn aggregator(analyzer: MockAnalyzer, reply: &str) -> FeedbackAggregator {
        let model = Arc::new(MockFeedbackModel::new(reply));
        let blender =
            AIFeedbackBlender::new(model, Duration::from_secs(5)).with_pronunciation_feedback(false);
        FeedbackAggregator::new(Arc::new(analyzer), blender, Duration::from_secs(5))
    }

    fn entry(response: &str) -> TestEntry {
        TestEntry {
            response: response.to_string(),
            questions: vec![],
            timing_data: None,
        }
    }

    #[tokio::test]
    async fn test_score_response_builds_report() {
        let analyzer = MockAnalyzer::new().with_tag("them", PartOfSpeech::Pron);
        let agg = aggregator(analyzer, "Use 'their'.\nFluency Score: 9/9");
        let request = ResponseRequest::new("part1", "  I like them books. They are old.  ")
            .with_timing(TimingData::new(4.0, 0.2));

        let report = agg.score_response(&request).await.unwrap();

        assert_eq!(report.part, "part1");
        assert_eq!(report.tokens.len(), 7);
        assert_eq!(report.tokens[0].text, "I");
        assert!(report.corrections[0].message().contains("them"));
        assert_eq!(report.ai_corrections().count(), 1);
        assert!((report.overall - report.scores.overall()).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_blank_response_is_empty_error() {
        let agg = aggregator(MockAnalyzer::new(), "Fluency Score: 8/9");
        for text in ["", "   "] {
            let err = agg
                .score_response(&ResponseRequest::new("practice", text))
                .await
                .unwrap_err();
            assert!(matches!(err, SpeakscoreError::EmptyResponse));
        }
    }

    #[tokio::test]
    async fn test_analyzer_failure_surfaces() {
        let agg = aggregator(MockAnalyzer::new().with_failure(), "Fluency Score: 8/9");
        let err = agg
            .score_response(&ResponseRequest::new("part1", "hello"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "analysis_failure");
    }

    #[tokio::test(start_paused = true)]
    async fn test_analyzer_timeout_is_analysis_failure() {
        let analyzer = MockAnalyzer::new().with_delay(Duration::from_secs(60));
        let model = Arc::new(MockFeedbackModel::new(""));
        let agg = FeedbackAggregator::new(
            Arc::new(analyzer),
            AIFeedbackBlender::new(model, Duration::from_secs(5)),
            Duration::from_secs(1),
        );
        let err = agg
            .score_response(&ResponseRequest::new("part1", "hello"))
            .await
            .unwrap_err();
        assert!(matches!(err, SpeakscoreError::AnalysisFailure { .. }));
        assert!(err.to_string().contains("mock"));
    }

    #[tokio::test]
    async fn test_score_test_isolates_failures() {
        let agg = aggregator(MockAnalyzer::new(), "Fluency Score: 7/9");
        let submission = TestSubmission {
            responses: TestResponses {
                part1: vec![entry("I live in Paris."), entry("  "), entry("I study law.")],
                ..TestResponses::default()
            },
            timing_data: None,
        };

        let result = agg.score_test(&submission).await;

        assert_eq!(result.part1.len(), 3);
        assert!(!result.part1[0].is_failed());
        assert!(result.part1[1].is_failed());
        assert!(!result.part1[2].is_failed());
        assert_eq!(
            result.failures(),
            vec![ResponseFailure {
                part: "part1",
                index: 1,
                kind: "empty_response",
                error: "Response is empty",
            }]
        );
    }

    #[tokio::test]
    async fn test_score_test_groups_by_declared_part() {
        let agg = aggregator(MockAnalyzer::new(), "Fluency Score: 7/9");
        let submission = TestSubmission {
            responses: TestResponses {
                part1: vec![entry("one answer")],
                part2: vec![entry("long turn answer"), entry("follow up")],
                part3: vec![entry("discussion answer")],
            },
            timing_data: None,
        };

        let result = agg.score_test(&submission).await;

        for (part, outcomes) in result.parts() {
            for outcome in outcomes {
                assert_eq!(outcome.report().map(|r| r.part.as_str()), Some(part));
            }
        }
        assert_eq!(result.part2.len(), 2);
        assert_eq!(result.part3.len(), 1);
        assert_eq!(
            result.part2[1].report().map(|r| r.tokens[0].text.as_str()),
            Some("follow")
        );
    }

    #[test]
    fn test_submission_wire_format() {
        let json = r#"{
            "responses": {
                "part1": [{"response": "I am a student", "questions": "What do you do?"}],
                "part2": [{"response": "My town", "questions": ["Describe", "your town"], "timingData": {"duration": 60}}]
            },
            "timingData": {"duration": 30, "pauseDuration": 3}
        }"#;
        let submission: TestSubmission = serde_json::from_str(json).unwrap();
        let requests = submission.requests();

        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].part, "part1");
        assert_eq!(requests[0].question.as_deref(), Some("What do you do?"));
        assert_eq!(requests[0].timing, Some(TimingData::new(30.0, 3.0)));
        assert_eq!(requests[1].part, "part2");
        assert_eq!(requests[1].question.as_deref(), Some("Describe your town"));
        assert_eq!(requests[1].timing, Some(TimingData::new(60.0, 0.0)));
        assert!(submission.responses.part3.is_empty());
    }

    #[test]
    fn test_practice_submission_defaults() {
        let submission: FeedbackSubmission =
            serde_json::from_str(r#"{"response": "hi there", "original": "hi"}"#).unwrap();
        let request = submission.into_request();
        assert_eq!(request.part, "practice");
        assert_eq!(request.original.as_deref(), Some("hi"));
        assert_eq!(request.timing, None);
    }

    #[test]
    fn test_failed_outcome_serialization() {
        let outcome = ResponseOutcome::from_result("part2", Err(SpeakscoreError::EmptyResponse));
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["part"], "part2");
        assert_eq!(json["kind"], "empty_response");
        assert_eq!(json["error"], "Response is empty");
    }
}
