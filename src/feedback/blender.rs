//! Blends generative-model commentary into the deterministic assessment.

use crate::config::FeedbackConfig;
use crate::defaults::clamp_score;
use crate::error::Result;
use crate::feedback::model::{FeedbackModel, unavailable};
use crate::feedback::prompt;
use crate::report::{Correction, ScoreSet};
use crate::scoring::{DeterministicAssessment, pronunciation_score};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Scores and commentary after blending.
#[derive(Debug, Clone, PartialEq)]
pub struct BlendedFeedback {
    pub scores: ScoreSet,
    pub corrections: Vec<Correction>,
    pub suggestions: Vec<String>,
}

impl BlendedFeedback {
    /// The deterministic result unchanged.
    fn from_assessment(assessment: DeterministicAssessment) -> Self {
        Self {
            scores: assessment.scores,
            corrections: assessment.corrections,
            suggestions: assessment.suggestions,
        }
    }
}

/// Consults the model and degrades to the deterministic result on any failure.
pub struct AIFeedbackBlender {
    model: Arc<dyn FeedbackModel>,
    timeout: Duration,
    pronunciation_feedback: bool,
}

impl AIFeedbackBlender {
    pub fn new(model: Arc<dyn FeedbackModel>, timeout: Duration) -> Self {
        Self {
            model,
            timeout,
            pronunciation_feedback: true,
        }
    }

    pub fn from_config(model: Arc<dyn FeedbackModel>, config: &FeedbackConfig) -> Self {
        Self::new(model, config.timeout()).with_pronunciation_feedback(config.pronunciation_feedback)
    }

    pub fn with_pronunciation_feedback(mut self, enabled: bool) -> Self {
        self.pronunciation_feedback = enabled;
        self
    }

    async fn ask(&self, prompt: &str) -> Result<String> {
        tokio::time::timeout(self.timeout, self.model.generate(prompt))
            .await
            .map_err(|_| unavailable(format!("no answer within {:?}", self.timeout)))?
    }

    /// Fluency score and commentary, or the reason there is none.
    async fn fluency_commentary(
        &self,
        transcript: &str,
        reference: Option<&str>,
        question: Option<&str>,
    ) -> Result<(f64, String)> {
        let text = self
            .ask(&prompt::build_feedback_prompt(transcript, reference, question))
            .await?;
        let score = prompt::extract_fluency_score(&text)
            .ok_or_else(|| unavailable("reply has no fluency score"))?;
        Ok((score, prompt::strip_score_line(&text)))
    }

    async fn pronunciation_commentary(&self, transcript: &str) -> Result<Option<String>> {
        if !self.pronunciation_feedback {
            return Ok(None);
        }
        let text = self
            .ask(&prompt::build_pronunciation_prompt(transcript))
            .await?;
        let text = prompt::strip_markdown(&text).trim().to_string();
        Ok((!text.is_empty()).then_some(text))
    }

    /// Blend model feedback into `assessment`.
    ///
    /// Never fails: the deterministic scores stand whenever the model errors,
    /// times out, or states no score.
    pub async fn blend(
        &self,
        assessment: DeterministicAssessment,
        transcript: &str,
        reference: Option<&str>,
        question: Option<&str>,
    ) -> BlendedFeedback {
        let (fluency, pronunciation) = tokio::join!(
            self.fluency_commentary(transcript, reference, question),
            self.pronunciation_commentary(transcript),
        );

        let mut blended = BlendedFeedback::from_assessment(assessment);

        match fluency {
            Ok((ai_score, commentary)) => {
                let deterministic = blended.scores.fluency;
                let fluency = clamp_score((deterministic + ai_score) / 2.0);
                debug!(
                    model = self.model.name(),
                    deterministic, ai_score, fluency, "blended fluency"
                );
                blended.scores = blended.scores.with_fluency(fluency);
                if !commentary.is_empty() {
                    blended.corrections.push(Correction::ai(commentary));
                }
            }
            Err(e) => warn!(model = self.model.name(), error = %e, "AI feedback skipped"),
        }

        match pronunciation {
            Ok(Some(commentary)) => {
                blended.suggestions.push(commentary);
                blended.scores = blended
                    .scores
                    .with_pronunciation(pronunciation_score(true));
            }
            Ok(None) => {}
            Err(e) => warn!(model = self.model.name(), error = %e, "pronunciation feedback skipped"),
        }

        blended
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::model::MockFeedbackModel;
    use crate::scoring::TextFeatures;

    fn assessment(fluency: f64) -> DeterministicAssessment {
        DeterministicAssessment {
            features: TextFeatures::from_text("I like tea").unwrap(),
            timing: None,
            scores: ScoreSet::new(fluency, 8.0, 6.0, 7.0),
            corrections: vec![Correction::token_rule("Unclear word: 'zz'")],
            suggestions: vec!["deterministic".to_string()],
        }
    }

    fn blender(model: MockFeedbackModel) -> AIFeedbackBlender {
        AIFeedbackBlender::new(Arc::new(model), Duration::from_secs(5))
            .with_pronunciation_feedback(false)
    }

    #[tokio::test]
    async fn test_blends_fluency_as_mean() {
        let model = MockFeedbackModel::new("**Grammar:** fine.\nFluency Score: 8/9");
        let blended = blender(model).blend(assessment(6.0), "I like tea", None, None).await;

        assert!((blended.scores.fluency - 7.0).abs() < 1e-9);
        assert_eq!(blended.scores.grammar, 8.0);
        assert_eq!(blended.corrections.len(), 2);
        assert!(matches!(blended.corrections[0], Correction::TokenRule { .. }));
        assert_eq!(blended.corrections[1], Correction::ai("Grammar: fine."));
    }

    #[tokio::test]
    async fn test_unparsable_reply_keeps_deterministic() {
        let model = MockFeedbackModel::new("Nice answer, keep going.");
        let blended = blender(model).blend(assessment(6.0), "I like tea", None, None).await;

        assert_eq!(blended.scores.fluency, 6.0);
        assert!(blended.corrections.iter().all(|c| !c.is_ai()));
    }

    #[tokio::test]
    async fn test_model_failure_keeps_deterministic() {
        let model = MockFeedbackModel::new("Fluency Score: 9/9").with_failure();
        let blended = blender(model).blend(assessment(6.0), "I like tea", None, None).await;

        assert_eq!(blended, BlendedFeedback::from_assessment(assessment(6.0)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_keeps_deterministic() {
        let model = MockFeedbackModel::new("Fluency Score: 9/9").with_delay(Duration::from_secs(60));
        let blender = AIFeedbackBlender::new(Arc::new(model), Duration::from_secs(1))
            .with_pronunciation_feedback(false);
        let blended = blender.blend(assessment(6.0), "I like tea", None, None).await;

        assert_eq!(blended.scores.fluency, 6.0);
        assert_eq!(blended.corrections.len(), 1);
    }

    #[tokio::test]
    async fn test_blended_fluency_clamped() {
        let model = MockFeedbackModel::new("Fluency Score: 30/9");
        let blended = blender(model).blend(assessment(8.0), "I like tea", None, None).await;
        assert_eq!(blended.scores.fluency, 9.0);
    }

    #[tokio::test]
    async fn test_score_only_reply_adds_no_empty_correction() {
        let model = MockFeedbackModel::new("Fluency Score: 6/9");
        let blended = blender(model).blend(assessment(6.0), "I like tea", None, None).await;
        assert_eq!(blended.scores.fluency, 6.0);
        assert!(blended.corrections.iter().all(|c| !c.is_ai()));
    }

    #[tokio::test]
    async fn test_pronunciation_commentary_raises_placeholder() {
        let model = MockFeedbackModel::new("Fluency Score: 6/9")
            .with_reply_for("pronounce", "*Tea* rhymes with *see*.");
        let blender = AIFeedbackBlender::new(Arc::new(model.clone()), Duration::from_secs(5));
        let blended = blender
            .blend(assessment(6.0), "I like tea", Some("I like tea"), Some("Drinks?"))
            .await;

        assert_eq!(blended.scores.pronunciation, 7.5);
        assert_eq!(
            blended.suggestions,
            vec!["deterministic".to_string(), "Tea rhymes with see.".to_string()]
        );

        let prompts = model.prompts();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].contains("Reference sentence: \"I like tea\""));
        assert!(prompts[0].contains("Question: \"Drinks?\""));
        assert!(prompts[1].contains("sounded like"));
    }

    #[tokio::test]
    async fn test_pronunciation_disabled_sends_one_prompt() {
        let model = MockFeedbackModel::new("Fluency Score: 6/9");
        let blended = blender(model.clone())
            .blend(assessment(6.0), "I like tea", None, None)
            .await;
        assert_eq!(blended.scores.pronunciation, 7.0);
        assert_eq!(model.prompts().len(), 1);
    }
}
