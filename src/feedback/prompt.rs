//! Prompt construction and score extraction for the generative model.

use regex::Regex;
use std::sync::LazyLock;

static FLUENCY_SCORE: LazyLock<Regex> = LazyLock::new(|| {
    // SAFETY: hardcoded pattern, always valid
    #[allow(clippy::expect_used)]
    Regex::new(r"(?i)fluency\s+score\s*:\s*(\d+(?:\.\d+)?)").expect("hardcoded fluency pattern")
});

static SCORE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    // SAFETY: hardcoded pattern, always valid
    #[allow(clippy::expect_used)]
    Regex::new(r"(?im)^.*fluency\s+score\s*:.*$\n?").expect("hardcoded score line pattern")
});

/// Prompt asking for grammar, vocabulary and fluency feedback plus a
/// machine-readable `Fluency Score: X/9` line.
pub fn build_feedback_prompt(
    transcript: &str,
    reference: Option<&str>,
    question: Option<&str>,
) -> String {
    let mut prompt = String::from(
        "You are an IELTS speaking examiner. Evaluate the candidate's spoken answer below.\n\n",
    );

    if let Some(question) = question.filter(|q| !q.trim().is_empty()) {
        prompt.push_str(&format!("Question: \"{}\"\n", question.trim()));
    }
    prompt.push_str(&format!("Response: \"{}\"\n", transcript.trim()));
    if let Some(reference) = reference.filter(|r| !r.trim().is_empty()) {
        prompt.push_str(&format!("Reference sentence: \"{}\"\n", reference.trim()));
    }

    prompt.push_str(
        "\nProvide:\n\
         1. Grammar notes: errors and how to fix them.\n\
         2. Vocabulary notes: word choice and range.\n\
         3. Fluency suggestions: coherence, hesitation and linking.\n\
         4. A final line in exactly this form: Fluency Score: X/9\n",
    );
    prompt
}

/// Prompt asking for word-by-word pronunciation help.
pub fn build_pronunciation_prompt(transcript: &str) -> String {
    format!(
        "When I spoke it sounded like: \"{}\". Provide feedback, focus on helping me pronounce each word correctly.",
        transcript.trim()
    )
}

/// Remove markdown emphasis and code markers.
pub fn strip_markdown(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '*' | '_' | '`'))
        .collect()
}

/// Fluency score stated by the model, if any.
///
/// The value is returned as written; clamping happens at blend time.
pub fn extract_fluency_score(text: &str) -> Option<f64> {
    let cleaned = strip_markdown(text);
    FLUENCY_SCORE
        .captures(&cleaned)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|score| score.is_finite())
}

/// Commentary without markdown and without the score line.
pub fn strip_score_line(text: &str) -> String {
    let cleaned = strip_markdown(text);
    SCORE_LINE.replace_all(&cleaned, "").trim().to_string()
}
