//! Human-readable rendering of reports for the terminal.

use crate::feedback::{ResponseOutcome, TestResult};
use crate::report::{Correction, FeedbackReport};
use crate::transcript::RecordedTranscript;
use owo_colors::OwoColorize;

/// Color a band score: green from 7, yellow from 5, red below.
fn band(score: f64, color: bool) -> String {
    let text = format!("{score:.1}");
    if !color {
        return text;
    }
    if score >= 7.0 {
        text.green().to_string()
    } else if score >= 5.0 {
        text.yellow().to_string()
    } else {
        text.red().to_string()
    }
}

fn heading(text: &str, color: bool) -> String {
    if color {
        text.bold().to_string()
    } else {
        text.to_string()
    }
}

fn correction_line(correction: &Correction, color: bool) -> String {
    let label = match correction {
        Correction::TokenRule { .. } => "[rule]",
        Correction::Ai { .. } => "[ai]",
    };
    let label = if color {
        label.dimmed().to_string()
    } else {
        label.to_string()
    };
    let mut lines = correction.message().lines();
    let mut out = format!("  {label} {}", lines.next().unwrap_or_default());
    for line in lines {
        out.push_str("\n         ");
        out.push_str(line);
    }
    out
}

/// Render one report as indented text.
pub fn render_report(report: &FeedbackReport, color: bool) -> String {
    let mut out = String::new();
    let scores = &report.scores;

    out.push_str(&format!("{} {}\n", heading("Part:", color), report.part));
    for (name, value) in [
        ("Fluency", scores.fluency),
        ("Grammar", scores.grammar),
        ("Vocabulary", scores.vocabulary),
        ("Pronunciation", scores.pronunciation),
        ("Overall", report.overall),
    ] {
        out.push_str(&format!("  {name:<14} {}\n", band(value, color)));
    }

    if !report.suggestions.is_empty() {
        out.push_str(&format!("\n{}\n", heading("Suggestions:", color)));
        for suggestion in &report.suggestions {
            out.push_str(&format!("  - {suggestion}\n"));
        }
    }

    if !report.corrections.is_empty() {
        out.push_str(&format!("\n{}\n", heading("Corrections:", color)));
        for correction in &report.corrections {
            out.push_str(&format!("{}\n", correction_line(correction, color)));
        }
    }

    out
}

/// Render every part of a test, failures inline.
pub fn render_test_result(result: &TestResult, color: bool) -> String {
    let mut out = String::new();

    for (part, outcomes) in result.parts() {
        if outcomes.is_empty() {
            continue;
        }
        out.push_str(&format!("{}\n", heading(&format!("== {part} =="), color)));
        for (index, outcome) in outcomes.iter().enumerate() {
            out.push_str(&format!("#{} ", index + 1));
            match outcome {
                ResponseOutcome::Scored(report) => {
                    out.push_str(&format!("{}\n", render_report(report, color)));
                }
                ResponseOutcome::Failed { kind, error, .. } => {
                    let line = format!("not scored ({kind}): {error}");
                    let line = if color { line.red().to_string() } else { line };
                    out.push_str(&format!("{line}\n\n"));
                }
            }
        }
    }

    let failures = result.failures().len();
    if failures > 0 {
        out.push_str(&format!("{failures} response(s) could not be scored\n"));
    }
    out
}

/// Render a replayed recording.
pub fn render_transcript(recorded: &RecordedTranscript, color: bool) -> String {
    format!(
        "{} {}\n{} {:.1}s, {} {:.1}s\n",
        heading("Transcript:", color),
        recorded.text,
        heading("Duration:", color),
        recorded.timing.duration_seconds,
        heading("Pauses:", color),
        recorded.timing.pause_duration_seconds,
    )
}
