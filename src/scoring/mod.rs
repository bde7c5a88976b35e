//! Deterministic scoring: text features, timing metrics and token rules.

pub mod features;
pub mod rules;
pub mod scorer;

pub use features::{TextFeatures, TimingData, TimingMetrics};
pub use scorer::{DeterministicAssessment, DeterministicScorer, pronunciation_score};
