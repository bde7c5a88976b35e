//! AI feedback blending and per-response / whole-test aggregation.

pub mod aggregator;
pub mod blender;
#[cfg(feature = "http")]
pub mod gemini;
pub mod model;
pub mod prompt;

pub use aggregator::{
    FeedbackAggregator, FeedbackSubmission, ResponseFailure, ResponseOutcome, ResponseRequest,
    TestEntry, TestResponses, TestResult, TestSubmission,
};
pub use blender::{AIFeedbackBlender, BlendedFeedback};
#[cfg(feature = "http")]
pub use gemini::GeminiFeedbackModel;
pub use model::{FeedbackModel, MockFeedbackModel};
