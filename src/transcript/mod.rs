//! Real-time transcript assembly from recognition fragments.

pub mod assembler;
pub mod session;
pub mod types;

pub use assembler::{PunctuationPolicy, TranscriptAssembler};
pub use session::{Recorder, RecordingSession};
pub use types::{RecognitionFragment, RecordedTranscript, RecorderState, TranscriptState};
