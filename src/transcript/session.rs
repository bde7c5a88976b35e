//! Recording session: drives a `TranscriptAssembler` from a live fragment
//! stream.
//!
//! Fragments, the stop signal and the silence timer are handled by one task
//! in one `select!` loop, so a timer firing can never interleave with a
//! fragment being applied.

use crate::config::TranscriptConfig;
use crate::error::{Result, SpeakscoreError};
use crate::transcript::assembler::TranscriptAssembler;
use crate::transcript::types::{RecognitionFragment, RecordedTranscript};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info};

/// Capacity of the fragment queue between recognizer and session.
pub const FRAGMENT_QUEUE_CAPACITY: usize = 64;

fn now() -> std::time::Instant {
    Instant::now().into_std()
}

/// One recording, owning its assembler for its whole lifetime.
pub struct RecordingSession {
    assembler: TranscriptAssembler,
}

impl RecordingSession {
    pub fn new(config: &TranscriptConfig) -> Self {
        Self {
            assembler: TranscriptAssembler::with_config(config),
        }
    }

    /// Runs the session until `stop` fires or the fragment stream closes.
    ///
    /// Fragments already queued when stop arrives are still applied.
    pub async fn run(
        mut self,
        mut fragments: mpsc::Receiver<RecognitionFragment>,
        mut stop: oneshot::Receiver<()>,
    ) -> RecordedTranscript {
        self.assembler.start(now());

        loop {
            let deadline = self.assembler.silence_deadline();
            let timer = sleep_until(
                deadline
                    .map(Instant::from_std)
                    .unwrap_or_else(Instant::now),
            );

            tokio::select! {
                biased;

                _ = &mut stop => {
                    while let Ok(fragment) = fragments.try_recv() {
                        self.assembler.push(fragment);
                    }
                    break;
                }
                fragment = fragments.recv() => match fragment {
                    Some(fragment) => {
                        self.assembler.push(fragment);
                    }
                    None => {
                        debug!("fragment stream closed, stopping session");
                        break;
                    }
                },
                _ = timer, if deadline.is_some() => {
                    self.assembler.on_silence_timeout(now());
                }
            }
        }

        self.assembler.stop(now())
    }
}

struct ActiveSession {
    stop: oneshot::Sender<()>,
    task: JoinHandle<RecordedTranscript>,
}

/// Owns at most one active recording session.
///
/// Starting while already recording tears the previous session down first,
/// so two silence timers never share a transcript.
pub struct Recorder {
    config: TranscriptConfig,
    active: Option<ActiveSession>,
}

impl Recorder {
    pub fn new(config: TranscriptConfig) -> Self {
        Self {
            config,
            active: None,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| !active.task.is_finished())
    }

    /// Starts a new session and returns the sender the recognizer feeds.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) -> mpsc::Sender<RecognitionFragment> {
        self.teardown();

        let (fragment_tx, fragment_rx) = mpsc::channel(FRAGMENT_QUEUE_CAPACITY);
        let (stop_tx, stop_rx) = oneshot::channel();
        let session = RecordingSession::new(&self.config);
        let task = tokio::spawn(session.run(fragment_rx, stop_rx));

        self.active = Some(ActiveSession {
            stop: stop_tx,
            task,
        });
        info!("recording started");
        fragment_tx
    }

    /// Stops the active session and returns its transcript.
    ///
    /// Stopping without an active session yields an empty transcript.
    pub async fn stop(&mut self) -> Result<RecordedTranscript> {
        let Some(active) = self.active.take() else {
            return Ok(RecordedTranscript::empty());
        };

        if active.stop.send(()).is_err() {
            debug!("session already finished before stop");
        }
        let recorded = active.task.await.map_err(|e| {
            SpeakscoreError::Other(format!("recording session task failed: {e}"))
        })?;
        info!(
            words = recorded.text.split_whitespace().count(),
            duration_s = recorded.timing.duration_seconds,
            pause_s = recorded.timing.pause_duration_seconds,
            "recording stopped"
        );
        Ok(recorded)
    }

    /// Discards the active session without producing a transcript.
    pub fn clear(&mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if let Some(active) = self.active.take() {
            active.task.abort();
            debug!("previous recording session discarded");
        }
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        self.teardown();
    }
}
