//! Audio recorder agent
//!
//! A two-phase toggle: the first activation starts recording, the next one
//! stops it and transcribes what was captured.

use crate::agents::{Agent, AgentConfig, AgentError, ExecutionContext, ExecutionResult};
use crate::collaborators::AudioBackend;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// Default shortcut of the recorder
pub const DEFAULT_SHORTCUT: &str = "cmd+r";

/// Output of the first (start) activation
pub const RECORDING_STARTED: &str = "Recording started...";

/// Output when the transcription contains no speech
pub const NO_SPEECH_DETECTED: &str = "No speech detected in the recorded audio. Try recording when someone is speaking or increase recording duration.";

/// Toggles audio capture and transcribes the result
pub struct AudioRecorderAgent {
    config: AgentConfig,
    backend: Arc<dyn AudioBackend>,
    // Not held across the stop/transcribe awaits; a third activation during an
    // in-flight stop starts a new recording.
    recording: AtomicBool,
}

impl AudioRecorderAgent {
    /// Create a recorder on [`DEFAULT_SHORTCUT`]
    pub fn new(backend: Arc<dyn AudioBackend>) -> Self {
        Self {
            config: AgentConfig::new(
                "Audio Recorder",
                "Record audio and convert speech to text",
                DEFAULT_SHORTCUT,
            )
            .without_clipboard_input(),
            backend,
            recording: AtomicBool::new(false),
        }
    }

    /// Bind to a different shortcut
    pub fn with_shortcut(mut self, shortcut: impl Into<String>) -> Self {
        self.config.shortcut = shortcut.into();
        self
    }

    /// Whether a recording is in progress
    pub fn is_recording(&self) -> bool {
        self.recording.load(Ordering::SeqCst)
    }

    async fn start(&self) -> ExecutionResult {
        match self.backend.start_recording().await {
            Ok(()) => {
                self.recording.store(true, Ordering::SeqCst);
                info!("Recording started");
                ExecutionResult::success(RECORDING_STARTED)
            }
            Err(e) => {
                warn!(error = %e, "Failed to start recording");
                ExecutionResult::failure(format!("Failed to start recording: {}", e))
            }
        }
    }

    async fn stop_and_transcribe(&self) -> ExecutionResult {
        let stopped = self.backend.stop_recording().await;
        self.recording.store(false, Ordering::SeqCst);

        let audio = match stopped {
            Ok(audio) => audio,
            Err(e) => {
                warn!(error = %e, "Failed to stop recording");
                return ExecutionResult::failure(format!("Failed to stop recording: {}", e));
            }
        };

        if audio.is_empty() {
            return ExecutionResult::failure("No audio data recorded");
        }

        info!(audio_bytes = audio.len(), "Transcribing recording");

        match self.backend.transcribe(&audio).await {
            Ok(text) if text.trim().is_empty() => ExecutionResult::success(NO_SPEECH_DETECTED),
            Ok(text) => ExecutionResult::success(text),
            Err(e) => ExecutionResult::failure(format!("Transcription failed: {}", e)),
        }
    }
}

#[async_trait]
impl Agent for AudioRecorderAgent {
    fn config(&self) -> &AgentConfig {
        &self.config
    }

    async fn execute(&self, _context: &ExecutionContext) -> Result<ExecutionResult, AgentError> {
        let result = if self.is_recording() {
            self.stop_and_transcribe().await
        } else {
            self.start().await
        };
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::TOGGLE_INPUT;
    use crate::collaborators::ServiceError;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeRecorder {
        audio: Vec<u8>,
        transcript: String,
        fail_start: bool,
        fail_stop: bool,
        calls: Mutex<Vec<&'static str>>,
    }

    #[async_trait]
    impl AudioBackend for FakeRecorder {
        async fn start_recording(&self) -> Result<(), ServiceError> {
            self.calls.lock().unwrap().push("start");
            if self.fail_start {
                return Err(ServiceError::Unavailable("no microphone".to_string()));
            }
            Ok(())
        }

        async fn stop_recording(&self) -> Result<Vec<u8>, ServiceError> {
            self.calls.lock().unwrap().push("stop");
            if self.fail_stop {
                return Err(ServiceError::Unavailable("device lost".to_string()));
            }
            Ok(self.audio.clone())
        }

        async fn transcribe(&self, _audio: &[u8]) -> Result<String, ServiceError> {
            self.calls.lock().unwrap().push("transcribe");
            Ok(self.transcript.clone())
        }

        async fn list_devices(&self) -> Result<Vec<String>, ServiceError> {
            Ok(vec!["Built-in Microphone".to_string()])
        }
    }

    fn toggle() -> ExecutionContext {
        ExecutionContext::new(TOGGLE_INPUT)
    }

    #[tokio::test]
    async fn test_start_then_empty_stop() {
        let agent = AudioRecorderAgent::new(Arc::new(FakeRecorder::default()));

        let first = agent.execute(&toggle()).await.unwrap();
        assert_eq!(first.output(), Some(RECORDING_STARTED));
        assert!(agent.is_recording());

        let second = agent.execute(&toggle()).await.unwrap();
        assert_eq!(second.error(), Some("No audio data recorded"));
        assert!(!agent.is_recording());
    }

    #[tokio::test]
    async fn test_whitespace_transcript_reports_no_speech() {
        let agent = AudioRecorderAgent::new(Arc::new(FakeRecorder {
            audio: vec![1, 2, 3],
            transcript: "  \n".to_string(),
            ..Default::default()
        }));

        agent.execute(&toggle()).await.unwrap();
        let result = agent.execute(&toggle()).await.unwrap();

        assert!(result.is_success());
        assert_eq!(result.output(), Some(NO_SPEECH_DETECTED));
    }

    #[tokio::test]
    async fn test_transcript_is_returned() {
        let backend = Arc::new(FakeRecorder {
            audio: vec![1, 2, 3],
            transcript: "hello world".to_string(),
            ..Default::default()
        });
        let agent = AudioRecorderAgent::new(backend.clone());

        agent.execute(&toggle()).await.unwrap();
        let result = agent.execute(&toggle()).await.unwrap();

        assert_eq!(result.output(), Some("hello world"));
        assert_eq!(
            backend.calls.lock().unwrap().as_slice(),
            ["start", "stop", "transcribe"]
        );
    }

    #[tokio::test]
    async fn test_failed_start_stays_idle() {
        let agent = AudioRecorderAgent::new(Arc::new(FakeRecorder {
            fail_start: true,
            ..Default::default()
        }));

        let result = agent.execute(&toggle()).await.unwrap();

        assert_eq!(
            result.error(),
            Some("Failed to start recording: no microphone")
        );
        assert!(!agent.is_recording());
    }

    #[tokio::test]
    async fn test_failed_stop_returns_to_idle() {
        let agent = AudioRecorderAgent::new(Arc::new(FakeRecorder {
            fail_stop: true,
            ..Default::default()
        }));

        agent.execute(&toggle()).await.unwrap();
        let result = agent.execute(&toggle()).await.unwrap();

        assert_eq!(result.error(), Some("Failed to stop recording: device lost"));
        assert!(!agent.is_recording());
    }

    #[test]
    fn test_recorder_does_not_take_clipboard_input() {
        let agent = AudioRecorderAgent::new(Arc::new(FakeRecorder::default()));
        assert!(!agent.config().clipboard_input);
        assert_eq!(agent.shortcut(), DEFAULT_SHORTCUT);
    }
}
