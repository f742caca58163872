//! Speech capture adapter - uniform start/stop/transcript/error contract over a
//! continuous recognition engine
//!
//! The engine runs on its own thread and reports through a channel of `EngineEvent`s.
//! The owner of the adapter feeds those events to `handle_event`, which drives the
//! Idle/Listening state machine and says what (if anything) downstream should do.

use crate::config::VoiceConfig;
use crate::error::VoiceError;

pub const START_FAILED: &str = "Failed to start speech recognition";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionOptions {
    pub language: String,
    pub continuous: bool,
    pub interim_results: bool,
}

impl Default for RecognitionOptions {
    fn default() -> Self {
        Self {
            language: "en-US".into(),
            continuous: true,
            interim_results: true,
        }
    }
}

impl From<&VoiceConfig> for RecognitionOptions {
    fn from(config: &VoiceConfig) -> Self {
        Self {
            language: config.language.clone(),
            continuous: config.continuous,
            interim_results: config.interim_results,
        }
    }
}

/// One recognition result; alternatives are ordered best first
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSegment {
    pub alternatives: Vec<String>,
    pub is_final: bool,
}

impl ResultSegment {
    pub fn interim(text: impl Into<String>) -> Self {
        Self {
            alternatives: vec![text.into()],
            is_final: false,
        }
    }

    pub fn finalized(text: impl Into<String>) -> Self {
        Self {
            alternatives: vec![text.into()],
            is_final: true,
        }
    }
}

/// Callbacks of a recognition engine, delivered over a channel
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Results so far in this session, oldest first
    Result(Vec<ResultSegment>),
    Error { code: String, message: String },
    /// Engine stopped on its own (end of speech)
    End,
}

/// Platform speech recognizer
pub trait RecognitionEngine: Send {
    fn name(&self) -> &str;
    fn start(&mut self, options: &RecognitionOptions) -> Result<(), VoiceError>;
    /// Must be safe to call at any time
    fn stop(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Listening,
}

/// What `handle_event` did with an engine event
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureUpdate {
    /// Transcript changed, not yet stable
    Interim(String),
    /// Stable transcript; ends the session unless continuous
    Final(String),
    Failed(VoiceError),
    Ended,
    /// Stale or empty event
    Ignored,
}

pub struct SpeechCapture {
    engine: Option<Box<dyn RecognitionEngine>>,
    options: RecognitionOptions,
    state: CaptureState,
    transcript: String,
    error: Option<VoiceError>,
}

impl SpeechCapture {
    pub fn new(engine: Option<Box<dyn RecognitionEngine>>, options: RecognitionOptions) -> Self {
        Self {
            engine,
            options,
            state: CaptureState::Idle,
            transcript: String::new(),
            error: None,
        }
    }

    pub fn is_supported(&self) -> bool {
        self.engine.is_some()
    }

    pub fn is_listening(&self) -> bool {
        self.state == CaptureState::Listening
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    pub fn error(&self) -> Option<&VoiceError> {
        self.error.as_ref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Begin a session; a no-op while one is already running
    pub fn start(&mut self) -> Result<(), VoiceError> {
        let Some(engine) = self.engine.as_mut() else {
            return Err(VoiceError::UnsupportedPlatform);
        };
        if self.state == CaptureState::Listening {
            return Ok(());
        }

        self.transcript.clear();
        self.error = None;

        if let Err(e) = engine.start(&self.options) {
            tracing::warn!(engine = engine.name(), error = %e, "engine refused to start");
            let error = VoiceError::recognition("start-failed", START_FAILED);
            self.error = Some(error.clone());
            return Err(error);
        }

        self.state = CaptureState::Listening;
        tracing::debug!(engine = engine.name(), language = %self.options.language, "listening");
        Ok(())
    }

    /// End the session; safe in any state
    pub fn stop(&mut self) {
        if self.state == CaptureState::Idle {
            return;
        }
        self.state = CaptureState::Idle;
        if let Some(engine) = self.engine.as_mut() {
            engine.stop();
        }
        tracing::debug!("stopped listening");
    }

    pub fn handle_event(&mut self, event: EngineEvent) -> CaptureUpdate {
        if self.state == CaptureState::Idle {
            tracing::trace!(?event, "stale engine event ignored");
            return CaptureUpdate::Ignored;
        }

        match event {
            EngineEvent::Result(segments) => {
                let Some(segment) = segments.last() else {
                    return CaptureUpdate::Ignored;
                };
                let Some(text) = segment.alternatives.first() else {
                    return CaptureUpdate::Ignored;
                };
                self.transcript = text.trim().to_lowercase();

                if segment.is_final {
                    if !self.options.continuous {
                        self.stop();
                    }
                    CaptureUpdate::Final(self.transcript.clone())
                } else {
                    CaptureUpdate::Interim(self.transcript.clone())
                }
            }
            EngineEvent::Error { code, message } => {
                tracing::warn!(%code, %message, "recognition error");
                let error = VoiceError::Recognition { code, message };
                self.error = Some(error.clone());
                self.stop();
                CaptureUpdate::Failed(error)
            }
            EngineEvent::End => {
                self.state = CaptureState::Idle;
                CaptureUpdate::Ended
            }
        }
    }
}
