//! Error types for the voice pipeline, the profile boundary and the editor surface
//!
//! Nothing in here is fatal. Recognition failures are recovered by the capture adapter
//! and shown as a toast; a transcript that matches no grammar rule is not an error at all.

use std::path::PathBuf;

/// Failures of the speech capture adapter
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VoiceError {
    /// No recognition engine is available in this environment
    #[error("speech recognition is not supported on this platform")]
    UnsupportedPlatform,

    /// Engine reported a failure during (or while starting) a session
    #[error("speech recognition error ({code}): {message}")]
    Recognition { code: String, message: String },
}

impl VoiceError {
    pub fn recognition(code: impl Into<String>, message: impl Into<String>) -> Self {
        VoiceError::Recognition {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Failures inside the microphone engine's capture and model threads
#[derive(Debug, thiserror::Error)]
pub enum MicError {
    #[error("no audio input device")]
    NoInputDevice,

    #[error("audio input failed: {0}")]
    Device(String),

    #[error("failed to load speech model {}: {message}", path.display())]
    ModelLoad { path: PathBuf, message: String },

    #[error("transcription failed: {0}")]
    Transcribe(String),
}

impl MicError {
    /// Code the capture adapter reports alongside the message
    pub fn code(&self) -> &'static str {
        match self {
            MicError::NoInputDevice | MicError::Device(_) => "audio-capture",
            MicError::ModelLoad { .. } => "model",
            MicError::Transcribe(_) => "transcribe",
        }
    }
}

impl From<MicError> for VoiceError {
    fn from(e: MicError) -> Self {
        VoiceError::recognition(e.code(), e.to_string())
    }
}

/// Failures reported by the identity/profile backend
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProfileError {
    #[error("no user signed in")]
    NotSignedIn,

    #[error("unknown user: {0}")]
    UnknownUser(String),

    #[error("invalid profile field {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// Failures turning a voice prefill into a store draft
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PrefillError {
    #[error("no pending entry to confirm")]
    NothingPending,

    #[error("missing field `{0}` in prefill")]
    MissingField(&'static str),

    #[error("invalid value for `{field}`: {value}")]
    InvalidValue { field: &'static str, value: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
