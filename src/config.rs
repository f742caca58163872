use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub voice: VoiceConfig,
    #[serde(default)]
    pub profile: ProfileConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub mic: MicConfig,
    /// tracing filter used when RUST_LOG is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            voice: VoiceConfig::default(),
            profile: ProfileConfig::default(),
            store: StoreConfig::default(),
            mic: MicConfig::default(),
            log_filter: default_log_filter(),
        }
    }
}

fn default_log_filter() -> String {
    "vitalog=info".into()
}

// ============================================================================
// Voice Config
// ============================================================================

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// Keyboard-fed recognizer (default)
    #[default]
    Typed,
    /// Microphone + local speech model, needs the `mic` feature
    Mic,
}

#[derive(Debug, Deserialize)]
pub struct VoiceConfig {
    /// BCP 47 tag handed to the recognition engine
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_true")]
    pub continuous: bool,
    #[serde(default = "default_true")]
    pub interim_results: bool,
    #[serde(default)]
    pub muted: bool,
    /// Feedback volume (0.0-1.0)
    #[serde(default = "default_volume")]
    pub volume: f32,
    /// Start a new listening session after each command
    #[serde(default)]
    pub auto_listen: bool,
    #[serde(default)]
    pub engine: EngineKind,
    /// How long notification toasts stay up
    #[serde(default = "default_toast_secs")]
    pub toast_secs: u64,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            continuous: true,
            interim_results: true,
            muted: false,
            volume: default_volume(),
            auto_listen: false,
            engine: EngineKind::default(),
            toast_secs: default_toast_secs(),
        }
    }
}

fn default_language() -> String {
    "en-US".into()
}

fn default_true() -> bool {
    true
}

fn default_volume() -> f32 {
    0.8
}

fn default_toast_secs() -> u64 {
    3
}

// ============================================================================
// Profile / Store Config
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ProfileConfig {
    #[serde(default = "default_user_name")]
    pub name: String,
    /// Goal used by the health score, kg
    #[serde(default = "default_target_weight")]
    pub target_weight: f64,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            name: default_user_name(),
            target_weight: default_target_weight(),
        }
    }
}

fn default_user_name() -> String {
    "John Doe".into()
}

fn default_target_weight() -> f64 {
    68.0
}

#[derive(Debug, Deserialize)]
pub struct StoreConfig {
    /// Load the demo entries at startup
    #[serde(default = "default_true")]
    pub seed: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { seed: true }
    }
}

// ============================================================================
// Mic Config
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct MicConfig {
    #[serde(default = "default_model_path")]
    pub model_path: String,
    /// Silence that closes an utterance
    #[serde(default = "default_silence_ms")]
    pub silence_ms: u32,
    #[serde(default = "default_max_segment_secs")]
    pub max_segment_secs: u32,
}

impl Default for MicConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            silence_ms: default_silence_ms(),
            max_segment_secs: default_max_segment_secs(),
        }
    }
}

fn default_model_path() -> String {
    "models/parakeet-tdt-0.6b-v3-int8".into()
}

fn default_silence_ms() -> u32 {
    500
}

fn default_max_segment_secs() -> u32 {
    30
}

impl Config {
    /// Load `config.toml` from the working directory, falling back to defaults
    pub fn load() -> Self {
        Self::try_load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "ignoring config file, using defaults");
            Config::default()
        })
    }

    /// Like `load`, but a broken file is reported instead of replaced by defaults
    pub fn try_load() -> Result<Self, ConfigError> {
        let path = Path::new(CONFIG_FILE);
        if !path.exists() {
            return Ok(Config::default());
        }
        Self::from_path(path)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: PathBuf::from(path),
            source,
        })?;
        Self::from_toml(&text).map_err(|source| ConfigError::Parse {
            path: PathBuf::from(path),
            source,
        })
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        let mut config: Config = toml::from_str(text)?;
        config.voice.volume = config.voice.volume.clamp(0.0, 1.0);
        Ok(config)
    }
}
