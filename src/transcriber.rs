//! Parakeet speech-to-text, loaded once per engine

use std::path::{Path, PathBuf};
use transcribe_rs::{
    TranscriptionEngine,
    engines::parakeet::{ParakeetEngine, ParakeetModelParams},
};

use crate::error::MicError;

pub struct Transcriber {
    engine: ParakeetEngine,
}

impl Transcriber {
    pub fn load(model_path: &Path) -> Result<Self, MicError> {
        let mut engine = ParakeetEngine::new();
        tracing::info!(model = %model_path.display(), "loading speech model");
        engine
            .load_model_with_params(model_path, ParakeetModelParams::int8())
            .map_err(|e| MicError::ModelLoad {
                path: PathBuf::from(model_path),
                message: e.to_string(),
            })?;
        tracing::info!("speech model loaded");
        Ok(Self { engine })
    }

    /// Transcribe one utterance into grammar-ready text
    #[hotpath::measure]
    pub fn transcribe(&mut self, samples: &[f32]) -> Result<String, MicError> {
        let result = self
            .engine
            .transcribe_samples(samples.to_vec(), None)
            .map_err(|e| MicError::Transcribe(e.to_string()))?;
        Ok(clean_transcript(&result.text))
    }
}

/// Drop the punctuation Parakeet adds; the grammar matches bare words and numbers
pub fn clean_transcript(text: &str) -> String {
    text.split_whitespace()
        .map(|word| word.trim_matches(|c: char| matches!(c, ',' | '.' | '!' | '?' | ';' | ':')))
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
