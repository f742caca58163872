//! Microphone recognition engine: cpal capture -> energy VAD segmenter -> Parakeet
//!
//! Each session runs three threads joined by flume channels. The speech model is loaded
//! on first use and kept for later sessions.

use flume::Sender;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use crate::capture::capture_mic;
use crate::config::MicConfig;
use crate::error::{MicError, VoiceError};
use crate::segmenter::{SegmentEvent, SegmenterConfig, run_segmenter};
use crate::speech::{EngineEvent, RecognitionEngine, RecognitionOptions, ResultSegment};
use crate::transcriber::Transcriber;
use crate::vad::VadEngine;

pub struct MicEngine {
    tx: Sender<EngineEvent>,
    model_path: PathBuf,
    silence_ms: u32,
    max_segment_secs: u32,
    transcriber: Arc<Mutex<Option<Transcriber>>>,
    running: Option<Arc<AtomicBool>>,
}

impl MicEngine {
    pub fn new(tx: Sender<EngineEvent>, config: &MicConfig) -> Self {
        Self {
            tx,
            model_path: PathBuf::from(&config.model_path),
            silence_ms: config.silence_ms,
            max_segment_secs: config.max_segment_secs,
            transcriber: Arc::new(Mutex::new(None)),
            running: None,
        }
    }
}

impl RecognitionEngine for MicEngine {
    fn name(&self) -> &str {
        "mic"
    }

    fn start(&mut self, options: &RecognitionOptions) -> Result<(), VoiceError> {
        if !self.model_path.exists() {
            return Err(VoiceError::recognition(
                "model-missing",
                format!("speech model not found at {}", self.model_path.display()),
            ));
        }
        self.stop();

        let running = Arc::new(AtomicBool::new(true));
        self.running = Some(Arc::clone(&running));

        let (audio_tx, audio_rx) = flume::unbounded::<Vec<f32>>();
        let (segment_tx, segment_rx) = flume::unbounded::<SegmentEvent>();

        let capture_running = Arc::clone(&running);
        let capture_events = self.tx.clone();
        thread::spawn(move || {
            if let Err(e) = capture_mic(audio_tx, capture_running) {
                let _ = capture_events.send(error_event(e));
            }
        });

        let segmenter_running = Arc::clone(&running);
        let config = SegmenterConfig {
            silence_ms: self.silence_ms,
            max_segment_secs: self.max_segment_secs,
        };
        thread::spawn(move || {
            run_segmenter(audio_rx, segment_tx, VadEngine::energy(), config, segmenter_running);
        });

        let events = self.tx.clone();
        let transcriber = Arc::clone(&self.transcriber);
        let model_path = self.model_path.clone();
        let session = options.clone();
        thread::spawn(move || {
            run_transcriber(segment_rx, events, transcriber, &model_path, &session, running);
        });

        // Parakeet detects the spoken language itself
        tracing::debug!(language = %options.language, continuous = options.continuous, "mic session started");
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(running) = self.running.take() {
            running.store(false, Ordering::SeqCst);
        }
    }
}

impl Drop for MicEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

fn error_event(e: MicError) -> EngineEvent {
    EngineEvent::Error {
        code: e.code().into(),
        message: e.to_string(),
    }
}

fn run_transcriber(
    rx: flume::Receiver<SegmentEvent>,
    tx: Sender<EngineEvent>,
    transcriber: Arc<Mutex<Option<Transcriber>>>,
    model_path: &Path,
    options: &RecognitionOptions,
    running: Arc<AtomicBool>,
) {
    let mut guard = transcriber.lock().unwrap_or_else(|p| p.into_inner());
    if guard.is_none() {
        match Transcriber::load(model_path) {
            Ok(t) => *guard = Some(t),
            Err(e) => {
                let _ = tx.send(error_event(e));
                return;
            }
        }
    }
    let Some(transcriber) = guard.as_mut() else {
        return;
    };

    while running.load(Ordering::SeqCst) {
        let event = match rx.recv_timeout(std::time::Duration::from_millis(100)) {
            Ok(event) => event,
            Err(flume::RecvTimeoutError::Timeout) => continue,
            Err(flume::RecvTimeoutError::Disconnected) => break,
        };

        let (samples, is_final) = match event {
            SegmentEvent::Partial(samples) if options.interim_results => (samples, false),
            SegmentEvent::Partial(_) => continue,
            SegmentEvent::Complete(segment) => (segment.samples, true),
        };

        match transcriber.transcribe(&samples) {
            Ok(text) if text.is_empty() => {}
            Ok(text) => {
                let segment = ResultSegment {
                    alternatives: vec![text],
                    is_final,
                };
                if tx.send(EngineEvent::Result(vec![segment])).is_err() {
                    break;
                }
                if is_final && !options.continuous {
                    // single utterance per session
                    running.store(false, Ordering::SeqCst);
                    break;
                }
            }
            Err(e) => tracing::warn!(error = %e, "transcription failed"),
        }
    }
}
