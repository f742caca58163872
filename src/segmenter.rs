use crate::vad::VadEngine;
use flume::{Receiver, Sender};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

const VAD_FRAME_SAMPLES: usize = 480;
pub const TARGET_RATE: usize = 16000;
/// Shortest in-progress buffer worth a preview transcription
const MIN_PREVIEW_SAMPLES: usize = TARGET_RATE / 2;
/// Preview every this many speech frames (~1s)
const PREVIEW_EVERY_FRAMES: usize = TARGET_RATE / VAD_FRAME_SAMPLES;

#[derive(Clone, Debug)]
pub struct AudioSegment {
    pub samples: Vec<f32>,
    pub start_sample: usize,
    pub end_sample: usize,
}

impl AudioSegment {
    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / TARGET_RATE as f32
    }
}

/// Output of the segmenter
#[derive(Clone, Debug)]
pub enum SegmentEvent {
    /// Speech still in progress; samples so far
    Partial(Vec<f32>),
    /// Utterance closed by silence or length
    Complete(AudioSegment),
}

pub struct SegmenterConfig {
    pub silence_ms: u32,
    pub max_segment_secs: u32,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            silence_ms: 500,
            max_segment_secs: 30,
        }
    }
}

/// Splits a 16kHz mono stream into utterances
pub struct Segmenter {
    vad: VadEngine,
    silence_threshold_frames: usize,
    max_samples: usize,
    vad_buf: Vec<f32>,
    speech_buf: Vec<f32>,
    in_speech: bool,
    silence_frames: usize,
    speech_frames: usize,
    total_samples: usize,
    speech_start_sample: usize,
}

impl Segmenter {
    pub fn new(vad: VadEngine, config: &SegmenterConfig) -> Self {
        Self {
            vad,
            silence_threshold_frames: ((config.silence_ms as usize * TARGET_RATE)
                / (1000 * VAD_FRAME_SAMPLES))
                .max(1),
            max_samples: config.max_segment_secs as usize * TARGET_RATE,
            vad_buf: Vec::new(),
            speech_buf: Vec::new(),
            in_speech: false,
            silence_frames: 0,
            speech_frames: 0,
            total_samples: 0,
            speech_start_sample: 0,
        }
    }

    pub fn in_speech(&self) -> bool {
        self.in_speech
    }

    /// Feed samples, returns any events they produced
    pub fn push(&mut self, samples: &[f32]) -> Vec<SegmentEvent> {
        let mut events = Vec::new();
        self.vad_buf.extend_from_slice(samples);

        while self.vad_buf.len() >= VAD_FRAME_SAMPLES {
            let chunk: Vec<f32> = self.vad_buf.drain(..VAD_FRAME_SAMPLES).collect();
            let is_speech = self.vad.is_speech(&chunk, self.in_speech);

            if is_speech {
                if !self.in_speech {
                    self.speech_start_sample = self.total_samples;
                    tracing::trace!(at = self.total_samples, "speech start");
                }
                self.silence_frames = 0;
                self.in_speech = true;
                self.speech_buf.extend_from_slice(&chunk);
            } else if self.in_speech {
                self.silence_frames += 1;
                self.speech_buf.extend_from_slice(&chunk);
            }

            if self.in_speech {
                self.speech_frames += 1;
                if self.silence_frames >= self.silence_threshold_frames
                    || self.speech_buf.len() >= self.max_samples
                {
                    let segment = AudioSegment {
                        samples: std::mem::take(&mut self.speech_buf),
                        start_sample: self.speech_start_sample,
                        end_sample: self.total_samples + VAD_FRAME_SAMPLES,
                    };
                    tracing::debug!(secs = segment.duration_secs(), "segment complete");
                    events.push(SegmentEvent::Complete(segment));
                    self.in_speech = false;
                    self.silence_frames = 0;
                    self.speech_frames = 0;
                } else if self.speech_frames % PREVIEW_EVERY_FRAMES == 0
                    && self.speech_buf.len() >= MIN_PREVIEW_SAMPLES
                {
                    events.push(SegmentEvent::Partial(self.speech_buf.clone()));
                }
            }

            self.total_samples += VAD_FRAME_SAMPLES;
        }
        events
    }

    /// Close any half-finished utterance of at least half a second
    pub fn flush(&mut self) -> Option<AudioSegment> {
        self.in_speech = false;
        self.silence_frames = 0;
        self.speech_frames = 0;
        let samples = std::mem::take(&mut self.speech_buf);
        (samples.len() >= TARGET_RATE / 2).then(|| AudioSegment {
            samples,
            start_sample: self.speech_start_sample,
            end_sample: self.total_samples,
        })
    }
}

pub fn run_segmenter(
    rx: Receiver<Vec<f32>>,
    tx: Sender<SegmentEvent>,
    vad: VadEngine,
    config: SegmenterConfig,
    running: Arc<AtomicBool>,
) {
    let mut segmenter = Segmenter::new(vad, &config);

    while running.load(Ordering::SeqCst) {
        match rx.recv_timeout(std::time::Duration::from_millis(100)) {
            Ok(samples) => {
                for event in segmenter.push(&samples) {
                    if tx.send(event).is_err() {
                        return;
                    }
                }
            }
            Err(flume::RecvTimeoutError::Timeout) => continue,
            Err(flume::RecvTimeoutError::Disconnected) => break,
        }
    }

    if let Some(segment) = segmenter.flush() {
        let _ = tx.send(SegmentEvent::Complete(segment));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(frames: usize) -> Vec<f32> {
        vec![0.1; frames * VAD_FRAME_SAMPLES]
    }

    fn silence(frames: usize) -> Vec<f32> {
        vec![0.0; frames * VAD_FRAME_SAMPLES]
    }

    fn completes(events: &[SegmentEvent]) -> Vec<&AudioSegment> {
        events
            .iter()
            .filter_map(|e| match e {
                SegmentEvent::Complete(s) => Some(s),
                SegmentEvent::Partial(_) => None,
            })
            .collect()
    }

    #[test]
    fn test_silence_produces_nothing() {
        let mut segmenter = Segmenter::new(VadEngine::energy(), &SegmenterConfig::default());
        assert!(segmenter.push(&silence(100)).is_empty());
        assert!(segmenter.flush().is_none());
    }

    #[test]
    fn test_speech_closed_by_silence() {
        let mut segmenter = Segmenter::new(VadEngine::energy(), &SegmenterConfig::default());
        let mut events = segmenter.push(&silence(10));
        events.extend(segmenter.push(&tone(40)));
        assert!(segmenter.in_speech());
        // 500ms of silence at 30ms frames
        events.extend(segmenter.push(&silence(20)));

        let segments = completes(&events);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].start_sample, 10 * VAD_FRAME_SAMPLES);
        assert!(!segmenter.in_speech());
    }

    #[test]
    fn test_long_speech_emits_partials() {
        let mut segmenter = Segmenter::new(VadEngine::energy(), &SegmenterConfig::default());
        let events = segmenter.push(&tone(PREVIEW_EVERY_FRAMES * 2));
        assert!(events.iter().any(|e| matches!(e, SegmentEvent::Partial(_))));
        assert!(completes(&events).is_empty());
    }

    #[test]
    fn test_max_length_forces_cut() {
        let config = SegmenterConfig {
            silence_ms: 500,
            max_segment_secs: 1,
        };
        let mut segmenter = Segmenter::new(VadEngine::energy(), &config);
        let events = segmenter.push(&tone(40));
        assert_eq!(completes(&events).len(), 1);
    }

    #[test]
    fn test_flush_keeps_trailing_speech() {
        let mut segmenter = Segmenter::new(VadEngine::energy(), &SegmenterConfig::default());
        segmenter.push(&tone(20));
        let segment = segmenter.flush().unwrap();
        assert_eq!(segment.samples.len(), 20 * VAD_FRAME_SAMPLES);
    }
}
