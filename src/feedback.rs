//! Audible cues for the voice loop, governed by the mute and volume settings

use crate::state::SharedState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    /// A recognition session started
    Listening,
    /// An editor was pre-filled from a voice command
    Prefilled,
    /// An entry was saved
    Saved,
    /// Recognition or saving failed
    Failed,
}

impl Cue {
    /// Tone pitch in Hz
    pub fn pitch(&self) -> f32 {
        match self {
            Cue::Listening => 660.0,
            Cue::Prefilled => 880.0,
            Cue::Saved => 1046.5,
            Cue::Failed => 220.0,
        }
    }
}

/// Where cues are played. Used only from the main loop.
pub trait CueSink {
    fn play(&self, cue: Cue, volume: f32);
}

/// Terminal bell on stderr; has no volume control of its own
pub struct TerminalBell;

impl CueSink for TerminalBell {
    fn play(&self, _cue: Cue, _volume: f32) {
        use std::io::Write;
        let mut err = std::io::stderr();
        let _ = err.write_all(b"\x07");
        let _ = err.flush();
    }
}

/// Short sine tones through the default output device
#[cfg(feature = "sound")]
pub struct ToneSink {
    _stream: rodio::OutputStream,
    sink: rodio::Sink,
}

#[cfg(feature = "sound")]
impl ToneSink {
    const SAMPLE_RATE: u32 = 24000;
    const TONE_MS: u32 = 120;

    pub fn open() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let stream = rodio::OutputStreamBuilder::open_default_stream()?;
        let sink = rodio::Sink::connect_new(stream.mixer());
        Ok(Self {
            _stream: stream,
            sink,
        })
    }
}

#[cfg(feature = "sound")]
impl CueSink for ToneSink {
    fn play(&self, cue: Cue, volume: f32) {
        let len = (Self::SAMPLE_RATE * Self::TONE_MS / 1000) as usize;
        let step = std::f32::consts::TAU * cue.pitch() / Self::SAMPLE_RATE as f32;
        let samples: Vec<f32> = (0..len)
            .map(|i| {
                // linear fade out
                let fade = 1.0 - i as f32 / len as f32;
                (i as f32 * step).sin() * 0.5 * fade
            })
            .collect();
        self.sink.set_volume(volume);
        self.sink
            .append(rodio::buffer::SamplesBuffer::new(1, Self::SAMPLE_RATE, samples));
    }
}

/// Best available sink for this build
pub fn default_sink() -> Box<dyn CueSink> {
    #[cfg(feature = "sound")]
    {
        match ToneSink::open() {
            Ok(sink) => return Box::new(sink),
            Err(e) => tracing::warn!(error = %e, "no audio output, falling back to terminal bell"),
        }
    }
    Box::new(TerminalBell)
}

pub struct Feedback {
    state: SharedState,
    sink: Box<dyn CueSink>,
}

impl Feedback {
    pub fn new(state: SharedState, sink: Box<dyn CueSink>) -> Self {
        Self { state, sink }
    }

    /// Play `cue` unless muted or at zero volume. Returns whether it was played.
    pub fn cue(&self, cue: Cue) -> bool {
        let volume = self.state.volume();
        if self.state.is_muted() || volume <= 0.0 {
            tracing::trace!(?cue, "cue suppressed");
            return false;
        }
        self.sink.play(cue, volume);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::state::RuntimeState;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Recorded(Arc<Mutex<Vec<(Cue, f32)>>>);

    impl CueSink for Recorded {
        fn play(&self, cue: Cue, volume: f32) {
            self.0.lock().unwrap().push((cue, volume));
        }
    }

    #[test]
    fn test_cue_uses_volume() {
        let state = RuntimeState::new(&Config::default());
        let played = Recorded::default();
        let feedback = Feedback::new(Arc::clone(&state), Box::new(played.clone()));

        state.set_volume(0.5);
        assert!(feedback.cue(Cue::Saved));
        assert_eq!(*played.0.lock().unwrap(), vec![(Cue::Saved, 0.5)]);
    }

    #[test]
    fn test_mute_suppresses_cues() {
        let state = RuntimeState::new(&Config::default());
        let played = Recorded::default();
        let feedback = Feedback::new(Arc::clone(&state), Box::new(played.clone()));

        state.toggle_mute();
        assert!(!feedback.cue(Cue::Listening));
        assert!(!feedback.cue(Cue::Failed));
        assert!(played.0.lock().unwrap().is_empty());

        state.toggle_mute();
        assert!(feedback.cue(Cue::Listening));
        assert_eq!(played.0.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_zero_volume_is_silent() {
        let state = RuntimeState::new(&Config::default());
        let played = Recorded::default();
        let feedback = Feedback::new(Arc::clone(&state), Box::new(played.clone()));

        state.set_volume(0.0);
        assert!(!feedback.cue(Cue::Prefilled));
        assert!(played.0.lock().unwrap().is_empty());
    }

    #[test]
    fn test_cues_have_distinct_pitches() {
        let pitches = [Cue::Listening, Cue::Prefilled, Cue::Saved, Cue::Failed].map(|c| c.pitch());
        for (i, a) in pitches.iter().enumerate() {
            assert!(pitches[i + 1..].iter().all(|b| b != a));
        }
    }
}
