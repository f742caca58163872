const ENERGY_THRESHOLD: f32 = 0.01;
const ENERGY_THRESHOLD_END: f32 = 0.006;

/// Energy-based voice activity detector
///
/// Uses a lower threshold once speech has started so trailing syllables are kept.
#[derive(Debug, Clone)]
pub struct VadEngine {
    start_threshold: f32,
    end_threshold: f32,
}

impl Default for VadEngine {
    fn default() -> Self {
        Self::energy()
    }
}

impl VadEngine {
    pub fn energy() -> Self {
        Self {
            start_threshold: ENERGY_THRESHOLD,
            end_threshold: ENERGY_THRESHOLD_END,
        }
    }

    pub fn with_thresholds(start_threshold: f32, end_threshold: f32) -> Self {
        Self {
            start_threshold,
            end_threshold,
        }
    }

    pub fn is_speech(&self, frame: &[f32], currently_speaking: bool) -> bool {
        let threshold = if currently_speaking {
            self.end_threshold
        } else {
            self.start_threshold
        };
        rms(frame) > threshold
    }

    pub fn name(&self) -> &'static str {
        "Energy"
    }
}

pub fn rms(frame: &[f32]) -> f32 {
    if frame.is_empty() {
        return 0.0;
    }
    (frame.iter().map(|&s| s * s).sum::<f32>() / frame.len() as f32).sqrt()
}
