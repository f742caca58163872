#[cfg(feature = "mic")]
use flume::Sender;
#[cfg(feature = "mic")]
use std::sync::Arc;
#[cfg(feature = "mic")]
use std::sync::atomic::{AtomicBool, Ordering};

#[cfg(feature = "mic")]
use crate::error::MicError;
pub use crate::segmenter::TARGET_RATE;

/// Linear-interpolation resampler, good enough for speech
pub fn resample(samples: &[f32], from_rate: usize, to_rate: usize) -> Vec<f32> {
    if from_rate == to_rate || from_rate == 0 {
        return samples.to_vec();
    }
    let step = from_rate as f64 / to_rate as f64;
    let len = (samples.len() as f64 / step) as usize;
    let mut out = Vec::with_capacity(len);
    for i in 0..len {
        let pos = i as f64 * step;
        let idx = pos as usize;
        let t = (pos - idx as f64) as f32;
        let a = samples.get(idx).copied().unwrap_or(0.0);
        let b = samples.get(idx + 1).copied().unwrap_or(a);
        out.push(a + (b - a) * t);
    }
    out
}

/// Average interleaved channels down to mono
pub fn downmix(data: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return data.to_vec();
    }
    data.chunks(channels)
        .map(|c| c.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Stream the default input device as 16kHz mono until `running` is cleared
#[cfg(feature = "mic")]
pub fn capture_mic(tx: Sender<Vec<f32>>, running: Arc<AtomicBool>) -> Result<(), MicError> {
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

    let device = cpal::default_host()
        .default_input_device()
        .ok_or(MicError::NoInputDevice)?;
    let supported = device
        .default_input_config()
        .map_err(|e| MicError::Device(e.to_string()))?;
    let sample_rate = u32::from(supported.sample_rate()) as usize;
    let channels = supported.channels() as usize;

    tracing::info!(sample_rate, channels, "mic opened");

    let stream = device
        .build_input_stream(
            &supported.config(),
            move |data: &[f32], _| {
                let mono = downmix(data, channels);
                // receiver gone means the session is over
                let _ = tx.send(resample(&mono, sample_rate, TARGET_RATE));
            },
            |e| tracing::error!(error = %e, "mic stream error"),
            None,
        )
        .map_err(|e| MicError::Device(e.to_string()))?;
    stream.play().map_err(|e| MicError::Device(e.to_string()))?;

    while running.load(Ordering::SeqCst) {
        std::thread::sleep(std::time::Duration::from_millis(100));
    }
    tracing::debug!("mic closed");
    Ok(())
}
