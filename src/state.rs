//! Shared runtime state - voice settings and listening flag readable from every component
//!
//! Fields are atomics so the engine threads and the main loop can read them without
//! locking. Pass `SharedState` to components that need it.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::config::Config;

/// Thread-safe f32 using bit casting to AtomicU32
#[derive(Debug)]
pub struct AtomicF32(AtomicU32);

impl AtomicF32 {
    pub fn new(v: f32) -> Self {
        Self(AtomicU32::new(v.to_bits()))
    }

    pub fn load(&self, order: Ordering) -> f32 {
        f32::from_bits(self.0.load(order))
    }

    pub fn store(&self, v: f32, order: Ordering) {
        self.0.store(v.to_bits(), order);
    }
}

pub struct RuntimeState {
    /// Voice feedback is silenced
    pub muted: AtomicBool,
    /// Feedback volume (0.0-1.0)
    volume: AtomicF32,
    /// Start listening again after each handled command
    pub auto_listen: AtomicBool,
    /// A capture session is active
    pub listening: AtomicBool,
}

impl RuntimeState {
    pub fn new(config: &Config) -> Arc<Self> {
        Arc::new(Self {
            muted: AtomicBool::new(config.voice.muted),
            volume: AtomicF32::new(config.voice.volume.clamp(0.0, 1.0)),
            auto_listen: AtomicBool::new(config.voice.auto_listen),
            listening: AtomicBool::new(false),
        })
    }

    pub fn volume(&self) -> f32 {
        self.volume.load(Ordering::SeqCst)
    }

    /// Set volume, clamped to 0.0-1.0; returns the stored value
    pub fn set_volume(&self, volume: f32) -> f32 {
        let volume = if volume.is_nan() { 0.0 } else { volume.clamp(0.0, 1.0) };
        self.volume.store(volume, Ordering::SeqCst);
        volume
    }

    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::SeqCst)
    }

    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }

    pub fn set_listening(&self, listening: bool) {
        self.listening.store(listening, Ordering::SeqCst);
    }

    pub fn auto_listen(&self) -> bool {
        self.auto_listen.load(Ordering::SeqCst)
    }

    /// Toggle mute, returns new state
    pub fn toggle_mute(&self) -> bool {
        !self.muted.fetch_xor(true, Ordering::SeqCst)
    }

    /// Toggle auto-listen, returns new state
    pub fn toggle_auto_listen(&self) -> bool {
        !self.auto_listen.fetch_xor(true, Ordering::SeqCst)
    }
}

impl fmt::Debug for RuntimeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeState")
            .field("muted", &self.is_muted())
            .field("volume", &self.volume())
            .field("auto_listen", &self.auto_listen())
            .field("listening", &self.is_listening())
            .finish()
    }
}

/// Type alias for shared state
pub type SharedState = Arc<RuntimeState>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialized_from_config() {
        let state = RuntimeState::new(&Config::default());
        assert!(!state.is_muted());
        assert_eq!(state.volume(), 0.8);
        assert!(!state.auto_listen());
        assert!(!state.is_listening());
    }

    #[test]
    fn test_volume_clamped() {
        let state = RuntimeState::new(&Config::default());
        assert_eq!(state.set_volume(1.5), 1.0);
        assert_eq!(state.set_volume(-0.2), 0.0);
        assert_eq!(state.set_volume(f32::NAN), 0.0);
        assert_eq!(state.set_volume(0.25), 0.25);
        assert_eq!(state.volume(), 0.25);
    }

    #[test]
    fn test_toggles_return_new_state() {
        let state = RuntimeState::new(&Config::default());
        assert!(state.toggle_mute());
        assert!(state.is_muted());
        assert!(!state.toggle_mute());
        assert!(state.toggle_auto_listen());
        assert!(state.auto_listen());
    }
}
