//! Voice-driven health journal
//!
//! Spoken (or typed) utterances are captured by a recognition engine, matched against a
//! fixed command grammar and turned into navigation or pre-filled log entries that the
//! user confirms into an in-memory store.

pub mod bus;
pub mod capture;
pub mod command;
pub mod config;
pub mod editor;
pub mod entry;
pub mod error;
pub mod feedback;
pub mod grammar;
pub mod insight;
pub mod intent;
#[cfg(feature = "mic")]
pub mod mic;
pub mod profile;
pub mod render;
pub mod repl;
pub mod score;
pub mod seed;
pub mod segmenter;
pub mod speech;
pub mod state;
pub mod store;
#[cfg(feature = "mic")]
pub mod transcriber;
pub mod typed_engine;
pub mod vad;
