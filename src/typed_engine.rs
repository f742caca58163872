//! Keyboard-fed recognition engine
//!
//! Stands in for a platform recognizer: text handed to a `TypedFeed` is replayed
//! word by word as interim results, then delivered once more as a final result.
//! Lines are queued and replayed one at a time by a single worker thread, and only
//! while a session is running. A line typed before `start` waits for the session.
//! Without `continuous`, the session ends after the first delivered utterance and
//! the next queued line waits for a restart.

use flume::Sender;
use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use crate::error::VoiceError;
use crate::speech::{EngineEvent, RecognitionEngine, RecognitionOptions, ResultSegment};

const DEFAULT_WORD_DELAY: Duration = Duration::from_millis(120);

#[derive(Debug, Clone, Copy)]
struct Session {
    id: u64,
    continuous: bool,
    interim: bool,
}

#[derive(Default)]
struct FeedState {
    queue: VecDeque<String>,
    session: Option<Session>,
    closed: bool,
}

#[derive(Default)]
struct Shared {
    state: Mutex<FeedState>,
    wake: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, FeedState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn is_current(&self, id: u64) -> bool {
        self.lock().session.is_some_and(|s| s.id == id)
    }

    /// End session `id` unless a newer one has replaced it
    fn end_session(&self, id: u64) {
        let mut state = self.lock();
        if state.session.is_some_and(|s| s.id == id) {
            state.session = None;
        }
    }

    /// Block until there is a line to replay in a running session; None once closed
    fn next_line(&self) -> Option<(String, Session)> {
        let mut state = self.lock();
        loop {
            if state.closed {
                return None;
            }
            if let Some(session) = state.session {
                if let Some(line) = state.queue.pop_front() {
                    return Some((line, session));
                }
            }
            state = self.wake.wait(state).unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }
}

pub struct TypedEngine {
    shared: Arc<Shared>,
    sessions: u64,
}

/// Handle used to "speak" into a `TypedEngine`
#[derive(Clone)]
pub struct TypedFeed {
    shared: Arc<Shared>,
}

impl TypedEngine {
    pub fn new(tx: Sender<EngineEvent>) -> (Self, TypedFeed) {
        Self::with_word_delay(tx, DEFAULT_WORD_DELAY)
    }

    pub fn with_word_delay(tx: Sender<EngineEvent>, word_delay: Duration) -> (Self, TypedFeed) {
        let shared = Arc::new(Shared::default());
        let worker = Arc::clone(&shared);
        thread::spawn(move || run_worker(worker, tx, word_delay));

        let feed = TypedFeed {
            shared: Arc::clone(&shared),
        };
        (Self { shared, sessions: 0 }, feed)
    }
}

impl RecognitionEngine for TypedEngine {
    fn name(&self) -> &str {
        "typed"
    }

    fn start(&mut self, options: &RecognitionOptions) -> Result<(), VoiceError> {
        self.sessions += 1;
        self.shared.lock().session = Some(Session {
            id: self.sessions,
            continuous: options.continuous,
            interim: options.interim_results,
        });
        self.shared.wake.notify_all();
        Ok(())
    }

    fn stop(&mut self) {
        self.shared.lock().session = None;
        self.shared.wake.notify_all();
    }
}

impl Drop for TypedEngine {
    fn drop(&mut self) {
        self.shared.lock().closed = true;
        self.shared.wake.notify_all();
    }
}

impl TypedFeed {
    pub fn is_active(&self) -> bool {
        self.shared.lock().session.is_some()
    }

    /// Lines waiting for the worker
    pub fn pending(&self) -> usize {
        self.shared.lock().queue.len()
    }

    /// Queue `text` as one utterance. Returns false for blank text or a dropped engine.
    pub fn say(&self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }
        let mut state = self.shared.lock();
        if state.closed {
            return false;
        }
        state.queue.push_back(text.to_string());
        drop(state);
        self.shared.wake.notify_all();
        true
    }
}

enum Replay {
    Delivered,
    /// Session stopped before the final result
    Abandoned,
    Disconnected,
}

fn run_worker(shared: Arc<Shared>, tx: Sender<EngineEvent>, delay: Duration) {
    while let Some((line, session)) = shared.next_line() {
        match replay(&shared, &tx, &line, session, delay) {
            Replay::Delivered if !session.continuous => shared.end_session(session.id),
            Replay::Delivered => {}
            Replay::Abandoned => tracing::debug!(%line, "session stopped mid-utterance"),
            Replay::Disconnected => return,
        }
    }
}

fn replay(shared: &Shared, tx: &Sender<EngineEvent>, line: &str, session: Session, delay: Duration) -> Replay {
    let words: Vec<&str> = line.split_whitespace().collect();

    if session.interim {
        for n in 1..words.len() {
            if !shared.is_current(session.id) {
                return Replay::Abandoned;
            }
            let partial = words[..n].join(" ");
            if tx.send(EngineEvent::Result(vec![ResultSegment::interim(partial)])).is_err() {
                return Replay::Disconnected;
            }
            if !delay.is_zero() {
                thread::sleep(delay);
            }
        }
    }

    if !shared.is_current(session.id) {
        return Replay::Abandoned;
    }
    match tx.send(EngineEvent::Result(vec![ResultSegment::finalized(words.join(" "))])) {
        Ok(()) => Replay::Delivered,
        Err(_) => Replay::Disconnected,
    }
}
