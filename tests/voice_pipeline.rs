//! End-to-end: utterance -> interpreter -> bus -> editor -> store

use chrono::NaiveDate;
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use vitalog::bus::{BusEvent, DispatchBus, EventName, LogModalRequest};
use vitalog::command::{CommandInterpreter, Navigator, Outcome};
use vitalog::editor::{LogEditor, VOICE_NOTE};
use vitalog::entry::{Category, Intensity, parse_clock};
use vitalog::intent::{LogSurface, Route};
use vitalog::speech::{CaptureUpdate, EngineEvent, RecognitionOptions, SpeechCapture};
use vitalog::store::{EntryStore, TimeRange};
use vitalog::typed_engine::TypedEngine;

#[derive(Clone, Default)]
struct Routes(Arc<Mutex<Vec<Route>>>);

impl Navigator for Routes {
    fn navigate(&self, route: Route) {
        self.0.lock().unwrap().push(route);
    }
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
}

fn single_shot() -> RecognitionOptions {
    RecognitionOptions {
        continuous: false,
        ..Default::default()
    }
}

/// Feed engine events through the capture until `count` final transcripts arrive
fn next_finals(rx: &flume::Receiver<EngineEvent>, capture: &mut SpeechCapture, count: usize) -> Vec<String> {
    let mut finals = Vec::new();
    while finals.len() < count {
        let event = rx.recv_timeout(Duration::from_secs(2)).expect("engine went quiet");
        match capture.handle_event(event) {
            CaptureUpdate::Final(text) => finals.push(text),
            CaptureUpdate::Interim(_) => {}
            other => panic!("unexpected update {other:?}"),
        }
    }
    finals
}

#[test]
fn test_spoken_workout_becomes_entry() {
    let bus = DispatchBus::new();
    let editor = LogEditor::attach(&bus);
    let interpreter = CommandInterpreter::new(bus.clone(), Box::new(Routes::default()));
    let mut store = EntryStore::new();

    let outcome = interpreter.interpret("I ran for 1 hour");
    let Outcome::Dispatched(request) = outcome else {
        panic!("expected a dispatched log request, got {outcome:?}");
    };
    assert_eq!(request.surface, LogSurface::Workout);
    assert_eq!(request.data.get("duration"), Some(&json!(60)));

    let id = editor.confirm(&mut store, today()).unwrap();
    let workout = &store.workouts()[0];
    assert_eq!(workout.id, id);
    assert_eq!(workout.activity, "ran");
    assert_eq!(workout.duration, 60);
    assert_eq!(workout.calories_burned, 480);
    assert_eq!(workout.intensity, Intensity::Medium);
    assert_eq!(workout.notes.as_deref(), Some(VOICE_NOTE));
}

#[test]
fn test_subscriber_sees_parameters_unchanged() {
    let bus = DispatchBus::new();
    let seen: Arc<Mutex<Vec<LogModalRequest>>> = Arc::default();
    let s = Arc::clone(&seen);
    let _sub = bus.subscribe(EventName::OpenLogModal, move |event| {
        if let BusEvent::OpenLogModal(request) = event {
            s.lock().unwrap().push(request.clone());
        }
    });
    let interpreter = CommandInterpreter::new(bus.clone(), Box::new(Routes::default()));

    interpreter.interpret("i ate a banana for breakfast");

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(
        serde_json::to_value(&seen[0]).unwrap(),
        json!({"type": "meal", "data": {"food": "a banana", "mealType": "breakfast"}})
    );
}

#[test]
fn test_navigation_and_noise_leave_store_untouched() {
    let bus = DispatchBus::new();
    let editor = LogEditor::attach(&bus);
    let routes = Routes::default();
    let interpreter = CommandInterpreter::new(bus.clone(), Box::new(routes.clone()));

    assert_eq!(interpreter.interpret("please open settings"), Outcome::Navigated(Route::Settings));
    assert_eq!(interpreter.interpret("turn on the lights"), Outcome::NoMatch);
    assert!(!editor.is_open());
    assert_eq!(*routes.0.lock().unwrap(), vec![Route::Settings]);
}

#[test]
fn test_typed_engine_through_capture() {
    let (tx, rx) = flume::unbounded();
    let (engine, feed) = TypedEngine::with_word_delay(tx, Duration::ZERO);
    let mut capture = SpeechCapture::new(Some(Box::new(engine)), single_shot());

    let bus = DispatchBus::new();
    let editor = LogEditor::attach(&bus);
    let interpreter = CommandInterpreter::new(bus.clone(), Box::new(Routes::default()));
    let mut store = EntryStore::new();

    capture.start().unwrap();
    assert!(feed.say("I slept for 7.5 hours with good quality"));

    let mut interims = 0;
    let transcript = loop {
        let event = rx.recv_timeout(Duration::from_secs(2)).expect("engine went quiet");
        match capture.handle_event(event) {
            CaptureUpdate::Interim(_) => interims += 1,
            CaptureUpdate::Final(text) => break text,
            other => panic!("unexpected update {other:?}"),
        }
    };
    assert!(interims > 0);
    assert!(!capture.is_listening());
    assert_eq!(transcript, "i slept for 7.5 hours with good quality");

    interpreter.interpret(&transcript);
    editor.confirm(&mut store, today()).unwrap();

    let sleep = &store.sleeps()[0];
    assert_eq!(sleep.duration, 7.5);
    assert_eq!(sleep.quality, 7);
    assert_eq!(store.len(Category::Sleep), 1);
}

#[test]
fn test_back_to_back_utterances_become_two_entries() {
    let (tx, rx) = flume::unbounded();
    let (engine, feed) = TypedEngine::with_word_delay(tx, Duration::ZERO);
    let mut capture = SpeechCapture::new(Some(Box::new(engine)), RecognitionOptions::default());

    let bus = DispatchBus::new();
    let editor = LogEditor::attach(&bus);
    let interpreter = CommandInterpreter::new(bus.clone(), Box::new(Routes::default()));
    let mut store = EntryStore::new();

    capture.start().unwrap();
    assert!(feed.say("log weight 72.5 kg"));
    assert!(feed.say("i ran for 30 minutes"));

    let finals = next_finals(&rx, &mut capture, 2);
    assert_eq!(finals, vec!["log weight 72.5 kg", "i ran for 30 minutes"]);
    assert!(capture.is_listening());

    for transcript in &finals {
        assert!(matches!(interpreter.interpret(transcript), Outcome::Dispatched(_)));
        editor.confirm(&mut store, today()).unwrap();
    }
    assert_eq!(store.len(Category::Weight), 1);
    assert_eq!(store.len(Category::Fitness), 1);
}

#[test]
fn test_single_shot_restart_picks_up_queued_line() {
    let (tx, rx) = flume::unbounded();
    let (engine, feed) = TypedEngine::with_word_delay(tx, Duration::ZERO);
    let mut capture = SpeechCapture::new(Some(Box::new(engine)), single_shot());

    capture.start().unwrap();
    feed.say("weight is 80");
    feed.say("i am feeling relaxed");

    assert_eq!(next_finals(&rx, &mut capture, 1), vec!["weight is 80"]);
    assert!(!capture.is_listening());

    // the second line waits until the loop restarts the session
    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    assert_eq!(feed.pending(), 1);
    capture.start().unwrap();
    assert_eq!(next_finals(&rx, &mut capture, 1), vec!["i am feeling relaxed"]);
}

#[test]
fn test_sleep_window_fills_duration() {
    let bus = DispatchBus::new();
    let editor = LogEditor::attach(&bus);
    let interpreter = CommandInterpreter::new(bus.clone(), Box::new(Routes::default()));
    let mut store = EntryStore::new();

    interpreter.interpret("i slept from 11 pm to 6:30 am");
    editor.confirm(&mut store, today()).unwrap();

    let sleep = &store.sleeps()[0];
    assert_eq!(sleep.duration, 7.5);
    assert_eq!(sleep.bed_time, parse_clock("23:00").unwrap());
    assert_eq!(sleep.wake_time, parse_clock("06:30").unwrap());
    assert_eq!(store.within(Category::Sleep, TimeRange::Week, today()).len(), 1);
}

#[test]
fn test_edit_after_voice_entry_changes_id() {
    let bus = DispatchBus::new();
    let editor = LogEditor::attach(&bus);
    let interpreter = CommandInterpreter::new(bus.clone(), Box::new(Routes::default()));
    let mut store = EntryStore::new();

    interpreter.interpret("log weight 72.5 kg");
    let id = editor.confirm(&mut store, today()).unwrap();

    interpreter.interpret("log weight 72.0 kg");
    let draft = editor.preview(today()).unwrap();
    assert!(editor.cancel());

    let new_id = store.edit(&id, draft).unwrap();
    assert_ne!(new_id, id);
    assert!(store.get(Category::Weight, &id).is_none());
    assert_eq!(store.weights()[0].weight, 72.0);
    assert_eq!(store.len(Category::Weight), 1);
}
