//! REPL input handling - keyboard lines and recognition updates

use std::io::BufRead;
use std::thread;
use std::time::Duration;

use crate::bus::{BusEvent, DispatchBus, Notification};
use crate::render::Ui;
use crate::speech::CaptureUpdate;

/// Read stdin lines on a background thread. The channel closes at EOF.
pub fn spawn_input_thread() -> flume::Receiver<String> {
    let (tx, rx) = flume::unbounded::<String>();
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if tx.send(line.trim().to_string()).is_err() {
                break;
            }
        }
    });
    rx
}

/// Handle a recognition update, returns the transcript to interpret if any
pub fn handle_capture_update(
    update: CaptureUpdate,
    ui: &Ui,
    bus: &DispatchBus,
    toast_ttl: Duration,
) -> Option<String> {
    match update {
        CaptureUpdate::Interim(text) => {
            ui.set_preview(text);
            None
        }
        CaptureUpdate::Final(text) => {
            if text.is_empty() {
                ui.set_idle();
                return None;
            }
            ui.show_final(&text);
            Some(text)
        }
        CaptureUpdate::Failed(error) => {
            ui.set_idle();
            bus.publish(BusEvent::Notification(Notification {
                message: error.to_string(),
                ttl: toast_ttl,
            }));
            None
        }
        CaptureUpdate::Ended => {
            ui.set_idle();
            None
        }
        CaptureUpdate::Ignored => None,
    }
}
