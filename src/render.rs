use std::io::Write;
use std::time::{Duration, Instant};

use crate::bus::{BusEvent, DispatchBus, EventName, LogModalRequest, Subscription};

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

#[derive(Debug, Clone)]
pub enum UiEvent {
    Preview(String),
    Final(String),
    Listening,
    Idle,
    Toast { message: String, ttl: Duration },
    Prefill(LogModalRequest),
    Message(String),
    Tick,
}

#[derive(Clone)]
pub struct Ui {
    tx: flume::Sender<UiEvent>,
}

impl Ui {
    pub fn new() -> (Self, flume::Receiver<UiEvent>) {
        let (tx, rx) = flume::unbounded();
        (Self { tx }, rx)
    }

    /// Mirror log requests and notifications from the bus onto the terminal
    #[must_use = "dropping the subscriptions detaches the ui"]
    pub fn attach(&self, bus: &DispatchBus) -> Vec<Subscription> {
        let prefill = self.clone();
        let toast = self.clone();
        vec![
            bus.subscribe(EventName::OpenLogModal, move |event| {
                if let BusEvent::OpenLogModal(request) = event {
                    prefill.show_prefill(request.clone());
                }
            }),
            bus.subscribe(EventName::Notification, move |event| {
                if let BusEvent::Notification(n) = event {
                    toast.toast(&n.message, n.ttl);
                }
            }),
        ]
    }

    pub fn set_preview(&self, text: String) {
        let _ = self.tx.send(UiEvent::Preview(text));
    }

    pub fn set_listening(&self) {
        let _ = self.tx.send(UiEvent::Listening);
    }

    pub fn set_idle(&self) {
        let _ = self.tx.send(UiEvent::Idle);
    }

    pub fn show_final(&self, text: &str) {
        let _ = self.tx.send(UiEvent::Final(text.to_string()));
    }

    pub fn toast(&self, message: &str, ttl: Duration) {
        let _ = self.tx.send(UiEvent::Toast {
            message: message.to_string(),
            ttl,
        });
    }

    pub fn show_prefill(&self, request: LogModalRequest) {
        let _ = self.tx.send(UiEvent::Prefill(request));
    }

    pub fn message(&self, text: impl Into<String>) {
        let _ = self.tx.send(UiEvent::Message(text.into()));
    }

    pub fn tick(&self) {
        let _ = self.tx.send(UiEvent::Tick);
    }
}

#[derive(Clone, PartialEq)]
enum RenderState {
    Idle,
    Preview(String),
    Listening,
}

struct Toast {
    message: String,
    expires: Instant,
}

pub struct Renderer {
    out: Box<dyn Write + Send>,
    state: RenderState,
    toast: Option<Toast>,
    frame: usize,
}

impl Renderer {
    pub fn new() -> Self {
        Self::with_writer(Box::new(std::io::stdout()))
    }

    pub fn with_writer(out: Box<dyn Write + Send>) -> Self {
        Self {
            out,
            state: RenderState::Idle,
            toast: None,
            frame: 0,
        }
    }

    /// Message of the toast currently on screen
    pub fn toast(&self) -> Option<&str> {
        self.toast.as_ref().map(|t| t.message.as_str())
    }

    pub fn handle(&mut self, event: UiEvent) {
        match event {
            UiEvent::Preview(text) => {
                self.state = RenderState::Preview(text.clone());
                let _ = write!(self.out, "\r\x1b[K\x1b[90m{}\x1b[0m", text);
            }
            UiEvent::Final(text) => {
                self.state = RenderState::Idle;
                let _ = writeln!(self.out, "\r\x1b[K> {}", text);
            }
            UiEvent::Listening => {
                self.state = RenderState::Listening;
                self.render_listening();
            }
            UiEvent::Idle => {
                self.state = RenderState::Idle;
                let _ = write!(self.out, "\r\x1b[K");
            }
            UiEvent::Toast { message, ttl } => {
                let _ = writeln!(self.out, "\r\x1b[K\x1b[33m! {}\x1b[0m", message);
                self.toast = Some(Toast {
                    message,
                    expires: Instant::now() + ttl,
                });
            }
            UiEvent::Prefill(request) => {
                let _ = writeln!(
                    self.out,
                    "\r\x1b[K\x1b[36mLog {}: {}\x1b[0m  \x1b[90m(/confirm or /cancel)\x1b[0m",
                    request.surface,
                    describe(&request)
                );
            }
            UiEvent::Message(text) => {
                let _ = writeln!(self.out, "\r\x1b[K{}", text);
            }
            UiEvent::Tick => {
                self.frame += 1;
                if self.toast.as_ref().is_some_and(|t| Instant::now() >= t.expires) {
                    self.toast = None;
                }
                match self.state {
                    RenderState::Listening => self.render_listening(),
                    _ => return,
                }
            }
        }
        self.out.flush().ok();
    }

    fn render_listening(&mut self) {
        let spinner = SPINNER[self.frame % SPINNER.len()];
        let _ = write!(self.out, "\r\x1b[K\x1b[32m{} Listening...\x1b[0m", spinner);
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

fn describe(request: &LogModalRequest) -> String {
    if request.data.is_empty() {
        return "(empty)".into();
    }
    request
        .data
        .iter()
        .map(|(k, v)| match v.as_str() {
            Some(s) => format!("{k}={s}"),
            None => format!("{k}={v}"),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::Notification;
    use crate::intent::{LogSurface, Params};
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[test]
    fn test_attach_forwards_bus_events() {
        let bus = DispatchBus::new();
        let (ui, rx) = Ui::new();
        let subs = ui.attach(&bus);
        assert_eq!(subs.len(), 2);

        let data: Params = serde_json::from_value(json!({"duration": 8})).unwrap();
        bus.publish(BusEvent::OpenLogModal(LogModalRequest {
            surface: LogSurface::Sleep,
            data,
        }));
        bus.publish(BusEvent::Notification(Notification {
            message: "Failed to start speech recognition".into(),
            ttl: Duration::from_secs(3),
        }));

        assert!(matches!(rx.try_recv(), Ok(UiEvent::Prefill(r)) if r.surface == LogSurface::Sleep));
        assert!(matches!(rx.try_recv(), Ok(UiEvent::Toast { ttl, .. }) if ttl == Duration::from_secs(3)));

        drop(subs);
        assert_eq!(bus.subscriber_count(EventName::Notification), 0);
    }

    #[test]
    fn test_toast_expires_on_tick() {
        let out = Captured::default();
        let mut renderer = Renderer::with_writer(Box::new(out.clone()));

        renderer.handle(UiEvent::Toast {
            message: "mic unavailable".into(),
            ttl: Duration::from_secs(60),
        });
        renderer.handle(UiEvent::Tick);
        assert_eq!(renderer.toast(), Some("mic unavailable"));

        renderer.handle(UiEvent::Toast {
            message: "gone".into(),
            ttl: Duration::ZERO,
        });
        renderer.handle(UiEvent::Tick);
        assert_eq!(renderer.toast(), None);
        assert!(out.text().contains("mic unavailable"));
    }

    #[test]
    fn test_prefill_lists_fields() {
        let out = Captured::default();
        let mut renderer = Renderer::with_writer(Box::new(out.clone()));
        let data: Params = serde_json::from_value(json!({"food": "oatmeal", "mealType": "breakfast"})).unwrap();
        renderer.handle(UiEvent::Prefill(LogModalRequest {
            surface: LogSurface::Meal,
            data,
        }));
        let text = out.text();
        assert!(text.contains("food=oatmeal"));
        assert!(text.contains("mealType=breakfast"));
    }
}
