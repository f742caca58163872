//! Dispatch bus - synchronous publish/subscribe between the interpreter and UI surfaces
//!
//! Delivery is in-process and best-effort: handlers for an event run in subscription
//! order on the publisher's thread, and an event published with no subscribers is
//! simply dropped. A `Subscription` unsubscribes when dropped, so a surface that goes
//! away stops receiving events.

use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use crate::intent::{LogSurface, Params};

/// Names subscribers can listen on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventName {
    OpenLogModal,
    Notification,
}

impl EventName {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventName::OpenLogModal => "openLogModal",
            EventName::Notification => "notification",
        }
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of `openLogModal`: which editor to open and what to pre-fill it with
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogModalRequest {
    #[serde(rename = "type")]
    pub surface: LogSurface,
    pub data: Params,
}

/// Transient, auto-dismissing message for the user
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub message: String,
    pub ttl: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BusEvent {
    OpenLogModal(LogModalRequest),
    Notification(Notification),
}

impl BusEvent {
    pub fn name(&self) -> EventName {
        match self {
            BusEvent::OpenLogModal(_) => EventName::OpenLogModal,
            BusEvent::Notification(_) => EventName::Notification,
        }
    }
}

pub type Handler = Arc<dyn Fn(&BusEvent) + Send + Sync>;

struct Registered {
    id: u64,
    name: EventName,
    handler: Handler,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    handlers: Vec<Registered>,
}

type SharedRegistry = Arc<Mutex<Registry>>;

/// Publish/subscribe channel, cheap to clone; clones share subscribers
#[derive(Clone, Default)]
pub struct DispatchBus {
    registry: SharedRegistry,
}

impl DispatchBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `name`; keep the returned handle alive to stay subscribed
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe<F>(&self, name: EventName, handler: F) -> Subscription
    where
        F: Fn(&BusEvent) + Send + Sync + 'static,
    {
        let mut registry = lock(&self.registry);
        registry.next_id += 1;
        let id = registry.next_id;
        registry.handlers.push(Registered {
            id,
            name,
            handler: Arc::new(handler),
        });
        tracing::trace!(event = %name, id, "subscribed");

        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Deliver `event` to every current subscriber of its name, returns how many ran
    pub fn publish(&self, event: BusEvent) -> usize {
        let name = event.name();
        // Snapshot so handlers can subscribe or publish without deadlocking
        let handlers: Vec<Handler> = lock(&self.registry)
            .handlers
            .iter()
            .filter(|r| r.name == name)
            .map(|r| Arc::clone(&r.handler))
            .collect();

        if handlers.is_empty() {
            tracing::debug!(event = %name, "no subscribers, event dropped");
            return 0;
        }

        for handler in &handlers {
            handler(&event);
        }
        handlers.len()
    }

    pub fn subscriber_count(&self, name: EventName) -> usize {
        lock(&self.registry)
            .handlers
            .iter()
            .filter(|r| r.name == name)
            .count()
    }
}

/// Live registration on a `DispatchBus`
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        // Drop does the work
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            let removed = {
                let mut guard = lock(&registry);
                let index = guard.handlers.iter().position(|r| r.id == self.id);
                index.map(|i| guard.handlers.remove(i))
            };
            // Handler may own other subscriptions; release it outside the lock
            drop(removed);
            tracing::trace!(id = self.id, "unsubscribed");
        }
    }
}

fn lock(registry: &Mutex<Registry>) -> std::sync::MutexGuard<'_, Registry> {
    // A panicking handler never runs under the lock, so poisoning is recoverable
    registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
