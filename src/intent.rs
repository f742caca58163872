//! Interpreted commands and the UI surfaces they are routed to

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Loosely-typed parameters extracted by a grammar rule
pub type Params = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentKind {
    Weight,
    Exercise,
    Nutrition,
    Sleep,
    Mood,
    Query,
    Unrecognized,
}

impl fmt::Display for IntentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IntentKind::Weight => "weight",
            IntentKind::Exercise => "exercise",
            IntentKind::Nutrition => "nutrition",
            IntentKind::Sleep => "sleep",
            IntentKind::Mood => "mood",
            IntentKind::Query => "query",
            IntentKind::Unrecognized => "unrecognized",
        };
        f.write_str(name)
    }
}

/// Result of interpreting a free-text command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    #[serde(rename = "type")]
    pub kind: IntentKind,
    #[serde(default)]
    pub data: Params,
}

impl Intent {
    pub fn new(kind: IntentKind, data: Params) -> Self {
        Self { kind, data }
    }

    pub fn unrecognized() -> Self {
        Self::new(IntentKind::Unrecognized, Params::new())
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.data.get(key).and_then(Value::as_f64)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }

    /// Editor surface that consumes this intent, if one is wired
    pub fn surface(&self) -> Option<LogSurface> {
        match self.kind {
            IntentKind::Weight => Some(LogSurface::Weight),
            IntentKind::Exercise => Some(LogSurface::Workout),
            IntentKind::Nutrition => Some(LogSurface::Meal),
            IntentKind::Sleep => Some(LogSurface::Sleep),
            IntentKind::Mood | IntentKind::Query | IntentKind::Unrecognized => None,
        }
    }
}

/// Editor a log request opens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogSurface {
    Weight,
    Workout,
    Meal,
    Sleep,
}

impl fmt::Display for LogSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogSurface::Weight => write!(f, "weight"),
            LogSurface::Workout => write!(f, "workout"),
            LogSurface::Meal => write!(f, "meal"),
            LogSurface::Sleep => write!(f, "sleep"),
        }
    }
}

/// Screens reachable through a voice navigation shortcut
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Insights,
    Settings,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Insights => "/app/insights",
            Route::Settings => "/app/settings",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}
