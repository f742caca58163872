//! Command system - turns finalized transcripts and typed slash commands into actions
//!
//! Voice transcripts are processed in order of priority:
//! 1. Navigation shortcuts - jump straight to a screen, grammar is skipped
//! 2. Grammar - log intents are published on the dispatch bus for an editor to pick up
//! 3. No match - dropped without a user-visible error

use crate::bus::{BusEvent, DispatchBus, LogModalRequest};
use crate::entry::Category;
use crate::grammar::Grammar;
use crate::insight::Priority;
use crate::intent::{Intent, Route};
use crate::state::SharedState;
use crate::store::TimeRange;

/// Screen switching, supplied by the front-end
pub trait Navigator {
    fn navigate(&self, route: Route);
}

/// What interpreting a transcript led to
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Navigated(Route),
    /// Log request published on the bus
    Dispatched(LogModalRequest),
    /// Recognized, but nothing consumes this kind of intent
    Unwired(Intent),
    NoMatch,
}

const SHORTCUTS: [(&str, Route); 4] = [
    ("show insights", Route::Insights),
    ("open insights", Route::Insights),
    ("open settings", Route::Settings),
    ("show settings", Route::Settings),
];

pub struct CommandInterpreter {
    grammar: Grammar,
    bus: DispatchBus,
    navigator: Box<dyn Navigator>,
}

impl CommandInterpreter {
    pub fn new(bus: DispatchBus, navigator: Box<dyn Navigator>) -> Self {
        Self::with_grammar(Grammar::standard(), bus, navigator)
    }

    pub fn with_grammar(grammar: Grammar, bus: DispatchBus, navigator: Box<dyn Navigator>) -> Self {
        Self {
            grammar,
            bus,
            navigator,
        }
    }

    /// Act on a finalized transcript
    pub fn interpret(&self, transcript: &str) -> Outcome {
        let text = transcript.trim().to_lowercase();

        if let Some(route) = navigation_shortcut(&text) {
            tracing::debug!(%route, "navigation shortcut");
            self.navigator.navigate(route);
            return Outcome::Navigated(route);
        }

        let Some(intent) = self.grammar.evaluate(&text) else {
            tracing::debug!(transcript = %text, "no command matched");
            return Outcome::NoMatch;
        };

        let Some(surface) = intent.surface() else {
            tracing::debug!(kind = %intent.kind, "intent has no consumer");
            return Outcome::Unwired(intent);
        };

        let request = LogModalRequest {
            surface,
            data: intent.data,
        };
        let delivered = self.bus.publish(BusEvent::OpenLogModal(request.clone()));
        tracing::info!(%surface, delivered, "log request dispatched");
        Outcome::Dispatched(request)
    }
}

fn navigation_shortcut(text: &str) -> Option<Route> {
    SHORTCUTS
        .iter()
        .find(|(phrase, _)| text.contains(phrase))
        .map(|(_, route)| *route)
}

// ============================================================================
// Slash commands (keyboard)
// ============================================================================

/// Result of a slash command
#[derive(Debug, Clone, PartialEq)]
pub enum CommandResult {
    /// Command was handled; optional message to show
    Handled(Option<String>),
    Listen,
    StopListening,
    Confirm,
    Cancel,
    Entries { category: Category, range: TimeRange },
    Delete { category: Category, id: String },
    Insights {
        category: Option<Category>,
        min_priority: Priority,
    },
    Score,
    /// New target weight in kg
    SetGoal(f64),
    Navigate(Route),
    Shutdown,
}

const HELP: &str = "\
Commands:
  /listen - Start a voice session (or just type an utterance)
  /stop - Stop listening
  /confirm - Save the pending entry
  /cancel - Discard the pending entry
  /entries <category> [1w|1m|3m|6m|1y|all] - List weight|fitness|nutrition|sleep|mood entries
  /delete <category> <id> - Delete an entry
  /insights [category] [min priority] - Show insights
  /score - Show the health score
  /goal <kg> - Set the target weight
  /mute - Toggle audible cues
  /volume <0.0-1.0> - Set cue volume
  /auto - Toggle auto-listen
  /status - Show current status
  /quit - Exit

Voice commands:
  'log weight 72.5 kg', 'i ran for 30 minutes', 'i ate oatmeal for breakfast',
  'i slept for 8 hours with good quality', 'show insights', 'open settings'";

/// Check if input is a slash command (keyboard input)
pub fn process_slash_command(input: &str, state: &SharedState) -> Option<CommandResult> {
    let input = input.trim();
    let rest = input.strip_prefix('/')?;

    let mut parts = rest.split_whitespace();
    let cmd = parts.next().unwrap_or_default().to_lowercase();
    let args: Vec<&str> = parts.collect();

    let result = match cmd.as_str() {
        "listen" => CommandResult::Listen,
        "stop" => CommandResult::StopListening,
        "confirm" | "save" => CommandResult::Confirm,
        "cancel" => CommandResult::Cancel,
        "entries" | "list" => parse_entries_args(&args),
        "delete" => match (args.first().map(|a| a.parse::<Category>()), args.get(1)) {
            (Some(Ok(category)), Some(id)) => CommandResult::Delete {
                category,
                id: id.to_string(),
            },
            (Some(Err(e)), _) => CommandResult::Handled(Some(e)),
            _ => CommandResult::Handled(Some("Usage: /delete <category> <id>".into())),
        },
        "insights" => parse_insights_args(&args),
        "score" => CommandResult::Score,
        "goal" => match args.first().map(|a| a.parse::<f64>()) {
            Some(Ok(kg)) => CommandResult::SetGoal(kg),
            _ => CommandResult::Handled(Some("Usage: /goal <kg>".into())),
        },
        "settings" => CommandResult::Navigate(Route::Settings),
        "mute" => {
            let muted = state.toggle_mute();
            CommandResult::Handled(Some(if muted { "Muted" } else { "Unmuted" }.into()))
        }
        "volume" => match args.first().map(|a| a.parse::<f32>()) {
            Some(Ok(volume)) => {
                let volume = state.set_volume(volume);
                CommandResult::Handled(Some(format!("Volume {:.0}%", volume * 100.0)))
            }
            _ => CommandResult::Handled(Some(format!(
                "Volume {:.0}% (usage: /volume <0.0-1.0>)",
                state.volume() * 100.0
            ))),
        },
        "auto" => {
            let enabled = state.toggle_auto_listen();
            CommandResult::Handled(Some(
                if enabled { "Auto-listen on" } else { "Auto-listen off" }.into(),
            ))
        }
        "status" => CommandResult::Handled(Some(format!(
            "Listening: {}, Muted: {}, Volume: {:.0}%, Auto-listen: {}",
            if state.is_listening() { "yes" } else { "no" },
            if state.is_muted() { "yes" } else { "no" },
            state.volume() * 100.0,
            if state.auto_listen() { "on" } else { "off" },
        ))),
        "quit" | "exit" => CommandResult::Shutdown,
        "help" | "commands" => CommandResult::Handled(Some(HELP.to_string())),
        _ => return None,
    };
    Some(result)
}

fn parse_entries_args(args: &[&str]) -> CommandResult {
    const USAGE: &str = "Usage: /entries <category> [1w|1m|3m|6m|1y|all]";
    let category = match args.first().map(|a| a.parse::<Category>()) {
        Some(Ok(category)) => category,
        Some(Err(e)) => return CommandResult::Handled(Some(e)),
        None => return CommandResult::Handled(Some(USAGE.into())),
    };
    let range = match args.get(1) {
        None => TimeRange::All,
        Some(arg) => match TimeRange::parse(arg) {
            Some(range) => range,
            None => return CommandResult::Handled(Some(format!("Unknown range: {arg}. {USAGE}"))),
        },
    };
    CommandResult::Entries { category, range }
}

fn parse_insights_args(args: &[&str]) -> CommandResult {
    let mut category = None;
    let mut min_priority = Priority::Low;
    for arg in args {
        if let Some(priority) = Priority::parse(arg) {
            min_priority = priority;
        } else {
            match arg.parse::<Category>() {
                Ok(c) => category = Some(c),
                Err(e) => return CommandResult::Handled(Some(e)),
            }
        }
    }
    CommandResult::Insights {
        category,
        min_priority,
    }
}
