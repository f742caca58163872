use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use vitalog::bus::DispatchBus;
use vitalog::command::{CommandInterpreter, CommandResult, Navigator, Outcome, process_slash_command};
use vitalog::config::{Config, EngineKind};
use vitalog::editor::LogEditor;
use vitalog::entry::Category;
use vitalog::feedback::{self, Cue, Feedback};
use vitalog::grammar::Grammar;
use vitalog::insight::{Insight, InsightFeed, Priority};
use vitalog::intent::Route;
use vitalog::profile::{InMemoryProfiles, ProfileBackend, ProfileFields, User};
use vitalog::render::{Renderer, Ui};
use vitalog::repl::{handle_capture_update, spawn_input_thread};
use vitalog::score::HealthScore;
use vitalog::speech::{CaptureUpdate, EngineEvent, RecognitionEngine, RecognitionOptions, SpeechCapture};
use vitalog::state::{RuntimeState, SharedState};
use vitalog::store::EntryStore;
use vitalog::typed_engine::{TypedEngine, TypedFeed};

#[derive(Parser)]
#[command(name = "vitalog", about = "Voice-driven health journal")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive voice session (default)
    Listen,
    /// Print the intent an utterance parses to, as JSON
    Parse {
        #[arg(required = true)]
        utterance: Vec<String>,
    },
    /// Show the health score for the demo data
    Score,
    /// List insights
    Insights {
        #[arg(long)]
        category: Option<Category>,
        #[arg(long, value_parser = parse_priority, default_value = "low")]
        priority: Priority,
    },
}

fn parse_priority(s: &str) -> Result<Priority, String> {
    Priority::parse(s).ok_or_else(|| format!("unknown priority: {s} (expected low, medium or high)"))
}

#[hotpath::main]
fn main() -> anyhow::Result<()> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main())
}

async fn async_main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let loaded = Config::try_load();
    let filter = loaded
        .as_ref()
        .map(|c| c.log_filter.clone())
        .unwrap_or_else(|_| Config::default().log_filter);
    init_tracing(&filter);
    let config = loaded.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "ignoring config file, using defaults");
        Config::default()
    });

    match cli.command.unwrap_or(Command::Listen) {
        Command::Listen => run_listen(config).await,
        Command::Parse { utterance } => {
            let intent = Grammar::standard().interpret(&utterance.join(" "));
            println!("{}", serde_json::to_string_pretty(&intent)?);
            Ok(())
        }
        Command::Score => {
            let store = open_store(&config);
            println!("{}", format_score(&HealthScore::compute(&store, config.profile.target_weight)));
            Ok(())
        }
        Command::Insights { category, priority } => {
            println!("{}", format_insights(&InsightFeed::default().filter(category, priority)));
            Ok(())
        }
    }
}

fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn open_store(config: &Config) -> EntryStore {
    if config.store.seed { EntryStore::seeded() } else { EntryStore::new() }
}

/// Prints route changes; the terminal has no screens to switch
#[derive(Clone)]
struct TerminalNavigator {
    ui: Ui,
}

impl Navigator for TerminalNavigator {
    fn navigate(&self, route: Route) {
        tracing::info!(path = route.path(), "navigate");
        self.ui.message(format!("\x1b[35m→ {}\x1b[0m", route));
    }
}

fn build_engine(
    config: &Config,
    tx: flume::Sender<EngineEvent>,
) -> (Option<Box<dyn RecognitionEngine>>, Option<TypedFeed>) {
    match config.voice.engine {
        EngineKind::Typed => {
            let (engine, feed) = TypedEngine::new(tx);
            (Some(Box::new(engine)), Some(feed))
        }
        #[cfg(feature = "mic")]
        EngineKind::Mic => (Some(Box::new(vitalog::mic::MicEngine::new(tx, &config.mic))), None),
        #[cfg(not(feature = "mic"))]
        EngineKind::Mic => {
            tracing::warn!("mic engine not enabled. Build with --features mic");
            drop(tx);
            (None, None)
        }
    }
}

async fn run_listen(config: Config) -> anyhow::Result<()> {
    let state: SharedState = RuntimeState::new(&config);
    let bus = DispatchBus::new();
    let (ui, ui_rx) = Ui::new();
    let mut renderer = Renderer::new();
    let feedback = Feedback::new(state.clone(), feedback::default_sink());
    let _ui_subscriptions = ui.attach(&bus);
    let editor = LogEditor::attach(&bus);
    let navigator = TerminalNavigator { ui: ui.clone() };
    let interpreter = CommandInterpreter::new(bus.clone(), Box::new(navigator.clone()));
    let mut store = open_store(&config);
    let insights = InsightFeed::default();
    let toast_ttl = Duration::from_secs(config.voice.toast_secs);

    let profiles = InMemoryProfiles::with_user(User {
        id: "local".into(),
        name: config.profile.name.clone(),
        email: String::new(),
        preferred_language: config.voice.language.clone(),
        height: None,
        weight_goal: Some(config.profile.target_weight),
    });

    let (engine_tx, engine_rx) = flume::unbounded::<EngineEvent>();
    let (engine, feed) = build_engine(&config, engine_tx);
    let mut capture = SpeechCapture::new(engine, RecognitionOptions::from(&config.voice));

    let (shutdown_tx, shutdown_rx) = flume::bounded::<()>(1);
    ctrlc::set_handler(move || {
        let _ = shutdown_tx.try_send(());
    })
    .context("failed to install Ctrl+C handler")?;

    // Animation tick for the listening spinner and toast expiry
    let ui_tick = ui.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(100));
        loop {
            interval.tick().await;
            ui_tick.tick();
        }
    });

    let input_rx = spawn_input_thread();

    println!(
        "Hi {}! Say or type a command, e.g. \"i ran for 30 minutes\". /help for commands.\n",
        config.profile.name
    );
    if config.voice.auto_listen {
        start_listening(&mut capture, &state, &ui, &bus, &feedback, toast_ttl);
    }

    loop {
        tokio::select! {
            biased;

            _ = shutdown_rx.recv_async() => break,

            line = input_rx.recv_async() => {
                let Ok(line) = line else {
                    break;
                };
                if line.is_empty() {
                    continue;
                }

                if line.starts_with('/') {
                    let Some(result) = process_slash_command(&line, &state) else {
                        ui.message(format!("Unknown command: {line} (try /help)"));
                        continue;
                    };
                    match result {
                        CommandResult::Handled(message) => {
                            if let Some(message) = message {
                                ui.message(message);
                            }
                        }
                        CommandResult::Listen => start_listening(&mut capture, &state, &ui, &bus, &feedback, toast_ttl),
                        CommandResult::StopListening => {
                            capture.stop();
                            state.set_listening(false);
                            ui.set_idle();
                        }
                        CommandResult::Confirm => match editor.confirm(&mut store, today()) {
                            Ok(id) => {
                                feedback.cue(Cue::Saved);
                                ui.message(format!("Saved {id}"));
                            }
                            Err(e) => {
                                feedback.cue(Cue::Failed);
                                ui.message(e.to_string());
                            }
                        },
                        CommandResult::Cancel => ui.message(if editor.cancel() {
                            "Discarded pending entry"
                        } else {
                            "Nothing pending"
                        }),
                        CommandResult::Entries { category, range } => {
                            let lines: Vec<String> = store
                                .within(category, range, today())
                                .iter()
                                .map(|e| format!("  {}  {}  {}", e.id(), e.date(), e.summary()))
                                .collect();
                            ui.message(if lines.is_empty() {
                                format!("No {category} entries in range")
                            } else {
                                lines.join("\n")
                            });
                        }
                        CommandResult::Delete { category, id } => ui.message(if store.delete(category, &id) {
                            format!("Deleted {id}")
                        } else {
                            format!("No {category} entry {id}")
                        }),
                        CommandResult::Insights { category, min_priority } => {
                            ui.message(format_insights(&insights.filter(category, min_priority)));
                        }
                        CommandResult::Score => {
                            let target = profiles
                                .current_user()
                                .and_then(|u| u.weight_goal)
                                .unwrap_or(config.profile.target_weight);
                            ui.message(format_score(&HealthScore::compute(&store, target)));
                        }
                        CommandResult::SetGoal(kg) => {
                            let result = match profiles.current_user() {
                                Some(user) => profiles.update_profile(
                                    &user.id,
                                    ProfileFields { weight_goal: Some(kg), ..Default::default() },
                                ),
                                None => Err(vitalog::error::ProfileError::NotSignedIn),
                            };
                            match result {
                                Ok(()) => ui.message(format!("Target weight {kg} kg")),
                                Err(e) => ui.message(e.to_string()),
                            }
                        }
                        CommandResult::Navigate(route) => navigator.navigate(route),
                        CommandResult::Shutdown => break,
                    }
                    continue;
                }

                match &feed {
                    // Typed lines are spoken into the recognizer like a microphone would
                    Some(feed) => {
                        if !capture.is_listening() {
                            start_listening(&mut capture, &state, &ui, &bus, &feedback, toast_ttl);
                        }
                        if !feed.say(&line) {
                            tracing::debug!("recognizer closed, utterance dropped");
                        }
                    }
                    None => {
                        ui.show_final(&line);
                        if interpret(&interpreter, &line) {
                            feedback.cue(Cue::Prefilled);
                        }
                    }
                }
            }

            Ok(event) = engine_rx.recv_async() => {
                let update = capture.handle_event(event);
                state.set_listening(capture.is_listening());
                if matches!(update, CaptureUpdate::Failed(_)) {
                    feedback.cue(Cue::Failed);
                }
                let finished = matches!(update, CaptureUpdate::Final(_));
                if let Some(transcript) = handle_capture_update(update, &ui, &bus, toast_ttl) {
                    if interpret(&interpreter, &transcript) {
                        feedback.cue(Cue::Prefilled);
                    }
                }
                // A single-shot session ends on its final result
                let queued = feed.as_ref().is_some_and(|f| f.pending() > 0);
                if finished && !capture.is_listening() && (state.auto_listen() || queued) {
                    start_listening(&mut capture, &state, &ui, &bus, &feedback, toast_ttl);
                }
            }

            Ok(ui_event) = ui_rx.recv_async() => {
                renderer.handle(ui_event);
            }
        }
    }

    capture.stop();
    // Drain anything still queued for the terminal
    while let Ok(ui_event) = ui_rx.try_recv() {
        renderer.handle(ui_event);
    }
    println!();
    Ok(())
}

fn start_listening(
    capture: &mut SpeechCapture,
    state: &SharedState,
    ui: &Ui,
    bus: &DispatchBus,
    feedback: &Feedback,
    toast_ttl: Duration,
) {
    match capture.start() {
        Ok(()) => {
            state.set_listening(true);
            ui.set_listening();
            feedback.cue(Cue::Listening);
        }
        Err(e) => {
            state.set_listening(false);
            feedback.cue(Cue::Failed);
            handle_capture_update(CaptureUpdate::Failed(e), ui, bus, toast_ttl);
        }
    }
}

/// Returns true when the transcript pre-filled a log editor
fn interpret(interpreter: &CommandInterpreter, transcript: &str) -> bool {
    match interpreter.interpret(transcript) {
        Outcome::Dispatched(_) => true,
        Outcome::Unwired(intent) => {
            tracing::debug!(kind = %intent.kind, "no surface for intent");
            false
        }
        Outcome::NoMatch => {
            tracing::debug!(%transcript, "not a command");
            false
        }
        Outcome::Navigated(_) => false,
    }
}

fn format_score(score: &HealthScore) -> String {
    format!(
        "Health score: {} ({})\n  sleep {:.1}  nutrition {:.1}  activity {:.1}  mood {:.1}  goal {:.1}",
        score.overall,
        score.grade(),
        score.sleep,
        score.nutrition,
        score.activity,
        score.mood,
        score.goal_progress
    )
}

fn format_insights(insights: &[&Insight]) -> String {
    if insights.is_empty() {
        return "No insights".into();
    }
    insights
        .iter()
        .map(|i| format!("[{}] {} ({})\n    {}", i.priority, i.title, i.category, i.description))
        .collect::<Vec<_>>()
        .join("\n")
}
