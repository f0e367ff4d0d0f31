// ── sproutd — the Sprout desk-companion daemon ─────────────────────────────
// Wires the core engine to the outside world:
//   - a fixed-period tick loop (the engine's only clock source),
//   - a stdin command channel standing in for the sensor and response
//     collaborators (real deployments feed the same engine entry points
//     from PIR/camera adapters),
//   - a terminal renderer standing in for the LED matrix and speaker,
//   - periodic state autosave through the SQLite store.
//
// All engine entry points go through one mutex around the full call; the
// engine itself is synchronous and never blocks on I/O.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use clap::Parser;
use log::{error, info, warn};
use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, BufReader};

use sprout_core::{
    render_output, CareLevel, CompanionEngine, ControlEvent, DisplayCommand, EngineConfig, Mood,
    OutcomeEvent, Posture, PostureReading, Renderer, ResponseType, SensorSample, SharedEngine,
    SpeechCommand, StateStore,
};

const TICK_INTERVAL: Duration = Duration::from_millis(100);
const AUTOSAVE_EVERY: Duration = Duration::from_secs(60);

#[derive(Parser)]
#[command(name = "sproutd", version, about = "Sprout desk-companion daemon")]
struct Args {
    /// Path to the TOML config. Defaults to <config dir>/sprout/sprout.toml.
    #[arg(long, env = "SPROUT_CONFIG")]
    config: Option<PathBuf>,

    /// Path to the state database. Defaults to the platform data directory.
    #[arg(long, env = "SPROUT_DB")]
    db: Option<PathBuf>,
}

/// Latest simulated/forwarded sensor readings, mutated by the stdin task and
/// drained by the tick loop. Motion is one-shot; posture and presence are
/// held until changed.
#[derive(Default)]
struct HostInputs {
    motion: bool,
    posture: Option<PostureReading>,
    presence_hint: Option<bool>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("[sproutd] Fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = args
        .config
        .or_else(|| dirs::config_dir().map(|d| d.join("sprout").join("sprout.toml")))
        .unwrap_or_else(|| PathBuf::from("sprout.toml"));
    let config = EngineConfig::load(&config_path);

    let store = match &args.db {
        Some(path) => StateStore::open_at(path)?,
        None => StateStore::open()?,
    };

    let mut engine = CompanionEngine::new(config, Utc::now());
    engine.restore_from(&store);
    let engine = engine.into_shared();

    info!("[sproutd] Sprout is awake and caring. Type `help` for commands.");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(event_loop(engine, store))?;
    Ok(())
}

async fn event_loop(
    engine: SharedEngine,
    store: StateStore,
) -> Result<(), Box<dyn std::error::Error>> {
    let inputs = Arc::new(Mutex::new(HostInputs::default()));
    let mut renderer = TerminalRenderer::default();

    // Stdin command task; feeds control/outcome events into the engine.
    // The local tx clone keeps the channel open across stdin EOF, so a
    // headless daemon keeps ticking until `quit` or Ctrl-C.
    let (quit_tx, mut quit_rx) = tokio::sync::mpsc::channel::<()>(1);
    let _quit_guard = quit_tx.clone();
    tokio::spawn(stdin_task(engine.clone(), inputs.clone(), quit_tx));

    let mut ticker = tokio::time::interval(TICK_INTERVAL);
    let mut autosave = tokio::time::interval(AUTOSAVE_EVERY);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let sample = {
                    let mut i = inputs.lock();
                    SensorSample {
                        motion_detected: std::mem::take(&mut i.motion),
                        posture: i.posture,
                        presence_hint: i.presence_hint,
                        light_level: None,
                        at: Utc::now(),
                    }
                };
                let output = engine.lock().tick(&sample);
                render_output(&output, &mut renderer);
            }
            _ = autosave.tick() => {
                if let Err(e) = engine.lock().save(&store) {
                    warn!("[sproutd] Autosave failed: {e}");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("[sproutd] Shutdown requested");
                break;
            }
            _ = quit_rx.recv() => break,
        }
    }

    engine.lock().save(&store)?;
    info!("[sproutd] State saved. Rest well.");
    Ok(())
}

async fn stdin_task(
    engine: SharedEngine,
    inputs: Arc<Mutex<HostInputs>>,
    quit: tokio::sync::mpsc::Sender<()>,
) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if !handle_command(line.trim(), &engine, &inputs) {
            let _ = quit.send(()).await;
            return;
        }
    }
}

/// Returns false when the daemon should exit.
fn handle_command(line: &str, engine: &SharedEngine, inputs: &Arc<Mutex<HostInputs>>) -> bool {
    let mut parts = line.split_whitespace();
    let Some(cmd) = parts.next() else { return true };
    let arg = parts.next();
    let arg2 = parts.next();

    let posture_input = |label: Posture| {
        let confidence = arg.and_then(|a| a.parse::<f32>().ok()).unwrap_or(0.9);
        Some(PostureReading { label, confidence })
    };

    match cmd {
        "help" => {
            println!("sensors:  motion | sit [conf] | stand [conf] | lean [conf] | nopose | here | gone");
            println!("feedback: acted <category> | ignored <category>");
            println!("control:  sleep | wake | snooze <category> <min> | name <name> | care <level>");
            println!("misc:     mute | unmute | status | quit");
        }
        "motion" => inputs.lock().motion = true,
        "sit" => inputs.lock().posture = posture_input(Posture::Sitting),
        "stand" => inputs.lock().posture = posture_input(Posture::Standing),
        "lean" => inputs.lock().posture = posture_input(Posture::LeaningForward),
        "nopose" => inputs.lock().posture = None,
        "here" => inputs.lock().presence_hint = Some(true),
        "gone" => {
            let mut i = inputs.lock();
            i.presence_hint = None;
            i.posture = None;
        }
        "acted" | "ignored" => match arg.map(str::parse::<ResponseType>) {
            Some(Ok(category)) => engine.lock().record_outcome(
                &OutcomeEvent {
                    category,
                    effective: cmd == "acted",
                },
                Utc::now(),
            ),
            _ => println!("usage: {cmd} <category>"),
        },
        "sleep" => apply(engine, ControlEvent::Sleep),
        "wake" => apply(engine, ControlEvent::Wake),
        "snooze" => {
            let category = arg.map(str::parse::<ResponseType>);
            let minutes = arg2.map(str::parse::<i64>);
            match (category, minutes) {
                (Some(Ok(category)), Some(Ok(minutes))) => {
                    apply(engine, ControlEvent::Snooze { category, minutes })
                }
                _ => println!("usage: snooze <category> <minutes>"),
            }
        }
        "name" => match arg {
            Some(name) => apply(
                engine,
                ControlEvent::SetUserName {
                    name: name.to_string(),
                },
            ),
            None => println!("usage: name <name>"),
        },
        "care" => match arg.and_then(parse_care_level) {
            Some(level) => apply(engine, ControlEvent::SetCareLevel { level }),
            None => println!("usage: care gentle|encouraging|concerned|worried"),
        },
        "mute" => engine.lock().set_responses_enabled(false),
        "unmute" => engine.lock().set_responses_enabled(true),
        "status" => match serde_json::to_string_pretty(&engine.lock().status()) {
            Ok(json) => println!("{json}"),
            Err(e) => warn!("[sproutd] Status serialization failed: {e}"),
        },
        "quit" | "exit" => return false,
        other => println!("unknown command: {other} (try `help`)"),
    }
    true
}

fn apply(engine: &SharedEngine, event: ControlEvent) {
    if let Err(e) = engine.lock().apply_control(&event, Utc::now()) {
        println!("rejected: {e}");
    }
}

fn parse_care_level(s: &str) -> Option<CareLevel> {
    match s.to_ascii_lowercase().as_str() {
        "gentle" => Some(CareLevel::Gentle),
        "encouraging" => Some(CareLevel::Encouraging),
        "concerned" => Some(CareLevel::Concerned),
        "worried" => Some(CareLevel::Worried),
        _ => None,
    }
}

// ── Terminal renderer ──────────────────────────────────────────────────────
// Stands in for the LED matrix and speaker: one colored mood line whenever
// the mood changes, and every spoken message as text.

#[derive(Default)]
struct TerminalRenderer {
    last_mood: Option<Mood>,
}

impl Renderer for TerminalRenderer {
    fn display(&mut self, cmd: &DisplayCommand) {
        if self.last_mood == Some(cmd.mood) {
            return;
        }
        self.last_mood = Some(cmd.mood);
        let (color, face) = mood_style(cmd.mood);
        println!("{color}● {:?}\x1b[0m {face}  (intensity {:.2})", cmd.mood, cmd.intensity);
    }

    fn speak(&mut self, cmd: &SpeechCommand) {
        println!("💬 [{:?}] {}", cmd.urgency, cmd.text);
    }
}

/// ANSI color + face per mood, mirroring the LED palette of the device
/// build: green happy, yellow caring, orange concerned, red worried,
/// blue sleeping, magenta celebrating.
fn mood_style(mood: Mood) -> (&'static str, &'static str) {
    match mood {
        Mood::Happy => ("\x1b[32m", "(^‿^)"),
        Mood::Caring => ("\x1b[33m", "(・‿・)"),
        Mood::Concerned => ("\x1b[38;5;208m", "(・_・)"),
        Mood::Worried => ("\x1b[31m", "(;´Д`)"),
        Mood::Sleeping => ("\x1b[34m", "(-_-) zzz"),
        Mood::Celebrating => ("\x1b[35m", "\\(^o^)/"),
    }
}
