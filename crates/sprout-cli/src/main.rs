// ── sprout — diagnostics CLI ───────────────────────────────────────────────
// Inspects and edits the persisted companion state. The daemon (`sproutd`)
// reads this state on startup, so edits here take effect on its next run.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use sprout_core::{EngineResult, PersistedState, ResponseType, StateStore};

#[derive(Parser)]
#[command(
    name = "sprout",
    version,
    about = "Inspect and manage the Sprout desk companion's persisted state"
)]
struct Cli {
    /// Path to the state database. Defaults to the platform data directory.
    #[arg(long, env = "SPROUT_DB", global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the last persisted companion state.
    Status {
        /// Emit raw JSON instead of the human-readable summary.
        #[arg(long)]
        json: bool,
    },
    /// Set the name used in personalized messages.
    SetName { name: String },
    /// Show learned per-category response effectiveness.
    Prefs,
    /// Delete the persisted state, returning the companion to defaults.
    Reset {
        /// Confirm the deletion.
        #[arg(long)]
        yes: bool,
    },
    /// Generate shell completions.
    Completions { shell: Shell },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> EngineResult<()> {
    match &cli.command {
        Commands::Status { json } => {
            let state = open_store(cli)?.load_state();
            if *json {
                println!("{}", serde_json::to_string_pretty(&state)?);
            } else {
                print_status(&state);
            }
            Ok(())
        }
        Commands::SetName { name } => {
            let store = open_store(cli)?;
            let mut state = store.load_state();
            state.user_name = name.trim().to_string();
            store.save_state(&state)?;
            println!("User name set to \"{}\"", state.user_name);
            Ok(())
        }
        Commands::Prefs => {
            let state = open_store(cli)?.load_state();
            println!("{:<15} {:>13}", "category", "effectiveness");
            for rt in ResponseType::ALL {
                let score = state.preferences.get(&rt).copied().unwrap_or(0.5);
                println!("{:<15} {:>13.3}", rt.as_str(), score);
            }
            Ok(())
        }
        Commands::Reset { yes } => {
            if !*yes {
                eprintln!("This deletes the saved companion state. Re-run with --yes to confirm.");
                return Ok(());
            }
            open_store(cli)?.clear_state()?;
            println!("State cleared.");
            Ok(())
        }
        Commands::Completions { shell } => {
            clap_complete::generate(*shell, &mut Cli::command(), "sprout", &mut io::stdout());
            Ok(())
        }
    }
}

fn open_store(cli: &Cli) -> EngineResult<StateStore> {
    match &cli.db {
        Some(path) => {
            log::debug!("[cli] Opening store at {}", path.display());
            StateStore::open_at(path)
        }
        None => StateStore::open(),
    }
}

fn print_status(state: &PersistedState) {
    println!("mood:                {:?}", state.mood);
    println!("care level:          {:?}", state.care_level);
    println!("user name:           {}", state.user_name);
    println!("consecutive ignored: {}", state.consecutive_ignored);
    println!("reminders today:     {}", state.reminders_sent_today);
    for (rt, count) in &state.reminders_by_category {
        println!("  {:<12} {}", rt.as_str(), count);
    }
    if let Some(reset) = state.last_stats_reset {
        println!("stats since:         {}", reset.format("%Y-%m-%d %H:%M UTC"));
    }
    let now = chrono::Utc::now();
    for (rt, at) in &state.last_fired {
        println!(
            "last {:<10} reminder: {} ({} min ago)",
            rt.as_str(),
            at.format("%Y-%m-%d %H:%M UTC"),
            (now - *at).num_minutes().max(0)
        );
    }
}
