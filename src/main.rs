#![forbid(unsafe_code)]

mod capture;
mod config;
mod constants;
mod enumerate;
mod errors;
mod matching;
mod persistence;
mod reconcile;
mod types;
mod winsys;
mod x11_utils;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{Level as TraceLevel, debug, error, info};
use tracing_subscriber::FmtSubscriber;

use config::Settings;
use persistence::PlacementStore;
use reconcile::Reconciler;
use x11_utils::X11WindowSystem;

#[derive(Parser)]
#[command(name = "placekeeper", version, about = "Keeps application windows where you put them")]
struct Cli {
    /// Override the saved-placements file location
    #[arg(long, global = true, value_name = "PATH")]
    positions: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Reposition matching windows on a fixed period (the default)
    Run {
        /// Reconcile once and exit
        #[arg(long)]
        once: bool,
    },
    /// List the currently visible windows
    List,
    /// List the saved placements
    Saved,
    /// Save the placement of the live window with this exact title
    Save { title: String },
    /// Remove the saved placement shown with this label ("Title (process)")
    Remove { label: String },
}

fn main() -> Result<()> {
    // Parse log level from environment variable
    let log_level = match std::env::var("LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    let mut settings = Settings::load();
    if let Some(path) = cli.positions {
        settings.positions_file = Some(path);
    }

    let winsys = X11WindowSystem::connect()?;
    let store = PlacementStore::load(settings.positions_path())?;
    info!(count = store.len(), path = %store.path().display(), "Loaded saved placements");

    let mut reconciler = Reconciler::new(winsys, store, settings.exclude_title_prefix.clone());

    match cli.command.unwrap_or(Command::Run { once: false }) {
        Command::Run { once } => run_loop(&mut reconciler, &settings, once),
        Command::List => {
            for window in reconciler.live_windows()? {
                println!("{}", window.label());
            }
            Ok(())
        }
        Command::Saved => {
            if reconciler.store().is_empty() {
                println!("No saved placements");
                return Ok(());
            }
            for (_, record) in reconciler.store().iter() {
                println!(
                    "{}  {},{} {}x{} {:?}",
                    record.label(),
                    record.x,
                    record.y,
                    record.width,
                    record.height,
                    record.state,
                );
            }
            Ok(())
        }
        Command::Save { title } => {
            let (_, record) = reconciler.save_window(&title)?;
            println!(
                "Saved '{}' at {},{} ({}x{}, {:?})",
                record.title, record.x, record.y, record.width, record.height, record.state,
            );
            Ok(())
        }
        Command::Remove { label } => {
            reconciler.remove_saved(&label)?;
            println!("Removed '{label}'");
            Ok(())
        }
    }
}

fn run_loop(
    reconciler: &mut Reconciler<X11WindowSystem>,
    settings: &Settings,
    once: bool,
) -> Result<()> {
    let term = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGTERM, Arc::clone(&term))?;
    signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&term))?;

    let interval = Duration::from_millis(settings.tick_interval_ms);
    info!(interval_ms = settings.tick_interval_ms, "Reconciling window placements");

    loop {
        match reconciler.tick(None) {
            Ok(outcome) => debug!(
                live = outcome.live.len(),
                highlighted = ?outcome.highlighted,
                "Reconciliation pass complete"
            ),
            Err(e) => error!(error = %e, "Reconciliation pass failed"),
        }

        if once || term.load(Ordering::Relaxed) {
            break;
        }
        std::thread::sleep(interval);
    }

    info!("Shutting down");
    Ok(())
}
