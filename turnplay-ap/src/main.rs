//! Audio Player (turnplay-ap) - Main entry point
//!
//! Loads a transcription response (JSON) and plays its turn clips as one
//! continuous recording, controlled by commands typed on stdin.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use turnplay_ap::config::{Config, ConfigOverrides, MODULE_NAME};
use turnplay_ap::control::{parse_command, ConsoleCommand, HELP};
use turnplay_ap::playback::PlaybackEngine;
use turnplay_common::api::{parse_transcription, TurnDescriptor};
use turnplay_common::config::{load_or_default, LoggingConfig};
use turnplay_common::events::{EventBus, PlayerEvent};

/// Command-line arguments for turnplay-ap
#[derive(Parser, Debug)]
#[command(name = "turnplay-ap")]
#[command(about = "Plays the turn clips of a diarized transcript as one recording")]
#[command(version)]
struct Args {
    /// Transcription response JSON (`{"transcription": [...]}`)
    transcript: PathBuf,

    /// TOML config file (default: <config_dir>/turnplay/turnplay-ap.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Folder that turn audio paths are resolved against
    #[arg(short, long, env = "TURNPLAY_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Position tick interval in milliseconds
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long)]
    log_level: Option<String>,

    /// Start global playback immediately
    #[arg(long)]
    autoplay: bool,

    /// Exit once global playback runs past the last turn
    #[arg(long)]
    exit_on_finish: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml_config = load_or_default(args.config.as_deref(), MODULE_NAME)
        .context("Failed to load configuration")?;

    let config = Config::resolve(
        ConfigOverrides {
            root_folder: args.root_folder.clone(),
            tick_interval_ms: args.tick_ms,
            log_level: args.log_level.clone(),
        },
        &toml_config,
    )
    .context("Invalid configuration")?;

    init_tracing(&config.log_level, &toml_config.logging)?;

    info!("Starting turnplay Audio Player");
    info!("Root folder: {}", config.root_folder.display());

    let body = std::fs::read_to_string(&args.transcript)
        .with_context(|| format!("Failed to read {}", args.transcript.display()))?;
    let turns = parse_transcription(&body).context("Invalid transcription response")?;
    if turns.is_empty() {
        anyhow::bail!("No transcription data found in {}", args.transcript.display());
    }
    info!("Loaded {} turns", turns.len());

    let bus = EventBus::new(config.event_bus_capacity);
    let mut events = bus.subscribe();

    let (engine, handle) = PlaybackEngine::with_clock_backend(&turns, &config, bus)
        .context("Failed to initialize playback engine")?;
    let engine_task = engine.spawn();
    info!("Playback engine initialized");

    print_turns(&turns);
    println!("{}", HELP);

    if args.autoplay {
        handle.play().await?;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            line = lines.next_line(), if stdin_open => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    info!("stdin closed");
                    stdin_open = false;
                    continue;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match parse_command(&line) {
                    Ok(ConsoleCommand::Quit) => break,
                    Ok(ConsoleCommand::Help) => println!("{}", HELP),
                    Ok(ConsoleCommand::Status) => {
                        let snapshot = handle.status().await?;
                        println!(
                            "{:5.1}% | turn {} | {}",
                            snapshot.progress_ratio * 100.0,
                            snapshot
                                .active_segment_index
                                .map(|i| i.to_string())
                                .unwrap_or_else(|| "-".to_string()),
                            snapshot.playback_intent
                        );
                    }
                    Ok(command) => {
                        if let Some(player_command) = command.to_player_command() {
                            handle.send(player_command).await?;
                        }
                    }
                    Err(e) => println!("{} (type 'help')", e),
                }
            }
            event = events.recv() => match event {
                Ok(event) => {
                    let finished = matches!(event, PlayerEvent::SessionFinished { .. });
                    report(&event, &turns);
                    if finished && args.exit_on_finish {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Console fell behind, skipped {} events", skipped);
                }
                Err(RecvError::Closed) => break,
            },
            _ = &mut shutdown => break,
        }
    }

    handle.shutdown().await.ok();
    engine_task.await.context("Playback engine task failed")?;

    info!("Shutdown complete");
    Ok(())
}

fn init_tracing(level: &str, logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("turnplay_ap={},turnplay_common={}", level, level).into());

    let file_layer = match &logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    let stderr_layer = file_layer
        .is_none()
        .then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(())
}

fn print_turns(turns: &[TurnDescriptor]) {
    for (index, turn) in turns.iter().enumerate() {
        println!("[{:>3}] {} ({}): {}", index, turn.speaker, turn.method, turn.text);
    }
}

/// Console rendering of player events
fn report(event: &PlayerEvent, turns: &[TurnDescriptor]) {
    match event {
        PlayerEvent::ActiveSegmentChanged {
            index: Some(index), ..
        } => {
            if let Some(turn) = turns.get(*index) {
                println!("> [{:>3}] {}: {}", index, turn.speaker, turn.text);
            }
        }
        PlayerEvent::PlaybackStateChanged { new_state, .. } => {
            println!("state: {}", new_state);
        }
        PlayerEvent::SegmentLoadFailed { index, reason, .. } => {
            println!("! turn {} skipped: {}", index, reason);
        }
        PlayerEvent::SessionFinished { completed, .. } => {
            if *completed {
                println!("finished");
            } else {
                println!("finished (remaining turns could not be loaded)");
            }
        }
        _ => {}
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
