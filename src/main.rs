//! Main entry point for the Ready Room match orchestration service
//!
//! Initializes configuration, logging, restart persistence, and the lobby
//! queue, then runs until a shutdown signal arrives. The presentation layer
//! (chat platform adapter) connects to this core through the library's
//! gating and session APIs.

use anyhow::Result;
use clap::Parser;
use ready_room::config::AppConfig;
use ready_room::lobby::LobbyQueue;
use ready_room::storage::MemoryStore;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

/// Ready Room - Match Session Orchestration Service
#[derive(Parser)]
#[command(
    name = "ready-room",
    version,
    about = "A match session orchestration service for competitive PUG lobbies",
    long_about = "Ready Room drives pickup-game match sessions through captain selection, \
                 team drafting, faction and base picks, readiness checks, and round scoring, \
                 with independently-failing side-effect plugins and restart-safe lobby state."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// Enable debug mode
    #[arg(short, long, help = "Enable debug mode with verbose logging")]
    debug: bool,

    /// Dry run mode (validate config and exit)
    #[arg(
        long,
        help = "Validate configuration and exit without starting service"
    )]
    dry_run: bool,
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Wait for shutdown signals (SIGINT, SIGTERM)
async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C) signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}

/// Display startup banner with service information
fn display_startup_banner(config: &AppConfig) {
    info!("🚀 Ready Room Match Orchestration Service");
    info!("   Service: {}", config.service.name);
    info!("   Log level: {}", config.service.log_level);
    info!("   Rounds per match: {}", config.match_rules.round_count);
    info!("   Lobby capacity: {}", config.match_rules.lobby_capacity);
    info!("   Audio announcements: {}", config.audio_enabled());
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}

/// Load and merge configuration from environment and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if args.debug {
        config.service.log_level = "debug".to_string();
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration (CLI args can override environment/config file)
    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });

    // Initialize logging early (before any other operations)
    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    if args.dry_run {
        info!("Configuration validation successful");
        display_startup_banner(&config);
        info!("Dry run completed - exiting without starting service");
        return Ok(());
    }

    display_startup_banner(&config);

    // Restart persistence and lobby signups
    let store = Arc::new(MemoryStore::new());
    let mut lobby = LobbyQueue::new(store, config.match_rules.lobby_capacity);
    match lobby.restore().await {
        Ok(0) => info!("No lobby state to restore"),
        Ok(n) => info!("Restored lobby with {} signups", n),
        Err(e) => {
            error!("Failed to restore lobby state: {}", e);
            std::process::exit(1);
        }
    }

    info!("✅ Ready Room is running");
    info!("Press Ctrl+C to shutdown gracefully...");

    wait_for_shutdown_signal().await;

    info!("🛑 Shutdown signal received, beginning graceful shutdown...");
    info!(
        "Persisted lobby state for {} signups",
        lobby.len()
    );
    info!("🛑 Ready Room stopped");
    Ok(())
}
