//! connboard - Connections puzzle monthly leaderboard service
//!
//! Serves the host HTTP surface and runs the monthly rotation scheduler in
//! the background until Ctrl+C or SIGTERM.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use connboard::notifier::WebhookNotifier;
use connboard::{build_router, AppState};
use connboard_common::config::{load_config, ConfigSource};
use connboard_common::db::init::init_database;
use connboard_common::store::{MemoryStore, SqliteStore};
use connboard_common::time::{millis_to_duration, Clock, SystemClock};
use connboard_common::{CommunityRegistry, LeaderboardService, LeaderboardStore, RotationScheduler};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Command-line arguments for connboard
#[derive(Parser, Debug)]
#[command(name = "connboard")]
#[command(about = "Monthly Connections puzzle leaderboard service")]
#[command(version)]
struct Args {
    /// Configuration file (overrides CONNBOARD_CONFIG)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "CONNBOARD_PORT")]
    port: Option<u16>,

    /// SQLite database file
    #[arg(short, long, env = "CONNBOARD_DATABASE")]
    database: Option<PathBuf>,

    /// Keep leaderboards in memory only (nothing survives a restart)
    #[arg(long)]
    memory_store: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let (mut config, config_source) = load_config(args.config.as_deref());

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.as_str().into()),
        )
        .init();

    info!(
        "Starting connboard v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    match &config_source {
        ConfigSource::File(path) => info!("Configuration loaded from {}", path.display()),
        ConfigSource::Defaults => info!("No configuration file found, using defaults"),
        ConfigSource::Fallback { path, error } => warn!(
            "Could not use configuration file {} ({}), using defaults",
            path.display(),
            error
        ),
    }

    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(database) = args.database {
        config.database_path = database;
    }

    let clock: Arc<dyn Clock> = match config.utc_offset_minutes {
        Some(minutes) => Arc::new(
            SystemClock::with_offset_minutes(minutes)
                .ok_or_else(|| anyhow!("Invalid UTC offset: {} minutes", minutes))?,
        ),
        None => Arc::new(SystemClock::new()),
    };

    let (store, registry): (Arc<dyn LeaderboardStore>, Arc<dyn CommunityRegistry>) =
        if args.memory_store {
            warn!("Using in-memory store; leaderboards are lost on restart");
            let store = Arc::new(MemoryStore::new());
            (store.clone() as Arc<dyn LeaderboardStore>, store as Arc<dyn CommunityRegistry>)
        } else {
            info!("Database path: {}", config.database_path.display());
            let pool = init_database(&config.database_path)
                .await
                .context("Failed to initialize database")?;
            info!("✓ Database ready");
            let store = Arc::new(SqliteStore::new(pool));
            (store.clone() as Arc<dyn LeaderboardStore>, store as Arc<dyn CommunityRegistry>)
        };

    let notifier = Arc::new(
        WebhookNotifier::new(millis_to_duration(config.notifier.timeout_ms))
            .context("Failed to initialize notifier")?,
    );

    let shutdown = CancellationToken::new();
    let scheduler = Arc::new(RotationScheduler::new(
        store.clone(),
        registry.clone(),
        notifier,
        clock.clone(),
        config.rotation.clone(),
    ));
    let rotation_task = scheduler.spawn(shutdown.clone());

    if config.operator_token.is_none() {
        info!("Operator authentication disabled (no operator_token configured)");
    }

    let service = LeaderboardService::new(store, clock);
    let app = build_router(AppState::new(service, registry, config.operator_token.clone()));

    let addr = format!("{}:{}", config.bind_address, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("connboard listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await
        .context("Server error")?;

    shutdown.cancel();
    if let Err(e) = rotation_task.await {
        warn!("Rotation task ended abnormally: {}", e);
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM and cancel background tasks
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
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
                warn!("Failed to install SIGTERM handler: {}", e);
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

    shutdown.cancel();
}
