//! Audio core service (serene-ap) - Main entry point
//!
//! Wires the simulated platform adapters, the audio controller and the HTTP
//! surface together.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serene_ap::api::{self, AppContext};
use serene_ap::config::{Config, ConfigOverrides};
use serene_ap::controller::{AudioController, AudioHandle, ControllerParts};
use serene_ap::db;
use serene_ap::platform::{FileCaptureBackend, FixedPermission, SimulatedPlayer};
use serene_ap::recording::RecordingStore;
use serene_ap::session::LoggingSessionBackend;
use serene_common::events::EventBus;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for serene-ap
#[derive(Parser, Debug)]
#[command(name = "serene-ap")]
#[command(about = "Audio session arbitration and playback service")]
#[command(version)]
struct Args {
    /// Port to listen on (overrides the config file)
    #[arg(short, long, env = "SERENE_AP_PORT")]
    port: Option<u16>,

    /// TOML configuration file
    #[arg(short, long, env = "SERENE_CONFIG")]
    config: Option<PathBuf>,

    /// Root folder for the database and recordings
    #[arg(short, long, env = "SERENE_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load(ConfigOverrides {
        config_file: args.config,
        port: args.port,
        root_folder: args.root_folder,
    })
    .context("Failed to load configuration")?;

    // RUST_LOG wins over the configured level
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.toml.logging.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting serene-ap v{} ({} {}, {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!("Root folder: {}", config.root_folder.display());
    info!("Recordings: {}", config.recordings_dir.display());

    let db_pool = db::init_database(&config.database_path)
        .await
        .context("Failed to initialize database")?;
    let app_settings = db::settings::load_app_settings(&db_pool)
        .await
        .context("Failed to load settings")?;
    info!(
        "Settings: rate {}, voice {}",
        app_settings.playback_rate, app_settings.selected_voice
    );

    // Audio controller
    let events = EventBus::new(256);
    let permission = Arc::new(FixedPermission(config.toml.recording.permission_granted));
    let (audio, mailbox) = AudioHandle::channel(permission, events.clone());

    let parts = ControllerParts {
        session_backend: Box::new(LoggingSessionBackend::new()),
        player: Box::new(SimulatedPlayer::new(audio.player_events())),
        capture: Box::new(FileCaptureBackend::new()),
        store: RecordingStore::new(config.recordings_dir.clone()),
        limits: config.recording_limits(),
        timings: config.timings(),
        events,
    };
    let controller_task = AudioController::new(mailbox, parts).spawn();

    if let Err(e) = audio.set_rate(app_settings.playback_rate).await {
        warn!("Could not restore playback rate: {}", e);
    }

    let ctx = AppContext {
        audio: audio.clone(),
        db_pool,
    };
    api::run(config.port, ctx, shutdown_signal())
        .await
        .context("Server error")?;

    // Finish any recording and release the session before exiting
    if let Err(e) = audio.shutdown().await {
        warn!("Audio controller shutdown: {}", e);
    }
    if let Err(e) = controller_task.await {
        warn!("Audio controller task failed: {}", e);
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
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
}
