//! HTTP server setup and routing

use crate::controller::AudioHandle;
use crate::error::{Error, Result};
use axum::{
    routing::{get, post},
    Router,
};
use sqlx::{Pool, Sqlite};
use std::future::Future;
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppContext {
    pub audio: AudioHandle,
    pub db_pool: Pool<Sqlite>,
}

pub fn create_router(ctx: AppContext) -> Router {
    use super::handlers;

    Router::new()
        .route("/health", get(handlers::health))
        // Playback
        .route("/playback/state", get(handlers::get_state))
        .route("/playback/load", post(handlers::load))
        .route("/playback/play", post(handlers::play))
        .route("/playback/pause", post(handlers::pause))
        .route("/playback/stop", post(handlers::stop))
        .route("/playback/clear", post(handlers::clear))
        .route("/playback/next", post(handlers::next))
        .route("/playback/previous", post(handlers::previous))
        .route("/playback/seek", post(handlers::seek))
        .route("/playback/rate", post(handlers::set_rate))
        .route(
            "/playback/sleep-timer",
            post(handlers::arm_sleep_timer).delete(handlers::cancel_sleep_timer),
        )
        .route("/playback/item-ended", post(handlers::item_ended))
        // Lock-screen / hardware commands
        .route("/remote/:command", post(handlers::remote_command))
        // Recording
        .route("/recording/start", post(handlers::start_recording))
        .route("/recording/stop", post(handlers::stop_recording))
        .route("/recording/cancel", post(handlers::cancel_recording))
        // Session
        .route(
            "/session/ambient",
            post(handlers::acquire_ambient).delete(handlers::release_ambient),
        )
        .route("/platform/signal", post(handlers::platform_signal))
        // Settings
        .route(
            "/settings",
            get(handlers::get_settings).post(handlers::update_settings),
        )
        .route("/events", get(super::sse::event_stream))
        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Serve the API until `shutdown` resolves
pub async fn run(
    port: u16,
    ctx: AppContext,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let app = create_router(ctx);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Http(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| Error::Http(format!("Server error: {}", e)))?;

    Ok(())
}
