//! HTTP request handlers
//!
//! Thin translation between JSON bodies and [`AudioHandle`](crate::controller::AudioHandle)
//! calls. Errors map onto status codes; only permission and file errors are
//! expected to be shown to the user.

use super::playback::*;
use crate::api::server::AppContext;
use crate::controller::AudioSnapshot;
use crate::db::{settings, AppSettings};
use crate::error::Error;
use crate::playback::MAX_SLEEP_TIMER;
use crate::recording::RecordingStarted;
use crate::remote::RemoteCommand;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serene_common::events::PlatformSignal;
use serene_common::time::{duration_to_millis, millis_to_duration};
use std::time::Duration;
use tracing::{error, info, warn};

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<StatusResponse>)>;

fn error_response(e: Error) -> (StatusCode, Json<StatusResponse>) {
    let status = match &e {
        Error::PermissionDenied => StatusCode::FORBIDDEN,
        Error::QueueEmpty => StatusCode::CONFLICT,
        Error::InvalidState(_) => StatusCode::CONFLICT,
        Error::InvalidRate(_) | Error::InvalidDuration(_) | Error::Config(_) => {
            StatusCode::BAD_REQUEST
        }
        Error::HardwareActivationFailed(_) | Error::ControllerUnavailable => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        error!("Request failed: {}", e);
    } else {
        info!("Request rejected: {}", e);
    }

    (
        status,
        Json(StatusResponse {
            status: format!("error: {}", e),
        }),
    )
}

fn ok() -> ApiResult<StatusResponse> {
    Ok(Json(StatusResponse::ok()))
}

// ============================================================================
// Health
// ============================================================================

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "serene-ap".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============================================================================
// Playback
// ============================================================================

/// GET /playback/state
pub async fn get_state(State(ctx): State<AppContext>) -> ApiResult<AudioSnapshot> {
    ctx.audio.snapshot().await.map(Json).map_err(error_response)
}

/// POST /playback/load
pub async fn load(
    State(ctx): State<AppContext>,
    Json(req): Json<LoadRequest>,
) -> ApiResult<StatusResponse> {
    ctx.audio
        .load(req.items, req.start_index, req.context)
        .await
        .map_err(error_response)?;
    ok()
}

/// POST /playback/play
pub async fn play(State(ctx): State<AppContext>) -> ApiResult<StatusResponse> {
    ctx.audio.play().await.map_err(error_response)?;
    ok()
}

/// POST /playback/pause
pub async fn pause(State(ctx): State<AppContext>) -> ApiResult<StatusResponse> {
    ctx.audio.pause().await.map_err(error_response)?;
    ok()
}

/// POST /playback/stop
pub async fn stop(State(ctx): State<AppContext>) -> ApiResult<StatusResponse> {
    ctx.audio.stop().await.map_err(error_response)?;
    ok()
}

/// POST /playback/clear
pub async fn clear(State(ctx): State<AppContext>) -> ApiResult<StatusResponse> {
    ctx.audio.clear().await.map_err(error_response)?;
    ok()
}

/// POST /playback/next
pub async fn next(State(ctx): State<AppContext>) -> ApiResult<NavigationResponse> {
    let navigation = ctx.audio.next().await.map_err(error_response)?;
    Ok(Json(NavigationResponse { navigation }))
}

/// POST /playback/previous
pub async fn previous(State(ctx): State<AppContext>) -> ApiResult<NavigationResponse> {
    let navigation = ctx.audio.previous().await.map_err(error_response)?;
    Ok(Json(NavigationResponse { navigation }))
}

/// POST /playback/seek
pub async fn seek(
    State(ctx): State<AppContext>,
    Json(req): Json<SeekRequest>,
) -> ApiResult<SeekResponse> {
    let applied = ctx
        .audio
        .seek(millis_to_duration(req.position_ms))
        .await
        .map_err(error_response)?;
    Ok(Json(SeekResponse {
        position_ms: duration_to_millis(applied),
    }))
}

/// POST /playback/rate
///
/// Applies the rate and persists it for the next launch.
pub async fn set_rate(
    State(ctx): State<AppContext>,
    Json(req): Json<RateRequest>,
) -> ApiResult<StatusResponse> {
    apply_rate(&ctx, req.rate).await?;
    ok()
}

async fn apply_rate(ctx: &AppContext, rate: f32) -> Result<(), (StatusCode, Json<StatusResponse>)> {
    ctx.audio.set_rate(rate).await.map_err(error_response)?;
    if let Err(e) = settings::set_playback_rate(&ctx.db_pool, rate).await {
        warn!("Playback rate applied but not persisted: {}", e);
    }
    Ok(())
}

/// POST /playback/sleep-timer
pub async fn arm_sleep_timer(
    State(ctx): State<AppContext>,
    Json(req): Json<SleepTimerRequest>,
) -> ApiResult<SleepTimerResponse> {
    let after = Duration::from_secs(req.minutes.saturating_mul(60).saturating_add(req.seconds));
    if after.is_zero() || after > MAX_SLEEP_TIMER {
        return Err(error_response(Error::InvalidDuration(format!(
            "sleep timer must be between 1s and {}s",
            MAX_SLEEP_TIMER.as_secs()
        ))));
    }

    ctx.audio
        .arm_sleep_timer(after)
        .await
        .map_err(error_response)?;
    Ok(Json(SleepTimerResponse {
        remaining_ms: duration_to_millis(after),
    }))
}

/// DELETE /playback/sleep-timer
pub async fn cancel_sleep_timer(State(ctx): State<AppContext>) -> ApiResult<StatusResponse> {
    ctx.audio.cancel_sleep_timer().await.map_err(error_response)?;
    ok()
}

/// POST /playback/item-ended
pub async fn item_ended(
    State(ctx): State<AppContext>,
    Json(req): Json<ItemEndedRequest>,
) -> ApiResult<ItemEndedResponse> {
    let handled = ctx
        .audio
        .item_ended(req.item_id)
        .await
        .map_err(error_response)?;
    Ok(Json(ItemEndedResponse { handled }))
}

// ============================================================================
// Remote commands
// ============================================================================

/// POST /remote/:command
pub async fn remote_command(
    State(ctx): State<AppContext>,
    Path(command): Path<String>,
) -> ApiResult<CommandResponse> {
    let command: RemoteCommand = command.parse().map_err(|msg: String| {
        (
            StatusCode::NOT_FOUND,
            Json(StatusResponse {
                status: format!("error: {}", msg),
            }),
        )
    })?;

    let status = ctx.audio.remote(command).await.map_err(error_response)?;
    Ok(Json(CommandResponse { status }))
}

// ============================================================================
// Recording
// ============================================================================

/// POST /recording/start
pub async fn start_recording(State(ctx): State<AppContext>) -> ApiResult<RecordingStarted> {
    ctx.audio
        .start_recording()
        .await
        .map(Json)
        .map_err(error_response)
}

/// POST /recording/stop
pub async fn stop_recording(State(ctx): State<AppContext>) -> ApiResult<RecordingStopResponse> {
    let file = ctx.audio.stop_recording().await.map_err(error_response)?;
    Ok(Json(RecordingStopResponse {
        file_path: file.map(|p| p.display().to_string()),
    }))
}

/// POST /recording/cancel
pub async fn cancel_recording(State(ctx): State<AppContext>) -> ApiResult<StatusResponse> {
    ctx.audio.cancel_recording().await.map_err(error_response)?;
    ok()
}

// ============================================================================
// Session and platform
// ============================================================================

/// POST /session/ambient
pub async fn acquire_ambient(State(ctx): State<AppContext>) -> ApiResult<StatusResponse> {
    ctx.audio.acquire_ambient().await.map_err(error_response)?;
    ok()
}

/// DELETE /session/ambient
pub async fn release_ambient(State(ctx): State<AppContext>) -> ApiResult<StatusResponse> {
    ctx.audio.release_ambient().await.map_err(error_response)?;
    ok()
}

/// POST /platform/signal
pub async fn platform_signal(
    State(ctx): State<AppContext>,
    Json(signal): Json<PlatformSignal>,
) -> ApiResult<StatusResponse> {
    ctx.audio.signal(signal).map_err(error_response)?;
    ok()
}

// ============================================================================
// Settings
// ============================================================================

/// GET /settings
pub async fn get_settings(State(ctx): State<AppContext>) -> ApiResult<AppSettings> {
    settings::load_app_settings(&ctx.db_pool)
        .await
        .map(Json)
        .map_err(error_response)
}

/// POST /settings
pub async fn update_settings(
    State(ctx): State<AppContext>,
    Json(update): Json<SettingsUpdate>,
) -> ApiResult<AppSettings> {
    if let Some(rate) = update.playback_rate {
        apply_rate(&ctx, rate).await?;
    }
    if let Some(voice) = update.selected_voice.as_deref() {
        settings::set_selected_voice(&ctx.db_pool, voice)
            .await
            .map_err(error_response)?;
    }
    if let Some(position) = update.floating_control {
        settings::set_floating_control(&ctx.db_pool, position)
            .await
            .map_err(error_response)?;
    }

    settings::load_app_settings(&ctx.db_pool)
        .await
        .map(Json)
        .map_err(error_response)
}
