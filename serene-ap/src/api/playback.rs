//! API request/response types

use crate::db::FloatingControlPosition;
use crate::playback::{Navigation, PlaylistItem, QueueContext};
use crate::remote::CommandStatus;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

/// Load request body
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoadRequest {
    pub items: Vec<PlaylistItem>,

    #[serde(default)]
    pub start_index: usize,

    /// Book/narrator shown on the remote-control surface
    #[serde(flatten)]
    pub context: QueueContext,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NavigationResponse {
    pub navigation: Navigation,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SeekRequest {
    pub position_ms: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SeekResponse {
    /// Position after clamping to the item duration
    pub position_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateRequest {
    pub rate: f32,
}

/// Sleep timer request; minutes and seconds add up
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SleepTimerRequest {
    #[serde(default)]
    pub minutes: u64,

    #[serde(default)]
    pub seconds: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SleepTimerResponse {
    pub remaining_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ItemEndedRequest {
    pub item_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ItemEndedResponse {
    /// False when the item was no longer current
    pub handled: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommandResponse {
    pub status: CommandStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecordingStopResponse {
    /// None when the take was shorter than the minimum and got deleted
    pub file_path: Option<String>,
}

/// Partial settings update; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SettingsUpdate {
    #[serde(default)]
    pub playback_rate: Option<f32>,

    #[serde(default)]
    pub selected_voice: Option<String>,

    #[serde(default)]
    pub floating_control: Option<FloatingControlPosition>,
}
