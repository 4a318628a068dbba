//! Playback and recording type definitions
//!
//! Supporting types for transport state, now-playing metadata and recording lifecycle.

use serde::{Deserialize, Serialize};

/// Transport state of the foreground playlist player
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransportState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

impl std::fmt::Display for TransportState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportState::Stopped => write!(f, "stopped"),
            TransportState::Playing => write!(f, "playing"),
            TransportState::Paused => write!(f, "paused"),
        }
    }
}

/// Recorder state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RecordingState {
    #[default]
    Idle,
    Recording,
}

/// Why a recording left the Recording state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecordingEndReason {
    /// User tapped stop
    Stopped,
    /// Watchdog reached the maximum duration
    MaxDuration,
    /// Audio interruption began
    Interrupted,
    /// Application is terminating
    Terminating,
    /// User cancelled; file always discarded
    Cancelled,
}

/// Metadata pushed to the lock-screen / remote-control surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NowPlayingInfo {
    /// Current item title
    pub title: String,
    /// Chapter (shown as artist)
    pub artist: Option<String>,
    /// Book (shown as album)
    pub album: Option<String>,
    /// Elapsed playback time in seconds
    pub elapsed_secs: f64,
    /// Item duration in seconds, when known
    pub duration_secs: Option<f64>,
    /// Effective rate: configured rate while playing, 0.0 otherwise
    pub rate: f32,
}
