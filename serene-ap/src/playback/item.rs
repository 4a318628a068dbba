//! Playlist items

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One playable entry (a narrated chapter, a meditation track, ...)
///
/// Immutable once loaded into a queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistItem {
    /// Caller-assigned identifier, echoed back in end-of-item notifications
    pub id: String,

    /// Title shown on the remote-control surface
    pub title: String,

    /// Location handed to the media player
    pub media_url: String,

    /// Duration known ahead of playback, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_hint_ms: Option<u64>,
}

impl PlaylistItem {
    pub fn new(id: impl Into<String>, title: impl Into<String>, media_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            media_url: media_url.into(),
            duration_hint_ms: None,
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration_hint_ms = Some(serene_common::time::duration_to_millis(duration));
        self
    }

    pub fn duration_hint(&self) -> Option<Duration> {
        self.duration_hint_ms.map(serene_common::time::millis_to_duration)
    }
}

/// Metadata shared by every item of a queue (book and narrator, for instance)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueContext {
    #[serde(default)]
    pub album: Option<String>,

    #[serde(default)]
    pub artist: Option<String>,
}
