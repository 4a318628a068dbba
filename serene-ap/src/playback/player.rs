//! Media player adapter
//!
//! The platform player does the actual decoding and output. The playlist
//! engine drives it through [`MediaPlayer`] and learns about finished items
//! through [`PlayerEvent`]s posted to the controller.

use super::item::PlaylistItem;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlayerError {
    #[error("failed to load {url}: {reason}")]
    Load { url: String, reason: String },
}

/// Position reported by the platform player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerPosition {
    pub elapsed: Duration,
    pub total: Option<Duration>,
}

/// Asynchronous notifications from the platform player
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEvent {
    /// The item with this id played to its end
    ItemEnded { item_id: String },
}

/// Thin control surface over the platform media player
pub trait MediaPlayer: Send {
    /// Replace the current media. Playback state is left to `play`/`pause`.
    fn load_media(&mut self, item: &PlaylistItem) -> Result<(), PlayerError>;

    fn play(&mut self);

    fn pause(&mut self);

    fn set_rate(&mut self, rate: f32);

    fn seek(&mut self, to: Duration);

    /// Current position, None when nothing is loaded
    fn position(&self) -> Option<PlayerPosition>;
}
