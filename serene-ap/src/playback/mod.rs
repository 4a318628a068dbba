//! Foreground playlist playback

pub mod engine;
pub mod item;
pub mod player;
pub mod sleep_timer;

pub use engine::{
    is_valid_rate, Navigation, PlaybackSnapshot, PlaylistEngine, DEFAULT_RATE, MAX_RATE,
    MAX_SLEEP_TIMER, MIN_RATE,
};
pub use item::{PlaylistItem, QueueContext};
pub use player::{MediaPlayer, PlayerError, PlayerEvent, PlayerPosition};
pub use sleep_timer::SleepTimer;
