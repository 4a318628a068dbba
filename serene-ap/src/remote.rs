//! Remote command bridge
//!
//! Maps lock-screen and hardware transport commands onto the playlist engine.
//! Every command reports `NoActionableItem` when the queue is empty. The bridge
//! runs inside the audio controller, so the empty check and the transport call
//! see the same engine state.

use crate::playback::PlaylistEngine;
use crate::session::SessionArbiter;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

/// Default skip interval for skip-forward/backward
pub const DEFAULT_SKIP_INTERVAL: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteCommand {
    Play,
    Pause,
    TogglePlayPause,
    NextTrack,
    PreviousTrack,
    SkipForward,
    SkipBackward,
}

impl RemoteCommand {
    pub const ALL: [RemoteCommand; 7] = [
        RemoteCommand::Play,
        RemoteCommand::Pause,
        RemoteCommand::TogglePlayPause,
        RemoteCommand::NextTrack,
        RemoteCommand::PreviousTrack,
        RemoteCommand::SkipForward,
        RemoteCommand::SkipBackward,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteCommand::Play => "play",
            RemoteCommand::Pause => "pause",
            RemoteCommand::TogglePlayPause => "toggle_play_pause",
            RemoteCommand::NextTrack => "next_track",
            RemoteCommand::PreviousTrack => "previous_track",
            RemoteCommand::SkipForward => "skip_forward",
            RemoteCommand::SkipBackward => "skip_backward",
        }
    }
}

impl fmt::Display for RemoteCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RemoteCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RemoteCommand::ALL
            .into_iter()
            .find(|command| command.as_str() == s)
            .ok_or_else(|| format!("unknown remote command: {}", s))
    }
}

/// Answer reported back to the OS command center
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandStatus {
    Success,
    NoActionableItem,
    Failed,
}

#[derive(Debug, Clone, Copy)]
pub struct RemoteCommandBridge {
    skip_interval: Duration,
}

impl Default for RemoteCommandBridge {
    fn default() -> Self {
        Self::new(DEFAULT_SKIP_INTERVAL)
    }
}

impl RemoteCommandBridge {
    pub fn new(skip_interval: Duration) -> Self {
        Self { skip_interval }
    }

    pub fn skip_interval(&self) -> Duration {
        self.skip_interval
    }

    pub fn execute(
        &self,
        command: RemoteCommand,
        engine: &mut PlaylistEngine,
        arbiter: &mut SessionArbiter,
    ) -> CommandStatus {
        if engine.is_empty() {
            debug!("Remote {} ignored: queue empty", command);
            return CommandStatus::NoActionableItem;
        }

        let result = match command {
            RemoteCommand::Play => engine.play(arbiter),
            RemoteCommand::Pause => engine.pause(),
            RemoteCommand::TogglePlayPause => engine.toggle_play_pause(arbiter),
            RemoteCommand::NextTrack => engine.next().map(|_| ()),
            RemoteCommand::PreviousTrack => engine.previous().map(|_| ()),
            RemoteCommand::SkipForward => engine.skip_forward(self.skip_interval).map(|_| ()),
            RemoteCommand::SkipBackward => engine.skip_backward(self.skip_interval).map(|_| ()),
        };

        match result {
            Ok(()) => CommandStatus::Success,
            Err(e) => {
                warn!("Remote {} failed: {}", command, e);
                CommandStatus::Failed
            }
        }
    }
}
