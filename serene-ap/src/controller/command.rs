//! Messages accepted by the audio controller

use super::actor::AudioSnapshot;
use crate::error::Result;
use crate::playback::{Navigation, PlaylistItem, QueueContext};
use crate::recording::RecordingStarted;
use crate::remote::{CommandStatus, RemoteCommand};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::oneshot;

type Reply<T> = oneshot::Sender<T>;

#[derive(Debug)]
pub(crate) enum Command {
    Load {
        items: Vec<PlaylistItem>,
        start_index: usize,
        context: QueueContext,
        reply: Reply<()>,
    },
    Play {
        reply: Reply<Result<()>>,
    },
    Pause {
        reply: Reply<Result<()>>,
    },
    TogglePlayPause {
        reply: Reply<Result<()>>,
    },
    Stop {
        reply: Reply<Result<()>>,
    },
    Clear {
        reply: Reply<()>,
    },
    Next {
        reply: Reply<Result<Navigation>>,
    },
    Previous {
        reply: Reply<Result<Navigation>>,
    },
    Seek {
        to: Duration,
        reply: Reply<Result<Duration>>,
    },
    SetRate {
        rate: f32,
        reply: Reply<Result<()>>,
    },
    ArmSleepTimer {
        after: Duration,
        reply: Reply<Result<()>>,
    },
    CancelSleepTimer {
        reply: Reply<()>,
    },
    ItemEnded {
        item_id: String,
        reply: Reply<bool>,
    },
    Remote {
        command: RemoteCommand,
        reply: Reply<CommandStatus>,
    },
    StartRecording {
        reply: Reply<Result<RecordingStarted>>,
    },
    StopRecording {
        reply: Reply<Result<Option<PathBuf>>>,
    },
    CancelRecording {
        reply: Reply<Result<()>>,
    },
    AcquireAmbient {
        reply: Reply<Result<()>>,
    },
    ReleaseAmbient {
        reply: Reply<()>,
    },
    Snapshot {
        reply: Reply<AudioSnapshot>,
    },
    Shutdown {
        reply: Reply<()>,
    },
}
