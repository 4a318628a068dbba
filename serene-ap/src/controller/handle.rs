//! Cloneable front door to the audio controller

use super::actor::AudioSnapshot;
use super::command::Command;
use crate::error::{Error, Result};
use crate::playback::{Navigation, PlayerEvent, PlaylistItem, QueueContext};
use crate::recording::{RecordPermission, RecordingStarted};
use crate::remote::{CommandStatus, RemoteCommand};
use futures::{Stream, StreamExt};
use serene_common::events::{AudioEvent, EventBus, NowPlayingInfo, PlatformSignal};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio_stream::wrappers::BroadcastStream;
use tracing::info;

const COMMAND_CAPACITY: usize = 64;

/// Receiving ends owned by the controller task
pub struct Mailbox {
    pub(crate) commands: mpsc::Receiver<Command>,
    pub(crate) signals: mpsc::UnboundedReceiver<PlatformSignal>,
    pub(crate) player_events: mpsc::UnboundedReceiver<PlayerEvent>,
}

#[derive(Clone)]
pub struct AudioHandle {
    commands: mpsc::Sender<Command>,
    signals: mpsc::UnboundedSender<PlatformSignal>,
    player_events: mpsc::UnboundedSender<PlayerEvent>,
    permission: Arc<dyn RecordPermission>,
    events: EventBus,
}

impl AudioHandle {
    /// Create a handle and the mailbox for the controller it will talk to
    pub fn channel(permission: Arc<dyn RecordPermission>, events: EventBus) -> (Self, Mailbox) {
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_CAPACITY);
        let (signals_tx, signals_rx) = mpsc::unbounded_channel();
        let (player_tx, player_rx) = mpsc::unbounded_channel();

        let handle = Self {
            commands: commands_tx,
            signals: signals_tx,
            player_events: player_tx,
            permission,
            events,
        };
        let mailbox = Mailbox {
            commands: commands_rx,
            signals: signals_rx,
            player_events: player_rx,
        };
        (handle, mailbox)
    }

    /// Sender for the platform player's end-of-item notifications
    pub fn player_events(&self) -> mpsc::UnboundedSender<PlayerEvent> {
        self.player_events.clone()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AudioEvent> {
        self.events.subscribe()
    }

    /// Now-playing pushes for the OS remote-control surface; None clears it
    pub fn now_playing_updates(&self) -> impl Stream<Item = Option<NowPlayingInfo>> {
        BroadcastStream::new(self.events.subscribe()).filter_map(|event| async move {
            match event {
                Ok(AudioEvent::NowPlayingChanged { info, .. }) => Some(info),
                _ => None,
            }
        })
    }

    /// Forward a platform interruption, route change or lifecycle transition
    pub fn signal(&self, signal: PlatformSignal) -> Result<()> {
        self.signals
            .send(signal)
            .map_err(|_| Error::ControllerUnavailable)
    }

    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(make(reply))
            .await
            .map_err(|_| Error::ControllerUnavailable)?;
        response.await.map_err(|_| Error::ControllerUnavailable)
    }

    pub async fn load(
        &self,
        items: Vec<PlaylistItem>,
        start_index: usize,
        context: QueueContext,
    ) -> Result<()> {
        self.request(|reply| Command::Load {
            items,
            start_index,
            context,
            reply,
        })
        .await
    }

    pub async fn play(&self) -> Result<()> {
        self.request(|reply| Command::Play { reply }).await?
    }

    pub async fn pause(&self) -> Result<()> {
        self.request(|reply| Command::Pause { reply }).await?
    }

    pub async fn toggle_play_pause(&self) -> Result<()> {
        self.request(|reply| Command::TogglePlayPause { reply }).await?
    }

    pub async fn stop(&self) -> Result<()> {
        self.request(|reply| Command::Stop { reply }).await?
    }

    pub async fn clear(&self) -> Result<()> {
        self.request(|reply| Command::Clear { reply }).await
    }

    pub async fn next(&self) -> Result<Navigation> {
        self.request(|reply| Command::Next { reply }).await?
    }

    pub async fn previous(&self) -> Result<Navigation> {
        self.request(|reply| Command::Previous { reply }).await?
    }

    /// Returns the clamped position actually applied
    pub async fn seek(&self, to: Duration) -> Result<Duration> {
        self.request(|reply| Command::Seek { to, reply }).await?
    }

    pub async fn set_rate(&self, rate: f32) -> Result<()> {
        self.request(|reply| Command::SetRate { rate, reply }).await?
    }

    pub async fn arm_sleep_timer(&self, after: Duration) -> Result<()> {
        self.request(|reply| Command::ArmSleepTimer { after, reply })
            .await?
    }

    pub async fn cancel_sleep_timer(&self) -> Result<()> {
        self.request(|reply| Command::CancelSleepTimer { reply })
            .await
    }

    /// End-of-item report from a player that is not wired to `player_events`
    pub async fn item_ended(&self, item_id: impl Into<String>) -> Result<bool> {
        let item_id = item_id.into();
        self.request(|reply| Command::ItemEnded { item_id, reply })
            .await
    }

    pub async fn remote(&self, command: RemoteCommand) -> Result<CommandStatus> {
        self.request(|reply| Command::Remote { command, reply })
            .await
    }

    /// Ask for capture permission, then start a take
    ///
    /// The permission prompt is awaited here, outside the controller task.
    pub async fn start_recording(&self) -> Result<RecordingStarted> {
        if !self.permission.request().await {
            info!("Recording permission denied");
            return Err(Error::PermissionDenied);
        }
        self.request(|reply| Command::StartRecording { reply })
            .await?
    }

    /// Returns the kept file, or None when the take was too short
    pub async fn stop_recording(&self) -> Result<Option<PathBuf>> {
        self.request(|reply| Command::StopRecording { reply })
            .await?
    }

    pub async fn cancel_recording(&self) -> Result<()> {
        self.request(|reply| Command::CancelRecording { reply })
            .await?
    }

    /// Grant for the ambient noise generator
    pub async fn acquire_ambient(&self) -> Result<()> {
        self.request(|reply| Command::AcquireAmbient { reply })
            .await?
    }

    pub async fn release_ambient(&self) -> Result<()> {
        self.request(|reply| Command::ReleaseAmbient { reply })
            .await
    }

    pub async fn snapshot(&self) -> Result<AudioSnapshot> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    /// Stop any take, release the session and end the controller task
    pub async fn shutdown(&self) -> Result<()> {
        self.request(|reply| Command::Shutdown { reply }).await
    }
}
