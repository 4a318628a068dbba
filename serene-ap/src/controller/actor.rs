//! Controller task
//!
//! One `tokio::select!` loop serializes commands, platform signals, player
//! events and the three periodic timers. Each timer branch is only polled
//! while it has work: position sampling while playing, the sleep ticker while
//! armed, the watchdog while recording.

use super::command::Command;
use super::handle::Mailbox;
use crate::playback::{MediaPlayer, PlaybackSnapshot, PlayerEvent, PlaylistEngine};
use crate::recording::{
    CaptureBackend, RecorderController, RecordingLimits, RecordingSnapshot, RecordingStore,
};
use crate::remote::{RemoteCommandBridge, DEFAULT_SKIP_INTERVAL};
use crate::session::{SessionArbiter, SessionBackend};
use serde::Serialize;
use serene_common::events::{
    AudioEvent, Consumer, EventBus, InterruptionKind, LifecycleKind, PlatformSignal,
    RecordingEndReason, SessionSignal,
};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Periods of the controller's timers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerTimings {
    pub position_sample: Duration,
    pub sleep_tick: Duration,
    pub watchdog_tick: Duration,
    pub skip_interval: Duration,
}

impl Default for ControllerTimings {
    fn default() -> Self {
        Self {
            position_sample: Duration::from_millis(500),
            sleep_tick: Duration::from_secs(1),
            watchdog_tick: Duration::from_millis(100),
            skip_interval: DEFAULT_SKIP_INTERVAL,
        }
    }
}

/// Platform adapters and settings the controller is built from
pub struct ControllerParts {
    pub session_backend: Box<dyn SessionBackend>,
    pub player: Box<dyn MediaPlayer>,
    pub capture: Box<dyn CaptureBackend>,
    pub store: RecordingStore,
    pub limits: RecordingLimits,
    pub timings: ControllerTimings,
    pub events: EventBus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub active_consumers: Vec<Consumer>,
    pub session_active: bool,
}

/// Point-in-time view of the whole audio core
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudioSnapshot {
    pub playback: PlaybackSnapshot,
    pub recording: RecordingSnapshot,
    pub session: SessionSnapshot,
}

pub struct AudioController {
    mailbox: Mailbox,
    arbiter: SessionArbiter,
    playlist: PlaylistEngine,
    recorder: RecorderController,
    remote: RemoteCommandBridge,
    timings: ControllerTimings,
    events: EventBus,
}

impl AudioController {
    pub fn new(mailbox: Mailbox, parts: ControllerParts) -> Self {
        let ControllerParts {
            session_backend,
            player,
            capture,
            store,
            limits,
            timings,
            events,
        } = parts;

        Self {
            mailbox,
            arbiter: SessionArbiter::new(session_backend, events.clone()),
            playlist: PlaylistEngine::new(player, events.clone()),
            recorder: RecorderController::new(store, capture, limits, events.clone()),
            remote: RemoteCommandBridge::new(timings.skip_interval),
            timings,
            events,
        }
    }

    /// Run the controller on the current tokio runtime
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    pub async fn run(mut self) {
        info!("Audio controller started");

        let mut position_tick = time::interval(self.timings.position_sample);
        position_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut sleep_tick = time::interval(self.timings.sleep_tick);
        sleep_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut watchdog_tick = time::interval(self.timings.watchdog_tick);
        watchdog_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let playing = self.playlist.is_playing();
            let sleep_armed = self.playlist.sleep_timer_armed();
            let recording = self.recorder.is_recording();

            tokio::select! {
                command = self.mailbox.commands.recv() => match command {
                    Some(Command::Shutdown { reply }) => {
                        self.terminate();
                        let _ = reply.send(());
                        break;
                    }
                    Some(command) => self.handle_command(command),
                    None => {
                        debug!("All audio handles dropped");
                        self.terminate();
                        break;
                    }
                },
                Some(signal) = self.mailbox.signals.recv() => self.handle_platform_signal(signal),
                Some(event) = self.mailbox.player_events.recv() => self.handle_player_event(event),
                _ = position_tick.tick(), if playing => {
                    self.playlist.sample_position();
                }
                _ = sleep_tick.tick(), if sleep_armed => {
                    self.playlist.check_sleep_timer(Instant::now());
                }
                _ = watchdog_tick.tick(), if recording => {
                    self.recorder.tick(&mut self.arbiter, Instant::now());
                }
            }
        }

        info!("Audio controller stopped");
    }

    fn handle_command(&mut self, command: Command) {
        let now = Instant::now();
        match command {
            Command::Load {
                items,
                start_index,
                context,
                reply,
            } => {
                self.playlist.load(items, start_index, context);
                let _ = reply.send(());
            }
            Command::Play { reply } => {
                let _ = reply.send(self.playlist.play(&mut self.arbiter));
            }
            Command::Pause { reply } => {
                let _ = reply.send(self.playlist.pause());
            }
            Command::TogglePlayPause { reply } => {
                let _ = reply.send(self.playlist.toggle_play_pause(&mut self.arbiter));
            }
            Command::Stop { reply } => {
                let _ = reply.send(self.playlist.stop(&mut self.arbiter));
            }
            Command::Clear { reply } => {
                self.playlist.clear(&mut self.arbiter);
                let _ = reply.send(());
            }
            Command::Next { reply } => {
                let _ = reply.send(self.playlist.next());
            }
            Command::Previous { reply } => {
                let _ = reply.send(self.playlist.previous());
            }
            Command::Seek { to, reply } => {
                let _ = reply.send(self.playlist.seek(to));
            }
            Command::SetRate { rate, reply } => {
                let _ = reply.send(self.playlist.set_rate(rate));
            }
            Command::ArmSleepTimer { after, reply } => {
                let _ = reply.send(self.playlist.arm_sleep_timer(after, now));
            }
            Command::CancelSleepTimer { reply } => {
                self.playlist.cancel_sleep_timer();
                let _ = reply.send(());
            }
            Command::ItemEnded { item_id, reply } => {
                let _ = reply.send(self.playlist.on_item_ended(&item_id));
            }
            Command::Remote { command, reply } => {
                let status = self
                    .remote
                    .execute(command, &mut self.playlist, &mut self.arbiter);
                let _ = reply.send(status);
            }
            Command::StartRecording { reply } => {
                let _ = reply.send(self.recorder.start(&mut self.arbiter, now));
            }
            Command::StopRecording { reply } => {
                let _ = reply.send(self.recorder.stop(
                    &mut self.arbiter,
                    now,
                    RecordingEndReason::Stopped,
                ));
            }
            Command::CancelRecording { reply } => {
                let _ = reply.send(self.recorder.cancel(&mut self.arbiter, now));
            }
            Command::AcquireAmbient { reply } => {
                let result: crate::error::Result<()> = self
                    .arbiter
                    .acquire(Consumer::AmbientLoop)
                    .map(|_| ())
                    .map_err(Into::into);
                let _ = reply.send(result);
            }
            Command::ReleaseAmbient { reply } => {
                self.arbiter.release(Consumer::AmbientLoop);
                let _ = reply.send(());
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.snapshot(now));
            }
            Command::Shutdown { reply } => {
                // Handled by the run loop
                let _ = reply.send(());
            }
        }
    }

    /// Interruptions and route changes are relayed through the arbiter and
    /// delivered to the recorder and the playlist before the next message.
    fn handle_platform_signal(&mut self, signal: PlatformSignal) {
        if let PlatformSignal::Lifecycle { kind } = signal {
            self.handle_lifecycle(kind);
            return;
        }

        let Some(session_signal) = self.arbiter.relay(signal) else {
            return;
        };

        let now = Instant::now();
        self.recorder
            .on_session_signal(session_signal, &mut self.arbiter, now);
        self.playlist
            .on_session_signal(session_signal, &mut self.arbiter);

        if session_signal == SessionSignal::Interruption(InterruptionKind::EndedShouldNotResume) {
            info!("Interruption ended without resumption, releasing audio session");
            self.arbiter.release_all();
        }
    }

    fn handle_lifecycle(&mut self, kind: LifecycleKind) {
        info!("Lifecycle: {:?}", kind);
        self.events.emit_lossy(AudioEvent::LifecycleChanged {
            kind,
            timestamp: chrono::Utc::now(),
        });

        match kind {
            LifecycleKind::EnteredBackground => {
                if !self.playlist.is_playing() && self.arbiter.is_held_by(Consumer::Playback) {
                    debug!("Backgrounded while not playing, releasing playback grant");
                    self.arbiter.release(Consumer::Playback);
                }
            }
            LifecycleKind::EnteredForeground => {}
            LifecycleKind::WillTerminate => self.terminate(),
        }
    }

    fn handle_player_event(&mut self, event: PlayerEvent) {
        match event {
            PlayerEvent::ItemEnded { item_id } => {
                self.playlist.on_item_ended(&item_id);
            }
        }
    }

    /// Finish any take and drop every grant
    fn terminate(&mut self) {
        if self.recorder.is_recording() {
            if let Err(e) = self.recorder.stop(
                &mut self.arbiter,
                Instant::now(),
                RecordingEndReason::Terminating,
            ) {
                warn!("Failed to finish recording on shutdown: {}", e);
            }
        }
        if self.playlist.is_playing() {
            if let Err(e) = self.playlist.pause() {
                warn!("Failed to pause on shutdown: {}", e);
            }
        }
        self.arbiter.release_all();
    }

    fn snapshot(&self, now: Instant) -> AudioSnapshot {
        AudioSnapshot {
            playback: self.playlist.snapshot(now),
            recording: self.recorder.snapshot(),
            session: SessionSnapshot {
                active_consumers: self.arbiter.active_consumers(),
                session_active: self.arbiter.is_session_active(),
            },
        }
    }
}
