//! Playlist engine
//!
//! Foreground player state machine: queue, cursor, transport state, rate and
//! sleep timer. Drives the platform player through [`MediaPlayer`] and
//! publishes now-playing metadata on every transport-affecting call.
//!
//! States:
//! - Empty: no queue, transport always Stopped
//! - Loaded-Stopped / Loaded-Playing / Loaded-Paused
//!
//! The engine is owned by the audio controller and only ever touched from its
//! serialized context; the session arbiter is passed in where a call needs it.

use super::item::{PlaylistItem, QueueContext};
use super::player::{MediaPlayer, PlayerPosition};
use super::sleep_timer::SleepTimer;
use crate::error::{Error, Result};
use crate::session::SessionArbiter;
use serde::{Deserialize, Serialize};
use serene_common::events::{
    AudioEvent, Consumer, EventBus, InterruptionKind, NowPlayingInfo, RouteChangeKind,
    SessionSignal, TransportState,
};
use serene_common::time::duration_to_millis;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Rate used until one is configured
pub const DEFAULT_RATE: f32 = 1.0;

/// Slowest narration speed offered
pub const MIN_RATE: f32 = 0.5;

/// Fastest narration speed offered
pub const MAX_RATE: f32 = 2.0;

/// Longest sleep timer accepted
pub const MAX_SLEEP_TIMER: Duration = Duration::from_secs(24 * 60 * 60);

/// Whether `rate` lies in `[MIN_RATE, MAX_RATE]`; NaN never does
pub fn is_valid_rate(rate: f32) -> bool {
    (MIN_RATE..=MAX_RATE).contains(&rate)
}

/// Outcome of `next`/`previous`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Navigation {
    /// Cursor moved to another item
    Moved,
    /// `next` on the last item; nothing changed
    AtEnd,
    /// `previous` on the first item; position reset to zero
    Restarted,
}

/// Read-only view of the engine for status queries
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackSnapshot {
    pub transport: TransportState,
    pub queue_len: usize,
    pub current_index: Option<usize>,
    pub current_item: Option<PlaylistItem>,
    pub elapsed_ms: u64,
    pub total_ms: Option<u64>,
    pub rate: f32,
    pub sleep_timer_remaining_ms: Option<u64>,
}

pub struct PlaylistEngine {
    player: Box<dyn MediaPlayer>,
    events: EventBus,

    queue: Vec<PlaylistItem>,
    context: QueueContext,
    current_index: usize,
    transport: TransportState,
    rate: f32,
    elapsed: Duration,
    total: Option<Duration>,
    sleep_timer: SleepTimer,

    /// Set when an interruption paused active playback
    interrupted: bool,

    /// Last metadata pushed to the remote-control surface
    now_playing: Option<NowPlayingInfo>,
}

impl PlaylistEngine {
    pub fn new(player: Box<dyn MediaPlayer>, events: EventBus) -> Self {
        Self {
            player,
            events,
            queue: Vec::new(),
            context: QueueContext::default(),
            current_index: 0,
            transport: TransportState::Stopped,
            rate: DEFAULT_RATE,
            elapsed: Duration::ZERO,
            total: None,
            sleep_timer: SleepTimer::new(),
            interrupted: false,
            now_playing: None,
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn transport(&self) -> TransportState {
        self.transport
    }

    pub fn is_playing(&self) -> bool {
        self.transport == TransportState::Playing
    }

    pub fn current_index(&self) -> Option<usize> {
        (!self.queue.is_empty()).then_some(self.current_index)
    }

    pub fn current_item(&self) -> Option<&PlaylistItem> {
        self.queue.get(self.current_index)
    }

    pub fn queue(&self) -> &[PlaylistItem] {
        &self.queue
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn total(&self) -> Option<Duration> {
        self.total
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    pub fn now_playing(&self) -> Option<&NowPlayingInfo> {
        self.now_playing.as_ref()
    }

    pub fn sleep_timer_armed(&self) -> bool {
        self.sleep_timer.is_armed()
    }

    pub fn sleep_timer_remaining(&self, now: Instant) -> Option<Duration> {
        self.sleep_timer.remaining(now)
    }

    pub fn snapshot(&self, now: Instant) -> PlaybackSnapshot {
        PlaybackSnapshot {
            transport: self.transport,
            queue_len: self.queue.len(),
            current_index: self.current_index(),
            current_item: self.current_item().cloned(),
            elapsed_ms: duration_to_millis(self.elapsed),
            total_ms: self.total.map(duration_to_millis),
            rate: self.rate,
            sleep_timer_remaining_ms: self.sleep_timer.remaining(now).map(duration_to_millis),
        }
    }

    // ------------------------------------------------------------------
    // Queue management
    // ------------------------------------------------------------------

    /// Replace the queue wholesale. Always lands in Stopped (or Empty).
    ///
    /// Does not release the session; a following `play` reuses the grant.
    pub fn load(&mut self, items: Vec<PlaylistItem>, start_index: usize, context: QueueContext) {
        if self.is_playing() {
            self.player.pause();
        }
        if self.sleep_timer.cancel() {
            self.emit_sleep_cancelled();
        }

        let old_state = self.transport;
        self.queue = items;
        self.context = context;
        self.transport = TransportState::Stopped;
        self.elapsed = Duration::ZERO;
        self.interrupted = false;

        if self.queue.is_empty() {
            info!("Loaded empty queue");
            self.current_index = 0;
            self.total = None;
            self.events.emit_lossy(AudioEvent::QueueLoaded {
                item_count: 0,
                start_index: 0,
                timestamp: chrono::Utc::now(),
            });
            self.emit_state_change(old_state);
            self.clear_now_playing();
            return;
        }

        let last = self.queue.len() - 1;
        if start_index > last {
            warn!(
                "Start index {} out of range for {} items, clamping to {}",
                start_index,
                self.queue.len(),
                last
            );
        }
        let index = start_index.min(last);

        info!("Loaded queue of {} items, starting at {}", self.queue.len(), index);
        self.events.emit_lossy(AudioEvent::QueueLoaded {
            item_count: self.queue.len(),
            start_index: index,
            timestamp: chrono::Utc::now(),
        });

        self.enter_item(index);
        self.emit_state_change(old_state);
        self.publish_now_playing();
    }

    /// Drop the queue, release Playback and clear the remote-control surface
    pub fn clear(&mut self, arbiter: &mut SessionArbiter) {
        if self.is_playing() {
            self.player.pause();
        }
        if self.sleep_timer.cancel() {
            self.emit_sleep_cancelled();
        }

        let old_state = self.transport;
        self.queue.clear();
        self.context = QueueContext::default();
        self.current_index = 0;
        self.transport = TransportState::Stopped;
        self.elapsed = Duration::ZERO;
        self.total = None;
        self.interrupted = false;

        arbiter.release(Consumer::Playback);
        info!("Playback cleared");
        self.emit_state_change(old_state);
        self.clear_now_playing();
    }

    // ------------------------------------------------------------------
    // Transport
    // ------------------------------------------------------------------

    /// Stopped/Paused → Playing
    ///
    /// A session denial is logged and playback proceeds without audio.
    pub fn play(&mut self, arbiter: &mut SessionArbiter) -> Result<()> {
        if self.queue.is_empty() {
            return Err(Error::QueueEmpty);
        }
        if self.is_playing() {
            debug!("Play ignored: already playing");
            return Ok(());
        }

        if let Err(denied) = arbiter.acquire(Consumer::Playback) {
            warn!("Playing without audio session: {}", denied);
        }

        self.player.set_rate(self.rate);
        self.player.play();

        let old_state = self.transport;
        self.transport = TransportState::Playing;
        self.interrupted = false;
        self.emit_state_change(old_state);
        self.publish_now_playing();
        Ok(())
    }

    /// Playing → Paused. Keeps the session grant.
    pub fn pause(&mut self) -> Result<()> {
        if self.queue.is_empty() {
            return Err(Error::QueueEmpty);
        }
        if !self.is_playing() {
            debug!("Pause ignored: transport is {}", self.transport);
            return Ok(());
        }

        self.capture_player_position();
        self.player.pause();

        let old_state = self.transport;
        self.transport = TransportState::Paused;
        self.emit_state_change(old_state);
        self.publish_now_playing();
        Ok(())
    }

    pub fn toggle_play_pause(&mut self, arbiter: &mut SessionArbiter) -> Result<()> {
        if self.is_playing() {
            self.pause()
        } else {
            self.play(arbiter)
        }
    }

    /// Back to Loaded-Stopped at position zero and release Playback
    pub fn stop(&mut self, arbiter: &mut SessionArbiter) -> Result<()> {
        if self.queue.is_empty() {
            return Err(Error::QueueEmpty);
        }

        self.player.pause();
        self.player.seek(Duration::ZERO);

        let old_state = self.transport;
        self.transport = TransportState::Stopped;
        self.elapsed = Duration::ZERO;
        self.interrupted = false;

        arbiter.release(Consumer::Playback);
        self.emit_state_change(old_state);
        self.publish_now_playing();
        Ok(())
    }

    pub fn next(&mut self) -> Result<Navigation> {
        if self.queue.is_empty() {
            return Err(Error::QueueEmpty);
        }
        if self.current_index + 1 >= self.queue.len() {
            let item_id = self.queue[self.current_index].id.clone();
            info!("Reached end of queue at {}", item_id);
            self.events.emit_lossy(AudioEvent::QueueExhausted {
                item_id,
                timestamp: chrono::Utc::now(),
            });
            return Ok(Navigation::AtEnd);
        }

        self.move_to(self.current_index + 1);
        Ok(Navigation::Moved)
    }

    pub fn previous(&mut self) -> Result<Navigation> {
        if self.queue.is_empty() {
            return Err(Error::QueueEmpty);
        }
        if self.current_index == 0 {
            self.seek(Duration::ZERO)?;
            return Ok(Navigation::Restarted);
        }

        self.move_to(self.current_index - 1);
        Ok(Navigation::Moved)
    }

    /// Seek within the current item. Targets past the end clamp to the total.
    ///
    /// Returns the position actually applied.
    pub fn seek(&mut self, to: Duration) -> Result<Duration> {
        if self.queue.is_empty() {
            return Err(Error::QueueEmpty);
        }

        let target = match self.total {
            Some(total) if to > total => {
                debug!("Seek target {:?} clamped to {:?}", to, total);
                total
            }
            _ => to,
        };

        self.elapsed = target;
        self.player.seek(target);
        self.publish_now_playing();
        Ok(target)
    }

    pub fn skip_forward(&mut self, by: Duration) -> Result<Duration> {
        self.seek(self.elapsed.saturating_add(by))
    }

    pub fn skip_backward(&mut self, by: Duration) -> Result<Duration> {
        self.seek(self.elapsed.saturating_sub(by))
    }

    /// Rate must lie in `[MIN_RATE, MAX_RATE]`. Applied now if playing, otherwise on next play.
    pub fn set_rate(&mut self, rate: f32) -> Result<()> {
        if !is_valid_rate(rate) {
            return Err(Error::InvalidRate(rate));
        }

        self.rate = rate;
        if self.is_playing() {
            self.player.set_rate(rate);
        }
        info!("Playback rate set to {}", rate);
        self.events.emit_lossy(AudioEvent::PlaybackRateChanged {
            rate,
            timestamp: chrono::Utc::now(),
        });
        if !self.queue.is_empty() {
            self.publish_now_playing();
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Sleep timer
    // ------------------------------------------------------------------

    pub fn arm_sleep_timer(&mut self, after: Duration, now: Instant) -> Result<()> {
        if after.is_zero() || after > MAX_SLEEP_TIMER {
            return Err(Error::InvalidDuration(format!(
                "sleep timer must be between 1s and {}h, got {:?}",
                MAX_SLEEP_TIMER.as_secs() / 3600,
                after
            )));
        }
        if self.sleep_timer.arm(after, now).is_none() {
            return Err(Error::InvalidDuration(format!(
                "sleep timer deadline out of range: {:?}",
                after
            )));
        }

        info!("Sleep timer armed for {:?}", after);
        self.events.emit_lossy(AudioEvent::SleepTimerArmed {
            remaining_ms: duration_to_millis(after),
            timestamp: chrono::Utc::now(),
        });
        Ok(())
    }

    /// Idempotent; never changes transport state
    pub fn cancel_sleep_timer(&mut self) {
        if self.sleep_timer.cancel() {
            info!("Sleep timer cancelled");
            self.emit_sleep_cancelled();
        }
    }

    /// Ticker callback. Returns true when the deadline passed on this check.
    pub fn check_sleep_timer(&mut self, now: Instant) -> bool {
        if !self.sleep_timer.poll_expired(now) {
            return false;
        }

        info!("Sleep timer fired");
        self.events.emit_lossy(AudioEvent::SleepTimerFired {
            timestamp: chrono::Utc::now(),
        });
        if self.is_playing() {
            if let Err(e) = self.pause() {
                warn!("Sleep timer pause failed: {}", e);
            }
        }
        true
    }

    // ------------------------------------------------------------------
    // Player and platform callbacks
    // ------------------------------------------------------------------

    /// Position sampler callback (runs while playing)
    pub fn sample_position(&mut self) -> Option<PlayerPosition> {
        let position = self.capture_player_position()?;
        let item_id = self.current_item()?.id.clone();

        self.events.emit_lossy(AudioEvent::PlaybackProgress {
            item_id,
            elapsed_ms: duration_to_millis(self.elapsed),
            duration_ms: self.total.map(duration_to_millis),
            timestamp: chrono::Utc::now(),
        });
        Some(position)
    }

    /// End-of-item notification. Advances if possible, otherwise stops with the
    /// queue kept. Notifications for an item that is no longer current are ignored.
    pub fn on_item_ended(&mut self, item_id: &str) -> bool {
        match self.current_item() {
            Some(item) if item.id == item_id => {}
            _ => {
                debug!("Ignoring end of stale item {}", item_id);
                return false;
            }
        }

        if self.current_index + 1 < self.queue.len() {
            debug!("Item {} ended, advancing", item_id);
            self.move_to(self.current_index + 1);
            return true;
        }

        info!("Item {} ended at end of queue", item_id);
        self.player.pause();
        self.player.seek(Duration::ZERO);

        let old_state = self.transport;
        self.transport = TransportState::Stopped;
        self.elapsed = Duration::ZERO;
        self.emit_state_change(old_state);
        self.publish_now_playing();
        true
    }

    /// React to a relayed interruption or route change
    pub fn on_session_signal(&mut self, signal: SessionSignal, arbiter: &mut SessionArbiter) {
        match signal {
            SessionSignal::Interruption(InterruptionKind::Began) => {
                if self.is_playing() {
                    info!("Pausing for interruption");
                    if self.pause().is_ok() {
                        self.interrupted = true;
                    }
                }
            }
            SessionSignal::Interruption(InterruptionKind::EndedShouldResume) => {
                if self.interrupted {
                    info!("Resuming after interruption");
                    self.interrupted = false;
                    if let Err(e) = self.play(arbiter) {
                        warn!("Resume after interruption failed: {}", e);
                    }
                }
            }
            SessionSignal::Interruption(InterruptionKind::EndedShouldNotResume) => {
                self.interrupted = false;
            }
            SessionSignal::RouteChange(RouteChangeKind::OldDeviceUnavailable) => {
                if self.is_playing() {
                    info!("Output device went away, pausing");
                    if let Err(e) = self.pause() {
                        warn!("Pause on route change failed: {}", e);
                    }
                }
            }
            SessionSignal::RouteChange(RouteChangeKind::Other) => {}
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Point the cursor at `index` and hand the media to the player
    fn enter_item(&mut self, index: usize) {
        self.current_index = index;
        self.elapsed = Duration::ZERO;

        let item = &self.queue[index];
        self.total = item.duration_hint();
        if let Err(e) = self.player.load_media(item) {
            warn!("Media load failed, continuing silently: {}", e);
        }

        self.events.emit_lossy(AudioEvent::CurrentItemChanged {
            item_id: item.id.clone(),
            index,
            timestamp: chrono::Utc::now(),
        });
    }

    /// Navigate preserving transport state
    fn move_to(&mut self, index: usize) {
        self.enter_item(index);
        if self.is_playing() {
            self.player.set_rate(self.rate);
            self.player.play();
        }
        self.publish_now_playing();
    }

    fn capture_player_position(&mut self) -> Option<PlayerPosition> {
        let position = self.player.position()?;
        self.elapsed = position.elapsed;
        if position.total.is_some() {
            self.total = position.total;
        }
        Some(position)
    }

    fn publish_now_playing(&mut self) {
        let Some(item) = self.queue.get(self.current_index) else {
            return;
        };

        let info = NowPlayingInfo {
            title: item.title.clone(),
            artist: self.context.artist.clone(),
            album: self.context.album.clone(),
            elapsed_secs: self.elapsed.as_secs_f64(),
            duration_secs: self.total.map(|d| d.as_secs_f64()),
            rate: if self.is_playing() { self.rate } else { 0.0 },
        };

        self.now_playing = Some(info.clone());
        self.events.emit_lossy(AudioEvent::NowPlayingChanged {
            info: Some(info),
            timestamp: chrono::Utc::now(),
        });
    }

    fn clear_now_playing(&mut self) {
        self.now_playing = None;
        self.events.emit_lossy(AudioEvent::NowPlayingChanged {
            info: None,
            timestamp: chrono::Utc::now(),
        });
    }

    fn emit_state_change(&self, old_state: TransportState) {
        if old_state == self.transport {
            return;
        }
        info!("Playback state: {} -> {}", old_state, self.transport);
        self.events.emit_lossy(AudioEvent::PlaybackStateChanged {
            old_state,
            new_state: self.transport,
            timestamp: chrono::Utc::now(),
        });
    }

    fn emit_sleep_cancelled(&self) {
        self.events.emit_lossy(AudioEvent::SleepTimerCancelled {
            timestamp: chrono::Utc::now(),
        });
    }
}
