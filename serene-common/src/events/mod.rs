//! Event types for the Serene event system
//!
//! Provides shared event definitions and the EventBus used by the audio core,
//! the HTTP/SSE surface and any OS glue listening for now-playing updates.

mod playback_types;
mod session_types;

pub use playback_types::{NowPlayingInfo, RecordingEndReason, RecordingState, TransportState};
pub use session_types::{
    Consumer, InterruptionKind, LifecycleKind, PlatformSignal, RouteChangeKind, SessionSignal,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Serene event types
///
/// Events are broadcast via EventBus and can be serialized for SSE transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AudioEvent {
    /// Arbiter holder set or hardware state changed
    SessionChanged {
        /// Current holders, sorted
        active_consumers: Vec<Consumer>,
        /// Whether the hardware session is engaged
        session_active: bool,
        timestamp: DateTime<Utc>,
    },

    /// Hardware activation failed for a consumer; it proceeds silently
    SessionActivationFailed {
        consumer: Consumer,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// Interruption relayed from the platform
    Interruption {
        kind: InterruptionKind,
        timestamp: DateTime<Utc>,
    },

    /// Route change relayed from the platform
    RouteChanged {
        kind: RouteChangeKind,
        timestamp: DateTime<Utc>,
    },

    /// Application lifecycle transition observed by the controller
    LifecycleChanged {
        kind: LifecycleKind,
        timestamp: DateTime<Utc>,
    },

    /// A new queue replaced the previous one
    QueueLoaded {
        item_count: usize,
        start_index: usize,
        timestamp: DateTime<Utc>,
    },

    /// Playlist cursor moved to another item
    CurrentItemChanged {
        item_id: String,
        index: usize,
        timestamp: DateTime<Utc>,
    },

    /// Transport state changed
    ///
    /// Triggers:
    /// - SSE: Update UI controls
    /// - Remote surface: play/pause button state
    PlaybackStateChanged {
        old_state: TransportState,
        new_state: TransportState,
        timestamp: DateTime<Utc>,
    },

    /// Now-playing metadata push (None clears the remote surface)
    NowPlayingChanged {
        info: Option<NowPlayingInfo>,
        timestamp: DateTime<Utc>,
    },

    /// Periodic position sample while playing
    PlaybackProgress {
        item_id: String,
        elapsed_ms: u64,
        duration_ms: Option<u64>,
        timestamp: DateTime<Utc>,
    },

    /// `next` was requested on the last item
    QueueExhausted {
        item_id: String,
        timestamp: DateTime<Utc>,
    },

    /// Playback rate changed
    PlaybackRateChanged {
        rate: f32,
        timestamp: DateTime<Utc>,
    },

    SleepTimerArmed {
        remaining_ms: u64,
        timestamp: DateTime<Utc>,
    },

    SleepTimerCancelled {
        timestamp: DateTime<Utc>,
    },

    /// Sleep deadline reached; playback was paused
    SleepTimerFired {
        timestamp: DateTime<Utc>,
    },

    RecordingStarted {
        recording_id: Uuid,
        file_path: String,
        timestamp: DateTime<Utc>,
    },

    /// Watchdog sample while recording
    RecordingProgress {
        recording_id: Uuid,
        elapsed_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// Recording left the Recording state
    ///
    /// `file_path` is None when the take was discarded (cancelled or too short).
    RecordingFinished {
        recording_id: Uuid,
        file_path: Option<String>,
        elapsed_ms: u64,
        reason: RecordingEndReason,
        timestamp: DateTime<Utc>,
    },
}

impl AudioEvent {
    /// Event name used as the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            AudioEvent::SessionChanged { .. } => "SessionChanged",
            AudioEvent::SessionActivationFailed { .. } => "SessionActivationFailed",
            AudioEvent::Interruption { .. } => "Interruption",
            AudioEvent::RouteChanged { .. } => "RouteChanged",
            AudioEvent::LifecycleChanged { .. } => "LifecycleChanged",
            AudioEvent::QueueLoaded { .. } => "QueueLoaded",
            AudioEvent::CurrentItemChanged { .. } => "CurrentItemChanged",
            AudioEvent::PlaybackStateChanged { .. } => "PlaybackStateChanged",
            AudioEvent::NowPlayingChanged { .. } => "NowPlayingChanged",
            AudioEvent::PlaybackProgress { .. } => "PlaybackProgress",
            AudioEvent::QueueExhausted { .. } => "QueueExhausted",
            AudioEvent::PlaybackRateChanged { .. } => "PlaybackRateChanged",
            AudioEvent::SleepTimerArmed { .. } => "SleepTimerArmed",
            AudioEvent::SleepTimerCancelled { .. } => "SleepTimerCancelled",
            AudioEvent::SleepTimerFired { .. } => "SleepTimerFired",
            AudioEvent::RecordingStarted { .. } => "RecordingStarted",
            AudioEvent::RecordingProgress { .. } => "RecordingProgress",
            AudioEvent::RecordingFinished { .. } => "RecordingFinished",
        }
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Central event distribution bus for application-wide events
///
/// The EventBus uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
/// - Lagged message detection for slow subscribers
///
/// Events are published in the order the audio controller produces them; each
/// subscriber observes that order.
///
/// # Examples
///
/// ```
/// use serene_common::events::{AudioEvent, EventBus, TransportState};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(AudioEvent::PlaybackStateChanged {
///     old_state: TransportState::Paused,
///     new_state: TransportState::Playing,
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert!(matches!(rx.try_recv(), Ok(AudioEvent::PlaybackStateChanged { .. })));
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<AudioEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// * `capacity` - Number of events to buffer before dropping old events
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<AudioEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: AudioEvent,
    ) -> Result<usize, broadcast::error::SendError<AudioEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: AudioEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
