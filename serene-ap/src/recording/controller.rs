//! Recorder controller
//!
//! Voice-memo capture lifecycle: Idle ⇄ Recording.
//!
//! The recorder acquires the Recording consumer before capturing and releases
//! it when the take ends. Release is conditional on the ambient loop: when the
//! loop still holds the session the hardware stays engaged and only the
//! Recording grant goes away.
//!
//! A take shorter than the minimum duration is deleted; the watchdog stops
//! (never cancels) a take that reaches the maximum duration.

use super::capture::CaptureBackend;
use super::storage::RecordingStore;
use crate::error::{Error, Result};
use crate::session::{ReleaseOutcome, SessionArbiter};
use serde::Serialize;
use serene_common::events::{
    AudioEvent, Consumer, EventBus, InterruptionKind, RecordingEndReason, RecordingState,
    SessionSignal,
};
use serene_common::time::duration_to_millis;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Duration bounds for a take
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordingLimits {
    pub min_duration: Duration,
    pub max_duration: Duration,
}

impl Default for RecordingLimits {
    fn default() -> Self {
        Self {
            min_duration: Duration::from_secs(1),
            max_duration: Duration::from_secs(60),
        }
    }
}

/// Returned by a successful `start`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordingStarted {
    pub recording_id: Uuid,
    pub file_path: PathBuf,
}

/// How a take ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordingOutcome {
    pub recording_id: Uuid,
    /// None when the file was discarded
    pub file_path: Option<PathBuf>,
    pub elapsed_ms: u64,
    pub reason: RecordingEndReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordingSnapshot {
    pub state: RecordingState,
    pub recording_id: Option<Uuid>,
    pub file_path: Option<PathBuf>,
    pub elapsed_ms: u64,
}

#[derive(Debug)]
struct ActiveTake {
    id: Uuid,
    path: PathBuf,
    started_at: Instant,
    elapsed: Duration,
}

impl ActiveTake {
    /// Monotonic elapsed time as of `now`
    fn advance(&mut self, now: Instant) -> Duration {
        let elapsed = now.saturating_duration_since(self.started_at);
        if elapsed > self.elapsed {
            self.elapsed = elapsed;
        }
        self.elapsed
    }
}

pub struct RecorderController {
    store: RecordingStore,
    capture: Box<dyn CaptureBackend>,
    limits: RecordingLimits,
    events: EventBus,
    active: Option<ActiveTake>,
}

impl RecorderController {
    pub fn new(
        store: RecordingStore,
        capture: Box<dyn CaptureBackend>,
        limits: RecordingLimits,
        events: EventBus,
    ) -> Self {
        Self {
            store,
            capture,
            limits,
            events,
            active: None,
        }
    }

    pub fn state(&self) -> RecordingState {
        if self.active.is_some() {
            RecordingState::Recording
        } else {
            RecordingState::Idle
        }
    }

    pub fn is_recording(&self) -> bool {
        self.active.is_some()
    }

    pub fn limits(&self) -> RecordingLimits {
        self.limits
    }

    pub fn snapshot(&self) -> RecordingSnapshot {
        match &self.active {
            Some(take) => RecordingSnapshot {
                state: RecordingState::Recording,
                recording_id: Some(take.id),
                file_path: Some(take.path.clone()),
                elapsed_ms: duration_to_millis(take.elapsed),
            },
            None => RecordingSnapshot {
                state: RecordingState::Idle,
                recording_id: None,
                file_path: None,
                elapsed_ms: 0,
            },
        }
    }

    /// Begin a take. The caller has already obtained capture permission.
    pub fn start(&mut self, arbiter: &mut SessionArbiter, now: Instant) -> Result<RecordingStarted> {
        if self.active.is_some() {
            return Err(Error::InvalidState("already recording".to_string()));
        }

        arbiter.acquire(Consumer::Recording)?;

        let path = match self.store.allocate(chrono::Utc::now()) {
            Ok(path) => path,
            Err(e) => {
                self.release_session(arbiter);
                return Err(e);
            }
        };

        if let Err(e) = self.capture.begin(&path) {
            warn!("Capture failed to start: {}", e);
            self.release_session(arbiter);
            if let Err(cleanup) = self.store.discard(&path) {
                debug!("Cleanup after failed start: {}", cleanup);
            }
            return Err(Error::Capture(e.to_string()));
        }

        let id = Uuid::new_v4();
        info!("Recording {} started: {}", id, path.display());
        self.events.emit_lossy(AudioEvent::RecordingStarted {
            recording_id: id,
            file_path: path.display().to_string(),
            timestamp: chrono::Utc::now(),
        });

        self.active = Some(ActiveTake {
            id,
            path: path.clone(),
            started_at: now,
            elapsed: Duration::ZERO,
        });

        Ok(RecordingStarted {
            recording_id: id,
            file_path: path,
        })
    }

    /// End the take, keeping the file if it reached the minimum duration
    pub fn stop(
        &mut self,
        arbiter: &mut SessionArbiter,
        now: Instant,
        reason: RecordingEndReason,
    ) -> Result<Option<PathBuf>> {
        let outcome = self.finish(arbiter, now, reason, false)?;
        Ok(outcome.file_path)
    }

    /// End the take and always delete the file. No-op when idle.
    pub fn cancel(&mut self, arbiter: &mut SessionArbiter, now: Instant) -> Result<()> {
        if self.active.is_none() {
            debug!("Cancel ignored: not recording");
            return Ok(());
        }
        self.finish(arbiter, now, RecordingEndReason::Cancelled, true)?;
        Ok(())
    }

    /// Watchdog callback. Stops the take once it reaches the maximum duration.
    pub fn tick(&mut self, arbiter: &mut SessionArbiter, now: Instant) -> Option<RecordingOutcome> {
        let take = self.active.as_mut()?;
        let elapsed = take.advance(now);

        self.events.emit_lossy(AudioEvent::RecordingProgress {
            recording_id: take.id,
            elapsed_ms: duration_to_millis(elapsed),
            timestamp: chrono::Utc::now(),
        });

        if elapsed < self.limits.max_duration {
            return None;
        }

        info!("Recording reached maximum duration {:?}", self.limits.max_duration);
        match self.finish(arbiter, now, RecordingEndReason::MaxDuration, false) {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                warn!("Automatic stop failed: {}", e);
                None
            }
        }
    }

    /// Interruptions end the take; route changes do not affect capture
    pub fn on_session_signal(
        &mut self,
        signal: SessionSignal,
        arbiter: &mut SessionArbiter,
        now: Instant,
    ) -> Option<RecordingOutcome> {
        if signal != SessionSignal::Interruption(InterruptionKind::Began) || self.active.is_none() {
            return None;
        }

        info!("Stopping recording for interruption");
        match self.finish(arbiter, now, RecordingEndReason::Interrupted, false) {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                warn!("Stop on interruption failed: {}", e);
                None
            }
        }
    }

    fn finish(
        &mut self,
        arbiter: &mut SessionArbiter,
        now: Instant,
        reason: RecordingEndReason,
        discard: bool,
    ) -> Result<RecordingOutcome> {
        let Some(mut take) = self.active.take() else {
            return Err(Error::InvalidState("not recording".to_string()));
        };
        let elapsed = take.advance(now);

        let capture_result = self.capture.finish();
        self.release_session(arbiter);

        let too_short = elapsed < self.limits.min_duration;
        let result = if discard || too_short {
            if too_short && !discard {
                info!(
                    "Recording {} too short ({:?} < {:?}), discarding",
                    take.id, elapsed, self.limits.min_duration
                );
            }
            self.store.discard(&take.path).map(|()| None)
        } else {
            match capture_result {
                Ok(()) => self.store.finalize(&take.path).map(Some),
                Err(e) => Err(Error::FileFinalizeFailed(e.to_string())),
            }
        };

        let outcome = RecordingOutcome {
            recording_id: take.id,
            file_path: result.as_ref().ok().cloned().flatten(),
            elapsed_ms: duration_to_millis(elapsed),
            reason,
        };

        info!(
            "Recording {} ended ({:?}) after {:?}",
            take.id, reason, elapsed
        );
        self.events.emit_lossy(AudioEvent::RecordingFinished {
            recording_id: take.id,
            file_path: outcome.file_path.as_ref().map(|p| p.display().to_string()),
            elapsed_ms: outcome.elapsed_ms,
            reason,
            timestamp: chrono::Utc::now(),
        });

        result.map(|_| outcome)
    }

    fn release_session(&self, arbiter: &mut SessionArbiter) -> ReleaseOutcome {
        let outcome = arbiter.release(Consumer::Recording);
        match outcome {
            ReleaseOutcome::StillActive => info!(
                "Recording released, hardware session stays active for {:?}",
                arbiter.active_consumers()
            ),
            ReleaseOutcome::Deactivated => debug!("Recording released, hardware session deactivated"),
            ReleaseOutcome::NotHeld => debug!("Recording grant already released"),
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::FileCaptureBackend;
    use crate::session::{ActivationError, LoggingSessionBackend, SessionBackend};
    use tempfile::TempDir;

    struct FailingBackend;

    impl SessionBackend for FailingBackend {
        fn activate(&mut self) -> std::result::Result<(), ActivationError> {
            Err(ActivationError::Failed("category conflict".into()))
        }

        fn deactivate(&mut self) -> std::result::Result<(), ActivationError> {
            Ok(())
        }
    }

    fn setup(dir: &TempDir) -> (RecorderController, SessionArbiter) {
        let events = EventBus::new(64);
        let recorder = RecorderController::new(
            RecordingStore::new(dir.path()),
            Box::new(FileCaptureBackend::new()),
            RecordingLimits::default(),
            events.clone(),
        );
        let arbiter = SessionArbiter::new(Box::new(LoggingSessionBackend::new()), events);
        (recorder, arbiter)
    }

    #[test]
    fn test_start_acquires_recording() {
        let dir = TempDir::new().unwrap();
        let (mut recorder, mut arbiter) = setup(&dir);

        let started = recorder.start(&mut arbiter, Instant::now()).unwrap();
        assert!(recorder.is_recording());
        assert!(arbiter.is_held_by(Consumer::Recording));
        assert!(started.file_path.exists());
        assert!(started
            .file_path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("voice_"));
    }

    #[test]
    fn test_start_twice_is_invalid() {
        let dir = TempDir::new().unwrap();
        let (mut recorder, mut arbiter) = setup(&dir);
        let now = Instant::now();

        recorder.start(&mut arbiter, now).unwrap();
        assert!(matches!(
            recorder.start(&mut arbiter, now),
            Err(Error::InvalidState(_))
        ));
    }

    #[test]
    fn test_short_take_is_deleted() {
        let dir = TempDir::new().unwrap();
        let (mut recorder, mut arbiter) = setup(&dir);
        let start = Instant::now();

        let started = recorder.start(&mut arbiter, start).unwrap();
        let kept = recorder
            .stop(&mut arbiter, start + Duration::from_millis(500), RecordingEndReason::Stopped)
            .unwrap();

        assert_eq!(kept, None);
        assert!(!started.file_path.exists());
        assert_eq!(recorder.state(), RecordingState::Idle);
        assert!(!arbiter.is_session_active());
    }

    #[test]
    fn test_long_enough_take_is_kept() {
        let dir = TempDir::new().unwrap();
        let (mut recorder, mut arbiter) = setup(&dir);
        let start = Instant::now();

        let started = recorder.start(&mut arbiter, start).unwrap();
        let kept = recorder
            .stop(&mut arbiter, start + Duration::from_secs(3), RecordingEndReason::Stopped)
            .unwrap();

        assert_eq!(kept, Some(started.file_path.clone()));
        assert!(started.file_path.exists());
    }

    #[test]
    fn test_cancel_always_deletes() {
        let dir = TempDir::new().unwrap();
        let (mut recorder, mut arbiter) = setup(&dir);
        let start = Instant::now();

        let started = recorder.start(&mut arbiter, start).unwrap();
        recorder
            .cancel(&mut arbiter, start + Duration::from_secs(30))
            .unwrap();
        assert!(!started.file_path.exists());
        assert!(!arbiter.is_held_by(Consumer::Recording));

        // Idle cancel is a no-op
        recorder.cancel(&mut arbiter, start).unwrap();
    }

    #[test]
    fn test_stop_with_ambient_loop_keeps_session() {
        let dir = TempDir::new().unwrap();
        let (mut recorder, mut arbiter) = setup(&dir);
        let start = Instant::now();

        arbiter.acquire(Consumer::AmbientLoop).unwrap();
        recorder.start(&mut arbiter, start).unwrap();
        recorder
            .stop(&mut arbiter, start + Duration::from_secs(2), RecordingEndReason::Stopped)
            .unwrap();

        assert!(arbiter.is_session_active());
        assert_eq!(arbiter.active_consumers(), vec![Consumer::AmbientLoop]);
    }

    #[test]
    fn test_release_reports_whether_hardware_stays_engaged() {
        let dir = TempDir::new().unwrap();
        let (recorder, mut arbiter) = setup(&dir);

        arbiter.acquire(Consumer::AmbientLoop).unwrap();
        arbiter.acquire(Consumer::Recording).unwrap();
        assert_eq!(recorder.release_session(&mut arbiter), ReleaseOutcome::StillActive);
        assert!(arbiter.is_session_active());
        assert_eq!(arbiter.active_consumers(), vec![Consumer::AmbientLoop]);
        assert_eq!(recorder.release_session(&mut arbiter), ReleaseOutcome::NotHeld);

        arbiter.release(Consumer::AmbientLoop);
        arbiter.acquire(Consumer::Recording).unwrap();
        assert_eq!(recorder.release_session(&mut arbiter), ReleaseOutcome::Deactivated);
        assert!(!arbiter.is_session_active());
    }

    #[test]
    fn test_watchdog_stops_at_max_duration() {
        let dir = TempDir::new().unwrap();
        let (mut recorder, mut arbiter) = setup(&dir);
        let start = Instant::now();
        recorder.start(&mut arbiter, start).unwrap();

        assert!(recorder
            .tick(&mut arbiter, start + Duration::from_secs(59))
            .is_none());
        let outcome = recorder
            .tick(&mut arbiter, start + Duration::from_secs(60))
            .unwrap();

        assert_eq!(outcome.reason, RecordingEndReason::MaxDuration);
        assert_eq!(outcome.elapsed_ms, 60_000);
        assert!(outcome.file_path.unwrap().exists());
        assert!(!recorder.is_recording());
    }

    #[test]
    fn test_elapsed_never_decreases() {
        let dir = TempDir::new().unwrap();
        let (mut recorder, mut arbiter) = setup(&dir);
        let start = Instant::now();
        recorder.start(&mut arbiter, start).unwrap();

        recorder.tick(&mut arbiter, start + Duration::from_secs(5));
        recorder.tick(&mut arbiter, start + Duration::from_secs(2));
        assert_eq!(recorder.snapshot().elapsed_ms, 5_000);
    }

    #[test]
    fn test_interruption_stops_and_keeps_take() {
        let dir = TempDir::new().unwrap();
        let (mut recorder, mut arbiter) = setup(&dir);
        let start = Instant::now();
        recorder.start(&mut arbiter, start).unwrap();

        let outcome = recorder
            .on_session_signal(
                SessionSignal::Interruption(InterruptionKind::Began),
                &mut arbiter,
                start + Duration::from_secs(4),
            )
            .unwrap();
        assert_eq!(outcome.reason, RecordingEndReason::Interrupted);
        assert!(outcome.file_path.is_some());
    }

    #[test]
    fn test_activation_failure_stays_idle() {
        let dir = TempDir::new().unwrap();
        let events = EventBus::new(16);
        let mut recorder = RecorderController::new(
            RecordingStore::new(dir.path()),
            Box::new(FileCaptureBackend::new()),
            RecordingLimits::default(),
            events.clone(),
        );
        let mut arbiter = SessionArbiter::new(Box::new(FailingBackend), events);

        let err = recorder.start(&mut arbiter, Instant::now()).unwrap_err();
        assert!(matches!(err, Error::HardwareActivationFailed(_)));
        assert_eq!(recorder.state(), RecordingState::Idle);
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[test]
    fn test_missing_file_fails_finalize() {
        let dir = TempDir::new().unwrap();
        let (mut recorder, mut arbiter) = setup(&dir);
        let start = Instant::now();

        let started = recorder.start(&mut arbiter, start).unwrap();
        std::fs::remove_file(&started.file_path).unwrap();

        let result = recorder.stop(&mut arbiter, start + Duration::from_secs(2), RecordingEndReason::Stopped);
        assert!(matches!(result, Err(Error::FileFinalizeFailed(_))));
        assert_eq!(recorder.state(), RecordingState::Idle);
        assert!(!arbiter.is_any_active());
    }
}
