//! Session arbiter
//!
//! Reference-counted ownership of the single hardware audio session.
//!
//! Grants are additive: any number of consumers may hold the session at once,
//! and the hardware is engaged exactly while the holder set is non-empty.
//! The arbiter lives inside the audio controller's serialized context, so
//! acquire/release are plain set operations with no locking.

use super::backend::{ActivationError, SessionBackend};
use crate::error::SessionDenied;
use serene_common::events::{
    AudioEvent, Consumer, EventBus, InterruptionKind, PlatformSignal, SessionSignal,
};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Successful grant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionGrant {
    pub consumer: Consumer,
    /// True when this grant caused the 0→1 hardware activation
    pub activated_hardware: bool,
}

/// Result of a release call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// Consumer was not a holder; nothing changed
    NotHeld,
    /// Consumer removed, other holders keep the hardware engaged
    StillActive,
    /// Last holder removed; hardware disengaged
    Deactivated,
}

/// Exclusive-resource manager for the hardware audio session
pub struct SessionArbiter {
    backend: Box<dyn SessionBackend>,
    active_consumers: BTreeSet<Consumer>,
    session_active: bool,
    events: EventBus,
}

impl SessionArbiter {
    /// Create an arbiter. The backend is not touched until the first acquire.
    pub fn new(backend: Box<dyn SessionBackend>, events: EventBus) -> Self {
        Self {
            backend,
            active_consumers: BTreeSet::new(),
            session_active: false,
            events,
        }
    }

    /// Register `consumer` as a holder of the session.
    ///
    /// The 0→1 transition activates the hardware. A busy report from the
    /// platform counts as activated. Any other activation failure leaves the
    /// holder set untouched and returns [`SessionDenied`].
    pub fn acquire(&mut self, consumer: Consumer) -> Result<SessionGrant, SessionDenied> {
        if self.active_consumers.contains(&consumer) {
            debug!("Session already held by {}", consumer);
            return Ok(SessionGrant {
                consumer,
                activated_hardware: false,
            });
        }

        let mut activated_hardware = false;
        if self.active_consumers.is_empty() {
            match self.backend.activate() {
                Ok(()) => {}
                Err(ActivationError::Busy) => {
                    warn!("Audio session busy during activation for {}, continuing", consumer);
                }
                Err(ActivationError::Failed(reason)) => {
                    warn!("Audio session activation failed for {}: {}", consumer, reason);
                    self.events.emit_lossy(AudioEvent::SessionActivationFailed {
                        consumer,
                        reason: reason.clone(),
                        timestamp: chrono::Utc::now(),
                    });
                    return Err(SessionDenied { consumer, reason });
                }
            }
            self.session_active = true;
            activated_hardware = true;
        }

        self.active_consumers.insert(consumer);
        info!(
            "Session granted to {} (holders: {:?})",
            consumer, self.active_consumers
        );
        self.publish_state();

        Ok(SessionGrant {
            consumer,
            activated_hardware,
        })
    }

    /// Remove `consumer` from the holder set. Releasing a non-holder is a no-op.
    pub fn release(&mut self, consumer: Consumer) -> ReleaseOutcome {
        if !self.active_consumers.remove(&consumer) {
            debug!("Release for {} ignored: not a holder", consumer);
            return ReleaseOutcome::NotHeld;
        }

        let outcome = if self.active_consumers.is_empty() {
            self.deactivate_hardware();
            ReleaseOutcome::Deactivated
        } else {
            ReleaseOutcome::StillActive
        };

        info!(
            "Session released by {} (holders: {:?})",
            consumer, self.active_consumers
        );
        self.publish_state();
        outcome
    }

    /// Drop every holder and disengage the hardware
    pub fn release_all(&mut self) {
        if self.active_consumers.is_empty() && !self.session_active {
            return;
        }
        self.active_consumers.clear();
        self.deactivate_hardware();
        info!("Session released by all holders");
        self.publish_state();
    }

    pub fn is_held_by(&self, consumer: Consumer) -> bool {
        self.active_consumers.contains(&consumer)
    }

    pub fn is_any_active(&self) -> bool {
        !self.active_consumers.is_empty()
    }

    /// Whether the hardware session is physically engaged
    pub fn is_session_active(&self) -> bool {
        self.session_active
    }

    /// Current holders in stable order
    pub fn active_consumers(&self) -> Vec<Consumer> {
        self.active_consumers.iter().copied().collect()
    }

    /// Re-publish a platform interruption or route change.
    ///
    /// Emits exactly one bus event and returns the signal so the controller can
    /// deliver it to in-process subscribers before handling anything else.
    /// Lifecycle signals are not session events and yield `None`.
    pub fn relay(&self, signal: PlatformSignal) -> Option<SessionSignal> {
        let timestamp = chrono::Utc::now();
        match signal {
            PlatformSignal::Interruption { kind } => {
                match kind {
                    InterruptionKind::Began => info!("Audio interruption began"),
                    _ => info!("Audio interruption ended ({:?})", kind),
                }
                self.events
                    .emit_lossy(AudioEvent::Interruption { kind, timestamp });
                Some(SessionSignal::Interruption(kind))
            }
            PlatformSignal::RouteChange { kind } => {
                info!("Audio route changed ({:?})", kind);
                self.events
                    .emit_lossy(AudioEvent::RouteChanged { kind, timestamp });
                Some(SessionSignal::RouteChange(kind))
            }
            PlatformSignal::Lifecycle { .. } => None,
        }
    }

    fn deactivate_hardware(&mut self) {
        if let Err(e) = self.backend.deactivate() {
            // Logical state still moves to inactive so holders stay consistent
            warn!("Audio session deactivation failed: {}", e);
        }
        self.session_active = false;
    }

    fn publish_state(&self) {
        self.events.emit_lossy(AudioEvent::SessionChanged {
            active_consumers: self.active_consumers(),
            session_active: self.session_active,
            timestamp: chrono::Utc::now(),
        });
    }
}
