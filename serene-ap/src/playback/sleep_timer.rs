//! Sleep timer
//!
//! A single absolute deadline. The controller's 1-second ticker polls it; the
//! timer itself never touches transport state.

use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Default, Clone)]
pub struct SleepTimer {
    deadline: Option<Instant>,
}

impl SleepTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm for `after` from `now`, replacing any earlier deadline.
    ///
    /// Returns None, leaving the timer untouched, when the deadline is not
    /// representable.
    pub fn arm(&mut self, after: Duration, now: Instant) -> Option<Instant> {
        let deadline = now.checked_add(after)?;
        self.deadline = Some(deadline);
        Some(deadline)
    }

    /// Returns whether a deadline was pending
    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    /// Consume the deadline if it has passed. Returns true exactly once per arm.
    pub fn poll_expired(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rearm_replaces_deadline() {
        let start = Instant::now();
        let mut timer = SleepTimer::new();
        timer.arm(Duration::from_secs(60), start);
        timer.arm(Duration::from_secs(120), start);

        assert!(!timer.poll_expired(start + Duration::from_secs(60)));
        assert!(!timer.poll_expired(start + Duration::from_secs(119)));
        assert!(timer.poll_expired(start + Duration::from_secs(120)));
        assert!(!timer.poll_expired(start + Duration::from_secs(121)));
        assert!(!timer.is_armed());
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let start = Instant::now();
        let mut timer = SleepTimer::new();
        assert!(!timer.cancel());

        timer.arm(Duration::from_secs(5), start);
        assert!(timer.cancel());
        assert!(!timer.cancel());
        assert_eq!(timer.remaining(start), None);
    }

    #[test]
    fn test_remaining_saturates_at_zero() {
        let start = Instant::now();
        let mut timer = SleepTimer::new();
        timer.arm(Duration::from_secs(10), start);

        assert_eq!(timer.remaining(start + Duration::from_secs(4)), Some(Duration::from_secs(6)));
        assert_eq!(timer.remaining(start + Duration::from_secs(30)), Some(Duration::ZERO));
    }

    #[test]
    fn test_unrepresentable_deadline_keeps_previous() {
        let start = Instant::now();
        let mut timer = SleepTimer::new();
        timer.arm(Duration::from_secs(30), start);

        assert_eq!(timer.arm(Duration::MAX, start), None);
        assert_eq!(timer.remaining(start), Some(Duration::from_secs(30)));
    }
}
