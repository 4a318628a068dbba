//! Duration helpers for the millisecond fields used on the wire

use std::time::Duration;

/// Convert milliseconds to duration
pub fn millis_to_duration(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

/// Convert a duration to whole milliseconds, saturating at `u64::MAX`
pub fn duration_to_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_millis_round_trip() {
        assert_eq!(millis_to_duration(1500), Duration::from_millis(1500));
        assert_eq!(duration_to_millis(Duration::from_millis(1500)), 1500);
    }

    #[test]
    fn test_duration_to_millis_saturates() {
        assert_eq!(duration_to_millis(Duration::MAX), u64::MAX);
    }
}
