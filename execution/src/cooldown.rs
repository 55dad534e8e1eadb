//! Cooldown gate consulted before a session is admitted.
//!
//! The boundary is inclusive: once exactly `duration` has elapsed since the
//! last play, the activity may start again. A timestamp in the future counts as
//! zero elapsed time.

use std::time::Duration;

/// Whether an activity last played at `last_played_ms` may start at `now_ms`.
pub fn can_start(last_played_ms: Option<u64>, duration: Duration, now_ms: u64) -> bool {
    time_remaining(last_played_ms, duration, now_ms).is_zero()
}

/// Time left until the activity may start again.
pub fn time_remaining(last_played_ms: Option<u64>, duration: Duration, now_ms: u64) -> Duration {
    let Some(last) = last_played_ms else {
        return Duration::ZERO;
    };
    let elapsed = now_ms.saturating_sub(last);
    let duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
    Duration::from_millis(duration_ms.saturating_sub(elapsed))
}

#[cfg(test)]
mod tests {
    use super::*;

    const D: Duration = Duration::from_secs(30);

    #[test]
    fn test_never_played_can_start() {
        assert!(can_start(None, D, 0));
        assert_eq!(time_remaining(None, D, 0), Duration::ZERO);
    }

    #[test]
    fn test_boundary_is_inclusive() {
        let now = 1_000_000;
        for elapsed in [0u64, 1, 15_000, 29_999] {
            assert!(!can_start(Some(now - elapsed), D, now), "elapsed {elapsed}");
        }
        for elapsed in [30_000u64, 30_001, 90_000] {
            assert!(can_start(Some(now - elapsed), D, now), "elapsed {elapsed}");
        }
    }

    #[test]
    fn test_time_remaining() {
        let now = 100_000;
        assert_eq!(
            time_remaining(Some(now - 10_000), D, now),
            Duration::from_secs(20)
        );
        assert_eq!(time_remaining(Some(now - 30_000), D, now), Duration::ZERO);
    }

    #[test]
    fn test_future_timestamp_counts_as_just_played() {
        let now = 50_000;
        assert!(!can_start(Some(now + 5_000), D, now));
        assert_eq!(time_remaining(Some(now + 5_000), D, now), D);
    }
}
