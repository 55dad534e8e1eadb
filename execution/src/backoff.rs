use rand::{Rng, RngCore};
use std::time::Duration;

pub(crate) fn jittered_backoff(rng: &mut impl RngCore, backoff: Duration) -> Duration {
    let backoff_ms = backoff.as_millis() as u64;
    if backoff_ms <= 1 {
        return backoff;
    }

    // "Equal jitter": delay is in [backoff/2, backoff].
    let half_ms = backoff_ms / 2;
    let jitter_ms = rng.gen_range(0..=half_ms);
    Duration::from_millis(half_ms.saturating_add(jitter_ms))
}

/// Double `backoff`, capped at `max`.
pub(crate) fn next_backoff(backoff: Duration, max: Duration) -> Duration {
    backoff.saturating_mul(2).min(max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_jitter_stays_within_half_window() {
        let mut rng = StdRng::seed_from_u64(9);
        let backoff = Duration::from_millis(400);
        for _ in 0..100 {
            let delay = jittered_backoff(&mut rng, backoff);
            assert!(delay >= Duration::from_millis(200));
            assert!(delay <= backoff);
        }
    }

    #[test]
    fn test_backoff_doubles_to_cap() {
        let max = Duration::from_millis(500);
        assert_eq!(
            next_backoff(Duration::from_millis(100), max),
            Duration::from_millis(200)
        );
        assert_eq!(next_backoff(Duration::from_millis(400), max), max);
    }
}
