use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::time::Instant;

/// Wall clock anchored to the Tokio timer.
///
/// Timestamps are ms since the Unix epoch, derived from a monotonic origin so
/// deadlines and persisted cooldowns agree (and so paused test runtimes move
/// both together).
#[derive(Clone, Copy, Debug)]
pub struct Clock {
    epoch_ms: u64,
    origin: Instant,
}

impl Clock {
    pub fn system() -> Self {
        let epoch_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or_default();
        Self::starting_at(epoch_ms)
    }

    pub fn starting_at(epoch_ms: u64) -> Self {
        Self {
            epoch_ms,
            origin: Instant::now(),
        }
    }

    pub fn now_ms(&self) -> u64 {
        let elapsed = u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.epoch_ms.saturating_add(elapsed)
    }

    /// Timer instant corresponding to the timestamp `at_ms`.
    pub fn instant_at(&self, at_ms: u64) -> Instant {
        self.origin + Duration::from_millis(at_ms.saturating_sub(self.epoch_ms))
    }
}
