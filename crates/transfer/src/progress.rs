use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

/// Rate limit for progress notifications.
///
/// Grants at most one emission per `interval`, measured from the previous
/// grant (or from construction for the first one).
#[derive(Debug)]
pub struct ProgressThrottle {
    interval: Duration,
    last: Mutex<Instant>,
}

impl ProgressThrottle {
    /// Creates a throttle; the clock starts now.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Mutex::new(Instant::now()),
        }
    }

    /// Minimum gap between two grants.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns `true` and restarts the clock if at least `interval` has
    /// elapsed since the last grant.
    pub fn try_acquire(&self) -> bool {
        let now = Instant::now();
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        if now.duration_since(*last) >= self.interval {
            *last = now;
            true
        } else {
            false
        }
    }
}
