//! Wall-clock measurement of bounded code regions.

use std::time::{Duration, Instant};

/// A start/end pair taken from the monotonic clock.
#[derive(Debug, Clone, Copy)]
pub struct TimingInterval {
    pub start: Instant,
    pub end: Instant,
}

impl TimingInterval {
    /// Never negative, even if the pair was built out of order.
    pub fn elapsed(&self) -> Duration {
        self.end.saturating_duration_since(self.start)
    }
}

/// Run `f` and return its result along with the interval it took.
pub fn timed<T>(f: impl FnOnce() -> T) -> (T, TimingInterval) {
    let start = Instant::now();
    let value = f();
    let end = Instant::now();
    (value, TimingInterval { start, end })
}

/// Fallible variant of [`timed`]: the interval is only returned on success.
pub fn try_timed<T, E>(f: impl FnOnce() -> Result<T, E>) -> Result<(T, TimingInterval), E> {
    let (value, interval) = timed(f);
    value.map(|v| (v, interval))
}
