//! Monotonic elapsed-time source
//!
//! Engine session timestamps are elapsed-realtime milliseconds, so ages must
//! be measured against the same clock.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::OnceLock;
use std::time::Instant;

pub trait Clock: Send + Sync {
    /// Milliseconds elapsed since an arbitrary, fixed origin
    fn elapsed_realtime_millis(&self) -> i64;
}

/// Process-wide monotonic clock starting at first use
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn elapsed_realtime_millis(&self) -> i64 {
        static ORIGIN: OnceLock<Instant> = OnceLock::new();
        let origin = ORIGIN.get_or_init(Instant::now);
        i64::try_from(origin.elapsed().as_millis()).unwrap_or(i64::MAX)
    }
}

/// A clock that only moves when told to
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicI64,
}

impl ManualClock {
    pub fn new(millis: i64) -> Self {
        Self {
            millis: AtomicI64::new(millis),
        }
    }

    pub fn set(&self, millis: i64) {
        self.millis.store(millis, Ordering::SeqCst);
    }

    pub fn advance(&self, millis: i64) {
        self.millis.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn elapsed_realtime_millis(&self) -> i64 {
        self.millis.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_is_monotonic() {
        let clock = SystemClock;
        let first = clock.elapsed_realtime_millis();
        let second = clock.elapsed_realtime_millis();
        assert!(second >= first);
    }

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(5_000);
        clock.advance(2);
        assert_eq!(clock.elapsed_realtime_millis(), 5_002);

        clock.set(10);
        assert_eq!(clock.elapsed_realtime_millis(), 10);
    }
}
