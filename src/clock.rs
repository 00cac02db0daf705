//! Monotonic microsecond time source.
//!
//! On device this is `esp_timer_get_time()`; [`ManualClock`] lets tests and
//! host tools decide what "now" is.

use portable_atomic::{AtomicI64, Ordering};

/// Monotonic microsecond clock, readable from interrupt context.
pub trait MonotonicClock {
    /// Microseconds since an arbitrary fixed origin. Never decreases.
    fn now_us(&self) -> i64;
}

/// Clock whose value is set explicitly.
pub struct ManualClock {
    now_us: AtomicI64,
}

impl ManualClock {
    pub const fn new(start_us: i64) -> Self {
        Self {
            now_us: AtomicI64::new(start_us),
        }
    }

    /// Jump to an absolute time.
    #[inline]
    pub fn set(&self, now_us: i64) {
        self.now_us.store(now_us, Ordering::Release);
    }

    /// Move forward by `delta_us`.
    #[inline]
    pub fn advance(&self, delta_us: i64) {
        self.now_us.fetch_add(delta_us, Ordering::AcqRel);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(0)
    }
}

impl MonotonicClock for ManualClock {
    #[inline]
    fn now_us(&self) -> i64 {
        self.now_us.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(1_000);
        assert_eq!(clock.now_us(), 1_000);
        clock.advance(500);
        assert_eq!(clock.now_us(), 1_500);
        clock.set(2_000_000);
        assert_eq!(clock.now_us(), 2_000_000);
    }
}
