//! Edge capture: admission policy for the two interrupt lines.
//!
//! Runs in interrupt context. Bounded, non-blocking, non-allocating.
//!
//! - Trigger: debounced. An edge closer than the threshold to the last
//!   *admitted* trigger is discarded, and the debounce clock is left alone.
//! - PPS: admitted unconditionally; a GPS pulse train is assumed clean.
//!
//! The debounce clock has a single writer (the trigger ISR). A plain
//! load-compare-store is enough: the worst a re-entrant edge can do is admit
//! one extra bounce, never corrupt the value.

use portable_atomic::{AtomicI64, Ordering};

use crate::event::TimeEvent;

/// Default trigger debounce window (10 ms).
pub const DEBOUNCE_THRESHOLD_US: i64 = 10_000;

/// Debounce clock value before the first admitted trigger.
///
/// The original firmware started this clock at 0, which discarded any trigger
/// within the first window after the clock origin. Starting at "never" admits
/// the first trigger whenever it arrives.
const NEVER: i64 = i64::MIN;

/// Per-line admission state.
pub struct EdgeCapture {
    /// Minimum spacing between admitted triggers.
    debounce_us: AtomicI64,
    /// `last_trigger_interrupt_time_us`: time of the last admitted trigger.
    last_trigger_us: AtomicI64,
}

impl EdgeCapture {
    pub const fn new(debounce_us: i64) -> Self {
        Self {
            debounce_us: AtomicI64::new(debounce_us),
            last_trigger_us: AtomicI64::new(NEVER),
        }
    }

    /// Apply the debounce filter to a trigger edge seen at `now_us`.
    ///
    /// Returns the event to enqueue, or `None` if the edge is a bounce.
    #[inline]
    pub fn admit_trigger(&self, now_us: i64) -> Option<TimeEvent> {
        let last = self.last_trigger_us.load(Ordering::Acquire);
        let delta = now_us.saturating_sub(last);

        if delta < self.debounce_us.load(Ordering::Relaxed) {
            return None;
        }

        self.last_trigger_us.store(now_us, Ordering::Release);
        Some(TimeEvent::trigger(now_us))
    }

    /// Stamp a PPS edge seen at `now_us`.
    #[inline]
    pub fn admit_pps(&self, now_us: i64) -> TimeEvent {
        TimeEvent::pps(now_us)
    }

    /// Current debounce window.
    #[inline]
    pub fn debounce_us(&self) -> i64 {
        self.debounce_us.load(Ordering::Relaxed)
    }

    /// Change the debounce window. Takes effect on the next trigger edge.
    #[inline]
    pub fn set_debounce_us(&self, debounce_us: i64) {
        self.debounce_us.store(debounce_us.max(0), Ordering::Relaxed);
    }

    /// Timestamp of the last admitted trigger, if any.
    #[inline]
    pub fn last_trigger_us(&self) -> Option<i64> {
        match self.last_trigger_us.load(Ordering::Acquire) {
            NEVER => None,
            t => Some(t),
        }
    }
}

impl Default for EdgeCapture {
    fn default() -> Self {
        Self::new(DEBOUNCE_THRESHOLD_US)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_trigger_always_admitted() {
        let capture = EdgeCapture::default();
        assert_eq!(capture.last_trigger_us(), None);

        // Even right after boot, inside what would be the first window
        assert_eq!(capture.admit_trigger(5), Some(TimeEvent::trigger(5)));
        assert_eq!(capture.last_trigger_us(), Some(5));
    }

    #[test]
    fn test_window_boundary_is_admitted() {
        let capture = EdgeCapture::default();
        capture.admit_trigger(100_000).unwrap();

        assert!(capture.admit_trigger(100_000 + DEBOUNCE_THRESHOLD_US - 1).is_none());
        assert!(capture.admit_trigger(100_000 + DEBOUNCE_THRESHOLD_US).is_some());
    }

    #[test]
    fn test_chatter_does_not_extend_window() {
        let capture = EdgeCapture::default();
        capture.admit_trigger(0).unwrap();

        // Bounces every 4 ms: rejected, and the window stays anchored at 0
        assert!(capture.admit_trigger(4_000).is_none());
        assert!(capture.admit_trigger(8_000).is_none());
        assert!(capture.admit_trigger(12_000).is_some());
    }

    #[test]
    fn test_backwards_time_is_rejected() {
        let capture = EdgeCapture::default();
        capture.admit_trigger(50_000).unwrap();
        assert!(capture.admit_trigger(40_000).is_none());
        assert_eq!(capture.last_trigger_us(), Some(50_000));
    }

    #[test]
    fn test_runtime_debounce_change() {
        let capture = EdgeCapture::default();
        capture.set_debounce_us(1_000);
        capture.admit_trigger(0).unwrap();
        assert!(capture.admit_trigger(1_500).is_some());

        capture.set_debounce_us(-5);
        assert_eq!(capture.debounce_us(), 0);
    }

    #[test]
    fn test_pps_never_filtered() {
        let capture = EdgeCapture::default();
        assert_eq!(capture.admit_pps(10), TimeEvent::pps(10));
        assert_eq!(capture.admit_pps(11), TimeEvent::pps(11));
    }
}
