//! Counters for the trigger/PPS path.
//!
//! Drops and debounce rejections are never escalated as errors; they are
//! counted here so the absence of an offset can be explained after the fact.
//! All counters are relaxed atomics, bumped from ISR and task context alike.

use core::sync::atomic::{AtomicU32, Ordering};

use crate::correlator::Outcome;

/// Thread- and ISR-safe counters.
///
/// # Usage
///
/// ```ignore
/// let snap = core.stats().snapshot();
/// if snap.events_dropped > 0 {
///     log::warn!("{} edges lost to a full channel", snap.events_dropped);
/// }
/// ```
pub struct SyncStats {
    triggers_admitted: AtomicU32,
    triggers_rejected: AtomicU32,
    pps_admitted: AtomicU32,
    events_dropped: AtomicU32,
    offsets_published: AtomicU32,
    pps_skipped: AtomicU32,
}

impl SyncStats {
    pub const fn new() -> Self {
        Self {
            triggers_admitted: AtomicU32::new(0),
            triggers_rejected: AtomicU32::new(0),
            pps_admitted: AtomicU32::new(0),
            events_dropped: AtomicU32::new(0),
            offsets_published: AtomicU32::new(0),
            pps_skipped: AtomicU32::new(0),
        }
    }

    #[inline]
    pub fn trigger_admitted(&self) {
        self.triggers_admitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Trigger edge discarded by the debounce window.
    #[inline]
    pub fn trigger_rejected(&self) {
        self.triggers_rejected.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn pps_admitted(&self) {
        self.pps_admitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Admitted event lost to a full channel.
    #[inline]
    pub fn event_dropped(&self) {
        self.events_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Account for one correlator step.
    #[inline]
    pub fn record(&self, outcome: Outcome) {
        match outcome {
            Outcome::TriggerRecorded => {}
            Outcome::Published(_) => {
                self.offsets_published.fetch_add(1, Ordering::Relaxed);
            }
            Outcome::Skipped => {
                self.pps_skipped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Get a snapshot of all counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            triggers_admitted: self.triggers_admitted.load(Ordering::Relaxed),
            triggers_rejected: self.triggers_rejected.load(Ordering::Relaxed),
            pps_admitted: self.pps_admitted.load(Ordering::Relaxed),
            events_dropped: self.events_dropped.load(Ordering::Relaxed),
            offsets_published: self.offsets_published.load(Ordering::Relaxed),
            pps_skipped: self.pps_skipped.load(Ordering::Relaxed),
        }
    }
}

impl Default for SyncStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of the counters at a point in time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub triggers_admitted: u32,
    pub triggers_rejected: u32,
    pub pps_admitted: u32,
    pub events_dropped: u32,
    pub offsets_published: u32,
    pub pps_skipped: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_start_at_zero() {
        let stats = SyncStats::new();
        assert_eq!(stats.snapshot(), StatsSnapshot::default());
    }

    #[test]
    fn test_stats_record_outcomes() {
        let stats = SyncStats::new();

        stats.trigger_admitted();
        stats.trigger_rejected();
        stats.trigger_rejected();
        stats.pps_admitted();
        stats.event_dropped();
        stats.record(Outcome::TriggerRecorded);
        stats.record(Outcome::Published(50_000));
        stats.record(Outcome::Skipped);

        let snap = stats.snapshot();
        assert_eq!(snap.triggers_admitted, 1);
        assert_eq!(snap.triggers_rejected, 2);
        assert_eq!(snap.pps_admitted, 1);
        assert_eq!(snap.events_dropped, 1);
        assert_eq!(snap.offsets_published, 1);
        assert_eq!(snap.pps_skipped, 1);
    }
}
