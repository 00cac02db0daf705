//! Offset sink: where computed trigger→PPS offsets go.
//!
//! Publication is fire-and-forget and last-value-wins. The sink never pushes
//! back on the correlator.

use alloc::sync::Arc;
use core::sync::atomic::{AtomicU32, Ordering};

use portable_atomic::AtomicI64;

/// Receiver of computed offsets.
pub trait OffsetSink {
    /// Called at most once per admitted PPS that pairs with a fresh trigger.
    fn publish_offset(&self, offset_us: i64);
}

impl<T: OffsetSink + ?Sized> OffsetSink for &T {
    #[inline]
    fn publish_offset(&self, offset_us: i64) {
        (**self).publish_offset(offset_us)
    }
}

impl<T: OffsetSink + ?Sized> OffsetSink for Arc<T> {
    #[inline]
    fn publish_offset(&self, offset_us: i64) {
        (**self).publish_offset(offset_us)
    }
}

/// Adapts a closure into a sink.
///
/// ```ignore
/// let sink = FnSink(|offset_us| ble_notify(offset_us));
/// ```
pub struct FnSink<F>(pub F);

impl<F: Fn(i64)> OffsetSink for FnSink<F> {
    #[inline]
    fn publish_offset(&self, offset_us: i64) {
        (self.0)(offset_us)
    }
}

/// Lock-free last-value-wins offset cell.
///
/// Written by the correlator, polled by whoever exposes the value
/// (e.g. a BLE read characteristic).
pub struct LatestOffset {
    offset_us: AtomicI64,
    /// Publications since boot. 0 means `offset_us` was never written.
    count: AtomicU32,
}

impl LatestOffset {
    pub const fn new() -> Self {
        Self {
            offset_us: AtomicI64::new(0),
            count: AtomicU32::new(0),
        }
    }

    /// Most recent offset, or `None` before the first publication.
    #[inline]
    pub fn get(&self) -> Option<i64> {
        if self.count.load(Ordering::Acquire) == 0 {
            return None;
        }
        Some(self.offset_us.load(Ordering::Acquire))
    }

    /// Number of offsets published so far.
    #[inline]
    pub fn count(&self) -> u32 {
        self.count.load(Ordering::Acquire)
    }
}

impl Default for LatestOffset {
    fn default() -> Self {
        Self::new()
    }
}

impl OffsetSink for LatestOffset {
    #[inline]
    fn publish_offset(&self, offset_us: i64) {
        self.offset_us.store(offset_us, Ordering::Release);
        self.count.fetch_add(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_offset_empty() {
        let sink = LatestOffset::new();
        assert_eq!(sink.get(), None);
        assert_eq!(sink.count(), 0);
    }

    #[test]
    fn test_latest_offset_last_value_wins() {
        let sink = LatestOffset::new();
        sink.publish_offset(50_000);
        sink.publish_offset(-1_200);

        assert_eq!(sink.get(), Some(-1_200));
        assert_eq!(sink.count(), 2);
    }

    #[test]
    fn test_sink_through_reference_and_arc() {
        let sink = Arc::new(LatestOffset::new());
        let by_ref: &LatestOffset = &sink;
        by_ref.publish_offset(1);
        OffsetSink::publish_offset(&sink, 2);

        assert_eq!(sink.get(), Some(2));
    }

    #[test]
    fn test_fn_sink() {
        let seen = core::cell::Cell::new(0);
        let sink = FnSink(|offset_us| seen.set(offset_us));
        sink.publish_offset(80_000);
        assert_eq!(seen.get(), 80_000);
    }
}
