//! Event channel from the edge interrupts to the correlator task.
//!
//! # Architecture
//!
//! ```text
//! Trigger ISR ──try_send()──┐
//!                           ├──▶ EventChannel ──recv()──▶ Correlator
//! PPS ISR ──────try_send()──┘    (bounded, lock-free)      (parks here)
//! ```
//!
//! # Rules
//!
//! - Producers never block: on a full channel the offered event is dropped
//!   (drop newest) and handed back to the caller
//! - Events leave in the order they were admitted, across both producers
//! - The consumer parks on a [`Signal`] until a producer notifies it

use core::hint::spin_loop;
use core::sync::atomic::{AtomicBool, Ordering};

use crate::event::TimeEvent;
use crate::ring::{BoundedRing, RingError};

/// Default channel depth (events).
pub const DEFAULT_CHANNEL_DEPTH: usize = 10;

/// Consumer wake-up primitive.
///
/// `notify` is called from interrupt context after every successful send and
/// must not block. Notifications may coalesce: the consumer re-checks the
/// channel after every wake-up.
pub trait Signal: Sync {
    /// Bind the calling context as the one to wake. Called once by the
    /// consumer before it first parks.
    fn attach(&self) {}

    /// Wake the consumer (ISR-safe).
    fn notify(&self);

    /// Park until notified.
    fn wait(&self);
}

/// Busy-wait signal for hosts and tests.
///
/// The pending flag is sticky, so a notify that lands before `wait` is not lost.
pub struct SpinSignal {
    pending: AtomicBool,
}

impl SpinSignal {
    pub const fn new() -> Self {
        Self {
            pending: AtomicBool::new(false),
        }
    }
}

impl Default for SpinSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl Signal for SpinSignal {
    #[inline]
    fn notify(&self) {
        self.pending.store(true, Ordering::Release);
    }

    fn wait(&self) {
        while !self.pending.swap(false, Ordering::Acquire) {
            spin_loop();
        }
    }
}

/// Bounded channel of [`TimeEvent`]s.
pub struct EventChannel<S> {
    ring: BoundedRing<TimeEvent>,
    signal: S,
}

impl<S: Signal> EventChannel<S> {
    /// Create a channel holding at most `capacity` events.
    pub fn try_with_capacity(capacity: usize, signal: S) -> Result<Self, RingError> {
        Ok(Self {
            ring: BoundedRing::try_with_capacity(capacity)?,
            signal,
        })
    }

    /// Offer an event without blocking.
    ///
    /// Returns `Err(event)` if the channel is full; the event is not queued.
    ///
    /// # Timing
    ///
    /// O(1), lock-free. Safe to call from interrupt context.
    #[inline]
    pub fn try_send(&self, event: TimeEvent) -> Result<(), TimeEvent> {
        self.ring.push(event)?;
        self.signal.notify();
        Ok(())
    }

    /// Take the next event if one is queued.
    #[inline]
    pub fn try_recv(&self) -> Option<TimeEvent> {
        self.ring.pop()
    }

    /// Block until an event is available. No timeout.
    pub fn recv(&self) -> TimeEvent {
        loop {
            if let Some(event) = self.ring.pop() {
                return event;
            }
            self.signal.wait();
        }
    }

    /// Bind the calling context as the consumer to wake.
    #[inline]
    pub fn attach_consumer(&self) {
        self.signal.attach();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }
}
