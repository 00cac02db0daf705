//! Lock-free bounded ring buffer.
//!
//! Shared storage behind [`EventChannel`](crate::channel::EventChannel) and
//! [`LogStream`](crate::logging::LogStream).
//!
//! # Architecture
//!
//! ```text
//! Trigger ISR ──┐
//!               ├──▶ [S0][S1][S2]...[Sn-1] ──────▶ Correlator task
//! PPS ISR ──────┘     per-slot stamps
//! ```
//!
//! Every slot carries a sequence stamp. A producer claims the slot at `tail`
//! with a CAS, writes the value, then publishes it by storing `tail + 1` into
//! the stamp. The consumer does the mirror image on `head`.
//!
//! # Rules
//!
//! - Only atomic operations for synchronization
//! - A producer never waits on another context: a slot still owned by a
//!   reader is reported as full and the offered value is handed back
//! - The consumer never waits on a producer: a claimed but unpublished slot
//!   reads as empty
//! - Values are `Copy`; nothing is ever dropped in place

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::cell::UnsafeCell;
use core::mem::MaybeUninit;
use core::sync::atomic::{AtomicUsize, Ordering};

/// Ring creation errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RingError {
    /// Capacity must be at least 1.
    ZeroCapacity,
    /// Slot storage could not be allocated.
    OutOfMemory,
}

struct Slot<T> {
    /// `lap + index` when free for the producer of that position,
    /// `lap + index + 1` once the value is published.
    stamp: AtomicUsize,
    value: UnsafeCell<MaybeUninit<T>>,
}

/// Bounded multi-producer ring with FIFO ordering in claim order.
pub struct BoundedRing<T: Copy> {
    slots: Box<[Slot<T>]>,
    /// Smallest power of two greater than the capacity. Positions are
    /// encoded as `lap | index` so wrap-around of the counters is harmless.
    one_lap: usize,
    head: AtomicUsize,
    tail: AtomicUsize,
}

// SAFETY: Slot ownership is transferred through the stamp protocol; a value is
// only written by the producer that won the tail CAS and only read by the
// consumer that won the head CAS.
unsafe impl<T: Copy + Send> Sync for BoundedRing<T> {}
unsafe impl<T: Copy + Send> Send for BoundedRing<T> {}

impl<T: Copy> BoundedRing<T> {
    /// Allocate a ring holding at most `capacity` values.
    pub fn try_with_capacity(capacity: usize) -> Result<Self, RingError> {
        if capacity == 0 {
            return Err(RingError::ZeroCapacity);
        }

        let mut slots = Vec::new();
        slots
            .try_reserve_exact(capacity)
            .map_err(|_| RingError::OutOfMemory)?;
        for i in 0..capacity {
            slots.push(Slot {
                stamp: AtomicUsize::new(i),
                value: UnsafeCell::new(MaybeUninit::uninit()),
            });
        }

        Ok(Self {
            slots: slots.into_boxed_slice(),
            one_lap: (capacity + 1).next_power_of_two(),
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
        })
    }

    /// Offer a value.
    ///
    /// Returns the value back if the ring is full. Never blocks and never
    /// spins on a slot owned by another context, so it is safe from an ISR.
    #[inline]
    pub fn push(&self, value: T) -> Result<(), T> {
        let capacity = self.slots.len();
        let mut tail = self.tail.load(Ordering::Relaxed);

        loop {
            let index = tail & (self.one_lap - 1);
            let lap = tail & !(self.one_lap - 1);
            let slot = &self.slots[index];
            let stamp = slot.stamp.load(Ordering::Acquire);

            if tail == stamp {
                let new_tail = if index + 1 < capacity {
                    tail + 1
                } else {
                    lap.wrapping_add(self.one_lap)
                };

                match self.tail.compare_exchange_weak(
                    tail,
                    new_tail,
                    Ordering::SeqCst,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        // SAFETY: Winning the CAS gives exclusive write access to this slot
                        // until the stamp is published.
                        unsafe {
                            (*slot.value.get()).write(value);
                        }
                        slot.stamp.store(tail + 1, Ordering::Release);
                        return Ok(());
                    }
                    Err(current) => tail = current,
                }
            } else if stamp.wrapping_add(self.one_lap) == tail + 1 {
                // Slot still holds the previous lap's value (or a pop is in flight).
                return Err(value);
            } else {
                // Another producer already claimed this position.
                tail = self.tail.load(Ordering::Relaxed);
            }
        }
    }

    /// Take the oldest published value, if any.
    #[inline]
    pub fn pop(&self) -> Option<T> {
        let capacity = self.slots.len();
        let mut head = self.head.load(Ordering::Relaxed);

        loop {
            let index = head & (self.one_lap - 1);
            let lap = head & !(self.one_lap - 1);
            let slot = &self.slots[index];
            let stamp = slot.stamp.load(Ordering::Acquire);

            if head + 1 == stamp {
                let new_head = if index + 1 < capacity {
                    head + 1
                } else {
                    lap.wrapping_add(self.one_lap)
                };

                match self.head.compare_exchange_weak(
                    head,
                    new_head,
                    Ordering::SeqCst,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        // SAFETY: Stamp == head + 1 means the producer published this slot,
                        // and winning the CAS makes us its only reader.
                        let value = unsafe { (*slot.value.get()).assume_init_read() };
                        slot.stamp
                            .store(head.wrapping_add(self.one_lap), Ordering::Release);
                        return Some(value);
                    }
                    Err(current) => head = current,
                }
            } else if stamp == head {
                // Empty, or claimed by a producer that has not published yet.
                return None;
            } else {
                head = self.head.load(Ordering::Relaxed);
            }
        }
    }

    /// Number of values currently held.
    pub fn len(&self) -> usize {
        let capacity = self.slots.len();
        loop {
            let tail = self.tail.load(Ordering::SeqCst);
            let head = self.head.load(Ordering::SeqCst);

            if self.tail.load(Ordering::SeqCst) == tail {
                let hix = head & (self.one_lap - 1);
                let tix = tail & (self.one_lap - 1);

                return if hix < tix {
                    tix - hix
                } else if hix > tix {
                    capacity - hix + tix
                } else if tail == head {
                    0
                } else {
                    capacity
                };
            }
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len() == self.slots.len()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}
