//! Module: event
//!
//! Purpose: TimeEvent type carried from the edge interrupts to the correlator.
//! One event per admitted edge, stamped with the monotonic clock at ISR entry.
//!
//! Safety: Safe. No unsafe blocks. Copy types only.

/// Which input line produced an edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum EventKind {
    /// External trigger input (debounced).
    Trigger = 0,
    /// GPS pulse-per-second input (not debounced).
    Pps = 1,
}

impl EventKind {
    /// Short label used in diagnostics.
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Trigger => "TRIGGER",
            EventKind::Pps => "PPS",
        }
    }
}

/// A single admitted edge.
///
/// Produced in interrupt context, consumed exactly once by the correlator.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeEvent {
    /// Monotonic timestamp in microseconds, taken at ISR entry.
    pub timestamp_us: i64,
    /// Source line.
    pub kind: EventKind,
}

impl TimeEvent {
    /// Create a trigger event.
    #[inline]
    pub const fn trigger(timestamp_us: i64) -> Self {
        Self {
            timestamp_us,
            kind: EventKind::Trigger,
        }
    }

    /// Create a PPS event.
    #[inline]
    pub const fn pps(timestamp_us: i64) -> Self {
        Self {
            timestamp_us,
            kind: EventKind::Pps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_constructors() {
        let t = TimeEvent::trigger(1_000_000);
        assert_eq!(t.kind, EventKind::Trigger);
        assert_eq!(t.timestamp_us, 1_000_000);

        let p = TimeEvent::pps(1_050_000);
        assert_eq!(p.kind, EventKind::Pps);
        assert_eq!(p.kind.as_str(), "PPS");
    }
}
