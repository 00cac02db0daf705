//! # trigger-pps-sync
//!
//! Measures the offset between an external trigger edge and the next GPS
//! pulse-per-second edge.
//!
//! ## Architecture
//!
//! Two interrupt lines feed one bounded channel; one task consumes it:
//! - ISRs timestamp, debounce and enqueue, never block, never allocate
//! - The correlator owns all pairing state, so nothing else needs a lock
//! - Offsets go to an [`OffsetSink`], diagnostics to a [`LogStream`]
//!
//! ```text
//! GPIO7 (trigger) ─▶ ISR ─┐
//!                         ├─▶ EventChannel ─▶ Correlator ─▶ OffsetSink
//! GPIO10 (PPS) ───▶ ISR ──┘
//! ```

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod capture;
pub mod channel;
pub mod clock;
pub mod config;
pub mod correlator;
pub mod error;
pub mod event;
pub mod hal;
pub mod isr;
pub mod log_drain;
pub mod logging;
pub mod ring;
pub mod sink;
pub mod stats;
pub mod sync;

pub use capture::{EdgeCapture, DEBOUNCE_THRESHOLD_US};
pub use channel::{EventChannel, Signal, SpinSignal};
pub use clock::{ManualClock, MonotonicClock};
pub use config::SyncConfig;
pub use correlator::{CorrelationState, Correlator, Outcome};
pub use error::SyncError;
pub use event::{EventKind, TimeEvent};
pub use hal::SyncHal;
pub use log_drain::LogDrain;
pub use logging::LogStream;
pub use sink::{FnSink, LatestOffset, OffsetSink};
pub use stats::{StatsSnapshot, SyncStats};
pub use sync::{init, SyncCore};
