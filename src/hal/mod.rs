//! Hardware Abstraction Layer for the trigger/PPS subsystem.
//!
//! Thin seam around the platform steps `init` performs. Business logic stays
//! in the core modules; the HAL is just I/O and RTOS plumbing.

use alloc::boxed::Box;
use core::ffi::c_void;

use crate::channel::Signal;
use crate::clock::MonotonicClock;
use crate::config::{PinConfig, TaskConfig};
use crate::error::SyncError;
use crate::event::EventKind;
use crate::isr::IsrHandler;

#[cfg(target_os = "espidf")]
pub mod esp;

/// Body of the correlator task. Never expected to return.
pub type TaskBody = Box<dyn FnOnce() + Send + 'static>;

/// Platform operations used during initialization.
pub trait SyncHal {
    /// Consumer wake-up primitive.
    type Signal: Signal + Send + 'static;
    /// Monotonic microsecond clock, readable from ISRs.
    type Clock: MonotonicClock + Send + Sync + 'static;

    fn signal(&mut self) -> Self::Signal;

    fn clock(&mut self) -> Self::Clock;

    /// Inputs, pull-down, rising-edge interrupt on both lines.
    fn configure_inputs(&mut self, pins: &PinConfig) -> Result<(), SyncError>;

    /// Install the shared GPIO ISR service. Already installed counts as success.
    fn install_isr_service(&mut self) -> Result<(), SyncError>;

    /// Attach `handler(arg)` to the rising edge of `pin`.
    fn register_isr(
        &mut self,
        kind: EventKind,
        pin: i32,
        handler: IsrHandler,
        arg: *mut c_void,
    ) -> Result<(), SyncError>;

    /// Start the correlator task.
    fn spawn_task(&mut self, task: &TaskConfig, body: TaskBody) -> Result<(), SyncError>;
}
