//! Interrupt entry points.
//!
//! The GPIO ISR service calls plain `extern "C"` functions with one opaque
//! argument. Both trampolines receive the address of the `'static`
//! [`SyncCore`] that `init` registered, so there is no file-scope state.

use core::ffi::c_void;

use crate::channel::Signal;
use crate::clock::MonotonicClock;
use crate::event::EventKind;
use crate::sync::SyncCore;

/// GPIO ISR handler signature (`gpio_isr_t`).
pub type IsrHandler = unsafe extern "C" fn(arg: *mut c_void);

/// Trigger line ISR.
///
/// # Safety
///
/// `arg` must come from [`core_arg`] for a `SyncCore<S, C>` of exactly these
/// type parameters.
pub unsafe extern "C" fn trigger_isr<S: Signal, C: MonotonicClock>(arg: *mut c_void) {
    // SAFETY: Caller contract; the core is 'static and only shared-borrowed.
    let core = unsafe { &*(arg as *const SyncCore<S, C>) };
    core.on_trigger_edge();
}

/// PPS line ISR.
///
/// # Safety
///
/// Same contract as [`trigger_isr`].
pub unsafe extern "C" fn pps_isr<S: Signal, C: MonotonicClock>(arg: *mut c_void) {
    // SAFETY: Caller contract; the core is 'static and only shared-borrowed.
    let core = unsafe { &*(arg as *const SyncCore<S, C>) };
    core.on_pps_edge();
}

/// Trampoline for a line.
pub fn handler_for<S: Signal, C: MonotonicClock>(kind: EventKind) -> IsrHandler {
    match kind {
        EventKind::Trigger => trigger_isr::<S, C> as IsrHandler,
        EventKind::Pps => pps_isr::<S, C> as IsrHandler,
    }
}

/// Opaque ISR argument for `core`.
#[inline]
pub fn core_arg<S, C>(core: &'static SyncCore<S, C>) -> *mut c_void {
    core as *const SyncCore<S, C> as *mut c_void
}
