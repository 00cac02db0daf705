//! Synchronization core handle and subsystem initialization.
//!
//! # Architecture
//!
//! ```text
//!  edge ──▶ trigger_isr ──▶ EdgeCapture ──┐
//!                          (debounce)     ├──▶ EventChannel ──▶ Correlator ──▶ OffsetSink
//!  edge ──▶ pps_isr ──────▶ EdgeCapture ──┘
//! ```
//!
//! [`SyncCore`] owns everything the two ISRs and the correlator share. `init`
//! leaks one per call, so it lives for the rest of the process; a second
//! `init` builds a brand-new core and correlator, and nothing carries over.

use alloc::boxed::Box;

use crate::capture::EdgeCapture;
use crate::channel::{EventChannel, Signal};
use crate::clock::MonotonicClock;
use crate::config::SyncConfig;
use crate::correlator::Correlator;
use crate::error::SyncError;
use crate::event::{EventKind, TimeEvent};
use crate::hal::SyncHal;
use crate::isr;
use crate::logging::LogStream;
use crate::sink::OffsetSink;
use crate::stats::SyncStats;

/// `log` target for cold-path messages.
pub const LOG_TARGET: &str = "TRIGGER";

/// Shared state of one trigger/PPS channel pair.
pub struct SyncCore<S, C> {
    capture: EdgeCapture,
    channel: EventChannel<S>,
    clock: C,
    log: LogStream,
    stats: SyncStats,
}

impl<S: Signal, C: MonotonicClock> SyncCore<S, C> {
    /// Allocate the channel and log ring.
    pub fn try_new(config: &SyncConfig, signal: S, clock: C) -> Result<Self, SyncError> {
        let channel = EventChannel::try_with_capacity(config.channel_depth, signal)
            .map_err(|_| SyncError::ChannelCreate)?;
        let log =
            LogStream::try_with_capacity(config.log_depth).map_err(|_| SyncError::ChannelCreate)?;

        Ok(Self {
            capture: EdgeCapture::new(config.debounce_us),
            channel,
            clock,
            log,
            stats: SyncStats::new(),
        })
    }

    /// Trigger ISR body: stamp, debounce, offer.
    #[inline]
    pub fn on_trigger_edge(&self) {
        let now_us = self.clock.now_us();
        match self.capture.admit_trigger(now_us) {
            Some(event) => {
                self.stats.trigger_admitted();
                self.offer(event);
            }
            None => self.stats.trigger_rejected(),
        }
    }

    /// PPS ISR body: stamp, offer.
    #[inline]
    pub fn on_pps_edge(&self) {
        let event = self.capture.admit_pps(self.clock.now_us());
        self.stats.pps_admitted();
        self.offer(event);
    }

    /// Non-blocking send; a full channel drops the event silently.
    #[inline]
    fn offer(&self, event: TimeEvent) {
        if self.channel.try_send(event).is_err() {
            self.stats.event_dropped();
        }
    }

    /// Correlator bound to this core's log.
    pub fn correlator(&self) -> Correlator<'_> {
        Correlator::new(&self.log)
    }

    #[inline]
    pub fn capture(&self) -> &EdgeCapture {
        &self.capture
    }

    #[inline]
    pub fn channel(&self) -> &EventChannel<S> {
        &self.channel
    }

    #[inline]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    #[inline]
    pub fn log(&self) -> &LogStream {
        &self.log
    }

    #[inline]
    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }
}

fn log_failure(err: SyncError) -> SyncError {
    log::error!(target: LOG_TARGET, "trigger/PPS init failed: {}", err);
    err
}

/// Bring up the trigger/PPS subsystem.
///
/// Steps, in order, each aborting on failure with no rollback:
/// 1. validate `config`
/// 2. configure both input lines
/// 3. create the event channel
/// 4. install the GPIO ISR service
/// 5. register the trigger and PPS handlers
/// 6. start the correlator task, publishing into `sink`
///
/// Returns the core so the caller can drain its log and read statistics.
///
/// # Memory
///
/// Every call leaks one `SyncCore`, event channel and log ring included.
/// Nothing stops the previous correlator task either, so on device it stays
/// parked with its full stack. Meant to run once per boot; each re-init adds
/// that cost again.
///
/// Failures are logged here; callers need not log them again.
pub fn init<H, P>(
    hal: &mut H,
    config: &SyncConfig,
    sink: P,
) -> Result<&'static SyncCore<H::Signal, H::Clock>, SyncError>
where
    H: SyncHal,
    P: OffsetSink + Send + 'static,
{
    log::info!(
        target: LOG_TARGET,
        "trigger/PPS sync init: trigger GPIO{}, PPS GPIO{}, debounce {} us",
        config.pins.trigger_pin,
        config.pins.pps_pin,
        config.debounce_us
    );

    config.validate().map_err(log_failure)?;
    hal.configure_inputs(&config.pins).map_err(log_failure)?;

    let core = SyncCore::try_new(config, hal.signal(), hal.clock()).map_err(log_failure)?;
    let core: &'static SyncCore<H::Signal, H::Clock> = Box::leak(Box::new(core));

    hal.install_isr_service().map_err(log_failure)?;

    let arg = isr::core_arg(core);
    for (kind, pin) in [
        (EventKind::Trigger, config.pins.trigger_pin),
        (EventKind::Pps, config.pins.pps_pin),
    ] {
        let handler = isr::handler_for::<H::Signal, H::Clock>(kind);
        hal.register_isr(kind, pin, handler, arg).map_err(log_failure)?;
    }

    hal.spawn_task(
        &config.task,
        Box::new(move || {
            core.correlator().run(core, &sink);
        }),
    )
    .map_err(log_failure)?;

    log::info!(target: LOG_TARGET, "trigger/PPS sync init complete");
    Ok(core)
}
