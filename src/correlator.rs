//! Trigger/PPS correlator.
//!
//! The only reader and writer of [`CorrelationState`]. Runs as a dedicated
//! task that parks on the event channel; nothing in interrupt context ever
//! touches the state, so it needs no lock.
//!
//! # State machine
//!
//! ```text
//!            ┌──────── Trigger: last_trigger := ts ───────┐
//!            ▼                                            │
//!  ──▶ [ Idle: recv() ] ──────────────────────────────────┤
//!            ▲                                            │
//!            └─ PPS: publish ts - last_trigger if fresh, ─┘
//!                    then last_pps := ts
//! ```
//!
//! A trigger is *fresh* when it arrived after the previous PPS
//! (`last_trigger_time_us > last_pps_time_us`). A stale trigger is never
//! paired twice.

use crate::channel::Signal;
use crate::clock::MonotonicClock;
use crate::event::{EventKind, TimeEvent};
use crate::logging::LogStream;
use crate::sink::OffsetSink;
use crate::sync::SyncCore;
use crate::{rt_info, rt_warn};

/// Last-seen timestamps, owned by the correlator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CorrelationState {
    pub last_trigger_time_us: i64,
    pub last_pps_time_us: i64,
}

impl CorrelationState {
    pub const INITIAL: Self = Self {
        last_trigger_time_us: 0,
        last_pps_time_us: 0,
    };

    /// A trigger arrived since the previous PPS was processed.
    #[inline]
    pub fn has_fresh_trigger(&self) -> bool {
        self.last_trigger_time_us > self.last_pps_time_us
    }
}

/// What one event did to the state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Trigger timestamp stored.
    TriggerRecorded,
    /// PPS paired with a fresh trigger; offset published.
    Published(i64),
    /// PPS with no trigger since the last PPS; nothing published.
    Skipped,
}

/// Correlator with its private state and diagnostic log.
pub struct Correlator<'a> {
    state: CorrelationState,
    log: &'a LogStream,
}

impl<'a> Correlator<'a> {
    /// Fresh correlator: no trigger, no PPS seen.
    pub fn new(log: &'a LogStream) -> Self {
        Self {
            state: CorrelationState::INITIAL,
            log,
        }
    }

    #[inline]
    pub fn state(&self) -> CorrelationState {
        self.state
    }

    /// Apply one event.
    ///
    /// Publishes to `sink` at most once, and only for a PPS that pairs with a
    /// fresh trigger. Cannot fail.
    pub fn handle<P: OffsetSink + ?Sized>(&mut self, event: TimeEvent, sink: &P) -> Outcome {
        let ts = event.timestamp_us;

        match event.kind {
            EventKind::Trigger => {
                self.state.last_trigger_time_us = ts;
                rt_info!(self.log, ts, "trigger at {} us", ts);
                Outcome::TriggerRecorded
            }
            EventKind::Pps => {
                rt_info!(self.log, ts, "PPS at {} us", ts);

                let outcome = if self.state.has_fresh_trigger() {
                    let offset_us = ts - self.state.last_trigger_time_us;
                    sink.publish_offset(offset_us);
                    rt_warn!(
                        self.log,
                        ts,
                        "===== OFFSET {} us (trigger {} us) =====",
                        offset_us,
                        self.state.last_trigger_time_us
                    );
                    Outcome::Published(offset_us)
                } else {
                    rt_info!(self.log, ts, "no trigger since last PPS, skipping");
                    Outcome::Skipped
                };

                self.state.last_pps_time_us = ts;
                outcome
            }
        }
    }

    /// Process everything currently queued in `core`, without blocking.
    ///
    /// Returns the number of events handled.
    pub fn drain<S, C, P>(&mut self, core: &SyncCore<S, C>, sink: &P) -> usize
    where
        S: Signal,
        C: MonotonicClock,
        P: OffsetSink + ?Sized,
    {
        let mut handled = 0;
        while let Some(event) = core.channel().try_recv() {
            core.stats().record(self.handle(event, sink));
            handled += 1;
        }
        handled
    }

    /// Task body: park on the channel forever.
    pub fn run<S, C, P>(mut self, core: &SyncCore<S, C>, sink: &P) -> !
    where
        S: Signal,
        C: MonotonicClock,
        P: OffsetSink + ?Sized,
    {
        core.channel().attach_consumer();
        rt_info!(self.log, core.clock().now_us(), "correlator started, waiting for events");

        loop {
            let event = core.channel().recv();
            core.stats().record(self.handle(event, sink));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogLevel;
    use crate::sink::LatestOffset;

    fn log() -> LogStream {
        LogStream::try_with_capacity(32).unwrap()
    }

    #[test]
    fn test_trigger_then_pps_publishes() {
        let log = log();
        let sink = LatestOffset::new();
        let mut correlator = Correlator::new(&log);

        assert_eq!(
            correlator.handle(TimeEvent::trigger(1_000_000), &sink),
            Outcome::TriggerRecorded
        );
        assert_eq!(
            correlator.handle(TimeEvent::pps(1_050_000), &sink),
            Outcome::Published(50_000)
        );
        assert_eq!(sink.get(), Some(50_000));
    }

    #[test]
    fn test_pps_without_trigger_skips_but_advances() {
        let log = log();
        let sink = LatestOffset::new();
        let mut correlator = Correlator::new(&log);

        assert_eq!(correlator.handle(TimeEvent::pps(3_000_000), &sink), Outcome::Skipped);
        assert_eq!(correlator.state().last_pps_time_us, 3_000_000);
        assert_eq!(sink.count(), 0);
    }

    #[test]
    fn test_trigger_is_paired_once() {
        let log = log();
        let sink = LatestOffset::new();
        let mut correlator = Correlator::new(&log);

        correlator.handle(TimeEvent::trigger(10), &sink);
        correlator.handle(TimeEvent::pps(20), &sink);
        assert_eq!(correlator.handle(TimeEvent::pps(30), &sink), Outcome::Skipped);
        assert_eq!(sink.count(), 1);
    }

    #[test]
    fn test_diagnostic_lines() {
        let log = log();
        let sink = LatestOffset::new();
        let mut correlator = Correlator::new(&log);

        correlator.handle(TimeEvent::trigger(1_000_000), &sink);
        correlator.handle(TimeEvent::pps(1_050_000), &sink);

        let lines: Vec<(LogLevel, String)> = core::iter::from_fn(|| log.drain())
            .map(|e| (e.level, e.message_str().to_string()))
            .collect();

        assert_eq!(lines[0], (LogLevel::Info, "trigger at 1000000 us".to_string()));
        assert_eq!(lines[1], (LogLevel::Info, "PPS at 1050000 us".to_string()));
        assert_eq!(lines[2].0, LogLevel::Warn);
        assert!(lines[2].1.contains("OFFSET 50000 us"));
    }

    #[test]
    fn test_skip_line_visible_at_info() {
        let log = log();
        let sink = LatestOffset::new();
        let mut correlator = Correlator::new(&log);

        correlator.handle(TimeEvent::pps(3_000_000), &sink);

        let skip = core::iter::from_fn(|| log.drain()).last().unwrap();
        assert_eq!(skip.level, LogLevel::Info);
        assert_eq!(skip.message_str(), "no trigger since last PPS, skipping");
    }
}
