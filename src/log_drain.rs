//! Log drain: forwards [`LogStream`] entries to the `log` facade.
//!
//! The correlator task only ever pushes into its fixed-size ring. Something
//! with time to spare (the main task on device, the test thread on host)
//! calls [`LogDrain::poll`] and pays for the blocking console write.
//!
//! ```text
//! LogStream ──drain()──▶ LogDrain::poll ──▶ log::log!(target: "TRIGGER")
//!                              │
//!                              └── every 10 s: "dropped N log lines"
//! ```

use crate::logging::{LogEntry, LogLevel, LogStream};
use crate::sync::LOG_TARGET;

/// Interval between dropped-line reports.
pub const DROPPED_REPORT_INTERVAL_US: i64 = 10_000_000;

/// Scratch size for one formatted line.
pub const FORMAT_BUF_LEN: usize = 128;

impl From<LogLevel> for log::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Trace => log::Level::Trace,
        }
    }
}

/// Format log entry to string.
///
/// Format: `[timestamp_us] message`. The level travels separately as the
/// `log::Level` of the record.
pub fn format_log_entry(entry: &LogEntry, buf: &mut [u8]) -> usize {
    crate::logging::format_to_buffer(
        buf,
        format_args!("[{:10}] {}", entry.timestamp_us, entry.message_str()),
    )
}

/// Drain state (remembers when drops were last reported).
pub struct LogDrain {
    last_dropped_report_us: i64,
}

impl LogDrain {
    pub const fn new() -> Self {
        Self {
            last_dropped_report_us: 0,
        }
    }

    /// Forward everything queued in `stream`.
    ///
    /// Returns the number of entries forwarded. Blocking; never call from
    /// the correlator task or an ISR.
    pub fn poll(&mut self, stream: &LogStream, now_us: i64) -> usize {
        let mut buf = [0u8; FORMAT_BUF_LEN];
        let mut forwarded = 0;

        while let Some(entry) = stream.drain() {
            let len = format_log_entry(&entry, &mut buf);
            let line = core::str::from_utf8(&buf[..len]).unwrap_or("<invalid utf8>");
            log::log!(target: LOG_TARGET, log::Level::from(entry.level), "{}", line);
            forwarded += 1;
        }

        if now_us - self.last_dropped_report_us >= DROPPED_REPORT_INTERVAL_US {
            let dropped = stream.take_dropped();
            if dropped > 0 {
                log::warn!(target: LOG_TARGET, "dropped {} log lines", dropped);
            }
            self.last_dropped_report_us = now_us;
        }

        forwarded
    }
}

impl Default for LogDrain {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_log_entry() {
        let entry = LogEntry::new(1234567, LogLevel::Info, b"Hello world");

        let mut buf = [0u8; FORMAT_BUF_LEN];
        let len = format_log_entry(&entry, &mut buf);

        let formatted = core::str::from_utf8(&buf[..len]).unwrap();
        assert_eq!(formatted, "[   1234567] Hello world");
    }

    #[test]
    fn test_level_mapping() {
        assert_eq!(log::Level::from(LogLevel::Error), log::Level::Error);
        assert_eq!(log::Level::from(LogLevel::Warn), log::Level::Warn);
        assert_eq!(log::Level::from(LogLevel::Debug), log::Level::Debug);
    }

    #[test]
    fn test_poll_empties_stream() {
        let stream = LogStream::try_with_capacity(8).unwrap();
        stream.push(1, LogLevel::Info, b"one");
        stream.push(2, LogLevel::Warn, b"two");

        let mut drain = LogDrain::new();
        assert_eq!(drain.poll(&stream, 0), 2);
        assert!(stream.drain().is_none());
        assert_eq!(drain.poll(&stream, 1), 0);
    }

    #[test]
    fn test_dropped_reported_once_per_interval() {
        let stream = LogStream::try_with_capacity(1).unwrap();
        stream.push(1, LogLevel::Info, b"kept");
        stream.push(2, LogLevel::Info, b"lost");
        assert_eq!(stream.dropped(), 1);

        let mut drain = LogDrain::new();

        // Too early: the counter is left alone
        drain.poll(&stream, DROPPED_REPORT_INTERVAL_US - 1);
        assert_eq!(stream.dropped(), 1);

        drain.poll(&stream, DROPPED_REPORT_INTERVAL_US);
        assert_eq!(stream.dropped(), 0);
    }
}
