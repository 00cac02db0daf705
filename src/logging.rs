//! RT-safe logging for the correlator hot path.
//!
//! # Architecture
//!
//! ```text
//! Correlator task         LogStream             Log drain
//! ───────────────         ─────────             ─────────
//!
//! rt_info!() ──────────▶ [L0][L1][L2] ──────▶ log::log!()
//! non-blocking            lock-free            blocking ok
//! fixed buffer            ring buffer          main task
//! ```
//!
//! # Rules
//!
//! - The hot path never calls blocking log functions
//! - `log::info!`, `println!` are for init and drain code only
//! - Hot path uses the `rt_*!` macros
//! - Lines may be dropped if the ring is full; drops are counted

use core::sync::atomic::{AtomicU32, Ordering};

use crate::ring::{BoundedRing, RingError};

/// Maximum message length.
pub const MAX_MSG_LEN: usize = 96;

/// Default log ring depth (number of entries).
pub const LOG_BUFFER_SIZE: usize = 32;

/// Log level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl LogLevel {
    /// Convert to string for output.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }
}

/// A single log entry.
#[derive(Clone, Copy)]
#[repr(C)]
pub struct LogEntry {
    /// Timestamp in microseconds.
    pub timestamp_us: i64,
    /// Log level.
    pub level: LogLevel,
    /// Message length.
    pub len: u8,
    /// Message bytes (not null-terminated).
    pub msg: [u8; MAX_MSG_LEN],
}

impl LogEntry {
    /// Build an entry, truncating `msg` to [`MAX_MSG_LEN`].
    pub fn new(timestamp_us: i64, level: LogLevel, msg: &[u8]) -> Self {
        let len = msg.len().min(MAX_MSG_LEN);
        let mut entry = Self {
            timestamp_us,
            level,
            len: len as u8,
            msg: [0; MAX_MSG_LEN],
        };
        entry.msg[..len].copy_from_slice(&msg[..len]);
        entry
    }

    /// Message bytes.
    #[inline]
    pub fn message(&self) -> &[u8] {
        &self.msg[..self.len as usize]
    }

    /// Message as text, or a marker if truncation split a UTF-8 sequence.
    pub fn message_str(&self) -> &str {
        core::str::from_utf8(self.message()).unwrap_or("<invalid utf8>")
    }
}

/// Lock-free log stream (multiple producers, single consumer).
///
/// - Any context can push (coordinated by the ring's CAS)
/// - Push never blocks (drops message if full)
/// - Drain runs elsewhere at leisure
pub struct LogStream {
    entries: BoundedRing<LogEntry>,
    dropped: AtomicU32,
}

impl LogStream {
    /// Create a stream holding at most `capacity` entries.
    pub fn try_with_capacity(capacity: usize) -> Result<Self, RingError> {
        Ok(Self {
            entries: BoundedRing::try_with_capacity(capacity)?,
            dropped: AtomicU32::new(0),
        })
    }

    /// Push a log entry (RT-safe, never blocks).
    ///
    /// Returns `true` if message was queued, `false` if dropped (ring full).
    #[inline]
    pub fn push(&self, timestamp_us: i64, level: LogLevel, msg: &[u8]) -> bool {
        match self.entries.push(LogEntry::new(timestamp_us, level, msg)) {
            Ok(()) => true,
            Err(_) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Drain next log entry.
    ///
    /// Returns `None` if no entries available.
    #[inline]
    pub fn drain(&self) -> Option<LogEntry> {
        self.entries.pop()
    }

    /// Get count of dropped messages.
    #[inline]
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Take and reset the dropped counter in one step.
    #[inline]
    pub fn take_dropped(&self) -> u32 {
        self.dropped.swap(0, Ordering::Relaxed)
    }
}

/// Format a message into a buffer.
///
/// Returns the number of bytes written. Output past the end of `buf` is cut.
#[inline]
pub fn format_to_buffer(buf: &mut [u8], args: core::fmt::Arguments<'_>) -> usize {
    use core::fmt::Write;

    struct BufWriter<'a> {
        buf: &'a mut [u8],
        pos: usize,
    }

    impl<'a> Write for BufWriter<'a> {
        fn write_str(&mut self, s: &str) -> core::fmt::Result {
            let bytes = s.as_bytes();
            let remaining = self.buf.len() - self.pos;
            let to_write = bytes.len().min(remaining);
            self.buf[self.pos..self.pos + to_write].copy_from_slice(&bytes[..to_write]);
            self.pos += to_write;
            Ok(())
        }
    }

    let mut writer = BufWriter { buf, pos: 0 };
    let _ = core::fmt::write(&mut writer, args);
    writer.pos
}

/// RT-safe log macro.
///
/// # Example
///
/// ```ignore
/// rt_log!(LogLevel::Info, core.log(), ts, "PPS at {} us", ts);
/// ```
#[macro_export]
macro_rules! rt_log {
    ($level:expr, $stream:expr, $timestamp:expr, $($arg:tt)*) => {{
        let mut buf = [0u8; $crate::logging::MAX_MSG_LEN];
        let len = $crate::logging::format_to_buffer(&mut buf, format_args!($($arg)*));
        $stream.push($timestamp, $level, &buf[..len]);
    }};
}

/// RT-safe info log.
#[macro_export]
macro_rules! rt_info {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::rt_log!($crate::logging::LogLevel::Info, $stream, $timestamp, $($arg)*)
    };
}

/// RT-safe warning log.
#[macro_export]
macro_rules! rt_warn {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::rt_log!($crate::logging::LogLevel::Warn, $stream, $timestamp, $($arg)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_stream_basic() {
        let stream = LogStream::try_with_capacity(16).unwrap();

        assert!(stream.push(1000, LogLevel::Info, b"test message"));

        let entry = stream.drain().unwrap();
        assert_eq!(entry.timestamp_us, 1000);
        assert_eq!(entry.level, LogLevel::Info);
        assert_eq!(entry.message(), b"test message");

        assert!(stream.drain().is_none());
    }

    #[test]
    fn test_log_stream_full() {
        let stream = LogStream::try_with_capacity(4).unwrap();

        assert!(stream.push(1, LogLevel::Info, b"1"));
        assert!(stream.push(2, LogLevel::Info, b"2"));
        assert!(stream.push(3, LogLevel::Info, b"3"));
        assert!(stream.push(4, LogLevel::Info, b"4"));

        // Should drop
        assert!(!stream.push(5, LogLevel::Info, b"5"));
        assert_eq!(stream.dropped(), 1);

        // Drain one, should be able to push again
        assert_eq!(stream.drain().unwrap().message(), b"1");
        assert!(stream.push(6, LogLevel::Info, b"6"));

        let rest: Vec<i64> = core::iter::from_fn(|| stream.drain())
            .map(|e| e.timestamp_us)
            .collect();
        assert_eq!(rest, vec![2, 3, 4, 6]);
        assert_eq!(stream.take_dropped(), 1);
        assert_eq!(stream.dropped(), 0);
    }

    #[test]
    fn test_entry_truncates_long_message() {
        let long = [b'x'; MAX_MSG_LEN + 20];
        let entry = LogEntry::new(0, LogLevel::Debug, &long);
        assert_eq!(entry.len as usize, MAX_MSG_LEN);
    }

    #[test]
    fn test_format_to_buffer() {
        let mut buf = [0u8; 32];
        let len = format_to_buffer(&mut buf, format_args!("Hello {}", 42));
        assert_eq!(&buf[..len], b"Hello 42");
    }

    #[test]
    fn test_format_to_buffer_cuts_overflow() {
        let mut buf = [0u8; 4];
        let len = format_to_buffer(&mut buf, format_args!("offset {}", 50_000));
        assert_eq!(&buf[..len], b"offs");
    }

    #[test]
    fn test_rt_macros_push_with_level() {
        let stream = LogStream::try_with_capacity(8).unwrap();
        crate::rt_warn!(stream, 7, "offset {} us", -12);

        let entry = stream.drain().unwrap();
        assert_eq!(entry.level, LogLevel::Warn);
        assert_eq!(entry.timestamp_us, 7);
        assert_eq!(entry.message_str(), "offset -12 us");
    }

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Error < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Debug);
        assert!(LogLevel::Debug < LogLevel::Trace);
    }

    #[test]
    fn test_multiple_producers() {
        use std::sync::Arc;
        use std::thread;

        let stream = Arc::new(LogStream::try_with_capacity(64).unwrap());
        let mut handles = vec![];

        for i in 0..4 {
            let stream = Arc::clone(&stream);
            handles.push(thread::spawn(move || {
                for j in 0..10 {
                    let msg = format!("Thread {} msg {}", i, j);
                    stream.push(j as i64, LogLevel::Info, msg.as_bytes());
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        let mut count = 0;
        while stream.drain().is_some() {
            count += 1;
        }
        assert_eq!(count, 40, "All messages should be present");
        assert_eq!(stream.dropped(), 0);
    }
}
