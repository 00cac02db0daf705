//! Module: config
//!
//! Purpose: Static configuration for the trigger/PPS subsystem.
//!
//! Everything here is read once by `init`. The only value that can change
//! afterwards is the debounce window, through
//! [`EdgeCapture::set_debounce_us`](crate::capture::EdgeCapture::set_debounce_us).

use core::ffi::CStr;

use crate::capture::DEBOUNCE_THRESHOLD_US;
use crate::channel::DEFAULT_CHANNEL_DEPTH;
use crate::error::SyncError;
use crate::logging::LOG_BUFFER_SIZE;

/// External trigger input (ESP32-C3 DevKit wiring).
pub const DEFAULT_TRIGGER_PIN: i32 = 7;

/// GPS PPS input.
pub const DEFAULT_PPS_PIN: i32 = 10;

/// Highest GPIO number on any supported chip.
const MAX_GPIO: i32 = 48;

/// FreeRTOS task stacks below this overflow on the first formatted log line.
const MIN_TASK_STACK: usize = 2048;

/// Input line assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinConfig {
    pub trigger_pin: i32,
    pub pps_pin: i32,
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            trigger_pin: DEFAULT_TRIGGER_PIN,
            pps_pin: DEFAULT_PPS_PIN,
        }
    }
}

/// Correlator task parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskConfig {
    pub name: &'static CStr,
    pub stack_size: usize,
    pub priority: u8,
    /// Core to pin to; `None` lets the scheduler choose.
    pub core: Option<u8>,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            name: c"timer_logic",
            stack_size: 4096,
            priority: 10,
            core: None,
        }
    }
}

/// Full subsystem configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    pub pins: PinConfig,
    /// Trigger debounce window in microseconds.
    pub debounce_us: i64,
    /// Event channel depth.
    pub channel_depth: usize,
    /// Diagnostic log ring depth.
    pub log_depth: usize,
    pub task: TaskConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            pins: PinConfig::default(),
            debounce_us: DEBOUNCE_THRESHOLD_US,
            channel_depth: DEFAULT_CHANNEL_DEPTH,
            log_depth: LOG_BUFFER_SIZE,
            task: TaskConfig::default(),
        }
    }
}

impl SyncConfig {
    /// Reject configurations that cannot work, before any hardware is touched.
    pub fn validate(&self) -> Result<(), SyncError> {
        let pin_ok = |pin: i32| (0..=MAX_GPIO).contains(&pin);

        if !pin_ok(self.pins.trigger_pin) {
            return Err(SyncError::InvalidConfig("trigger pin out of range"));
        }
        if !pin_ok(self.pins.pps_pin) {
            return Err(SyncError::InvalidConfig("PPS pin out of range"));
        }
        if self.pins.trigger_pin == self.pins.pps_pin {
            return Err(SyncError::InvalidConfig("trigger and PPS share a pin"));
        }
        if self.debounce_us < 0 {
            return Err(SyncError::InvalidConfig("negative debounce window"));
        }
        if self.channel_depth == 0 {
            return Err(SyncError::InvalidConfig("channel depth is zero"));
        }
        if self.log_depth == 0 {
            return Err(SyncError::InvalidConfig("log depth is zero"));
        }
        if self.task.stack_size < MIN_TASK_STACK {
            return Err(SyncError::InvalidConfig("task stack too small"));
        }
        if matches!(self.task.core, Some(core) if core > 1) {
            return Err(SyncError::InvalidConfig("no such core"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SyncConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.pins.trigger_pin, 7);
        assert_eq!(config.pins.pps_pin, 10);
        assert_eq!(config.debounce_us, 10_000);
        assert_eq!(config.channel_depth, 10);
    }

    #[test]
    fn test_shared_pin_rejected() {
        let mut config = SyncConfig::default();
        config.pins.pps_pin = config.pins.trigger_pin;
        assert!(matches!(config.validate(), Err(SyncError::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_depth_rejected() {
        let config = SyncConfig {
            channel_depth: 0,
            ..SyncConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_core_rejected() {
        let mut config = SyncConfig::default();
        config.task.core = Some(2);
        assert!(config.validate().is_err());
        config.task.core = Some(1);
        assert!(config.validate().is_ok());
    }
}
