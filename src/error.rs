//! Initialization error types.
//!
//! Every variant is fatal for `init`: the subsystem is unavailable and the
//! caller may retry from scratch. Steady-state problems (drops, bounces) are
//! not errors; see [`SyncStats`](crate::stats::SyncStats).

use crate::event::EventKind;

/// Raw ESP-IDF `esp_err_t` value.
pub type EspCode = i32;

/// Initialization failure with code and message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncError {
    /// E01: Configuration rejected before touching hardware
    InvalidConfig(&'static str),
    /// E02: Input pin configuration failed
    GpioConfig(EspCode),
    /// E03: Event channel (or log ring) could not be created
    ChannelCreate,
    /// E04: GPIO ISR service installation failed
    IsrService(EspCode),
    /// E05: ISR handler registration failed for one line
    HandlerRegister { kind: EventKind, code: EspCode },
    /// E06: Correlator task could not be created
    TaskSpawn(EspCode),
}

impl SyncError {
    /// Get error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig(_) => "E01",
            Self::GpioConfig(_) => "E02",
            Self::ChannelCreate => "E03",
            Self::IsrService(_) => "E04",
            Self::HandlerRegister { .. } => "E05",
            Self::TaskSpawn(_) => "E06",
        }
    }

    /// Get error message
    pub fn message(&self) -> &'static str {
        match self {
            Self::InvalidConfig(_) => "invalid configuration",
            Self::GpioConfig(_) => "input pin configuration failed",
            Self::ChannelCreate => "event channel creation failed",
            Self::IsrService(_) => "ISR service installation failed",
            Self::HandlerRegister { .. } => "ISR handler registration failed",
            Self::TaskSpawn(_) => "correlator task creation failed",
        }
    }

    /// Underlying ESP-IDF error code, when the platform reported one.
    pub fn esp_code(&self) -> Option<EspCode> {
        match *self {
            Self::GpioConfig(code)
            | Self::IsrService(code)
            | Self::HandlerRegister { code, .. }
            | Self::TaskSpawn(code) => Some(code),
            Self::InvalidConfig(_) | Self::ChannelCreate => None,
        }
    }
}

impl core::fmt::Display for SyncError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())?;
        match self {
            Self::InvalidConfig(why) => write!(f, " ({})", why),
            Self::HandlerRegister { kind, code } => {
                write!(f, " ({}, esp_err 0x{:x})", kind.as_str(), code)
            }
            Self::GpioConfig(code) | Self::IsrService(code) | Self::TaskSpawn(code) => {
                write!(f, " (esp_err 0x{:x})", code)
            }
            Self::ChannelCreate => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SyncError::HandlerRegister {
            kind: EventKind::Pps,
            code: 0x103,
        };
        assert_eq!(
            err.to_string(),
            "E05: ISR handler registration failed (PPS, esp_err 0x103)"
        );
        assert_eq!(SyncError::ChannelCreate.to_string(), "E03: event channel creation failed");
    }

    #[test]
    fn test_esp_code() {
        assert_eq!(SyncError::IsrService(-1).esp_code(), Some(-1));
        assert_eq!(SyncError::InvalidConfig("x").esp_code(), None);
    }
}
