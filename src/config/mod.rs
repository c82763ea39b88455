//! Device configuration.
//!
//! # Components
//!
//! - [`wifi`] - WiFi credential validation
//! - [`device`] - the immutable [`DeviceConfig`] built once at startup
//!
//! All types here are platform-independent and tested on the host.

mod device;
mod wifi;

use std::fmt;

pub use device::{
    ConnectPolicy, DeviceConfig, ServoConfig, DEFAULT_HTTP_PORT, DEFAULT_PRESS_ANGLE,
    DEFAULT_PRESS_DURATION, DEFAULT_SERVO_PIN,
};
pub use wifi::{WifiConfig, MAX_PASSWORD_LEN, MAX_SSID_LEN, MIN_PASSWORD_LEN};

/// Errors that can occur while building the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// SSID is empty.
    SsidEmpty,
    /// SSID exceeds maximum length.
    SsidTooLong { len: usize, max: usize },
    /// Password is too short for WPA2.
    PasswordTooShort { len: usize, min: usize },
    /// Password exceeds maximum length.
    PasswordTooLong { len: usize, max: usize },
    /// A required build-time value was not set.
    Missing(&'static str),
    /// A build-time value could not be parsed.
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SsidEmpty => write!(f, "SSID cannot be empty"),
            Self::SsidTooLong { len, max } => {
                write!(f, "SSID too long: {} bytes (max {})", len, max)
            }
            Self::PasswordTooShort { len, min } => {
                write!(f, "password too short: {} bytes (min {})", len, min)
            }
            Self::PasswordTooLong { len, max } => {
                write!(f, "password too long: {} bytes (max {})", len, max)
            }
            Self::Missing(key) => write!(f, "{} was not set at compile time", key),
            Self::InvalidValue { key, value, reason } => {
                write!(f, "invalid {} '{}': {}", key, value, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
