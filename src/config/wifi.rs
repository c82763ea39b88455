//! WiFi credential types.
//!
//! Platform-independent, so validation can be tested on the host machine.
//!
//! # Example
//!
//! ```
//! use button_pusher_esp32::config::WifiConfig;
//!
//! let config = WifiConfig::new("MyNetwork", "MyPassword").unwrap();
//! assert!(config.validate().is_ok());
//! assert_eq!(config.masked_password(), "**********");
//! ```

use super::ConfigError;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Maximum SSID length per IEEE 802.11 standard.
pub const MAX_SSID_LEN: usize = 32;

/// Maximum password length for WPA2.
pub const MAX_PASSWORD_LEN: usize = 64;

/// Minimum password length for WPA2.
pub const MIN_PASSWORD_LEN: usize = 8;

/// WiFi credentials for joining an access point.
///
/// The password is wiped from memory when the value is dropped.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct WifiConfig {
    /// Network SSID (1-32 bytes).
    pub ssid: String,
    /// Network password (8-64 bytes for WPA2, empty for open networks).
    pub password: String,
}

impl WifiConfig {
    /// Create a new WiFi configuration.
    ///
    /// Returns an error if SSID or password are invalid.
    pub fn new(ssid: impl Into<String>, password: impl Into<String>) -> Result<Self, ConfigError> {
        let config = Self {
            ssid: ssid.into(),
            password: password.into(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Create a configuration for an open network (no password).
    pub fn open(ssid: impl Into<String>) -> Result<Self, ConfigError> {
        Self::new(ssid, String::new())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ssid.is_empty() {
            return Err(ConfigError::SsidEmpty);
        }
        if self.ssid.len() > MAX_SSID_LEN {
            return Err(ConfigError::SsidTooLong {
                len: self.ssid.len(),
                max: MAX_SSID_LEN,
            });
        }

        // Empty is OK for open networks
        if !self.password.is_empty() && self.password.len() < MIN_PASSWORD_LEN {
            return Err(ConfigError::PasswordTooShort {
                len: self.password.len(),
                min: MIN_PASSWORD_LEN,
            });
        }
        if self.password.len() > MAX_PASSWORD_LEN {
            return Err(ConfigError::PasswordTooLong {
                len: self.password.len(),
                max: MAX_PASSWORD_LEN,
            });
        }

        Ok(())
    }

    /// Check if this is an open network (no password).
    pub fn is_open(&self) -> bool {
        self.password.is_empty()
    }

    /// Password rendered for logs: one `*` per byte, `(none)` when open.
    pub fn masked_password(&self) -> String {
        if self.is_open() {
            "(none)".to_string()
        } else {
            "*".repeat(self.password.len())
        }
    }
}

impl fmt::Debug for WifiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WifiConfig")
            .field("ssid", &self.ssid)
            .field("password", &self.masked_password())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        let config = WifiConfig::new("TestNetwork", "password123").unwrap();
        assert_eq!(config.ssid, "TestNetwork");
        assert_eq!(config.password, "password123");
        assert!(!config.is_open());
    }

    #[test]
    fn test_open_network() {
        let config = WifiConfig::open("OpenNetwork").unwrap();
        assert!(config.is_open());
        assert_eq!(config.masked_password(), "(none)");
    }

    #[test]
    fn test_empty_ssid() {
        let result = WifiConfig::new("", "password123");
        assert_eq!(result, Err(ConfigError::SsidEmpty));
    }

    #[test]
    fn test_ssid_length_limits() {
        assert!(WifiConfig::new("a".repeat(32), "password123").is_ok());
        let result = WifiConfig::new("a".repeat(33), "password123");
        assert!(matches!(result, Err(ConfigError::SsidTooLong { len: 33, .. })));
    }

    #[test]
    fn test_password_length_limits() {
        assert!(WifiConfig::new("TestNetwork", "12345678").is_ok());
        assert!(WifiConfig::new("TestNetwork", "a".repeat(64)).is_ok());
        assert!(matches!(
            WifiConfig::new("TestNetwork", "short"),
            Err(ConfigError::PasswordTooShort { len: 5, min: 8 })
        ));
        assert!(matches!(
            WifiConfig::new("TestNetwork", "a".repeat(65)),
            Err(ConfigError::PasswordTooLong { len: 65, max: 64 })
        ));
    }

    #[test]
    fn test_debug_hides_password() {
        let config = WifiConfig::new("TestNetwork", "hunter2hunter2").unwrap();
        let debug = format!("{:?}", config);
        assert!(debug.contains("TestNetwork"));
        assert!(!debug.contains("hunter2"));
    }
}
