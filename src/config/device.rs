//! Device configuration assembled from compile-time values.
//!
//! Everything is baked in when the firmware is built; there is no runtime
//! configuration store. Set the variables when building:
//!
//! ```bash
//! WIFI_SSID="MyNetwork" WIFI_PASSWORD="secret123" PUSHER_STATIC_IP="192.168.0.184" \
//!     cargo build --release --features esp32
//! ```
//!
//! | Variable                   | Default | Meaning                               |
//! |----------------------------|---------|---------------------------------------|
//! | `WIFI_SSID`                | -       | Network to join (required)            |
//! | `WIFI_PASSWORD`            | empty   | Network password, empty for open      |
//! | `PUSHER_STATIC_IP`         | empty   | Address to request after joining      |
//! | `PUSHER_SERVO_PIN`         | `5`     | GPIO driving the servo signal line    |
//! | `PUSHER_PRESS_ANGLE`       | `90`    | Angle used by `/press`                |
//! | `PUSHER_PRESS_DURATION_MS` | `500`   | Hold time used by `/press`            |
//! | `PUSHER_HTTP_PORT`         | `80`    | Port of the control server            |

use super::{ConfigError, WifiConfig};
use crate::servo::Angle;
use log::info;
use std::net::Ipv4Addr;
use std::str::FromStr;
use std::time::Duration;

const WIFI_SSID: Option<&str> = option_env!("WIFI_SSID");
const WIFI_PASSWORD: Option<&str> = option_env!("WIFI_PASSWORD");
const STATIC_IP: Option<&str> = option_env!("PUSHER_STATIC_IP");
const SERVO_PIN: Option<&str> = option_env!("PUSHER_SERVO_PIN");
const PRESS_ANGLE: Option<&str> = option_env!("PUSHER_PRESS_ANGLE");
const PRESS_DURATION_MS: Option<&str> = option_env!("PUSHER_PRESS_DURATION_MS");
const HTTP_PORT: Option<&str> = option_env!("PUSHER_HTTP_PORT");

/// Default GPIO for the servo signal line.
pub const DEFAULT_SERVO_PIN: u8 = 5;

/// Default angle for `/press`, in degrees.
pub const DEFAULT_PRESS_ANGLE: u8 = 90;

/// Default hold time for `/press`.
pub const DEFAULT_PRESS_DURATION: Duration = Duration::from_millis(500);

/// Default control server port.
pub const DEFAULT_HTTP_PORT: u16 = 80;

/// Servo wiring and press parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServoConfig {
    /// GPIO number of the PWM signal line.
    pub pin: u8,
    /// Angle the servo moves to for `/press`.
    pub press_angle: Angle,
    /// How long `/press` holds the press angle before returning to rest.
    pub press_duration: Duration,
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            pin: DEFAULT_SERVO_PIN,
            press_angle: Angle::saturating(DEFAULT_PRESS_ANGLE),
            press_duration: DEFAULT_PRESS_DURATION,
        }
    }
}

/// Timing used when joining the network and supervising the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectPolicy {
    /// Delay between connection status polls while joining.
    pub poll_interval: Duration,
    /// Give up a join attempt after this long.
    pub join_timeout: Duration,
    /// Delay between supervisory link checks.
    pub check_interval: Duration,
}

impl Default for ConnectPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            join_timeout: Duration::from_secs(60),
            check_interval: Duration::from_secs(1),
        }
    }
}

/// Complete, immutable device configuration.
///
/// Built once at startup and handed to the controller by value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    /// Network credentials.
    pub wifi: WifiConfig,
    /// Address to request after joining; `None` keeps the DHCP lease.
    pub static_ip: Option<Ipv4Addr>,
    /// Servo parameters.
    pub servo: ServoConfig,
    /// Control server port.
    pub http_port: u16,
    /// Join and supervision timing.
    pub connect: ConnectPolicy,
}

impl DeviceConfig {
    /// Create a configuration with default servo, port and timing settings.
    pub fn new(wifi: WifiConfig) -> Self {
        Self {
            wifi,
            static_ip: None,
            servo: ServoConfig::default(),
            http_port: DEFAULT_HTTP_PORT,
            connect: ConnectPolicy::default(),
        }
    }

    /// Build the configuration from values captured at compile time.
    pub fn from_build_env() -> Result<Self, ConfigError> {
        Self::from_values(&BuildValues {
            ssid: WIFI_SSID,
            password: WIFI_PASSWORD,
            static_ip: STATIC_IP,
            servo_pin: SERVO_PIN,
            press_angle: PRESS_ANGLE,
            press_duration_ms: PRESS_DURATION_MS,
            http_port: HTTP_PORT,
        })
    }

    fn from_values(values: &BuildValues<'_>) -> Result<Self, ConfigError> {
        let ssid = values
            .ssid
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("WIFI_SSID"))?;
        let wifi = WifiConfig::new(ssid, values.password.unwrap_or(""))?;

        let mut config = Self::new(wifi);

        config.static_ip = non_empty(values.static_ip)
            .map(|raw| parse_value::<Ipv4Addr>("PUSHER_STATIC_IP", raw))
            .transpose()?;

        if let Some(raw) = non_empty(values.servo_pin) {
            config.servo.pin = parse_value("PUSHER_SERVO_PIN", raw)?;
        }
        if let Some(raw) = non_empty(values.press_angle) {
            let degrees: i64 = parse_value("PUSHER_PRESS_ANGLE", raw)?;
            config.servo.press_angle =
                Angle::new(degrees).map_err(|_| ConfigError::InvalidValue {
                    key: "PUSHER_PRESS_ANGLE",
                    value: raw.to_string(),
                    reason: "must be between 0 and 180".to_string(),
                })?;
        }
        if let Some(raw) = non_empty(values.press_duration_ms) {
            let millis: u64 = parse_value("PUSHER_PRESS_DURATION_MS", raw)?;
            config.servo.press_duration = Duration::from_millis(millis);
        }
        if let Some(raw) = non_empty(values.http_port) {
            config.http_port = parse_value("PUSHER_HTTP_PORT", raw)?;
        }

        Ok(config)
    }

    /// Log the effective configuration at boot.
    pub fn log_summary(&self) {
        info!("CONFIGURATION PARAMETERS:");
        info!("WLAN SSID: {}", self.wifi.ssid);
        info!("WLAN Password: {}", self.wifi.masked_password());
        match self.static_ip {
            Some(ip) => info!("Device IP: {}", ip),
            None => info!("Device IP: (DHCP)"),
        }
        info!("Servo PIN: {}", self.servo.pin);
        info!("Turning Degrees: {}", self.servo.press_angle);
        info!(
            "Press Duration (ms): {}",
            self.servo.press_duration.as_millis()
        );
        info!("HTTP Port: {}", self.http_port);
    }
}

/// Raw compile-time strings, separated out so parsing can be tested.
struct BuildValues<'a> {
    ssid: Option<&'a str>,
    password: Option<&'a str>,
    static_ip: Option<&'a str>,
    servo_pin: Option<&'a str>,
    press_angle: Option<&'a str>,
    press_duration_ms: Option<&'a str>,
    http_port: Option<&'a str>,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

fn parse_value<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}
