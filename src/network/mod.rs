//! Network abstraction layer.
//!
//! The radio and IP stack are external collaborators. This module only
//! exposes what the controller needs from them through [`NetworkProvider`]:
//! - **ESP32** (`esp32` feature): [`EspWifiNetwork`] on top of `esp-idf-svc`
//! - **Host**: [`HostNetwork`], where the OS owns networking
//!
//! Connection state is never modeled here; it is read from the provider.
//!
//! # Example
//!
//! ```ignore
//! use button_pusher_esp32::network::{join_network, HostNetwork, JoinPhase};
//!
//! let mut network = HostNetwork::new();
//! join_network(&mut network, &config.wifi, &config.connect, JoinPhase::Initial)?;
//! println!("Connected, IP: {:?}", network.ip_info());
//! ```

#[cfg(feature = "esp32")]
mod wifi;

mod host;

#[cfg(feature = "esp32")]
pub use wifi::EspWifiNetwork;

pub use host::HostNetwork;

use crate::config::{ConnectPolicy, WifiConfig};
use log::info;
use std::fmt;
use std::net::Ipv4Addr;
use std::thread;
use std::time::{Duration, Instant};

/// Addressing of the station interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpInfo {
    /// Local address.
    pub ip: Ipv4Addr,
    /// Default gateway.
    pub gateway: Ipv4Addr,
    /// Subnet mask.
    pub netmask: Ipv4Addr,
}

impl IpInfo {
    /// Log the effective addressing.
    pub fn log(&self) {
        info!("Device IP: {}", self.ip);
        info!("Gateway IP: {}", self.gateway);
        info!("Subnet Mask: {}", self.netmask);
    }
}

/// Convert a CIDR prefix length (e.g. `24`) into a dotted subnet mask.
pub fn netmask_from_prefix(prefix: u8) -> Ipv4Addr {
    let bits = u32::MAX
        .checked_shl(32u32.saturating_sub(prefix as u32))
        .unwrap_or(0);
    Ipv4Addr::from(bits)
}

/// Network provider abstraction.
///
/// Implementations wrap a platform network stack. `begin` only starts an
/// association; callers poll [`NetworkProvider::is_connected`] to learn the
/// outcome (see [`join_network`]).
pub trait NetworkProvider {
    /// Start joining the network described by `wifi`.
    ///
    /// Any previous association is dropped first.
    fn begin(&mut self, wifi: &WifiConfig) -> Result<(), NetworkError>;

    /// Whether the link is up and an address is assigned.
    fn is_connected(&self) -> bool;

    /// Current addressing. `None` while not connected.
    fn ip_info(&self) -> Option<IpInfo>;

    /// Replace the assigned address with `ip`, keeping the gateway and
    /// subnet mask handed out by the network.
    fn set_static_ip(&mut self, ip: Ipv4Addr) -> Result<(), NetworkError>;

    /// Leave the network.
    fn disconnect(&mut self) -> Result<(), NetworkError>;
}

/// Which situation a join attempt is made in; only affects log wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinPhase {
    /// First join after boot.
    Initial,
    /// Repairing a dropped link.
    Reconnect,
}

impl JoinPhase {
    fn progress(self) -> &'static str {
        match self {
            Self::Initial => "Connecting to WiFi...",
            Self::Reconnect => "Reconnecting to WiFi...",
        }
    }
}

/// Join the network, polling until connected or the policy's timeout elapses.
///
/// Status is checked every `poll_interval` against a monotonic clock.
pub fn join_network<N: NetworkProvider + ?Sized>(
    network: &mut N,
    wifi: &WifiConfig,
    policy: &ConnectPolicy,
    phase: JoinPhase,
) -> Result<(), NetworkError> {
    network.begin(wifi)?;

    let started = Instant::now();
    while !network.is_connected() && started.elapsed() < policy.join_timeout {
        thread::sleep(policy.poll_interval);
        info!("{}", phase.progress());
    }

    if network.is_connected() {
        Ok(())
    } else {
        Err(NetworkError::Timeout(policy.join_timeout))
    }
}

/// Network errors.
#[derive(Debug)]
pub enum NetworkError {
    /// SSID or password rejected by the driver.
    InvalidCredentials,
    /// Not connected within the join timeout.
    Timeout(Duration),
    /// Static address could not be applied.
    StaticIp(String),
    /// Platform driver error.
    Driver(String),
    /// Generic I/O error.
    Io(std::io::Error),
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCredentials => write!(f, "credentials rejected by driver"),
            Self::Timeout(after) => write!(f, "not connected after {} s", after.as_secs()),
            Self::StaticIp(msg) => write!(f, "static address failed: {}", msg),
            Self::Driver(msg) => write!(f, "driver error: {}", msg),
            Self::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for NetworkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for NetworkError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

#[cfg(feature = "esp32")]
impl From<esp_idf_sys::EspError> for NetworkError {
    fn from(e: esp_idf_sys::EspError) -> Self {
        Self::Driver(format!("{:?}", e))
    }
}
