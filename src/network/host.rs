//! Host network provider.
//!
//! On host systems the OS handles networking. This provider is a thin wrapper
//! that reports the machine's primary IPv4 address so the device can be run
//! and exercised locally.

use super::{IpInfo, NetworkError, NetworkProvider};
use crate::config::WifiConfig;
use log::{info, warn};
use std::net::{IpAddr, Ipv4Addr};

/// Host network provider.
#[derive(Debug, Default)]
pub struct HostNetwork {
    joined: bool,
    ip_addr: Option<Ipv4Addr>,
}

impl HostNetwork {
    /// Create a new host network provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the primary local IPv4 address.
    ///
    /// Creates a UDP socket and "connects" it to a public address (nothing is
    /// sent), then reads back which local address the OS picked.
    fn detect_local_ip() -> Option<Ipv4Addr> {
        use std::net::UdpSocket;

        let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
        socket.connect("8.8.8.8:80").ok()?;
        match socket.local_addr().ok()?.ip() {
            IpAddr::V4(ip) => Some(ip),
            IpAddr::V6(_) => None,
        }
    }
}

impl NetworkProvider for HostNetwork {
    fn begin(&mut self, wifi: &WifiConfig) -> Result<(), NetworkError> {
        // The OS is already on a network; the SSID is informational only.
        info!("Host network: pretending to join '{}'", wifi.ssid);
        self.joined = true;
        self.ip_addr = Self::detect_local_ip();
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.joined
    }

    fn ip_info(&self) -> Option<IpInfo> {
        if !self.joined {
            return None;
        }
        Some(IpInfo {
            ip: self.ip_addr.unwrap_or(Ipv4Addr::UNSPECIFIED),
            gateway: Ipv4Addr::UNSPECIFIED,
            netmask: Ipv4Addr::UNSPECIFIED,
        })
    }

    fn set_static_ip(&mut self, ip: Ipv4Addr) -> Result<(), NetworkError> {
        warn!(
            "Host network: static address {} ignored, the OS manages addressing",
            ip
        );
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), NetworkError> {
        self.joined = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_network_starts_disconnected() {
        let network = HostNetwork::new();
        assert!(!network.is_connected());
        assert!(network.ip_info().is_none());
    }

    #[test]
    fn test_host_network_begin_connects() {
        let mut network = HostNetwork::new();
        let wifi = WifiConfig::open("Anything").unwrap();
        network.begin(&wifi).unwrap();
        assert!(network.is_connected());
        // IP detection might fail in air-gapped CI, so only check presence
        assert!(network.ip_info().is_some());

        network.disconnect().unwrap();
        assert!(!network.is_connected());
    }

    #[test]
    fn test_static_ip_is_accepted() {
        let mut network = HostNetwork::new();
        assert!(network.set_static_ip(Ipv4Addr::new(192, 168, 0, 184)).is_ok());
    }
}
