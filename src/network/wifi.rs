//! ESP32 WiFi network provider.
//!
//! Wraps the non-blocking `EspWifi` driver: [`NetworkProvider::begin`] only
//! kicks off association, and the caller polls for the outcome.

use super::{netmask_from_prefix, IpInfo, NetworkError, NetworkProvider};
use crate::config::WifiConfig;
use esp_idf_hal::modem::Modem;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::ipv4::{self, ClientSettings};
use esp_idf_svc::netif::{EspNetif, NetifConfiguration};
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration, EspWifi};
use log::{debug, info};
use std::net::Ipv4Addr;

/// WiFi station on ESP32.
pub struct EspWifiNetwork<'a> {
    wifi: EspWifi<'a>,
}

impl<'a> EspWifiNetwork<'a> {
    /// Create the WiFi driver.
    ///
    /// # Arguments
    ///
    /// * `modem` - The WiFi/BT modem peripheral
    /// * `sysloop` - The ESP-IDF system event loop
    /// * `nvs` - Default NVS partition, used by the driver for calibration data
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: Option<EspDefaultNvsPartition>,
    ) -> Result<Self, NetworkError> {
        let wifi = EspWifi::new(modem, sysloop, nvs)?;
        Ok(Self { wifi })
    }
}

impl NetworkProvider for EspWifiNetwork<'_> {
    fn begin(&mut self, wifi: &WifiConfig) -> Result<(), NetworkError> {
        info!("Joining WiFi: {}", wifi.ssid);

        let auth_method = if wifi.is_open() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };

        let client = Configuration::Client(ClientConfiguration {
            ssid: wifi
                .ssid
                .as_str()
                .try_into()
                .map_err(|_| NetworkError::InvalidCredentials)?,
            password: wifi
                .password
                .as_str()
                .try_into()
                .map_err(|_| NetworkError::InvalidCredentials)?,
            auth_method,
            ..Default::default()
        });

        if self.wifi.is_started()? {
            // Drop any half-open association before retrying
            if let Err(e) = self.wifi.disconnect() {
                debug!("Disconnect before rejoin failed: {:?}", e);
            }
        }

        self.wifi.set_configuration(&client)?;
        if !self.wifi.is_started()? {
            self.wifi.start()?;
        }
        self.wifi.connect()?;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.wifi.is_up().unwrap_or(false)
    }

    fn ip_info(&self) -> Option<IpInfo> {
        if !self.is_connected() {
            return None;
        }
        let info = self.wifi.sta_netif().get_ip_info().ok()?;
        Some(IpInfo {
            ip: info.ip,
            gateway: info.subnet.gateway,
            netmask: netmask_from_prefix(info.subnet.mask.0),
        })
    }

    fn set_static_ip(&mut self, ip: Ipv4Addr) -> Result<(), NetworkError> {
        let current = self.wifi.sta_netif().get_ip_info()?;

        let netif_config = NetifConfiguration {
            ip_configuration: Some(ipv4::Configuration::Client(
                ipv4::ClientConfiguration::Fixed(ClientSettings {
                    ip,
                    subnet: current.subnet,
                    dns: current.dns,
                    secondary_dns: current.secondary_dns,
                }),
            )),
            ..NetifConfiguration::wifi_default_client()
        };

        let netif = EspNetif::new_with_conf(&netif_config)
            .map_err(|e| NetworkError::StaticIp(format!("{:?}", e)))?;
        self.wifi
            .swap_netif_sta(netif)
            .map_err(|e| NetworkError::StaticIp(format!("{:?}", e)))?;

        info!("Static address {} applied", ip);
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), NetworkError> {
        info!("Disconnecting from WiFi");
        self.wifi.disconnect()?;
        Ok(())
    }
}
