//! Button pusher ESP32 firmware library.
//!
//! Drives a servo over a tiny HTTP control surface on the local WiFi network.
//! Everything except the ESP-IDF drivers is platform-independent and tested
//! on the host machine.

pub mod config;
pub mod controller;
pub mod network;
pub mod server;
pub mod servo;

// Re-export commonly used items
pub use config::{ConfigError, ConnectPolicy, DeviceConfig, ServoConfig, WifiConfig};
pub use controller::{DeviceController, SuperviseOutcome};
pub use network::{HostNetwork, IpInfo, NetworkError, NetworkProvider};
pub use server::{ControlServer, Reply, Router};
pub use servo::{Actuator, Angle, Servo, ServoError, SimulatedServo};
