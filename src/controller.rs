//! Device controller.
//!
//! Owns the network provider, the servo and the control server, and runs the
//! two phases of the firmware:
//!
//! 1. [`DeviceController::setup`] - park the servo, join the network, apply
//!    the static address and start the control server.
//! 2. [`DeviceController::run`] - supervise the link forever, rejoining with
//!    the same poll/timeout policy whenever it drops.
//!
//! If the first join fails, the control server is started by the first
//! supervision pass that finds the link up.

use crate::config::DeviceConfig;
use crate::network::{join_network, JoinPhase, NetworkProvider};
use crate::server::{control_routes, ControlServer};
use crate::servo::Servo;
use log::{error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread;

/// Result of one supervision pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuperviseOutcome {
    /// Link was up; nothing to repair.
    Healthy,
    /// Link was down and has been re-established.
    Reconnected,
    /// Link was down and the rejoin timed out; retried next pass.
    ReconnectFailed,
}

/// The firmware's single top-level component.
pub struct DeviceController<N: NetworkProvider> {
    config: DeviceConfig,
    network: N,
    servo: Arc<Servo>,
    server: Option<ControlServer>,
}

impl<N: NetworkProvider> DeviceController<N> {
    /// Create a controller. Nothing is started until [`Self::setup`].
    pub fn new(config: DeviceConfig, network: N, servo: Servo) -> Self {
        Self {
            config,
            network,
            servo: Arc::new(servo),
            server: None,
        }
    }

    /// Run the startup sequence once.
    ///
    /// Returns whether the network was joined. Failure is only logged; the
    /// device carries on into supervision either way.
    pub fn setup(&mut self) -> bool {
        self.config.log_summary();

        if let Err(e) = self.servo.rest() {
            warn!("Could not park servo at rest: {}", e);
        }

        match join_network(
            &mut self.network,
            &self.config.wifi,
            &self.config.connect,
            JoinPhase::Initial,
        ) {
            Ok(()) => {
                self.apply_static_ip();
                info!("Connected to WiFi");
                self.ensure_server();
                self.log_addressing();
                true
            }
            Err(e) => {
                error!("Failed to connect to WiFi: {}", e);
                false
            }
        }
    }

    /// Check the link once and repair it if it dropped.
    pub fn supervise_once(&mut self) -> SuperviseOutcome {
        if self.network.is_connected() {
            self.ensure_server();
            return SuperviseOutcome::Healthy;
        }

        warn!("WiFi connection lost, attempting to reconnect...");
        match join_network(
            &mut self.network,
            &self.config.wifi,
            &self.config.connect,
            JoinPhase::Reconnect,
        ) {
            Ok(()) => {
                info!("Reconnected to WiFi");
                self.apply_static_ip();
                self.ensure_server();
                self.log_addressing();
                SuperviseOutcome::Reconnected
            }
            Err(e) => {
                error!("Failed to reconnect to WiFi: {}", e);
                SuperviseOutcome::ReconnectFailed
            }
        }
    }

    /// Supervise the link forever.
    pub fn run(mut self) -> ! {
        info!("Entering supervision loop");
        loop {
            self.supervise_once();
            thread::sleep(self.config.connect.check_interval);
        }
    }

    /// Bound address of the control server, once started.
    pub fn server_addr(&self) -> Option<SocketAddr> {
        self.server.as_ref().map(ControlServer::local_addr)
    }

    /// Shared servo handle.
    pub fn servo(&self) -> &Arc<Servo> {
        &self.servo
    }

    /// The network provider.
    pub fn network(&self) -> &N {
        &self.network
    }

    fn apply_static_ip(&mut self) {
        let Some(target) = self.config.static_ip else {
            return;
        };
        if self.network.ip_info().map(|info| info.ip) == Some(target) {
            return;
        }
        // Keep whatever address was assigned if this fails
        if let Err(e) = self.network.set_static_ip(target) {
            warn!("STA Failed to configure: {}", e);
        }
    }

    fn ensure_server(&mut self) {
        if self.server.is_some() {
            return;
        }
        let router = control_routes(self.servo.clone(), self.config.servo);
        match ControlServer::start(None, self.config.http_port, router) {
            Ok(server) => {
                info!("Server started");
                self.server = Some(server);
            }
            Err(e) => error!("Failed to start control server: {}", e),
        }
    }

    fn log_addressing(&self) {
        if let Some(info) = self.network.ip_info() {
            info.log();
        }
    }
}
