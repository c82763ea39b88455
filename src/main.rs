//! Button pusher firmware binary.
//!
//! Runs on both ESP32 and host platforms:
//! - **ESP32**: `WIFI_SSID=.. WIFI_PASSWORD=.. cargo espflash flash --features esp32 --release`
//! - **Host**: `WIFI_SSID=dev PUSHER_HTTP_PORT=8080 cargo run`
//!   (simulated servo, the OS provides networking)
//!
//! ## Endpoints
//!
//! - `GET /press` - press with the configured angle and duration
//! - `GET /test?angle=<0-180>&duration=<ms>` - press with explicit values
//! - `GET /areyoualive` - liveness probe

use button_pusher_esp32::DeviceConfig;
use log::info;

/// Print error message and halt. On ESP32, pause briefly first so the serial
/// monitor shows the output before the task exits.
fn halt_with_error(msg: &str) -> ! {
    eprintln!("\n{}", msg);
    eprintln!("\n=== Startup failed ===\n");
    std::thread::sleep(std::time::Duration::from_secs(2));
    std::process::exit(1);
}

fn load_config() -> DeviceConfig {
    match DeviceConfig::from_build_env() {
        Ok(config) => config,
        Err(e) => halt_with_error(&format!(
            "Error: {}\n\n\
             Configuration is compiled in. Usage:\n  \
             WIFI_SSID=\"MyNetwork\" WIFI_PASSWORD=\"secret123\" cargo build --features esp32\n\n\
             Optional: PUSHER_STATIC_IP, PUSHER_SERVO_PIN, PUSHER_PRESS_ANGLE,\n\
             PUSHER_PRESS_DURATION_MS, PUSHER_HTTP_PORT",
            e
        )),
    }
}

#[cfg(feature = "esp32")]
fn main() {
    // Link ESP-IDF patches (must be first!)
    esp_idf_sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    info!("=== Button pusher starting ===");
    info!("Platform: ESP32");

    let config = load_config();
    let mut controller = match device::build(config) {
        Ok(controller) => controller,
        Err(e) => halt_with_error(&format!("Error: hardware init failed: {}", e)),
    };

    controller.setup();
    controller.run()
}

#[cfg(feature = "esp32")]
mod device {
    use button_pusher_esp32::network::EspWifiNetwork;
    use button_pusher_esp32::servo::{servo_timer_config, LedcServo};
    use button_pusher_esp32::{DeviceConfig, DeviceController, Servo};
    use esp_idf_hal::gpio::AnyOutputPin;
    use esp_idf_hal::ledc::{LedcDriver, LedcTimerDriver};
    use esp_idf_hal::peripherals::Peripherals;
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;
    use std::error::Error;

    /// Claim the peripherals and wire up servo and WiFi.
    pub fn build(
        config: DeviceConfig,
    ) -> Result<DeviceController<EspWifiNetwork<'static>>, Box<dyn Error>> {
        let peripherals = Peripherals::take()?;
        let sysloop = EspSystemEventLoop::take()?;
        let nvs = EspDefaultNvsPartition::take()?;

        let timer = LedcTimerDriver::new(peripherals.ledc.timer0, &servo_timer_config())?;
        // SAFETY: the pin number is fixed at build time and no other driver
        // in this firmware claims a GPIO by number.
        let pin = unsafe { AnyOutputPin::new(config.servo.pin as _) };
        let ledc = LedcDriver::new(peripherals.ledc.channel0, timer, pin)?;
        let servo = Servo::new(LedcServo::new(ledc));

        let network = EspWifiNetwork::new(peripherals.modem, sysloop, Some(nvs))?;

        Ok(DeviceController::new(config, network, servo))
    }
}

#[cfg(not(feature = "esp32"))]
fn main() {
    use button_pusher_esp32::{DeviceController, HostNetwork, Servo, SimulatedServo};

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("=== Button pusher starting ===");
    info!("Platform: Host (simulated servo)");

    let config = load_config();
    let mut controller =
        DeviceController::new(config, HostNetwork::new(), Servo::new(SimulatedServo::new()));

    controller.setup();
    controller.run()
}
