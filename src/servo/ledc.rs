//! LEDC PWM servo driver (ESP32 only).
//!
//! Drives a hobby servo (SG90/MG90S class) with a 50 Hz signal whose pulse
//! width maps linearly from 500 µs at 0° to 2500 µs at 180°.

use super::{Actuator, Angle, ServoError};
use esp_idf_hal::ledc::config::TimerConfig;
use esp_idf_hal::ledc::{LedcDriver, Resolution};
use esp_idf_hal::units::FromValueType;

/// Servo PWM frequency.
const PWM_FREQ_HZ: u32 = 50;
/// Pulse width at 0°.
const MIN_PULSE_US: u32 = 500;
/// Pulse width at 180°.
const MAX_PULSE_US: u32 = 2500;
/// Signal period at 50 Hz.
const PERIOD_US: u32 = 20_000;

/// LEDC timer settings for a 50 Hz servo signal.
pub fn servo_timer_config() -> TimerConfig {
    TimerConfig::default()
        .frequency(PWM_FREQ_HZ.Hz().into())
        .resolution(Resolution::Bits14)
}

/// Servo on an LEDC channel.
pub struct LedcServo<'d> {
    ledc: LedcDriver<'d>,
    max_duty: u32,
}

impl<'d> LedcServo<'d> {
    /// Wrap a channel driver whose timer uses [`servo_timer_config`].
    pub fn new(ledc: LedcDriver<'d>) -> Self {
        let max_duty = ledc.get_max_duty();
        Self { ledc, max_duty }
    }

    fn angle_to_duty(&self, angle: Angle) -> u32 {
        let degrees = angle.degrees() as u32;
        let pulse_us =
            MIN_PULSE_US + degrees * (MAX_PULSE_US - MIN_PULSE_US) / Angle::MAX.degrees() as u32;
        pulse_us * self.max_duty / PERIOD_US
    }
}

impl Actuator for LedcServo<'_> {
    fn set_angle(&mut self, angle: Angle) -> Result<(), ServoError> {
        let duty = self.angle_to_duty(angle);
        self.ledc
            .set_duty(duty)
            .map_err(|e| ServoError::Driver(format!("{:?}", e)))
    }
}
