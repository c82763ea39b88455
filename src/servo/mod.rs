//! Servo actuation.
//!
//! The PWM driver sits behind the [`Actuator`] trait so the press logic runs
//! unchanged on ESP32 ([`LedcServo`]) and on the host ([`SimulatedServo`]).
//!
//! [`Servo`] is the single owner of the actuator. Every press holds its lock
//! from the first move until the servo is back at rest, so overlapping
//! requests serialize instead of interleaving angle commands.

#[cfg(feature = "esp32")]
mod ledc;
mod simulated;

#[cfg(feature = "esp32")]
pub use ledc::{servo_timer_config, LedcServo};
pub use simulated::SimulatedServo;

use log::{error, info};
use std::fmt;
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

/// Servo position in whole degrees, always within `0..=180`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Angle(u8);

impl Angle {
    /// Idle position.
    pub const REST: Angle = Angle(0);

    /// Largest commandable angle.
    pub const MAX: Angle = Angle(180);

    /// Validate an angle given in degrees.
    pub fn new(degrees: i64) -> Result<Self, ServoError> {
        if (0..=Self::MAX.0 as i64).contains(&degrees) {
            Ok(Self(degrees as u8))
        } else {
            Err(ServoError::AngleOutOfRange(degrees))
        }
    }

    /// Clamp to the valid range; usable in constants.
    pub const fn saturating(degrees: u8) -> Self {
        if degrees > Self::MAX.0 {
            Self::MAX
        } else {
            Self(degrees)
        }
    }

    /// Angle in degrees.
    pub fn degrees(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Angle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Low-level servo driver.
pub trait Actuator: Send {
    /// Command the horn to `angle`. Returns once the command is issued, not
    /// when the horn arrives.
    fn set_angle(&mut self, angle: Angle) -> Result<(), ServoError>;
}

/// Servo errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServoError {
    /// Requested angle is outside `0..=180`.
    AngleOutOfRange(i64),
    /// The PWM driver rejected the command.
    Driver(String),
}

impl fmt::Display for ServoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AngleOutOfRange(degrees) => {
                write!(f, "angle {} out of range (0-{})", degrees, Angle::MAX)
            }
            Self::Driver(msg) => write!(f, "servo driver error: {}", msg),
        }
    }
}

impl std::error::Error for ServoError {}

struct ServoState {
    actuator: Box<dyn Actuator>,
    angle: Angle,
}

/// Shared handle to the servo.
pub struct Servo {
    state: Mutex<ServoState>,
}

impl Servo {
    /// Wrap an actuator. The servo is assumed to be at rest until told otherwise.
    pub fn new(actuator: impl Actuator + 'static) -> Self {
        Self {
            state: Mutex::new(ServoState {
                actuator: Box::new(actuator),
                angle: Angle::REST,
            }),
        }
    }

    /// Move to the rest position.
    pub fn rest(&self) -> Result<(), ServoError> {
        let mut state = self.lock();
        Self::move_to(&mut state, Angle::REST)
    }

    /// Move to `angle`, hold for `hold`, then return to rest.
    ///
    /// Blocks the caller for the full hold. The return-to-rest command is
    /// issued even if the first move fails; the first error is reported.
    pub fn press(&self, angle: Angle, hold: Duration) -> Result<(), ServoError> {
        let mut state = self.lock();

        let pressed = Self::move_to(&mut state, angle);
        if pressed.is_ok() {
            info!("Servo moved to {} degrees", angle);
        }

        thread::sleep(hold);

        let rested = Self::move_to(&mut state, Angle::REST);
        if rested.is_ok() {
            info!(
                "Servo returned to {} degrees after {} ms",
                Angle::REST,
                hold.as_millis()
            );
        }

        pressed.and(rested)
    }

    /// Last angle successfully commanded.
    pub fn angle(&self) -> Angle {
        self.lock().angle
    }

    fn move_to(state: &mut ServoState, angle: Angle) -> Result<(), ServoError> {
        match state.actuator.set_angle(angle) {
            Ok(()) => {
                state.angle = angle;
                Ok(())
            }
            Err(e) => {
                error!("Failed to move servo to {} degrees: {}", angle, e);
                Err(e)
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, ServoState> {
        // A panic while holding the lock cannot leave the state inconsistent:
        // the recorded angle is only updated after a successful command.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
