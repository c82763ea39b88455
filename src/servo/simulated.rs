//! Host stand-in for the PWM servo.
//!
//! Records every commanded angle so host runs and tests can observe motion.
//! Clones share the same record.

use super::{Actuator, Angle, ServoError};
use log::debug;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct Record {
    history: Vec<u8>,
    fail_next: bool,
}

/// Simulated servo for host builds.
#[derive(Debug, Clone, Default)]
pub struct SimulatedServo {
    record: Arc<Mutex<Record>>,
}

impl SimulatedServo {
    /// Create a simulated servo with an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Angles commanded so far, oldest first.
    pub fn history(&self) -> Vec<u8> {
        self.record
            .lock()
            .map(|r| r.history.clone())
            .unwrap_or_default()
    }

    /// Make the next command fail with a driver error.
    pub fn fail_next(&self) {
        if let Ok(mut record) = self.record.lock() {
            record.fail_next = true;
        }
    }
}

impl Actuator for SimulatedServo {
    fn set_angle(&mut self, angle: Angle) -> Result<(), ServoError> {
        let mut record = self
            .record
            .lock()
            .map_err(|_| ServoError::Driver("simulated servo poisoned".into()))?;

        if record.fail_next {
            record.fail_next = false;
            return Err(ServoError::Driver("simulated failure".into()));
        }

        debug!("Simulated servo -> {} degrees", angle);
        record.history.push(angle.degrees());
        Ok(())
    }
}
