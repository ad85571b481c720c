//! Digital I/O capability consumed by the sequencer.
//!
//! Implementations wrap the actual pin driver (GPIO relay, motor
//! direction pin, PWM drive, position-sensor input). The sequencer is
//! generic over this trait so tests and the simulated agent inject
//! software implementations.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Actuator drive direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Turn the mechanism toward the unlocked position.
    Unlock,
    /// Turn the mechanism back toward the locked position.
    Relock,
}

/// Binary position-sensor reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Position {
    Locked,
    Unlocked,
}

/// A hardware I/O failure reported by the pin driver.
#[derive(Debug, Error)]
#[error("digital I/O fault: {0}")]
pub struct IoError(pub String);

/// Raw pin access for the lock hardware.
///
/// Every method may fail; the sequencer treats any failure as an
/// actuator fault and runs its fail-safe cleanup.
pub trait DigitalIo {
    /// Energize or de-energize the power relay.
    fn set_relay(&mut self, on: bool) -> Result<(), IoError>;

    /// Select the actuator drive direction.
    fn set_direction(&mut self, direction: Direction) -> Result<(), IoError>;

    /// Start continuous drive at the given PWM duty cycle (percent).
    fn start_drive(&mut self, duty_cycle: f32) -> Result<(), IoError>;

    /// Stop the drive.
    fn stop_drive(&mut self) -> Result<(), IoError>;

    /// Read the position sensor.
    fn read_position(&mut self) -> Result<Position, IoError>;
}
