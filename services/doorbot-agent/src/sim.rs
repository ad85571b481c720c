//! Software stand-in for the lock hardware.
//!
//! Lets the agent run end-to-end without a device attached: the position
//! sensor follows the drive direction after a few reads, as if the
//! mechanism took some travel time. Real GPIO plugs in behind the same
//! [`DigitalIo`] trait.

use doorbot_sequencer::{DigitalIo, Direction, IoError, Position};
use tracing::info;

/// Reads of the sensor before the simulated mechanism arrives.
const TRAVEL_READS: u32 = 3;

pub struct SimulatedLock {
    relay: bool,
    driving: bool,
    direction: Direction,
    position: Position,
    reads_in_travel: u32,
}

impl SimulatedLock {
    pub fn new() -> Self {
        Self {
            relay: false,
            driving: false,
            direction: Direction::Relock,
            position: Position::Locked,
            reads_in_travel: 0,
        }
    }
}

impl Default for SimulatedLock {
    fn default() -> Self {
        Self::new()
    }
}

impl DigitalIo for SimulatedLock {
    fn set_relay(&mut self, on: bool) -> Result<(), IoError> {
        self.relay = on;
        info!(on, "sim: relay");
        Ok(())
    }

    fn set_direction(&mut self, direction: Direction) -> Result<(), IoError> {
        self.direction = direction;
        info!(?direction, "sim: direction");
        Ok(())
    }

    fn start_drive(&mut self, duty_cycle: f32) -> Result<(), IoError> {
        self.driving = true;
        self.reads_in_travel = 0;
        info!(duty_cycle, "sim: drive started");
        Ok(())
    }

    fn stop_drive(&mut self) -> Result<(), IoError> {
        self.driving = false;
        info!("sim: drive stopped");
        Ok(())
    }

    fn read_position(&mut self) -> Result<Position, IoError> {
        if self.driving {
            self.reads_in_travel += 1;
            if self.reads_in_travel >= TRAVEL_READS {
                self.position = match self.direction {
                    Direction::Unlock => Position::Unlocked,
                    Direction::Relock => Position::Locked,
                };
            }
        }
        Ok(self.position)
    }
}
