//! The unlock-cycle state machine.

use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::io::{DigitalIo, Direction, IoError, Position};

/// Sequencer states. One cycle walks the active states in order; `Faulted`
/// is reachable from any of them and always drains back to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerState {
    Idle,
    PoweringOn,
    Unlocking,
    HoldingOpen,
    Relocking,
    PoweringOff,
    Faulted,
}

impl fmt::Display for SequencerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SequencerState::Idle => "idle",
            SequencerState::PoweringOn => "powering-on",
            SequencerState::Unlocking => "unlocking",
            SequencerState::HoldingOpen => "holding-open",
            SequencerState::Relocking => "relocking",
            SequencerState::PoweringOff => "powering-off",
            SequencerState::Faulted => "faulted",
        };
        f.write_str(name)
    }
}

/// Sequencer errors
#[derive(Debug, Error)]
pub enum SequencerError {
    /// Hardware I/O failed; fail-safe cleanup has already run
    #[error("actuator fault while {state}: {source}")]
    ActuatorFault {
        /// State in which the fault occurred
        state: SequencerState,
        /// The underlying I/O failure
        #[source]
        source: IoError,
    },

    /// Shutdown was signaled mid-cycle; fail-safe cleanup has already run
    #[error("cycle canceled while {state}")]
    Canceled {
        /// State in which cancellation was observed
        state: SequencerState,
    },
}

/// Timing and drive parameters for one unlock cycle.
#[derive(Debug, Clone)]
pub struct SequencerConfig {
    /// Delay after energizing the relay before driving.
    pub settle_delay: Duration,
    /// Interval between position-sensor reads.
    pub sensor_poll_interval: Duration,
    /// Upper bound on waiting for either sensor position.
    pub sensor_timeout: Duration,
    /// How long the door is held unlocked.
    pub hold_duration: Duration,
    /// PWM duty cycle for the drive, in percent.
    pub duty_cycle: f32,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(500),
            sensor_poll_interval: Duration::from_millis(100),
            sensor_timeout: Duration::from_secs(10),
            hold_duration: Duration::from_secs(10),
            duty_cycle: 50.0,
        }
    }
}

/// Outcome of a completed cycle.
///
/// A `false` confirmation means the position sensor timed out during
/// that phase. That is a soft fault: logged, never retried, not an error.
#[derive(Debug, Clone, Copy)]
pub struct CycleReport {
    /// The sensor confirmed the unlocked position.
    pub unlock_confirmed: bool,
    /// The sensor confirmed the return to the locked position.
    pub relock_confirmed: bool,
}

impl CycleReport {
    /// True when either phase finished on sensor timeout.
    pub fn soft_fault(&self) -> bool {
        !self.unlock_confirmed || !self.relock_confirmed
    }
}

/// Drives the lock hardware through one unlock-hold-relock cycle.
///
/// Owns the I/O capability exclusively for its lifetime; `run_cycle`
/// takes `&mut self`, so overlapping cycles cannot be expressed.
pub struct Sequencer<IO: DigitalIo> {
    io: IO,
    config: SequencerConfig,
    state: SequencerState,
    shutdown: watch::Receiver<bool>,
}

impl<IO: DigitalIo> Sequencer<IO> {
    pub fn new(io: IO, config: SequencerConfig, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            io,
            config,
            state: SequencerState::Idle,
            shutdown,
        }
    }

    /// Current state; `Idle` between cycles.
    pub fn state(&self) -> SequencerState {
        self.state
    }

    /// The underlying I/O capability.
    pub fn io(&self) -> &IO {
        &self.io
    }

    /// Run one full unlock cycle.
    ///
    /// Blocks (in async terms) for the whole cycle: settle delay, sensor
    /// waits, and hold duration. On any I/O fault or shutdown signal the
    /// fail-safe cleanup runs before the error is returned, so the
    /// post-condition is always "drive stopped, relay off".
    pub async fn run_cycle(&mut self) -> Result<CycleReport, SequencerError> {
        info!("unlock cycle starting");
        match self.drive_cycle().await {
            Ok(report) => {
                self.transition(SequencerState::Idle);
                if report.soft_fault() {
                    warn!(
                        unlock_confirmed = report.unlock_confirmed,
                        relock_confirmed = report.relock_confirmed,
                        "unlock cycle complete with unconfirmed position"
                    );
                } else {
                    info!("unlock cycle complete");
                }
                Ok(report)
            }
            Err(error) => {
                self.transition(SequencerState::Faulted);
                self.park();
                self.transition(SequencerState::Idle);
                Err(error)
            }
        }
    }

    /// Fail-safe cleanup: stop the drive and de-energize the relay.
    ///
    /// Both are attempted unconditionally; a failure here is logged and
    /// swallowed because there is nothing safer left to do.
    pub fn park(&mut self) {
        if let Err(error) = self.io.stop_drive() {
            warn!(%error, "fail-safe: stop_drive failed");
        }
        if let Err(error) = self.io.set_relay(false) {
            warn!(%error, "fail-safe: relay off failed");
        }
    }

    async fn drive_cycle(&mut self) -> Result<CycleReport, SequencerError> {
        self.transition(SequencerState::PoweringOn);
        self.io.set_relay(true).map_err(|e| self.fault(e))?;
        self.pause(self.config.settle_delay).await?;

        self.transition(SequencerState::Unlocking);
        self.io
            .set_direction(Direction::Unlock)
            .map_err(|e| self.fault(e))?;
        self.io
            .start_drive(self.config.duty_cycle)
            .map_err(|e| self.fault(e))?;
        let unlock_confirmed = self.await_position(Position::Unlocked).await?;
        self.io.stop_drive().map_err(|e| self.fault(e))?;

        self.transition(SequencerState::HoldingOpen);
        self.pause(self.config.hold_duration).await?;

        self.transition(SequencerState::Relocking);
        self.io
            .set_direction(Direction::Relock)
            .map_err(|e| self.fault(e))?;
        self.io
            .start_drive(self.config.duty_cycle)
            .map_err(|e| self.fault(e))?;
        let relock_confirmed = self.await_position(Position::Locked).await?;
        self.io.stop_drive().map_err(|e| self.fault(e))?;

        self.transition(SequencerState::PoweringOff);
        self.io.set_relay(false).map_err(|e| self.fault(e))?;

        Ok(CycleReport {
            unlock_confirmed,
            relock_confirmed,
        })
    }

    /// Poll the sensor until it reports `target` or the sensor timeout
    /// elapses. Returns whether the position was confirmed; a timeout is
    /// a soft fault, not an error.
    async fn await_position(&mut self, target: Position) -> Result<bool, SequencerError> {
        let deadline = Instant::now() + self.config.sensor_timeout;
        loop {
            let position = self.io.read_position().map_err(|e| self.fault(e))?;
            if position == target {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                warn!(
                    state = %self.state,
                    target = ?target,
                    timeout_ms = self.config.sensor_timeout.as_millis() as u64,
                    "position sensor timeout"
                );
                return Ok(false);
            }
            self.pause(self.config.sensor_poll_interval).await?;
        }
    }

    /// Sleep for `duration`, waking early if shutdown is signaled.
    async fn pause(&mut self, duration: Duration) -> Result<(), SequencerError> {
        if *self.shutdown.borrow() {
            return Err(SequencerError::Canceled { state: self.state });
        }
        tokio::select! {
            _ = tokio::time::sleep(duration) => Ok(()),
            // Any signal (or a dropped sender) cancels the cycle.
            _ = self.shutdown.changed() => Err(SequencerError::Canceled { state: self.state }),
        }
    }

    fn transition(&mut self, next: SequencerState) {
        info!(from = %self.state, to = %next, "sequencer transition");
        self.state = next;
    }

    fn fault(&self, source: IoError) -> SequencerError {
        SequencerError::ActuatorFault {
            state: self.state,
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Which I/O call to fail, and on which invocation (1-based).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum FailPoint {
        Relay(u32),
        SetDirection(u32),
        StartDrive(u32),
        StopDrive(u32),
        ReadPosition(u32),
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Op {
        Relay(bool),
        SetDirection(Direction),
        StartDrive,
        StopDrive,
        ReadPosition,
    }

    /// Scripted lock hardware: the position follows the drive direction
    /// when the corresponding `reaches_*` flag is set, and a single
    /// scripted call can be made to fail.
    struct FakeIo {
        relay: bool,
        driving: bool,
        direction: Direction,
        position: Position,
        reaches_unlocked: bool,
        reaches_locked: bool,
        fail_at: Option<FailPoint>,
        relay_calls: u32,
        direction_calls: u32,
        start_calls: u32,
        stop_calls: u32,
        read_calls: u32,
        ops: Vec<Op>,
    }

    impl FakeIo {
        fn new() -> Self {
            Self {
                relay: false,
                driving: false,
                direction: Direction::Relock,
                position: Position::Locked,
                reaches_unlocked: true,
                reaches_locked: true,
                fail_at: None,
                relay_calls: 0,
                direction_calls: 0,
                start_calls: 0,
                stop_calls: 0,
                read_calls: 0,
                ops: Vec::new(),
            }
        }

        fn failing_at(fail_at: FailPoint) -> Self {
            Self {
                fail_at: Some(fail_at),
                ..Self::new()
            }
        }

        fn trip(&mut self, point: FailPoint) -> Result<(), IoError> {
            if self.fail_at == Some(point) {
                self.fail_at = None;
                return Err(IoError("injected".to_string()));
            }
            Ok(())
        }
    }

    impl DigitalIo for FakeIo {
        fn set_relay(&mut self, on: bool) -> Result<(), IoError> {
            self.relay_calls += 1;
            self.trip(FailPoint::Relay(self.relay_calls))?;
            self.relay = on;
            self.ops.push(Op::Relay(on));
            Ok(())
        }

        fn set_direction(&mut self, direction: Direction) -> Result<(), IoError> {
            self.direction_calls += 1;
            self.trip(FailPoint::SetDirection(self.direction_calls))?;
            self.direction = direction;
            self.ops.push(Op::SetDirection(direction));
            Ok(())
        }

        fn start_drive(&mut self, _duty_cycle: f32) -> Result<(), IoError> {
            self.start_calls += 1;
            self.trip(FailPoint::StartDrive(self.start_calls))?;
            self.driving = true;
            self.ops.push(Op::StartDrive);
            Ok(())
        }

        fn stop_drive(&mut self) -> Result<(), IoError> {
            self.stop_calls += 1;
            self.trip(FailPoint::StopDrive(self.stop_calls))?;
            self.driving = false;
            self.ops.push(Op::StopDrive);
            Ok(())
        }

        fn read_position(&mut self) -> Result<Position, IoError> {
            self.read_calls += 1;
            self.trip(FailPoint::ReadPosition(self.read_calls))?;
            if self.driving {
                match self.direction {
                    Direction::Unlock if self.reaches_unlocked => {
                        self.position = Position::Unlocked;
                    }
                    Direction::Relock if self.reaches_locked => {
                        self.position = Position::Locked;
                    }
                    _ => {}
                }
            }
            self.ops.push(Op::ReadPosition);
            Ok(self.position)
        }
    }

    fn fast_config() -> SequencerConfig {
        SequencerConfig {
            settle_delay: Duration::from_millis(1),
            sensor_poll_interval: Duration::from_millis(2),
            sensor_timeout: Duration::from_millis(20),
            hold_duration: Duration::from_millis(5),
            duty_cycle: 50.0,
        }
    }

    /// The sender must stay alive: a dropped sender reads as shutdown.
    fn sequencer(io: FakeIo) -> (watch::Sender<bool>, Sequencer<FakeIo>) {
        let (tx, rx) = watch::channel(false);
        (tx, Sequencer::new(io, fast_config(), rx))
    }

    #[tokio::test]
    async fn test_happy_path_confirms_both_positions() {
        let (_tx, mut seq) = sequencer(FakeIo::new());

        let report = seq.run_cycle().await.unwrap();
        assert!(report.unlock_confirmed);
        assert!(report.relock_confirmed);
        assert!(!report.soft_fault());
        assert_eq!(seq.state(), SequencerState::Idle);

        let io = seq.io();
        assert!(!io.relay);
        assert!(!io.driving);
        // Relay on, unlock drive, relock drive, relay off, in that order.
        assert_eq!(io.ops.first(), Some(&Op::Relay(true)));
        assert_eq!(io.ops.last(), Some(&Op::Relay(false)));
        assert_eq!(
            io.ops.iter().filter(|op| **op == Op::StartDrive).count(),
            2
        );
        assert_eq!(io.ops.iter().filter(|op| **op == Op::StopDrive).count(), 2);
    }

    #[tokio::test]
    async fn test_sensor_never_unlocks_is_soft_fault() {
        let mut io = FakeIo::new();
        io.reaches_unlocked = false;
        let (_tx, mut seq) = sequencer(io);

        let report = seq.run_cycle().await.unwrap();
        assert!(!report.unlock_confirmed);
        assert!(report.relock_confirmed);
        assert!(report.soft_fault());

        // Cycle still completed and parked the hardware.
        assert_eq!(seq.state(), SequencerState::Idle);
        assert!(!seq.io().relay);
        assert!(!seq.io().driving);
    }

    #[tokio::test]
    async fn test_sensor_never_relocks_is_soft_fault_no_retry() {
        let mut io = FakeIo::new();
        io.reaches_locked = false;
        let (_tx, mut seq) = sequencer(io);

        let report = seq.run_cycle().await.unwrap();
        assert!(report.unlock_confirmed);
        assert!(!report.relock_confirmed);

        // Exactly one relock attempt; timeouts are never retried.
        assert_eq!(seq.io().start_calls, 2);
        assert!(!seq.io().relay);
        assert!(!seq.io().driving);
    }

    #[tokio::test]
    async fn test_fault_in_each_active_state_leaves_hardware_parked() {
        let cases = [
            FailPoint::Relay(1),         // PoweringOn
            FailPoint::SetDirection(1),  // Unlocking
            FailPoint::StartDrive(1),    // Unlocking
            FailPoint::ReadPosition(1),  // Unlocking (sensor wait)
            FailPoint::StopDrive(1),     // leaving Unlocking
            FailPoint::SetDirection(2),  // Relocking
            FailPoint::StartDrive(2),    // Relocking
            FailPoint::StopDrive(2),     // leaving Relocking
            FailPoint::Relay(2),         // PoweringOff
        ];

        for fail_at in cases {
            let (_tx, mut seq) = sequencer(FakeIo::failing_at(fail_at));
            let error = seq.run_cycle().await.unwrap_err();
            assert!(
                matches!(error, SequencerError::ActuatorFault { .. }),
                "{fail_at:?}: expected actuator fault, got {error}"
            );
            assert_eq!(seq.state(), SequencerState::Idle, "{fail_at:?}");
            assert!(!seq.io().relay, "{fail_at:?}: relay still energized");
            assert!(!seq.io().driving, "{fail_at:?}: drive still running");
        }
    }

    #[tokio::test]
    async fn test_fault_error_names_failing_state() {
        let (_tx, mut seq) = sequencer(FakeIo::failing_at(FailPoint::Relay(1)));
        match seq.run_cycle().await.unwrap_err() {
            SequencerError::ActuatorFault { state, .. } => {
                assert_eq!(state, SequencerState::PoweringOn);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_shutdown_mid_hold_parks_hardware() {
        let (tx, rx) = watch::channel(false);
        let mut config = fast_config();
        config.hold_duration = Duration::from_secs(60);
        let mut seq = Sequencer::new(FakeIo::new(), config, rx);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            let _ = tx.send(true);
        });

        let error = seq.run_cycle().await.unwrap_err();
        assert!(matches!(
            error,
            SequencerError::Canceled {
                state: SequencerState::HoldingOpen
            }
        ));
        assert_eq!(seq.state(), SequencerState::Idle);
        assert!(!seq.io().relay);
        assert!(!seq.io().driving);
    }

    #[tokio::test]
    async fn test_shutdown_already_signaled_cancels_before_driving() {
        let (tx, rx) = watch::channel(true);
        let mut seq = Sequencer::new(FakeIo::new(), fast_config(), rx);
        drop(tx);

        let error = seq.run_cycle().await.unwrap_err();
        assert!(matches!(error, SequencerError::Canceled { .. }));
        // Relay was energized in PoweringOn, then parked by cleanup.
        assert!(!seq.io().relay);
        assert!(!seq.io().driving);
    }
}
