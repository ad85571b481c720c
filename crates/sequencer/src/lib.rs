//! Hardware sequencer for the Doorbot device agent.
//!
//! Drives the physical lock actuator through one full
//! unlock-hold-relock cycle:
//!
//! ```text
//! Idle → PoweringOn → Unlocking → HoldingOpen → Relocking → PoweringOff → Idle
//!              │           │            │            │            │
//!              └───────────┴────────────┴────────────┴────────────┘
//!                          any I/O fault or cancellation
//!                                      │
//!                                   Faulted ──(fail-safe cleanup)── Idle
//! ```
//!
//! The hardware itself is reached through the [`DigitalIo`] capability
//! trait; the sequencer never touches pins directly. Whatever happens
//! (success, sensor timeout, I/O fault, shutdown mid-cycle), the
//! post-condition is always "drive stopped, relay off".

pub mod io;
pub mod sequencer;

pub use io::{DigitalIo, Direction, IoError, Position};
pub use sequencer::{CycleReport, Sequencer, SequencerConfig, SequencerError, SequencerState};
