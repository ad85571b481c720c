//! Poll client for the Doorbot device agent.
//!
//! The device cannot be reached from the server, so it polls: fetch the
//! current intent over HTTP, run one hardware unlock cycle when the
//! intent says so, sleep, repeat. Transport failures are counted and the
//! loop gives up after a configurable number of consecutive failures so
//! the device never polls an unreachable server forever without operator
//! visibility.

pub mod poll;
pub mod source;

pub use poll::{PollClient, PollConfig, PollExit};
pub use source::{HttpIntentSource, IntentSource, PollOutcome, TransportError};
