//! Command store and gateway for the Doorbot server.
//!
//! This crate holds the server-side half of the unlock coordination
//! protocol:
//! - [`IntentStore`]: the single process-wide [`DoorIntent`] record, its
//!   auto-revert timer, and the activity log, all behind one exclusion
//!   domain.
//! - [`Gateway`]: validates inbound command payloads and mutates the store.
//!
//! # Auto-revert
//!
//! Every accepted unlock schedules a cancelable revert task that flips the
//! intent back to locked after a fixed delay. Issuing a new unlock command
//! aborts and replaces any pending task (last-writer-wins); a lock command
//! cancels it outright. A generation counter makes the replacement exact
//! even when an old task has already woken up and is waiting on the lock.

pub mod activity;
pub mod gateway;
pub mod intent;

pub use activity::ActivityEntry;
pub use gateway::{CommandError, Gateway};
pub use intent::IntentStore;
