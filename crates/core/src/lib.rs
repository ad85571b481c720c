//! Core functionality for the Doorbot remote door-lock system.
//!
//! This crate provides the shared data model, wire types, configuration
//! helpers, and logging setup used across the Doorbot workspace.

pub mod config;
pub mod logging;
pub mod types;

pub use config::ConfigError;
pub use types::{
    CommandAck, CommandEnvelope, DoorIntent, IntentSnapshot, SoundRegistration, StatusPayload,
};
