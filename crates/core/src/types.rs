//! Shared data model and wire types for the Doorbot protocol.
//!
//! The wire format is JSON over HTTP, polled by the device agent:
//! - `GET /` returns an [`IntentSnapshot`]
//! - `POST /` accepts a [`CommandEnvelope`] and returns a [`CommandAck`]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The server's currently stored desired door state.
///
/// A single instance exists per store; it is mutated only by the command
/// gateway and read by any number of concurrent pollers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoorIntent {
    /// Whether an unlock has been requested.
    pub unlock: bool,
    /// Time of the most recent accepted command. `None` iff no command
    /// has ever been accepted.
    pub issued_at: Option<DateTime<Utc>>,
}

impl DoorIntent {
    /// The initial intent: locked, never commanded.
    pub fn locked() -> Self {
        Self {
            unlock: false,
            issued_at: None,
        }
    }
}

impl Default for DoorIntent {
    fn default() -> Self {
        Self::locked()
    }
}

/// Intent snapshot as rendered to pollers by `GET /`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentSnapshot {
    /// Current unlock intent.
    pub letmein: bool,
    /// RFC 3339 timestamp of the most recent accepted command.
    pub last_command_time: Option<String>,
    /// Caller identity of the most recent accepted unlock command.
    pub last_unlock_user: Option<String>,
    /// Sound requested by the most recent accepted command; empty when
    /// the command named none.
    #[serde(default)]
    pub sound: String,
    /// Sounds the device has registered via `POST /sounds`.
    #[serde(default)]
    pub sounds: Vec<String>,
}

/// Inner payload of a door command.
///
/// `letmein` is optional at the type level so the gateway can reject a
/// missing field with a validation error instead of a deserialization
/// failure, keeping the wire contract's 400 response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusPayload {
    /// Desired unlock state. Required; `None` is a validation error.
    pub letmein: Option<bool>,
    /// Sound to play on the device. Optional; absent reads as "none".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound: Option<String>,
}

/// Command envelope accepted by `POST /`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandEnvelope {
    /// The command payload. Required; `None` is a validation error.
    pub status: Option<StatusPayload>,
    /// Optional caller identity, recorded in the activity log.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

impl CommandEnvelope {
    /// Build a well-formed command envelope.
    pub fn new(letmein: bool) -> Self {
        Self {
            status: Some(StatusPayload {
                letmein: Some(letmein),
                sound: None,
            }),
            user: None,
        }
    }

    /// Attach a caller identity.
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }
}

/// Body accepted by `POST /sounds`: the device registering the sounds
/// it can play.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SoundRegistration {
    /// Available sound names. Required; `None` is a validation error.
    pub sounds: Option<Vec<String>>,
}

/// Acknowledgement returned by `POST /` on success.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandAck {
    /// Always `true`; failures use the error response shape instead.
    pub success: bool,
    /// The intent value that is now stored.
    pub letmein: bool,
}
