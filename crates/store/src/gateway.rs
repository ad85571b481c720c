//! Command gateway: validates inbound payloads and mutates the store.

use doorbot_core::types::{CommandEnvelope, DoorIntent, SoundRegistration};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

use crate::intent::IntentStore;

/// Gateway errors
#[derive(Debug, Error)]
pub enum CommandError {
    /// The command payload is malformed; the store is left unchanged
    #[error("Invalid data format: {0}")]
    Validation(String),
}

/// Validates door commands and applies them to an [`IntentStore`].
#[derive(Debug, Clone)]
pub struct Gateway {
    store: IntentStore,
    auto_revert: Duration,
}

impl Gateway {
    /// Create a gateway applying `auto_revert` to every accepted unlock.
    pub fn new(store: IntentStore, auto_revert: Duration) -> Self {
        Self { store, auto_revert }
    }

    /// The store this gateway mutates.
    pub fn store(&self) -> &IntentStore {
        &self.store
    }

    /// Validate and apply a raw command payload.
    ///
    /// A payload missing `status.letmein` is rejected with
    /// [`CommandError::Validation`] and the store is left unchanged.
    /// Returns the resulting intent on success.
    pub async fn apply(&self, payload: Value) -> Result<DoorIntent, CommandError> {
        let envelope: CommandEnvelope = serde_json::from_value(payload).map_err(|e| {
            warn!(error = %e, "rejected command: undecodable payload");
            CommandError::Validation(e.to_string())
        })?;

        let letmein = envelope
            .status
            .as_ref()
            .and_then(|status| status.letmein)
            .ok_or_else(|| {
                warn!("rejected command: missing status.letmein");
                CommandError::Validation("missing status.letmein".to_string())
            })?;

        let sound = envelope.status.as_ref().and_then(|status| status.sound.as_deref());
        let revert = letmein.then_some(self.auto_revert);
        Ok(self
            .store
            .set_intent(letmein, revert, envelope.user.as_deref(), sound)
            .await)
    }

    /// Validate and apply a sound registration payload.
    ///
    /// A payload missing the `sounds` field is rejected with
    /// [`CommandError::Validation`]. Returns the registered count.
    pub async fn register_sounds(&self, payload: Value) -> Result<usize, CommandError> {
        let registration: SoundRegistration = serde_json::from_value(payload).map_err(|e| {
            warn!(error = %e, "rejected sound registration: undecodable payload");
            CommandError::Validation(e.to_string())
        })?;

        let sounds = registration.sounds.ok_or_else(|| {
            warn!("rejected sound registration: missing sounds field");
            CommandError::Validation("missing sounds field".to_string())
        })?;

        Ok(self.store.set_sounds(sounds).await)
    }
}
