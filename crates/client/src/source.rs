//! Intent fetching over the network boundary.

use doorbot_core::types::IntentSnapshot;
use std::time::Duration;
use thiserror::Error;

/// Transport errors
#[derive(Debug, Error)]
pub enum TransportError {
    /// Could not reach the server
    #[error("connection failed: {0}")]
    Connection(String),

    /// The request exceeded its bounded timeout
    #[error("request timed out")]
    Timeout,

    /// The server answered with something other than an intent snapshot
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// One poll cycle's result: the fetched intent or a transport failure.
pub type PollOutcome = Result<IntentSnapshot, TransportError>;

/// Source of door intent, as published by the command gateway.
///
/// The poll client only depends on this contract; tests substitute
/// scripted sources.
#[allow(async_fn_in_trait)]
pub trait IntentSource {
    /// Fetch the current intent snapshot.
    async fn fetch(&self) -> PollOutcome;
}

/// HTTP implementation: `GET` against the gateway with a bounded
/// per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpIntentSource {
    client: reqwest::Client,
    url: String,
}

impl HttpIntentSource {
    pub fn new(url: impl Into<String>, request_timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| TransportError::Connection(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

impl IntentSource for HttpIntentSource {
    async fn fetch(&self) -> PollOutcome {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout
                } else {
                    TransportError::Connection(e.to_string())
                }
            })?;

        let response = response
            .error_for_status()
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        response
            .json::<IntentSnapshot>()
            .await
            .map_err(|e| TransportError::Malformed(e.to_string()))
    }
}
