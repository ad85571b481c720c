//! The polling loop: fetch intent, actuate, account for failures.

use doorbot_sequencer::{DigitalIo, Sequencer, SequencerError};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::source::IntentSource;

/// Poll loop tunables.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Sleep between polls, regardless of outcome.
    pub poll_interval: Duration,
    /// Consecutive transport failures tolerated before giving up.
    pub max_consecutive_failures: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            max_consecutive_failures: 10,
        }
    }
}

/// Why the poll loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollExit {
    /// Shutdown was signaled.
    Shutdown,
    /// The consecutive-failure threshold was reached.
    FailureThreshold {
        /// Failure count at exit (equals the configured maximum).
        failures: u32,
    },
}

/// Single sequential poll loop driving the hardware sequencer.
///
/// One unlock cycle must complete (or fault) before the next poll is
/// issued; overlapping actuation is unsafe, so there is deliberately no
/// concurrency here. Sequencer faults are logged and surfaced but never
/// stop polling; only the transport failure threshold does.
pub struct PollClient<S: IntentSource, IO: DigitalIo> {
    source: S,
    sequencer: Sequencer<IO>,
    config: PollConfig,
    failures: u32,
    shutdown: watch::Receiver<bool>,
}

impl<S: IntentSource, IO: DigitalIo> PollClient<S, IO> {
    pub fn new(
        source: S,
        sequencer: Sequencer<IO>,
        config: PollConfig,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            source,
            sequencer,
            config,
            failures: 0,
            shutdown,
        }
    }

    /// Current consecutive-failure count.
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// The sequencer this client drives.
    pub fn sequencer(&self) -> &Sequencer<IO> {
        &self.sequencer
    }

    /// Run the loop until shutdown or the failure threshold.
    pub async fn run(&mut self) -> PollExit {
        info!(
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            max_failures = self.config.max_consecutive_failures,
            "poll loop starting"
        );

        loop {
            if *self.shutdown.borrow() {
                return PollExit::Shutdown;
            }

            let outcome = tokio::select! {
                outcome = self.source.fetch() => outcome,
                _ = self.shutdown.changed() => return PollExit::Shutdown,
            };

            match outcome {
                Ok(snapshot) => {
                    self.failures = 0;
                    if snapshot.letmein {
                        info!(
                            user = snapshot.last_unlock_user.as_deref().unwrap_or("anonymous"),
                            "unlock requested"
                        );
                        match self.sequencer.run_cycle().await {
                            Ok(report) if report.soft_fault() => {
                                warn!("cycle completed with unconfirmed position");
                            }
                            Ok(_) => {}
                            Err(SequencerError::Canceled { .. }) => {
                                // Fail-safe cleanup already ran inside the cycle.
                                return PollExit::Shutdown;
                            }
                            Err(fault) => {
                                // Local to this cycle; keep polling.
                                error!(%fault, "unlock cycle aborted");
                            }
                        }
                    }
                }
                Err(transport) => {
                    self.failures += 1;
                    warn!(
                        %transport,
                        failures = self.failures,
                        max = self.config.max_consecutive_failures,
                        "poll failed"
                    );
                    if self.failures >= self.config.max_consecutive_failures {
                        error!(
                            failures = self.failures,
                            "too many consecutive failures, giving up"
                        );
                        return PollExit::FailureThreshold {
                            failures: self.failures,
                        };
                    }
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.config.poll_interval) => {}
                _ = self.shutdown.changed() => return PollExit::Shutdown,
            }
        }
    }
}
