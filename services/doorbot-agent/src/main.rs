use doorbot_client::{HttpIntentSource, PollClient, PollConfig, PollExit};
use doorbot_sequencer::Sequencer;
use tokio::sync::watch;
use tracing::{info, warn};

mod config;
mod sim;

use config::Config;
use sim::SimulatedLock;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    doorbot_core::logging::init_from_env();

    let config = Config::from_env()?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        }
    });

    let source = HttpIntentSource::new(config.server_url.clone(), config.request_timeout)?;
    let sequencer = Sequencer::new(
        SimulatedLock::new(),
        config.sequencer.clone(),
        shutdown_rx.clone(),
    );
    let mut client = PollClient::new(
        source,
        sequencer,
        PollConfig {
            poll_interval: config.poll_interval,
            max_consecutive_failures: config.max_consecutive_failures,
        },
        shutdown_rx,
    );

    info!(server = %config.server_url, "Doorbot agent starting");

    match client.run().await {
        PollExit::Shutdown => {
            info!("agent stopped");
            Ok(())
        }
        PollExit::FailureThreshold { failures } => {
            warn!(failures, "agent giving up: server unreachable");
            anyhow::bail!("gave up after {failures} consecutive poll failures")
        }
    }
}
