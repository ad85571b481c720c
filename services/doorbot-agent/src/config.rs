use doorbot_core::config::{env_millis_or, env_or, ConfigError};
use doorbot_sequencer::SequencerConfig;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_url: String,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub max_consecutive_failures: u32,
    pub sequencer: SequencerConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Config {
            server_url: env_or("DOORBOT_SERVER_URL", "http://127.0.0.1:8878".to_string())?,
            poll_interval: env_millis_or("DOORBOT_POLL_INTERVAL_MS", 1000)?,
            request_timeout: env_millis_or("DOORBOT_REQUEST_TIMEOUT_MS", 5000)?,
            max_consecutive_failures: env_or("DOORBOT_MAX_FAILURES", 10)?,
            sequencer: SequencerConfig {
                settle_delay: env_millis_or("DOORBOT_SETTLE_MS", 500)?,
                sensor_poll_interval: env_millis_or("DOORBOT_SENSOR_POLL_MS", 100)?,
                sensor_timeout: env_millis_or("DOORBOT_SENSOR_TIMEOUT_MS", 10_000)?,
                hold_duration: env_millis_or("DOORBOT_HOLD_MS", 10_000)?,
                duty_cycle: env_or("DOORBOT_DUTY_CYCLE", 50.0)?,
            },
        })
    }
}
