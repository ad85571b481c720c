use doorbot_core::config::{env_or, ConfigError};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// How long an accepted unlock stays live before auto-reverting.
    pub auto_revert: Duration,
    pub activity_capacity: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Config {
            port: env_or("DOORBOT_PORT", 8878)?,
            auto_revert: Duration::from_secs(env_or("DOORBOT_AUTO_REVERT_SECS", 3)?),
            activity_capacity: env_or("DOORBOT_ACTIVITY_CAPACITY", 64)?,
        })
    }
}
