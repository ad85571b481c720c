//! Environment-driven configuration helpers.
//!
//! Every tunable in the workspace has a typed default and can be overridden
//! with a `DOORBOT_*` environment variable. Services build their own config
//! structs from these helpers.

use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable was set but could not be parsed
    #[error("Invalid value for {var}: {value}")]
    InvalidValue {
        /// Variable name
        var: String,
        /// The offending value
        value: String,
    },
}

/// Read an optional environment variable, falling back to `default`.
///
/// Returns an error only when the variable is set to an unparseable value;
/// an unset variable is not an error.
pub fn env_or<T: FromStr>(var: &str, default: T) -> Result<T, ConfigError> {
    match env::var(var) {
        Ok(value) => value.parse().map_err(|_| ConfigError::InvalidValue {
            var: var.to_string(),
            value,
        }),
        Err(_) => Ok(default),
    }
}

/// Read a millisecond-valued environment variable as a [`Duration`].
pub fn env_millis_or(var: &str, default_ms: u64) -> Result<Duration, ConfigError> {
    Ok(Duration::from_millis(env_or(var, default_ms)?))
}
