//! Structured logging infrastructure for Doorbot.
//!
//! This module provides centralized logging initialization with support
//! for structured JSON output and environment-based configuration.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the logging system with structured output.
///
/// Log level can be configured via the `RUST_LOG` environment variable.
/// If not set, defaults to `info` level.
///
/// # Example
/// ```no_run
/// use doorbot_core::logging;
///
/// logging::init();
/// tracing::info!("Agent started");
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .init();
}

/// Initialize the logging system with JSON output for production environments.
///
/// This format is suitable for log aggregation systems and structured log analysis.
/// Log level can be configured via the `RUST_LOG` environment variable.
///
/// # Example
/// ```no_run
/// use doorbot_core::logging;
///
/// logging::init_json();
/// tracing::info!(service = "doorbot-server", "Service started");
/// ```
pub fn init_json() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().with_target(true))
        .init();
}

/// Initialize logging in the format selected by the environment.
///
/// Set `DOORBOT_LOG_JSON` to `1`, `true`, or `yes` for JSON output;
/// anything else gets the human-readable format.
pub fn init_from_env() {
    if json_output_requested(std::env::var("DOORBOT_LOG_JSON").ok().as_deref()) {
        init_json();
    } else {
        init();
    }
}

fn json_output_requested(value: Option<&str>) -> bool {
    matches!(
        value.map(str::trim).map(str::to_ascii_lowercase).as_deref(),
        Some("1") | Some("true") | Some("yes")
    )
}
