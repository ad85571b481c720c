use axum::{
    routing::get,
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tracing::info;

mod config;
mod handlers;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    doorbot_core::logging::init_from_env();

    let config = Config::from_env()?;
    let state = Arc::new(AppState::new(config.clone()));

    let app = Router::new()
        .route("/", get(handlers::get_intent).post(handlers::post_command))
        .route("/sounds", get(handlers::get_sounds).post(handlers::post_sounds))
        .route("/health", get(handlers::health))
        .with_state(state)
        .layer(ServiceBuilder::new().into_inner());

    let bind_addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&bind_addr).await?;
    info!(
        auto_revert_secs = config.auto_revert.as_secs(),
        "Doorbot server listening on {}", bind_addr
    );

    axum::serve(listener, app).await?;
    Ok(())
}
