use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use doorbot_core::types::IntentSnapshot;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::warn;

use crate::state::AppState;

/// `GET /`: the intent snapshot polled by the device agent.
pub async fn get_intent(State(state): State<Arc<AppState>>) -> Json<IntentSnapshot> {
    Json(state.gateway.store().render().await)
}

/// `POST /`: accept a door command.
///
/// Any malformed body, unparseable JSON included, gets the wire
/// contract's 400 response; the stored intent is left unchanged.
pub async fn post_command(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let payload: Value = serde_json::from_slice(&body).map_err(|e| {
        warn!(error = %e, "rejected command: body is not JSON");
        invalid_format()
    })?;

    match state.gateway.apply(payload).await {
        Ok(intent) => Ok(Json(json!({
            "success": true,
            "letmein": intent.unlock
        }))),
        Err(_) => Err(invalid_format()),
    }
}

/// `GET /sounds`: the sound names the device has registered.
pub async fn get_sounds(State(state): State<Arc<AppState>>) -> Json<Value> {
    let sounds = state.gateway.store().sounds().await;
    Json(json!({ "sounds": sounds }))
}

/// `POST /sounds`: the device registering the sounds it can play.
pub async fn post_sounds(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let payload: Value = serde_json::from_slice(&body).map_err(|e| {
        warn!(error = %e, "rejected sound registration: body is not JSON");
        missing_sounds()
    })?;

    match state.gateway.register_sounds(payload).await {
        Ok(count) => Ok(Json(json!({
            "success": true,
            "count": count
        }))),
        Err(_) => Err(missing_sounds()),
    }
}

/// `GET /health`: liveness and state introspection.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let snapshot = state.gateway.store().render().await;
    let activity = state.gateway.store().recent_activity().await;

    Json(json!({
        "status": "healthy",
        "service": "doorbot-server",
        "timestamp": Utc::now().to_rfc3339(),
        "letmein": snapshot.letmein,
        "last_command_time": snapshot.last_command_time,
        "auto_revert_secs": state.config.auto_revert.as_secs(),
        "recent_activity": activity,
    }))
}

fn invalid_format() -> (StatusCode, Json<Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "Invalid data format" })),
    )
}

fn missing_sounds() -> (StatusCode, Json<Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "Missing 'sounds' field" })),
    )
}
