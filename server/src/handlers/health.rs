// Health check handler
use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::state::AppState;

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let response = json!({
        "status": "ok",
        "service": "tradewire-server",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().timestamp(),
        "components": {
            "socket_connections": state.registry.len().await,
            "hub_subscribers": state.hub.subscriber_count(),
        }
    });

    state.metrics.record_http_request("GET", "/health", 200);
    Json(response)
}
