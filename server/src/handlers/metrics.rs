// Prometheus metrics endpoint
use axum::extract::State;

use crate::state::AppState;

pub async fn prometheus_metrics(State(state): State<AppState>) -> String {
    state
        .prometheus
        .as_ref()
        .map(|handle| handle.render())
        .unwrap_or_default()
}
