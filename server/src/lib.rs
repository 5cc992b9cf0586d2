// Tradewire event distribution server
pub mod handlers;
pub mod hub;
pub mod pump;
pub mod registry;
pub mod relay;
pub mod state;

pub use hub::{Broadcaster, EventHub};
pub use registry::{CloseReason, ConnectionRegistry};
pub use state::AppState;

use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health::health_check))
        // Event publish endpoints, one per update kind
        .route("/events/price", post(handlers::events::publish_price))
        .route("/events/order", post(handlers::events::publish_order))
        .route("/events/position", post(handlers::events::publish_position))
        .route("/events/quote", post(handlers::events::publish_quote))
        .route("/events/account", post(handlers::events::publish_account))
        // Duplex socket endpoints
        .route("/socket/connect", get(handlers::socket::socket_connect))
        .route("/socket/connections", get(handlers::socket::list_connections))
        .route("/socket/:connection_id", delete(handlers::socket::remove_connection))
        // Push hub endpoint
        .route("/hub/trading", get(handlers::hub::hub_connect))
        // Prometheus metrics
        .route("/metrics", get(handlers::metrics::prometheus_metrics))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
