// Publish endpoints: accept an update DTO, hand it to the broadcaster, 202
//
// The response never waits for delivery; publish is fire-and-forget.
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use tradewire_common::{AccountUpdate, OrderUpdate, PositionUpdate, PriceUpdate, QuoteUpdate};

use crate::state::AppState;

pub async fn publish_price(
    State(state): State<AppState>,
    Json(update): Json<PriceUpdate>,
) -> StatusCode {
    state.broadcaster.publish_price(update);
    state.metrics.record_http_request("POST", "/events/price", 202);
    StatusCode::ACCEPTED
}

pub async fn publish_order(
    State(state): State<AppState>,
    Json(update): Json<OrderUpdate>,
) -> StatusCode {
    state.broadcaster.publish_order(update);
    state.metrics.record_http_request("POST", "/events/order", 202);
    StatusCode::ACCEPTED
}

pub async fn publish_position(
    State(state): State<AppState>,
    Json(update): Json<PositionUpdate>,
) -> StatusCode {
    state.broadcaster.publish_position(update);
    state.metrics.record_http_request("POST", "/events/position", 202);
    StatusCode::ACCEPTED
}

pub async fn publish_quote(
    State(state): State<AppState>,
    Json(update): Json<QuoteUpdate>,
) -> StatusCode {
    state.broadcaster.publish_quote(update);
    state.metrics.record_http_request("POST", "/events/quote", 202);
    StatusCode::ACCEPTED
}

pub async fn publish_account(
    State(state): State<AppState>,
    Json(update): Json<AccountUpdate>,
) -> StatusCode {
    state.broadcaster.publish_account(update);
    state.metrics.record_http_request("POST", "/events/account", 202);
    StatusCode::ACCEPTED
}
