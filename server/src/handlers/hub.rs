// Push-hub endpoint: server-to-client stream of typed update events
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tokio::time::{interval_at, Instant};
use tracing::{debug, info, warn};

use crate::state::AppState;

pub async fn hub_connect(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_hub_client(socket, state))
}

async fn handle_hub_client(socket: WebSocket, state: AppState) {
    let (mut sink, mut stream) = socket.split();
    let mut events = state.hub.subscribe();
    let mut shutdown = state.shutdown.clone();
    let keep_alive = state.config.keep_alive_interval;
    let mut keep_alive = interval_at(Instant::now() + keep_alive, keep_alive);

    info!("hub subscriber connected");
    state.metrics.record_websocket_connection_status("hub", true);

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    let text = match event.encode() {
                        Ok(text) => text,
                        Err(e) => {
                            warn!(error = %e, "failed to encode event for hub subscriber");
                            continue;
                        }
                    };
                    if sink.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "hub subscriber lagging, events skipped");
                }
                Err(RecvError::Closed) => break,
            },
            _ = keep_alive.tick() => {
                if sink.send(Message::Ping(Vec::new())).await.is_err() {
                    break;
                }
            }
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Close(_))) | None => break,
                // The hub channel is push-only; inbound data is ignored.
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!(error = %e, "hub subscriber read error");
                    break;
                }
            },
            _ = async { let _ = shutdown.wait_for(|stop| *stop).await; } => break,
        }
    }

    state.metrics.record_websocket_connection_status("hub", false);
    info!("hub subscriber disconnected");
}
