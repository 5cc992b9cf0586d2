// Hub-push transport: typed event stream with automatic reconnect
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};

use tradewire_common::ReconnectPolicy;

use crate::service::ServiceShared;
use crate::status::{ConnectionStatus, ConnectionTransport};

use super::WsStream;

enum SessionEnd {
    Shutdown,
    Dropped,
}

/// Drives hub sessions until stopped. A dropped connection surfaces a
/// Connecting transition and is retried with backoff; the caller never has
/// to re-invoke start.
pub(crate) async fn run(
    mut ws: WsStream,
    url: String,
    shared: Arc<ServiceShared>,
    generation: u64,
    policy: ReconnectPolicy,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        shared.metrics().record_websocket_connection_status("hub", true);
        let end = run_session(&mut ws, &shared, &mut shutdown).await;
        shared.metrics().record_websocket_connection_status("hub", false);

        if matches!(end, SessionEnd::Shutdown) {
            return;
        }
        if !shared.is_current(generation) {
            return;
        }
        shared.set_status(
            generation,
            ConnectionStatus::Connecting,
            "hub connection lost, reconnecting",
            Some(ConnectionTransport::HubPush),
        );

        let mut attempt = 0u32;
        ws = loop {
            let delay = policy.delay_for(attempt);
            tokio::select! {
                _ = shutdown.wait_for(|stop| *stop) => return,
                _ = tokio::time::sleep(delay) => {}
            }
            shared.metrics().record_websocket_reconnection("hub");
            match super::connect(&url).await {
                Ok(stream) => break stream,
                Err(e) => {
                    warn!(error = %e, attempt, "hub reconnect attempt failed");
                    attempt = attempt.saturating_add(1);
                }
            }
        };

        if !shared.set_status(
            generation,
            ConnectionStatus::Connected,
            "hub reconnected",
            Some(ConnectionTransport::HubPush),
        ) {
            // A newer transport took over while we were reconnecting.
            let _ = ws.close(None).await;
            return;
        }
    }
}

async fn run_session(
    ws: &mut WsStream,
    shared: &ServiceShared,
    shutdown: &mut watch::Receiver<bool>,
) -> SessionEnd {
    loop {
        tokio::select! {
            _ = async { let _ = shutdown.wait_for(|stop| *stop).await; } => {
                let _ = ws.close(None).await;
                return SessionEnd::Shutdown;
            }
            incoming = ws.next() => match incoming {
                Some(Ok(Message::Text(text))) => shared.dispatch_text(&text),
                Some(Ok(Message::Ping(data))) => {
                    let _ = ws.send(Message::Pong(data)).await;
                }
                Some(Ok(Message::Close(_))) | None => {
                    debug!("hub connection dropped");
                    return SessionEnd::Dropped;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(error = %e, "hub receive error");
                    return SessionEnd::Dropped;
                }
            }
        }
    }
}
