// Raw duplex-socket transport: no automatic reconnect
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};

use crate::service::ServiceShared;
use crate::status::{ConnectionStatus, ConnectionTransport};

use super::WsStream;

/// Receive loop for one socket session. A peer close transitions to
/// Disconnected and a receive error to Faulted; either way the loop ends and
/// the caller must start a transport again.
pub(crate) async fn run(
    mut ws: WsStream,
    shared: Arc<ServiceShared>,
    generation: u64,
    mut shutdown: watch::Receiver<bool>,
) {
    shared.metrics().record_websocket_connection_status("socket", true);

    loop {
        tokio::select! {
            _ = async { let _ = shutdown.wait_for(|stop| *stop).await; } => {
                // Service-initiated stop: close handshake, then the service
                // settles the status after joining this task.
                let _ = ws.close(None).await;
                break;
            }
            incoming = ws.next() => match incoming {
                Some(Ok(Message::Text(text))) => shared.dispatch_text(&text),
                Some(Ok(Message::Ping(data))) => {
                    let _ = ws.send(Message::Pong(data)).await;
                }
                Some(Ok(Message::Close(_))) | None => {
                    debug!("duplex socket closed by peer");
                    shared.set_status(
                        generation,
                        ConnectionStatus::Disconnected,
                        "duplex socket closed by peer",
                        None,
                    );
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(error = %e, "duplex socket receive error");
                    shared.set_status(
                        generation,
                        ConnectionStatus::Faulted,
                        format!("duplex socket error: {e}"),
                        Some(ConnectionTransport::DuplexSocket),
                    );
                    break;
                }
            }
        }
    }

    shared.metrics().record_websocket_connection_status("socket", false);
}
