// Duplex socket endpoints: upgrade, list, remove
use std::net::SocketAddr;

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::info;

use tradewire_common::{ConnectionInfo, Result, TradewireError};

use crate::pump::{Fragment, FragmentSource, MessagePump, PumpOutcome};
use crate::registry::CloseReason;
use crate::relay::RawRelay;
use crate::state::AppState;

const OUTBOUND_QUEUE_DEPTH: usize = 64;

pub async fn socket_connect(
    ws: WebSocketUpgrade,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    State(state): State<AppState>,
) -> Response {
    let remote = connect_info.map(|ConnectInfo(addr)| addr.to_string());
    ws.on_upgrade(move |socket| handle_socket(socket, state, remote))
}

pub async fn list_connections(State(state): State<AppState>) -> Json<Vec<ConnectionInfo>> {
    state
        .metrics
        .record_http_request("GET", "/socket/connections", 200);
    Json(state.registry.list().await)
}

/// Returns 204 whether or not the id existed; removal is idempotent.
pub async fn remove_connection(
    Path(connection_id): Path<String>,
    State(state): State<AppState>,
) -> StatusCode {
    state.registry.remove(&connection_id, CloseReason::Removed).await;
    state
        .metrics
        .record_http_request("DELETE", "/socket/{connection_id}", 204);
    StatusCode::NO_CONTENT
}

async fn handle_socket(socket: WebSocket, state: AppState, remote: Option<String>) {
    let (sink, stream) = socket.split();
    let (outbound_tx, outbound_rx) = mpsc::channel::<Message>(OUTBOUND_QUEUE_DEPTH);

    let info = state.registry.register(outbound_tx, remote).await;
    state.metrics.record_connection_opened();

    // Single writer task per connection: every frame to this peer, including
    // the close handshake, flows through the outbound queue.
    let writer = tokio::spawn(write_outbound(sink, outbound_rx));

    let relay = RawRelay::new(
        state.registry.clone(),
        state.broadcaster.clone(),
        state.metrics.clone(),
    );
    let mut source = WsFragmentSource { stream };
    let mut pump = MessagePump::new(
        info.id.clone(),
        state.config.read_chunk_size,
        state.config.max_message_size,
    );
    let outcome = pump.run(&mut source, &relay, state.shutdown.clone()).await;

    // Guaranteed cleanup: exactly one removal per connection, whatever the
    // outcome.
    let reason = match outcome {
        PumpOutcome::ClosedTooBig => CloseReason::MessageTooBig,
        _ => CloseReason::Normal,
    };
    state.registry.remove(&info.id, reason).await;
    state.metrics.record_connection_closed();
    if outcome == PumpOutcome::ClosedTooBig {
        state.metrics.record_oversize_close();
    }

    let _ = writer.await;
    info!(id = %info.id, ?outcome, "socket connection finished");
}

async fn write_outbound(
    mut sink: SplitSink<WebSocket, Message>,
    mut outbound: mpsc::Receiver<Message>,
) {
    while let Some(message) = outbound.recv().await {
        let is_close = matches!(message, Message::Close(_));
        if sink.send(message).await.is_err() {
            // Peer is gone; the pump side observes that on its own.
            break;
        }
        if is_close {
            break;
        }
    }
}

/// Adapts the axum socket stream to the pump's fragment model. The protocol
/// layer reassembles continuation frames, so each delivered message is one
/// final fragment; ping/pong traffic never reaches the pump.
struct WsFragmentSource {
    stream: SplitStream<WebSocket>,
}

#[async_trait]
impl FragmentSource for WsFragmentSource {
    async fn next_fragment(&mut self) -> Result<Option<Fragment>> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(Fragment::Data {
                        bytes: text.into_bytes(),
                        is_text: true,
                        fin: true,
                    }))
                }
                Some(Ok(Message::Binary(bytes))) => {
                    return Ok(Some(Fragment::Data {
                        bytes,
                        is_text: false,
                        fin: true,
                    }))
                }
                Some(Ok(Message::Close(_))) => return Ok(Some(Fragment::Close)),
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
                Some(Err(e)) => return Err(TradewireError::Transport(e.to_string())),
                None => return Ok(None),
            }
        }
    }
}
