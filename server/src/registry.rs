// Connection registry: the only shared mutable store on the server
use std::collections::HashMap;

use axum::extract::ws::{CloseFrame, Message};
use chrono::Utc;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use tradewire_common::{ConnectionInfo, Result, TradewireError};

/// Why a connection is being closed. Determines the close frame the peer sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    Normal,
    MessageTooBig,
    Removed,
}

impl CloseReason {
    pub fn code(self) -> u16 {
        match self {
            CloseReason::Normal => 1000,
            CloseReason::MessageTooBig => 1009,
            CloseReason::Removed => 1000,
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            CloseReason::Normal => "normal closure",
            CloseReason::MessageTooBig => "message too big",
            CloseReason::Removed => "removed by server",
        }
    }
}

/// Pairs a live connection's outbound channel with its metadata. The
/// registry is the sole owner; nothing mutates a managed connection from
/// outside.
struct ManagedConnection {
    info: ConnectionInfo,
    outbound: mpsc::Sender<Message>,
}

/// Thread-safe store of duplex-socket connections. Every frame written to a
/// peer (direct send, broadcast, close) goes through that connection's
/// single-consumer outbound channel, so sends are serialized per connection.
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<String, ManagedConnection>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a connection under a fresh id and returns its metadata.
    pub async fn register(
        &self,
        outbound: mpsc::Sender<Message>,
        remote_endpoint: Option<String>,
    ) -> ConnectionInfo {
        let info = ConnectionInfo {
            id: Uuid::new_v4().to_string(),
            connected_at: Utc::now(),
            remote_endpoint,
        };
        let managed = ManagedConnection {
            info: info.clone(),
            outbound,
        };

        let mut connections = self.connections.write().await;
        if connections.insert(info.id.clone(), managed).is_some() {
            // A v4 collision means id generation is broken; nothing sane to recover.
            panic!("duplicate connection id generated: {}", info.id);
        }
        drop(connections);

        info!(id = %info.id, remote = ?info.remote_endpoint, "connection registered");
        info
    }

    /// Removes a connection and attempts a graceful close with the given
    /// reason. Idempotent: unknown ids are a no-op, and a writer that is
    /// already gone just skips the close handshake.
    pub async fn remove(&self, id: &str, reason: CloseReason) {
        let removed = self.connections.write().await.remove(id);
        let Some(connection) = removed else {
            debug!(id, "remove for unknown connection ignored");
            return;
        };

        let frame = CloseFrame {
            code: reason.code(),
            reason: reason.describe().into(),
        };
        if connection.outbound.send(Message::Close(Some(frame))).await.is_err() {
            debug!(id, "close handshake skipped, writer already gone");
        }
        info!(id, reason = reason.describe(), "connection removed");
    }

    /// Sends a text message to one connection. An unknown id is an error; a
    /// send to a connection that is already closing is silently dropped
    /// (best-effort delivery, not at-least-once).
    pub async fn send(&self, id: &str, text: String) -> Result<()> {
        let outbound = {
            let connections = self.connections.read().await;
            match connections.get(id) {
                Some(connection) => connection.outbound.clone(),
                None => return Err(TradewireError::ConnectionNotFound(id.to_string())),
            }
        };
        if outbound.send(Message::Text(text)).await.is_err() {
            debug!(id, "message dropped, connection closing");
        }
        Ok(())
    }

    /// Fans a text message out to a point-in-time snapshot of the connection
    /// set. A connection that closes mid-broadcast does not abort delivery to
    /// the others; connections registered during the iteration may miss this
    /// broadcast.
    pub async fn broadcast(&self, text: String) {
        let targets: Vec<(String, mpsc::Sender<Message>)> = {
            let connections = self.connections.read().await;
            connections
                .values()
                .map(|c| (c.info.id.clone(), c.outbound.clone()))
                .collect()
        };

        for (id, outbound) in targets {
            if outbound.send(Message::Text(text.clone())).await.is_err() {
                debug!(id = %id, "broadcast skipped closed connection");
            }
        }
    }

    /// Snapshot of connection metadata, ordered by connect time ascending.
    pub async fn list(&self) -> Vec<ConnectionInfo> {
        let mut infos: Vec<ConnectionInfo> = self
            .connections
            .read()
            .await
            .values()
            .map(|c| c.info.clone())
            .collect();
        infos.sort_by_key(|info| info.connected_at);
        infos
    }

    pub async fn len(&self) -> usize {
        self.connections.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.connections.read().await.is_empty()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
