// Connection lifecycle types raised by the service
use std::fmt;

/// Lifecycle of the client-side connection service. One instance at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
    Faulted,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionStatus::Disconnected => "disconnected",
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Faulted => "faulted",
        };
        f.write_str(name)
    }
}

/// Which mechanism backs the current connection; absent when disconnected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionTransport {
    HubPush,
    DuplexSocket,
}

/// Payload of every status transition the service raises.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChanged {
    pub status: ConnectionStatus,
    pub message: String,
    pub transport: Option<ConnectionTransport>,
}
