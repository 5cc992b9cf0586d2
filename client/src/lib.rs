// Tradewire client: dual-transport connection service for the terminal
pub mod service;
pub mod status;
mod transport;

pub use service::ConnectionService;
pub use status::{ConnectionStatus, ConnectionTransport, StatusChanged};
