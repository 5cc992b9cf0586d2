// Error types for Tradewire services
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TradewireError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Connection not found: {0}")]
    ConnectionNotFound(String),

    #[error("Message too big: {size} bytes exceeds limit of {limit}")]
    MessageTooBig { size: usize, limit: usize },

    #[error("Connect failed: {0}")]
    ConnectFailed(String),

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, TradewireError>;
