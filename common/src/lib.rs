// Common types and utilities shared across Tradewire services
// Wire shapes mirror the terminal's update events one-to-one

pub mod config;
pub mod error;
pub mod metrics;
pub mod retry;
pub mod types;

pub use config::Config;
pub use error::{Result, TradewireError};
pub use metrics::MetricsCollector;
pub use retry::ReconnectPolicy;
pub use types::*;
