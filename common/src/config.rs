// Runtime policy constants, loaded from the environment with fallbacks
use std::time::Duration;

use tracing::warn;

pub const DEFAULT_READ_CHUNK_SIZE: usize = 64 * 1024;
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 2 * 1024 * 1024;
pub const DEFAULT_KEEP_ALIVE_SECS: u64 = 120;

#[derive(Debug, Clone)]
pub struct Config {
    /// Fragment read chunk size; sizes the pump's reusable buffer.
    pub read_chunk_size: usize,
    /// Hard cap on one reassembled message. Exceeding it closes the connection.
    pub max_message_size: usize,
    /// Ping interval on the push-hub endpoint.
    pub keep_alive_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            keep_alive_interval: Duration::from_secs(DEFAULT_KEEP_ALIVE_SECS),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            read_chunk_size: env_or("TRADEWIRE_READ_CHUNK_SIZE", DEFAULT_READ_CHUNK_SIZE),
            max_message_size: env_or("TRADEWIRE_MAX_MESSAGE_SIZE", DEFAULT_MAX_MESSAGE_SIZE),
            keep_alive_interval: Duration::from_secs(env_or(
                "TRADEWIRE_KEEP_ALIVE_SECS",
                DEFAULT_KEEP_ALIVE_SECS,
            )),
        }
    }
}

fn env_or<T: std::str::FromStr + std::fmt::Display>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => match raw.parse() {
            Ok(value) => value,
            Err(_) => {
                warn!("Invalid value {:?} for {}, using default {}", raw, key, default);
                default
            }
        },
        Err(_) => default,
    }
}
