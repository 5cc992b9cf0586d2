// Per-connection message pump: reassembles fragments, enforces the size cap
use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{debug, warn};

use tradewire_common::Result;

/// One transport-level fragment of a possibly multi-part message.
pub enum Fragment {
    Data {
        bytes: Vec<u8>,
        is_text: bool,
        fin: bool,
    },
    Close,
}

/// Source of fragments for one connection. `Ok(None)` means the stream ended
/// without a close control message.
#[async_trait]
pub trait FragmentSource: Send {
    async fn next_fragment(&mut self) -> Result<Option<Fragment>>;
}

/// Receives completed text messages from a pump.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn on_message(&self, connection_id: &str, text: String);
}

/// Terminal state of one pump run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpOutcome {
    ClosedNormal,
    ClosedTooBig,
    ClosedError,
    Cancelled,
}

/// Reads fragments off one connection, reassembles them into complete
/// messages, and forwards non-empty text messages to the handler. The
/// accumulation buffer is allocated once and reused across messages; it is
/// never shared between pumps.
pub struct MessagePump {
    connection_id: String,
    max_message_size: usize,
    buffer: Vec<u8>,
}

impl MessagePump {
    pub fn new(
        connection_id: impl Into<String>,
        read_chunk_size: usize,
        max_message_size: usize,
    ) -> Self {
        Self {
            connection_id: connection_id.into(),
            max_message_size,
            buffer: Vec::with_capacity(read_chunk_size),
        }
    }

    /// Runs until the peer closes, the transport fails, the size cap is
    /// breached, or the shutdown signal fires. The caller owns cleanup: it
    /// maps the outcome to a close reason and removes the connection exactly
    /// once.
    pub async fn run<S: FragmentSource>(
        &mut self,
        source: &mut S,
        handler: &dyn MessageHandler,
        mut shutdown: watch::Receiver<bool>,
    ) -> PumpOutcome {
        loop {
            self.buffer.clear();
            let mut message_is_text = false;
            let mut first_fragment = true;

            // Inner loop: accumulate fragments until end-of-message.
            loop {
                let next = tokio::select! {
                    biased;
                    _ = shutdown.wait_for(|stop| *stop) => {
                        debug!(id = %self.connection_id, "pump cancelled");
                        return PumpOutcome::Cancelled;
                    }
                    next = source.next_fragment() => next,
                };

                let fragment = match next {
                    Ok(Some(fragment)) => fragment,
                    Ok(None) => {
                        debug!(id = %self.connection_id, "stream ended");
                        return PumpOutcome::ClosedNormal;
                    }
                    Err(e) => {
                        warn!(id = %self.connection_id, error = %e, "transport error, terminating pump");
                        return PumpOutcome::ClosedError;
                    }
                };

                match fragment {
                    Fragment::Close => {
                        debug!(id = %self.connection_id, "close received");
                        return PumpOutcome::ClosedNormal;
                    }
                    Fragment::Data { bytes, is_text, fin } => {
                        if first_fragment {
                            message_is_text = is_text;
                            first_fragment = false;
                        }
                        // Cap check before any parsing or forwarding of the
                        // partial message.
                        if self.buffer.len() + bytes.len() > self.max_message_size {
                            warn!(
                                id = %self.connection_id,
                                size = self.buffer.len() + bytes.len(),
                                limit = self.max_message_size,
                                "message exceeds size cap, closing connection"
                            );
                            return PumpOutcome::ClosedTooBig;
                        }
                        self.buffer.extend_from_slice(&bytes);
                        if fin {
                            break;
                        }
                    }
                }
            }

            if message_is_text && !self.buffer.is_empty() {
                match std::str::from_utf8(&self.buffer) {
                    Ok(text) => handler.on_message(&self.connection_id, text.to_owned()).await,
                    Err(e) => {
                        debug!(id = %self.connection_id, error = %e, "non-utf8 text message dropped")
                    }
                }
            }
        }
    }
}
