// Relays completed raw-socket messages to the rest of the fleet
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use tradewire_common::{Envelope, MetricsCollector, UpdateEvent};

use crate::hub::Broadcaster;
use crate::pump::MessageHandler;
use crate::registry::ConnectionRegistry;

/// Handles every completed raw text message: rebroadcasts it to all
/// duplex-socket connections prefixed with the sender id, and republishes it
/// through the hub when it is itself a valid update envelope, so hub
/// subscribers observe socket-originated events too.
pub struct RawRelay {
    registry: Arc<ConnectionRegistry>,
    broadcaster: Broadcaster,
    metrics: Arc<MetricsCollector>,
}

impl RawRelay {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        broadcaster: Broadcaster,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            registry,
            broadcaster,
            metrics,
        }
    }
}

#[async_trait]
impl MessageHandler for RawRelay {
    async fn on_message(&self, connection_id: &str, text: String) {
        self.metrics.record_raw_message_relayed();
        self.registry
            .broadcast(format!("{connection_id}: {text}"))
            .await;

        if !text.starts_with('{') {
            return;
        }
        match serde_json::from_str::<Envelope>(&text) {
            Ok(envelope) => match UpdateEvent::from_envelope(&envelope) {
                Ok(Some(event)) => self.broadcaster.publish_event(event),
                Ok(None) => {
                    self.metrics.record_message_dropped("unknown_type");
                    debug!(id = connection_id, kind = %envelope.kind, "unknown envelope type ignored");
                }
                Err(e) => {
                    self.metrics.record_message_dropped("bad_payload");
                    debug!(id = connection_id, error = %e, "envelope payload rejected");
                }
            },
            Err(e) => {
                debug!(id = connection_id, error = %e, "raw message is not an envelope");
            }
        }
    }
}
