// Metrics collection for Tradewire services
use metrics::{counter, gauge};

/// Facade over the `metrics` macros so call sites stay intent-named and the
/// recorder backend stays a binary-level concern.
pub struct MetricsCollector;

impl MetricsCollector {
    pub fn new() -> Self {
        Self
    }

    pub fn record_connection_opened(&self) {
        counter!("tradewire_socket_connections_total").increment(1);
        gauge!("tradewire_socket_connections_active").increment(1.0);
    }

    pub fn record_connection_closed(&self) {
        gauge!("tradewire_socket_connections_active").decrement(1.0);
    }

    pub fn record_event_published(&self, kind: &str) {
        counter!("tradewire_events_published_total", "kind" => kind.to_string()).increment(1);
    }

    pub fn record_raw_message_relayed(&self) {
        counter!("tradewire_raw_messages_relayed_total").increment(1);
    }

    pub fn record_oversize_close(&self) {
        counter!("tradewire_oversize_closes_total").increment(1);
    }

    pub fn record_message_dropped(&self, reason: &str) {
        counter!("tradewire_messages_dropped_total", "reason" => reason.to_string()).increment(1);
    }

    pub fn record_websocket_connection_status(&self, transport: &str, connected: bool) {
        let value = if connected { 1.0 } else { 0.0 };
        gauge!("tradewire_websocket_connected", "transport" => transport.to_string()).set(value);
    }

    pub fn record_websocket_reconnection(&self, transport: &str) {
        counter!("tradewire_websocket_reconnections_total", "transport" => transport.to_string())
            .increment(1);
    }

    pub fn record_http_request(&self, method: &str, path: &str, status: u16) {
        counter!(
            "tradewire_http_requests_total",
            "method" => method.to_string(),
            "path" => path.to_string(),
            "status" => status.to_string()
        )
        .increment(1);
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}
