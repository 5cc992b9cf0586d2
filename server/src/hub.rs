// Push hub: one-to-many fan-out of typed update events
use std::sync::Arc;

use tokio::sync::broadcast;
use tradewire_common::{
    AccountUpdate, MetricsCollector, OrderUpdate, PositionUpdate, PriceUpdate, QuoteUpdate,
    UpdateEvent,
};

/// Managed pub/sub channel. Every subscriber sees every published event;
/// there is no per-client filtering.
#[derive(Clone)]
pub struct EventHub {
    tx: broadcast::Sender<UpdateEvent>,
}

impl EventHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<UpdateEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Fire-and-forget publish. Zero subscribers is not an error.
    pub fn publish(&self, event: UpdateEvent) {
        let _ = self.tx.send(event);
    }
}

/// Typed publish facade over the hub, one method per update kind. Publish is
/// fire-and-forget from the caller's perspective: no acknowledgment, no retry.
#[derive(Clone)]
pub struct Broadcaster {
    hub: EventHub,
    metrics: Arc<MetricsCollector>,
}

impl Broadcaster {
    pub fn new(hub: EventHub, metrics: Arc<MetricsCollector>) -> Self {
        Self { hub, metrics }
    }

    pub fn publish_price(&self, update: PriceUpdate) {
        self.publish_event(UpdateEvent::Price(update));
    }

    pub fn publish_order(&self, update: OrderUpdate) {
        self.publish_event(UpdateEvent::Order(update));
    }

    pub fn publish_position(&self, update: PositionUpdate) {
        self.publish_event(UpdateEvent::Position(update));
    }

    pub fn publish_quote(&self, update: QuoteUpdate) {
        self.publish_event(UpdateEvent::Quote(update));
    }

    pub fn publish_account(&self, update: AccountUpdate) {
        self.publish_event(UpdateEvent::Account(update));
    }

    pub fn publish_event(&self, event: UpdateEvent) {
        self.metrics.record_event_published(event.kind());
        self.hub.publish(event);
    }
}
