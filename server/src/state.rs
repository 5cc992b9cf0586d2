// Application state for the event distribution server
use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use tokio::sync::watch;
use tradewire_common::{Config, MetricsCollector};

use crate::hub::{Broadcaster, EventHub};
use crate::registry::ConnectionRegistry;

const HUB_CHANNEL_CAPACITY: usize = 1024;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: Arc<ConnectionRegistry>,
    pub hub: EventHub,
    pub broadcaster: Broadcaster,
    pub metrics: Arc<MetricsCollector>,
    /// Flipped on graceful shutdown; every pump and hub loop watches it.
    pub shutdown: watch::Receiver<bool>,
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    /// Builds the state and hands back the shutdown trigger for the binary
    /// (or test harness) to own.
    pub fn new(config: Config) -> (Self, watch::Sender<bool>) {
        let (shutdown_tx, shutdown) = watch::channel(false);
        let hub = EventHub::new(HUB_CHANNEL_CAPACITY);
        let metrics = Arc::new(MetricsCollector::new());
        let broadcaster = Broadcaster::new(hub.clone(), metrics.clone());

        let state = Self {
            config: Arc::new(config),
            registry: Arc::new(ConnectionRegistry::new()),
            hub,
            broadcaster,
            metrics,
            shutdown,
            prometheus: None,
        };
        (state, shutdown_tx)
    }

    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }
}
