// Dual-transport connection service: at most one live transport at a time
use std::sync::Arc;

use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::debug;

use tradewire_common::{Envelope, MetricsCollector, ReconnectPolicy, Result, UpdateEvent};

use crate::status::{ConnectionStatus, ConnectionTransport, StatusChanged};
use crate::transport;

const EVENT_CHANNEL_CAPACITY: usize = 256;
const STATUS_CHANNEL_CAPACITY: usize = 64;

/// Maintains exactly one active transport (push hub or raw duplex socket),
/// exposes the connection-status state machine, and raises typed update
/// events for whatever the transport delivers.
pub struct ConnectionService {
    shared: Arc<ServiceShared>,
    active: Mutex<Option<ActiveTransport>>,
    reconnect: ReconnectPolicy,
}

struct ActiveTransport {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl ConnectionService {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(ServiceShared::new()),
            active: Mutex::new(None),
            reconnect: ReconnectPolicy::default(),
        }
    }

    pub fn with_reconnect_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = policy;
        self
    }

    /// Typed update events, regardless of which transport delivered them.
    /// Each call yields an independent subscription.
    pub fn subscribe_events(&self) -> broadcast::Receiver<UpdateEvent> {
        self.shared.events_tx.subscribe()
    }

    /// Fires on every status transition.
    pub fn subscribe_status(&self) -> broadcast::Receiver<StatusChanged> {
        self.shared.status_tx.subscribe()
    }

    pub fn status(&self) -> ConnectionStatus {
        self.shared.status()
    }

    pub fn transport(&self) -> Option<ConnectionTransport> {
        self.shared.transport()
    }

    /// Connects to the push hub. The hub transport reconnects automatically
    /// after a dropped connection, surfacing Connecting/Connected
    /// transitions, until `stop` is called.
    pub async fn start_hub_push(&self, url: &str) -> Result<()> {
        let mut active = self.active.lock().await;
        Self::teardown(&self.shared, &mut active).await;

        let generation = self.shared.next_generation();
        self.shared.set_status(
            generation,
            ConnectionStatus::Connecting,
            format!("connecting to hub at {url}"),
            Some(ConnectionTransport::HubPush),
        );

        match transport::connect(url).await {
            Ok(stream) => {
                self.shared.set_status(
                    generation,
                    ConnectionStatus::Connected,
                    format!("hub connected to {url}"),
                    Some(ConnectionTransport::HubPush),
                );
                let (shutdown_tx, shutdown_rx) = watch::channel(false);
                let task = tokio::spawn(transport::hub::run(
                    stream,
                    url.to_string(),
                    self.shared.clone(),
                    generation,
                    self.reconnect.clone(),
                    shutdown_rx,
                ));
                *active = Some(ActiveTransport {
                    shutdown: shutdown_tx,
                    task,
                });
                Ok(())
            }
            Err(e) => {
                self.shared.set_status(
                    generation,
                    ConnectionStatus::Faulted,
                    format!("hub connect failed: {e}"),
                    Some(ConnectionTransport::HubPush),
                );
                Err(e)
            }
        }
    }

    /// Connects the raw duplex socket. This transport has no automatic
    /// reconnect: a peer close or receive error ends it, and the caller must
    /// start again.
    pub async fn start_duplex_socket(&self, url: &str) -> Result<()> {
        let mut active = self.active.lock().await;
        Self::teardown(&self.shared, &mut active).await;

        let generation = self.shared.next_generation();
        self.shared.set_status(
            generation,
            ConnectionStatus::Connecting,
            format!("connecting duplex socket to {url}"),
            Some(ConnectionTransport::DuplexSocket),
        );

        match transport::connect(url).await {
            Ok(stream) => {
                self.shared.set_status(
                    generation,
                    ConnectionStatus::Connected,
                    format!("duplex socket connected to {url}"),
                    Some(ConnectionTransport::DuplexSocket),
                );
                let (shutdown_tx, shutdown_rx) = watch::channel(false);
                let task = tokio::spawn(transport::socket::run(
                    stream,
                    self.shared.clone(),
                    generation,
                    shutdown_rx,
                ));
                *active = Some(ActiveTransport {
                    shutdown: shutdown_tx,
                    task,
                });
                Ok(())
            }
            Err(e) => {
                self.shared.set_status(
                    generation,
                    ConnectionStatus::Faulted,
                    format!("duplex socket connect failed: {e}"),
                    Some(ConnectionTransport::DuplexSocket),
                );
                Err(e)
            }
        }
    }

    /// Tears down whichever transport is active and settles on Disconnected.
    /// Safe to call when already stopped.
    pub async fn stop(&self) {
        let mut active = self.active.lock().await;
        Self::teardown(&self.shared, &mut active).await;
    }

    async fn teardown(shared: &Arc<ServiceShared>, active: &mut Option<ActiveTransport>) {
        let Some(transport) = active.take() else {
            return;
        };
        let _ = transport.shutdown.send(true);
        if let Err(e) = transport.task.await {
            debug!(error = %e, "transport task join failed");
        }
        // Invalidate any late callback from the finished task, then settle.
        let generation = shared.next_generation();
        shared.set_status(
            generation,
            ConnectionStatus::Disconnected,
            "stopped",
            None,
        );
    }
}

impl Default for ConnectionService {
    fn default() -> Self {
        Self::new()
    }
}

/// State shared between the service facade and its transport tasks.
pub(crate) struct ServiceShared {
    events_tx: broadcast::Sender<UpdateEvent>,
    status_tx: broadcast::Sender<StatusChanged>,
    state: std::sync::Mutex<StatusState>,
    metrics: MetricsCollector,
}

struct StatusState {
    status: ConnectionStatus,
    transport: Option<ConnectionTransport>,
    generation: u64,
}

impl ServiceShared {
    fn new() -> Self {
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (status_tx, _) = broadcast::channel(STATUS_CHANNEL_CAPACITY);
        Self {
            events_tx,
            status_tx,
            state: std::sync::Mutex::new(StatusState {
                status: ConnectionStatus::Disconnected,
                transport: None,
                generation: 0,
            }),
            metrics: MetricsCollector::new(),
        }
    }

    pub(crate) fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    fn status(&self) -> ConnectionStatus {
        self.state.lock().unwrap().status
    }

    fn transport(&self) -> Option<ConnectionTransport> {
        self.state.lock().unwrap().transport
    }

    /// Bumps the generation so callbacks from any older transport task are
    /// ignored from here on.
    fn next_generation(&self) -> u64 {
        let mut state = self.state.lock().unwrap();
        state.generation += 1;
        state.generation
    }

    /// Records a transition and notifies subscribers. Returns false if the
    /// caller's generation is stale (a newer transport owns the state) or if
    /// nothing changed (repeated reconnect attempts are not transitions).
    pub(crate) fn set_status(
        &self,
        generation: u64,
        status: ConnectionStatus,
        message: impl Into<String>,
        transport: Option<ConnectionTransport>,
    ) -> bool {
        let changed = {
            let mut state = self.state.lock().unwrap();
            if state.generation != generation {
                return false;
            }
            if state.status == status && state.transport == transport {
                false
            } else {
                state.status = status;
                state.transport = transport;
                true
            }
        };
        if changed {
            let _ = self.status_tx.send(StatusChanged {
                status,
                message: message.into(),
                transport,
            });
        }
        changed
    }

    /// True while the given generation is the current one.
    pub(crate) fn is_current(&self, generation: u64) -> bool {
        self.state.lock().unwrap().generation == generation
    }

    /// Decodes one incoming text message and raises the typed event. Decode
    /// failures are dropped without surfacing a fault.
    pub(crate) fn dispatch_text(&self, text: &str) {
        if !text.starts_with('{') {
            debug!("non-envelope message dropped");
            return;
        }
        match serde_json::from_str::<Envelope>(text) {
            Ok(envelope) => match UpdateEvent::from_envelope(&envelope) {
                Ok(Some(event)) => {
                    let _ = self.events_tx.send(event);
                }
                Ok(None) => debug!(kind = %envelope.kind, "unknown envelope type dropped"),
                Err(e) => debug!(error = %e, "envelope payload rejected"),
            },
            Err(e) => debug!(error = %e, "malformed envelope dropped"),
        }
    }
}
