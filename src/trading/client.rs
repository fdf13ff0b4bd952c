use std::sync::Arc;

use tracing::instrument;

use crate::config::ClientConfig;
use crate::connection::{ConnectionController, ConnectionState, OrderIdSequencer};
use crate::correlation::Correlator;
use crate::error::{ConnectError, RequestError};
use crate::transport::{EventHub, HubSnapshot, TransportPort};

use super::account::AccountLedger;

/// The operation surface of the orchestration layer.
///
/// One client per physical connection: it owns the event hub, the lifecycle
/// controller, the identity sequencer and the correlation engine, and exposes
/// every primitive and compound operation as a future. Construct it inside a
/// tokio runtime: the sequencer wires itself to the hub at build time so the
/// broker's id seed cannot be missed.
pub struct BrokerClient {
    pub(super) hub: EventHub,
    pub(super) connection: Arc<ConnectionController>,
    pub(super) sequencer: OrderIdSequencer,
    pub(super) correlator: Correlator,
    pub(super) ledger: AccountLedger,
    pub(super) config: ClientConfig,
}

impl BrokerClient {
    pub fn new(transport: Arc<dyn TransportPort>, config: ClientConfig) -> Self {
        let hub = EventHub::new();
        let sequencer = OrderIdSequencer::new(&hub);
        let connection = Arc::new(ConnectionController::new(
            transport,
            hub.clone(),
            config.clone(),
        ));
        let correlator = Correlator::new(hub.clone(), Arc::clone(&connection));

        Self {
            hub,
            connection,
            sequencer,
            correlator,
            ledger: AccountLedger::new(),
            config,
        }
    }

    /// Connect if necessary; a no-op on a live session
    #[instrument(skip(self))]
    pub async fn ensure_connected(&self) -> Result<(), ConnectError> {
        self.connection.ensure_connected().await
    }

    /// Close the session; a no-op when already closed
    #[instrument(skip(self))]
    pub async fn disconnect(&self) -> Result<(), ConnectError> {
        self.connection.disconnect().await
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Next identity from the shared order/query namespace
    pub async fn next_order_id(&self) -> Result<i64, RequestError> {
        self.sequencer.next_id(self.config.timeouts.id_seed).await
    }

    /// Subscribe-level access to the typed event channels
    pub fn hub(&self) -> &EventHub {
        &self.hub
    }

    /// Dispatch counters for monitoring
    pub fn hub_snapshot(&self) -> HubSnapshot {
        self.hub.snapshot()
    }
}
