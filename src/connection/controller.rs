use std::sync::{Arc, RwLock};
use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::config::ClientConfig;
use crate::error::ConnectError;
use crate::transport::{Command, ConnectionEvent, EventHub, EventStream, TransportPort};

/// Lifecycle of the single physical connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

struct Pump {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Owner of the connection state machine and the reader pump.
///
/// `ensure_connected` and `disconnect` are idempotent and serialized against
/// each other; a connect attempt that times out returns the machine to
/// `Disconnected` and is never retried automatically. The pump is a managed
/// task: it forwards transport events into the hub in delivery order and
/// stops on its cancellation token when the controller tears the
/// connection down.
pub struct ConnectionController {
    transport: Arc<dyn TransportPort>,
    hub: EventHub,
    config: ClientConfig,
    state: Arc<RwLock<ConnectionState>>,
    pump: tokio::sync::Mutex<Option<Pump>>,
}

impl ConnectionController {
    pub fn new(transport: Arc<dyn TransportPort>, hub: EventHub, config: ClientConfig) -> Self {
        Self {
            transport,
            hub,
            config,
            state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
            pump: tokio::sync::Mutex::new(None),
        }
    }

    /// Current lifecycle state, readable from any thread
    pub fn state(&self) -> ConnectionState {
        *self.state.read().unwrap()
    }

    fn set_state(&self, next: ConnectionState) {
        *self.state.write().unwrap() = next;
    }

    /// Connect if not already connected.
    ///
    /// Waits for the broker's acknowledgement, then holds the caller through
    /// the settle delay so commands do not race the flood of startup notices
    /// the broker emits right after the handshake.
    #[instrument(skip(self), fields(host = %self.config.host, port = self.config.port))]
    pub async fn ensure_connected(&self) -> Result<(), ConnectError> {
        let mut pump_slot = self.pump.lock().await;
        if self.state() == ConnectionState::Connected {
            debug!("already connected");
            return Ok(());
        }

        self.set_state(ConnectionState::Connecting);
        let mut acks = self.hub.subscribe_connection();

        let stream = match self
            .transport
            .connect(&self.config.host, self.config.port, self.config.client_id)
            .await
        {
            Ok(stream) => stream,
            Err(e) => {
                self.set_state(ConnectionState::Disconnected);
                return Err(ConnectError::Transport(e));
            }
        };
        let pump = self.start_pump(stream);

        let deadline = self.config.timeouts.connect;
        if !wait_for(&mut acks, deadline, |event| {
            matches!(event, ConnectionEvent::Ack)
        })
        .await
        {
            warn!(?deadline, "no connection acknowledgement, tearing down");
            pump.cancel.cancel();
            let _ = pump.task.await;
            let _ = self.transport.disconnect().await;
            self.set_state(ConnectionState::Disconnected);
            return Err(ConnectError::AckTimeout(deadline));
        }

        // the broker floods the channel right after the ack; let it drain
        tokio::time::sleep(self.config.timeouts.settle).await;

        *pump_slot = Some(pump);
        self.set_state(ConnectionState::Connected);
        info!("connected");
        Ok(())
    }

    /// Disconnect if connected; a no-op on an already-closed session.
    #[instrument(skip(self))]
    pub async fn disconnect(&self) -> Result<(), ConnectError> {
        let mut pump_slot = self.pump.lock().await;
        let Some(pump) = pump_slot.take() else {
            debug!("already disconnected");
            self.set_state(ConnectionState::Disconnected);
            return Ok(());
        };

        let mut closes = self.hub.subscribe_connection();
        let disconnect_result = self.transport.disconnect().await;

        let deadline = self.config.timeouts.disconnect;
        let closed = wait_for(&mut closes, deadline, |event| {
            matches!(event, ConnectionEvent::Closed { .. })
        })
        .await;

        pump.cancel.cancel();
        let _ = pump.task.await;
        self.set_state(ConnectionState::Disconnected);

        if let Err(e) = disconnect_result {
            return Err(ConnectError::Transport(e));
        }
        if !closed {
            return Err(ConnectError::CloseTimeout(deadline));
        }
        info!("disconnected");
        Ok(())
    }

    /// Send one command over the live connection
    pub async fn send(&self, command: Command) -> Result<(), ConnectError> {
        if self.state() != ConnectionState::Connected {
            return Err(ConnectError::NotConnected);
        }
        self.transport
            .send(command)
            .await
            .map_err(ConnectError::Transport)
    }

    fn start_pump(&self, mut stream: EventStream) -> Pump {
        let cancel = CancellationToken::new();
        let hub = self.hub.clone();
        let state = Arc::clone(&self.state);
        let token = cancel.clone();

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        debug!("reader pump stopped");
                        break;
                    }
                    event = stream.next() => match event {
                        Some(event) => hub.dispatch(event),
                        None => {
                            debug!("transport stream ended");
                            *state.write().unwrap() = ConnectionState::Disconnected;
                            break;
                        }
                    }
                }
            }
        });

        Pump { cancel, task }
    }
}

/// Drain connection events until `matches` hits or the deadline passes
async fn wait_for(
    events: &mut tokio::sync::broadcast::Receiver<ConnectionEvent>,
    deadline: Duration,
    matches: impl Fn(&ConnectionEvent) -> bool,
) -> bool {
    let wait = async {
        loop {
            match events.recv().await {
                Ok(event) if matches(&event) => return true,
                Ok(_) => {}
                Err(RecvError::Lagged(n)) => {
                    warn!(missed = n, "lagged on connection events");
                }
                Err(RecvError::Closed) => return false,
            }
        }
    };
    tokio::time::timeout(deadline, wait).await.unwrap_or(false)
}
