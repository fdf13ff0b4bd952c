use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::connection::ConnectionController;
use crate::error::RequestError;
use crate::transport::{BrokerEvent, Command, EventHub};

/// Per-call overrides for deadline and external cancellation.
///
/// One struct instead of a spread of optional parameters: omitted fields fall
/// back to the operation's default deadline and to a signal that never fires.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    pub deadline: Option<Duration>,
    pub cancel: Option<CancellationToken>,
}

impl CallOptions {
    pub fn with_deadline(deadline: Duration) -> Self {
        Self {
            deadline: Some(deadline),
            cancel: None,
        }
    }

    pub fn with_cancel(cancel: CancellationToken) -> Self {
        Self {
            deadline: None,
            cancel: Some(cancel),
        }
    }
}

/// What a reducer decided after seeing one event
#[derive(Debug)]
pub enum Step<T> {
    /// Not this request's terminal event; keep listening
    Pending,
    /// The request is resolved with this value
    Done(T),
}

/// The generic request primitive every operation is built on.
///
/// A request is: subscribe to the event stream, send exactly one command,
/// reduce matching events until a terminal condition, resolve exactly once.
/// The subscription is taken before the command goes out, so the reply cannot
/// be missed, and it is dropped on every exit path (success, broker error,
/// deadline, cancellation), so no listener ever outlives its request and a
/// later request reusing the same callback shapes cannot observe stale
/// deliveries.
pub struct Correlator {
    hub: EventHub,
    connection: Arc<ConnectionController>,
}

impl Correlator {
    pub fn new(hub: EventHub, connection: Arc<ConnectionController>) -> Self {
        Self { hub, connection }
    }

    /// Run one correlated request to resolution.
    ///
    /// `reduce` sees every event on the stream and decides what belongs to
    /// this request; identity filtering for events that carry no identity
    /// (global end markers) lives in the closure. An error event bearing this
    /// request's identity is offered to the reducer first, where operations
    /// that treat certain codes as expected outcomes resolve, and becomes a
    /// `RequestError::Broker` otherwise.
    #[instrument(skip(self, command, opts, reduce))]
    pub async fn execute<T, F>(
        &self,
        req_id: i64,
        command: Command,
        default_deadline: Duration,
        opts: &CallOptions,
        mut reduce: F,
    ) -> Result<T, RequestError>
    where
        F: FnMut(&BrokerEvent) -> Step<T> + Send,
    {
        // listener registration precedes the command on the wire
        let mut events = self.hub.subscribe_all();
        self.connection.send(command).await?;

        let deadline = opts.deadline.unwrap_or(default_deadline);
        let cancel = opts.cancel.clone().unwrap_or_default();
        let expiry = tokio::time::sleep(deadline);
        tokio::pin!(expiry);

        loop {
            tokio::select! {
                _ = &mut expiry => {
                    debug!(req_id, ?deadline, "request deadline elapsed");
                    return Err(RequestError::Timeout { req_id, elapsed: deadline });
                }
                _ = cancel.cancelled() => {
                    debug!(req_id, "request cancelled");
                    return Err(RequestError::Cancelled { req_id });
                }
                received = events.recv() => match received {
                    Ok(event) => {
                        if let BrokerEvent::Error { id, code, message } = &event {
                            if *id == req_id {
                                match reduce(&event) {
                                    Step::Done(value) => return Ok(value),
                                    Step::Pending => {
                                        return Err(RequestError::Broker {
                                            req_id,
                                            code: *code,
                                            message: message.clone(),
                                        });
                                    }
                                }
                            }
                            continue;
                        }
                        if let Step::Done(value) = reduce(&event) {
                            return Ok(value);
                        }
                    }
                    Err(RecvError::Lagged(missed)) => {
                        warn!(req_id, missed, "correlation stream lagged");
                    }
                    Err(RecvError::Closed) => {
                        debug!(req_id, "event hub closed under a live request");
                        return Err(RequestError::Cancelled { req_id });
                    }
                }
            }
        }
    }
}
