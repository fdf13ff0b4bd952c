//! Scripted transport for driving the orchestration layer in tests.
//!
//! Commands are recorded, responders map each received command to the events
//! a live broker would push back, and `inject` feeds unsolicited events into
//! the connection's stream.

use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use tokio::sync::mpsc;

use super::command::Command;
use super::events::BrokerEvent;
use super::port::{EventStream, TransportPort};

type Responder = Box<dyn Fn(&Command) -> Vec<BrokerEvent> + Send + Sync>;

pub struct MockTransport {
    on_connect: Vec<BrokerEvent>,
    responders: Mutex<Vec<Responder>>,
    sent: Mutex<Vec<Command>>,
    event_tx: Mutex<Option<mpsc::UnboundedSender<BrokerEvent>>>,
}

impl MockTransport {
    /// A transport that acknowledges the handshake and seeds order id 100
    pub fn new() -> Self {
        Self::with_connect_events(vec![
            BrokerEvent::ConnectionAck,
            BrokerEvent::NextValidId { order_id: 100 },
        ])
    }

    /// A transport that emits exactly `events` right after connecting
    pub fn with_connect_events(events: Vec<BrokerEvent>) -> Self {
        Self {
            on_connect: events,
            responders: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
            event_tx: Mutex::new(None),
        }
    }

    /// Script a reply: every received command is offered to each responder in
    /// registration order and all produced events are pushed to the stream.
    pub fn respond(&self, f: impl Fn(&Command) -> Vec<BrokerEvent> + Send + Sync + 'static) {
        self.responders.lock().unwrap().push(Box::new(f));
    }

    /// Push an unsolicited event, as the broker does outside request flows
    pub fn inject(&self, event: BrokerEvent) {
        if let Some(tx) = self.event_tx.lock().unwrap().as_ref() {
            let _ = tx.send(event);
        }
    }

    /// Everything sent through the port so far
    pub fn sent(&self) -> Vec<Command> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl TransportPort for MockTransport {
    async fn connect(&self, _host: &str, _port: u16, _client_id: i32) -> Result<EventStream> {
        let (tx, rx) = mpsc::unbounded_channel();
        for event in &self.on_connect {
            let _ = tx.send(event.clone());
        }
        *self.event_tx.lock().unwrap() = Some(tx);

        let stream = futures_util::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        });
        Ok(Box::pin(stream))
    }

    async fn disconnect(&self) -> Result<()> {
        let tx = self.event_tx.lock().unwrap().take();
        match tx {
            Some(tx) => {
                let _ = tx.send(BrokerEvent::ConnectionClosed { reason: None });
                Ok(())
            }
            None => Ok(()),
        }
    }

    async fn send(&self, command: Command) -> Result<()> {
        let tx = self.event_tx.lock().unwrap().clone();
        let Some(tx) = tx else {
            bail!("send on a disconnected mock transport");
        };

        self.sent.lock().unwrap().push(command.clone());
        for responder in self.responders.lock().unwrap().iter() {
            for event in responder(&command) {
                let _ = tx.send(event);
            }
        }
        Ok(())
    }
}
