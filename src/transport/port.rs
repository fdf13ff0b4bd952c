use anyhow::Result;
use async_trait::async_trait;
use futures_util::stream::BoxStream;

use super::command::Command;
use super::events::BrokerEvent;

/// Stream of decoded broker callbacks for one physical connection. Ends when
/// the connection is gone.
pub type EventStream = BoxStream<'static, BrokerEvent>;

/// The wire boundary.
///
/// Implementations own message framing, encoding and socket I/O; this layer
/// only assumes that `connect` yields the connection's event stream, that
/// `send` is safe once the connection is acknowledged, and that the
/// implementation serializes concurrent writes. At most one physical
/// connection exists per lifecycle controller.
#[async_trait]
pub trait TransportPort: Send + Sync {
    /// Open the physical connection and return its event stream.
    async fn connect(&self, host: &str, port: u16, client_id: i32) -> Result<EventStream>;

    /// Tear down the physical connection. The transport reports the closure
    /// through a `ConnectionClosed` event before ending the stream.
    async fn disconnect(&self) -> Result<()>;

    /// Encode and write one command.
    async fn send(&self, command: Command) -> Result<()>;
}
