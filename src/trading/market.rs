use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{instrument, warn};

use crate::connection::ConnectionController;
use crate::core::Contract;
use crate::error::{ConnectError, RequestError};
use crate::transport::{Command, MarketEvent};

use super::client::BrokerClient;

/// A live market-data or PnL stream for one request identity.
///
/// Events are filtered by identity and delivered in broker order. Dropping
/// the handle stops local delivery; call `cancel` to also tell the broker to
/// stop producing.
pub struct MarketStream {
    req_id: i64,
    rx: mpsc::UnboundedReceiver<MarketEvent>,
    cancel_command: Command,
    connection: std::sync::Arc<ConnectionController>,
    forwarder: JoinHandle<()>,
}

impl MarketStream {
    pub fn request_id(&self) -> i64 {
        self.req_id
    }

    /// Next event on this subscription; `None` once the feed is gone
    pub async fn recv(&mut self) -> Option<MarketEvent> {
        self.rx.recv().await
    }

    /// Stop the stream on both sides
    pub async fn cancel(self) -> Result<(), ConnectError> {
        self.forwarder.abort();
        self.connection.send(self.cancel_command.clone()).await
    }
}

impl Drop for MarketStream {
    fn drop(&mut self) {
        self.forwarder.abort();
    }
}

impl BrokerClient {
    /// Stream ticks for one instrument until cancelled
    #[instrument(skip(self), fields(symbol = %contract.symbol))]
    pub async fn subscribe_market_data(
        &self,
        contract: &Contract,
        snapshot: bool,
    ) -> Result<MarketStream, RequestError> {
        let req_id = self.next_order_id().await?;
        let command = Command::RequestMarketData {
            req_id,
            contract: contract.clone(),
            snapshot,
        };
        self.open_stream(req_id, command, Command::CancelMarketData { req_id })
            .await
    }

    /// Stream profit-and-loss updates for one account until cancelled
    #[instrument(skip(self), fields(account = %account))]
    pub async fn subscribe_pnl(&self, account: &str) -> Result<MarketStream, RequestError> {
        let req_id = self.next_order_id().await?;
        let command = Command::RequestPnl {
            req_id,
            account: account.to_string(),
        };
        self.open_stream(req_id, command, Command::CancelPnl { req_id })
            .await
    }

    async fn open_stream(
        &self,
        req_id: i64,
        subscribe: Command,
        cancel_command: Command,
    ) -> Result<MarketStream, RequestError> {
        // listener first, command second: the first tick cannot be missed
        let mut market = self.hub.subscribe_market();
        let (tx, rx) = mpsc::unbounded_channel();

        let forwarder = tokio::spawn(async move {
            loop {
                match market.recv().await {
                    Ok(event) if event.req_id() == req_id => {
                        if tx.send(event).is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(missed)) => {
                        warn!(req_id, missed, "market stream lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        if let Err(e) = self.connection.send(subscribe).await {
            forwarder.abort();
            return Err(e.into());
        }

        Ok(MarketStream {
            req_id,
            rx,
            cancel_command,
            connection: std::sync::Arc::clone(&self.connection),
            forwarder,
        })
    }
}
