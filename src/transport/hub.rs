use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, instrument};

use crate::core::constants::{CONNECTION_CAPACITY, FAMILY_CAPACITY, FIREHOSE_CAPACITY};

use super::events::{
    AccountEvent, BrokerEvent, ConnectionEvent, ContractEvent, ErrorEvent, ExecutionEvent,
    MarketEvent, OrderEvent, PositionEvent,
};

/// Typed fan-out for the transport's single event stream.
///
/// One channel per event family plus a unified firehose the correlation
/// engine listens on. The reader pump is the only publisher, so every channel
/// observes events in transport delivery order. Channels do not buffer for
/// late subscribers: a listener registered after an event was published never
/// sees it, which is why every request subscribes before its command is sent.
/// The hub holds no business state beyond dispatch counters.
#[derive(Debug, Clone)]
pub struct EventHub {
    firehose: broadcast::Sender<BrokerEvent>,
    connection: broadcast::Sender<ConnectionEvent>,
    orders: broadcast::Sender<OrderEvent>,
    contracts: broadcast::Sender<ContractEvent>,
    positions: broadcast::Sender<PositionEvent>,
    executions: broadcast::Sender<ExecutionEvent>,
    account: broadcast::Sender<AccountEvent>,
    market: broadcast::Sender<MarketEvent>,
    errors: broadcast::Sender<ErrorEvent>,
    stats: Arc<HubStats>,
}

/// Dispatch counters per event family
#[derive(Debug, Default)]
pub struct HubStats {
    pub connection_events: AtomicU64,
    pub order_events: AtomicU64,
    pub contract_events: AtomicU64,
    pub position_events: AtomicU64,
    pub execution_events: AtomicU64,
    pub account_events: AtomicU64,
    pub market_events: AtomicU64,
    pub error_events: AtomicU64,
}

/// Point-in-time snapshot of hub activity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubSnapshot {
    pub connection_events: u64,
    pub order_events: u64,
    pub contract_events: u64,
    pub position_events: u64,
    pub execution_events: u64,
    pub account_events: u64,
    pub market_events: u64,
    pub error_events: u64,
    pub firehose_subscribers: usize,
}

impl EventHub {
    pub fn new() -> Self {
        let (firehose, _) = broadcast::channel(FIREHOSE_CAPACITY);
        let (connection, _) = broadcast::channel(CONNECTION_CAPACITY);
        let (orders, _) = broadcast::channel(FAMILY_CAPACITY);
        let (contracts, _) = broadcast::channel(FAMILY_CAPACITY);
        let (positions, _) = broadcast::channel(FAMILY_CAPACITY);
        let (executions, _) = broadcast::channel(FAMILY_CAPACITY);
        let (account, _) = broadcast::channel(FAMILY_CAPACITY);
        let (market, _) = broadcast::channel(FAMILY_CAPACITY);
        let (errors, _) = broadcast::channel(FAMILY_CAPACITY);

        Self {
            firehose,
            connection,
            orders,
            contracts,
            positions,
            executions,
            account,
            market,
            errors,
            stats: Arc::new(HubStats::default()),
        }
    }

    /// Route one transport event into its family channel and the firehose.
    ///
    /// Send errors mean "no current subscriber" and are expected: nothing is
    /// listening for families with no request in flight.
    #[instrument(skip(self, event), fields(event = ?std::mem::discriminant(&event)))]
    pub fn dispatch(&self, event: BrokerEvent) {
        match &event {
            BrokerEvent::ConnectionAck => {
                self.stats.connection_events.fetch_add(1, Ordering::Relaxed);
                let _ = self.connection.send(ConnectionEvent::Ack);
            }
            BrokerEvent::ConnectionClosed { reason } => {
                self.stats.connection_events.fetch_add(1, Ordering::Relaxed);
                let _ = self.connection.send(ConnectionEvent::Closed {
                    reason: reason.clone(),
                });
            }
            BrokerEvent::NextValidId { order_id } => {
                self.stats.connection_events.fetch_add(1, Ordering::Relaxed);
                let _ = self
                    .connection
                    .send(ConnectionEvent::NextValidId { order_id: *order_id });
            }
            BrokerEvent::Error { id, code, message } => {
                self.stats.error_events.fetch_add(1, Ordering::Relaxed);
                let _ = self.errors.send(ErrorEvent {
                    id: *id,
                    code: *code,
                    message: message.clone(),
                });
            }
            BrokerEvent::OrderStatus {
                order_id,
                state,
                filled,
                remaining,
                avg_fill_price,
            } => {
                self.stats.order_events.fetch_add(1, Ordering::Relaxed);
                let _ = self.orders.send(OrderEvent::Status {
                    order_id: *order_id,
                    state: *state,
                    filled: *filled,
                    remaining: *remaining,
                    avg_fill_price: *avg_fill_price,
                });
            }
            BrokerEvent::OpenOrder { record } => {
                self.stats.order_events.fetch_add(1, Ordering::Relaxed);
                let _ = self.orders.send(OrderEvent::Open {
                    record: record.clone(),
                });
            }
            BrokerEvent::OpenOrderEnd => {
                self.stats.order_events.fetch_add(1, Ordering::Relaxed);
                let _ = self.orders.send(OrderEvent::OpenEnd);
            }
            BrokerEvent::ContractDetails { req_id, details } => {
                self.stats.contract_events.fetch_add(1, Ordering::Relaxed);
                let _ = self.contracts.send(ContractEvent::Details {
                    req_id: *req_id,
                    details: details.clone(),
                });
            }
            BrokerEvent::ContractDetailsEnd { req_id } => {
                self.stats.contract_events.fetch_add(1, Ordering::Relaxed);
                let _ = self.contracts.send(ContractEvent::End { req_id: *req_id });
            }
            BrokerEvent::Position { position } => {
                self.stats.position_events.fetch_add(1, Ordering::Relaxed);
                let _ = self.positions.send(PositionEvent::Row {
                    position: position.clone(),
                });
            }
            BrokerEvent::PositionEnd => {
                self.stats.position_events.fetch_add(1, Ordering::Relaxed);
                let _ = self.positions.send(PositionEvent::End);
            }
            BrokerEvent::ExecutionData { req_id, execution } => {
                self.stats.execution_events.fetch_add(1, Ordering::Relaxed);
                let _ = self.executions.send(ExecutionEvent::Row {
                    req_id: *req_id,
                    execution: execution.clone(),
                });
            }
            BrokerEvent::ExecutionDataEnd { req_id } => {
                self.stats.execution_events.fetch_add(1, Ordering::Relaxed);
                let _ = self.executions.send(ExecutionEvent::End { req_id: *req_id });
            }
            BrokerEvent::AccountValue { field } => {
                self.stats.account_events.fetch_add(1, Ordering::Relaxed);
                let _ = self.account.send(AccountEvent::Value {
                    field: field.clone(),
                });
            }
            BrokerEvent::AccountDownloadEnd { account } => {
                self.stats.account_events.fetch_add(1, Ordering::Relaxed);
                let _ = self.account.send(AccountEvent::DownloadEnd {
                    account: account.clone(),
                });
            }
            BrokerEvent::TickPrice { req_id, kind, price } => {
                self.stats.market_events.fetch_add(1, Ordering::Relaxed);
                let _ = self.market.send(MarketEvent::TickPrice {
                    req_id: *req_id,
                    kind: *kind,
                    price: *price,
                });
            }
            BrokerEvent::TickSize { req_id, kind, size } => {
                self.stats.market_events.fetch_add(1, Ordering::Relaxed);
                let _ = self.market.send(MarketEvent::TickSize {
                    req_id: *req_id,
                    kind: *kind,
                    size: *size,
                });
            }
            BrokerEvent::Pnl { req_id, pnl } => {
                self.stats.market_events.fetch_add(1, Ordering::Relaxed);
                let _ = self.market.send(MarketEvent::Pnl {
                    req_id: *req_id,
                    pnl: *pnl,
                });
            }
            BrokerEvent::SecurityDefinition { req_id, params } => {
                self.stats.market_events.fetch_add(1, Ordering::Relaxed);
                let _ = self.market.send(MarketEvent::SecurityDefinition {
                    req_id: *req_id,
                    params: params.clone(),
                });
            }
            BrokerEvent::SecurityDefinitionEnd { req_id } => {
                self.stats.market_events.fetch_add(1, Ordering::Relaxed);
                let _ = self
                    .market
                    .send(MarketEvent::SecurityDefinitionEnd { req_id: *req_id });
            }
        }

        if self.firehose.send(event).is_err() {
            debug!("event dropped - no firehose subscribers");
        }
    }

    /// Every event, in delivery order. The correlation engine's channel.
    pub fn subscribe_all(&self) -> broadcast::Receiver<BrokerEvent> {
        self.firehose.subscribe()
    }

    pub fn subscribe_connection(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.connection.subscribe()
    }

    pub fn subscribe_orders(&self) -> broadcast::Receiver<OrderEvent> {
        self.orders.subscribe()
    }

    pub fn subscribe_contracts(&self) -> broadcast::Receiver<ContractEvent> {
        self.contracts.subscribe()
    }

    pub fn subscribe_positions(&self) -> broadcast::Receiver<PositionEvent> {
        self.positions.subscribe()
    }

    pub fn subscribe_executions(&self) -> broadcast::Receiver<ExecutionEvent> {
        self.executions.subscribe()
    }

    pub fn subscribe_account(&self) -> broadcast::Receiver<AccountEvent> {
        self.account.subscribe()
    }

    pub fn subscribe_market(&self) -> broadcast::Receiver<MarketEvent> {
        self.market.subscribe()
    }

    pub fn subscribe_errors(&self) -> broadcast::Receiver<ErrorEvent> {
        self.errors.subscribe()
    }

    /// Current dispatch counters for monitoring
    pub fn snapshot(&self) -> HubSnapshot {
        HubSnapshot {
            connection_events: self.stats.connection_events.load(Ordering::Relaxed),
            order_events: self.stats.order_events.load(Ordering::Relaxed),
            contract_events: self.stats.contract_events.load(Ordering::Relaxed),
            position_events: self.stats.position_events.load(Ordering::Relaxed),
            execution_events: self.stats.execution_events.load(Ordering::Relaxed),
            account_events: self.stats.account_events.load(Ordering::Relaxed),
            market_events: self.stats.market_events.load(Ordering::Relaxed),
            error_events: self.stats.error_events.load(Ordering::Relaxed),
            firehose_subscribers: self.firehose.receiver_count(),
        }
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}
