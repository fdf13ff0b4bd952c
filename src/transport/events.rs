use serde::{Deserialize, Serialize};

use crate::core::{
    AccountField, ContractDetails, ExecutionRecord, OpenOrderRecord, OptionChainParams,
    OrderState, PnlUpdate, Position, TickKind,
};

/// Every callback the transport can deliver, in one stream.
///
/// The transport produces these in broker delivery order on a single reader;
/// the hub fans them out without reordering. Events that answer a specific
/// request carry the request identity (`req_id`/`order_id`); stream-style
/// downloads (open orders, positions) are global and are terminated by their
/// own end markers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum BrokerEvent {
    /// The broker acknowledged the connection handshake
    ConnectionAck,
    /// The physical connection is gone
    ConnectionClosed { reason: Option<String> },
    /// One-time order-id seed pushed by the broker after connecting
    NextValidId { order_id: i64 },
    /// Error callback; `id` is the originating request identity, or a
    /// negative value for connection-level notices
    Error { id: i64, code: i32, message: String },

    OrderStatus {
        order_id: i64,
        state: OrderState,
        filled: f64,
        remaining: f64,
        avg_fill_price: f64,
    },
    OpenOrder { record: OpenOrderRecord },
    OpenOrderEnd,

    ContractDetails { req_id: i64, details: ContractDetails },
    ContractDetailsEnd { req_id: i64 },

    Position { position: Position },
    PositionEnd,

    ExecutionData { req_id: i64, execution: ExecutionRecord },
    ExecutionDataEnd { req_id: i64 },

    AccountValue { field: AccountField },
    AccountDownloadEnd { account: String },

    TickPrice { req_id: i64, kind: TickKind, price: f64 },
    TickSize { req_id: i64, kind: TickKind, size: f64 },
    Pnl { req_id: i64, pnl: PnlUpdate },

    SecurityDefinition { req_id: i64, params: OptionChainParams },
    SecurityDefinitionEnd { req_id: i64 },
}

impl BrokerEvent {
    /// The request identity this event answers, if it targets one
    pub fn request_id(&self) -> Option<i64> {
        match self {
            BrokerEvent::Error { id, .. } if *id >= 0 => Some(*id),
            BrokerEvent::OrderStatus { order_id, .. } => Some(*order_id),
            BrokerEvent::OpenOrder { record } => Some(record.order_id),
            BrokerEvent::ContractDetails { req_id, .. }
            | BrokerEvent::ContractDetailsEnd { req_id }
            | BrokerEvent::ExecutionData { req_id, .. }
            | BrokerEvent::ExecutionDataEnd { req_id }
            | BrokerEvent::TickPrice { req_id, .. }
            | BrokerEvent::TickSize { req_id, .. }
            | BrokerEvent::Pnl { req_id, .. }
            | BrokerEvent::SecurityDefinition { req_id, .. }
            | BrokerEvent::SecurityDefinitionEnd { req_id } => Some(*req_id),
            _ => None,
        }
    }
}

/// Connection lifecycle events on their own channel
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    Ack,
    Closed { reason: Option<String> },
    NextValidId { order_id: i64 },
}

/// Order events: status transitions and open-order downloads
#[derive(Debug, Clone, PartialEq)]
pub enum OrderEvent {
    Status {
        order_id: i64,
        state: OrderState,
        filled: f64,
        remaining: f64,
        avg_fill_price: f64,
    },
    Open { record: OpenOrderRecord },
    OpenEnd,
}

/// Contract-details download events
#[derive(Debug, Clone, PartialEq)]
pub enum ContractEvent {
    Details { req_id: i64, details: ContractDetails },
    End { req_id: i64 },
}

/// Position download events
#[derive(Debug, Clone, PartialEq)]
pub enum PositionEvent {
    Row { position: Position },
    End,
}

/// Execution download events
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionEvent {
    Row { req_id: i64, execution: ExecutionRecord },
    End { req_id: i64 },
}

/// Account-update stream events
#[derive(Debug, Clone, PartialEq)]
pub enum AccountEvent {
    Value { field: AccountField },
    DownloadEnd { account: String },
}

/// Market data: ticks, PnL, and security-definition lookups
#[derive(Debug, Clone, PartialEq)]
pub enum MarketEvent {
    TickPrice { req_id: i64, kind: TickKind, price: f64 },
    TickSize { req_id: i64, kind: TickKind, size: f64 },
    Pnl { req_id: i64, pnl: PnlUpdate },
    SecurityDefinition { req_id: i64, params: OptionChainParams },
    SecurityDefinitionEnd { req_id: i64 },
}

impl MarketEvent {
    pub fn req_id(&self) -> i64 {
        match self {
            MarketEvent::TickPrice { req_id, .. }
            | MarketEvent::TickSize { req_id, .. }
            | MarketEvent::Pnl { req_id, .. }
            | MarketEvent::SecurityDefinition { req_id, .. }
            | MarketEvent::SecurityDefinitionEnd { req_id } => *req_id,
        }
    }
}

/// Broker error callback on its own channel
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorEvent {
    pub id: i64,
    pub code: i32,
    pub message: String,
}
