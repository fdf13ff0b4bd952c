use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::contract::Contract;
use super::order::OrderAction;

/// A holding reported by the positions download.
///
/// Quantity is signed: positive for long, negative for short. The snapshot
/// does not retain the venue the position was built on, so closing workflows
/// must supply an execution exchange themselves.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub account: String,
    pub contract: Contract,
    pub quantity: f64,
    pub average_cost: f64,
}

impl Position {
    /// The order side that offsets this position, None when flat
    pub fn closing_action(&self) -> Option<OrderAction> {
        if self.quantity > 0.0 {
            Some(OrderAction::Sell)
        } else if self.quantity < 0.0 {
            Some(OrderAction::Buy)
        } else {
            None
        }
    }
}

/// One fill reported by an executions download
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecutionRecord {
    pub execution_id: String,
    pub order_id: i64,
    pub contract: Contract,
    pub side: OrderAction,
    pub shares: f64,
    pub price: f64,
    pub account: String,
    pub exchange: String,
    pub time: DateTime<Utc>,
}

/// Server-side filter for an executions download; empty fields match everything
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExecutionFilter {
    pub client_id: Option<i32>,
    pub account: Option<String>,
    pub symbol: Option<String>,
    pub side: Option<OrderAction>,
    /// Only executions after this time are reported
    pub since: Option<DateTime<Utc>>,
}

/// One key/value row of the account-update stream
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccountField {
    pub key: String,
    pub value: String,
    pub currency: Option<String>,
    pub account: String,
    pub updated_at: DateTime<Utc>,
}

/// Which market observable a tick carries
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TickKind {
    Bid,
    Ask,
    Last,
    BidSize,
    AskSize,
    LastSize,
    Volume,
    Close,
}

/// Profit-and-loss update for a PnL subscription
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PnlUpdate {
    pub daily: f64,
    pub unrealized: f64,
    pub realized: f64,
}

/// Option chain parameters for one underlying/exchange pair
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OptionChainParams {
    pub exchange: String,
    pub underlying_contract_id: i64,
    pub trading_class: String,
    pub multiplier: String,
    pub expirations: Vec<String>,
    pub strikes: Vec<f64>,
}
