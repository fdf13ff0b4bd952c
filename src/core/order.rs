use serde::{Deserialize, Serialize};

use super::contract::Contract;

/// Side of an order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderAction {
    Buy,
    Sell,
}

impl OrderAction {
    /// The opposite side, used to build closing/profit legs
    pub fn reversed(self) -> Self {
        match self {
            OrderAction::Buy => OrderAction::Sell,
            OrderAction::Sell => OrderAction::Buy,
        }
    }
}

/// Order types the orchestration layer emits
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderKind {
    Market,
    Limit,
    Stop,
    StopLimit,
}

/// How long an order stays working
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum TimeInForce {
    #[default]
    Day,
    GoodTillCancelled,
    ImmediateOrCancel,
    FillOrKill,
}

/// Behavior of the remaining orders when one member of an OCA group executes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OcaType {
    CancelWithBlock = 1,
    ReduceWithBlock = 2,
    ReduceNonBlock = 3,
}

/// An order ticket.
///
/// Identity is not part of the ticket: the caller supplies the order id at
/// placement time so compound workflows can allocate consecutive ids and link
/// legs before anything is sent. `parent_id` of 0 marks a root order; child
/// legs reference the root's id. `transmit = false` parks the order at the
/// broker until a later leg with `transmit = true` releases the whole group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub action: OrderAction,
    pub kind: OrderKind,
    pub quantity: f64,
    pub limit_price: Option<f64>,
    /// Stop/trigger price for Stop and StopLimit orders
    pub aux_price: Option<f64>,
    pub time_in_force: TimeInForce,
    pub parent_id: i64,
    pub transmit: bool,
    pub oca_group: Option<String>,
    pub oca_type: Option<OcaType>,
    pub account: Option<String>,
}

impl Order {
    pub fn market(action: OrderAction, quantity: f64) -> Self {
        Self::new(action, OrderKind::Market, quantity)
    }

    pub fn limit(action: OrderAction, quantity: f64, limit_price: f64) -> Self {
        let mut order = Self::new(action, OrderKind::Limit, quantity);
        order.limit_price = Some(limit_price);
        order
    }

    pub fn stop(action: OrderAction, quantity: f64, stop_price: f64) -> Self {
        let mut order = Self::new(action, OrderKind::Stop, quantity);
        order.aux_price = Some(stop_price);
        order
    }

    pub fn stop_limit(action: OrderAction, quantity: f64, stop_price: f64, limit_price: f64) -> Self {
        let mut order = Self::new(action, OrderKind::StopLimit, quantity);
        order.aux_price = Some(stop_price);
        order.limit_price = Some(limit_price);
        order
    }

    fn new(action: OrderAction, kind: OrderKind, quantity: f64) -> Self {
        Self {
            action,
            kind,
            quantity,
            limit_price: None,
            aux_price: None,
            time_in_force: TimeInForce::Day,
            parent_id: 0,
            transmit: true,
            oca_group: None,
            oca_type: None,
            account: None,
        }
    }

    /// Link this order under a root leg
    pub fn child_of(mut self, parent_id: i64) -> Self {
        self.parent_id = parent_id;
        self
    }

    /// Park the order at the broker until a sibling releases the group
    pub fn held(mut self) -> Self {
        self.transmit = false;
        self
    }
}

/// Lifecycle states the broker reports for a working order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderState {
    PendingSubmit,
    PendingCancel,
    PreSubmitted,
    Submitted,
    Filled,
    Cancelled,
    ApiCancelled,
    Inactive,
}

impl OrderState {
    /// True once the broker has accepted the order onto its book (or filled it)
    pub fn is_accepted(self) -> bool {
        matches!(
            self,
            OrderState::PreSubmitted | OrderState::Submitted | OrderState::Filled
        )
    }

    /// True once the order is dead on the broker side
    pub fn is_cancelled(self) -> bool {
        matches!(self, OrderState::Cancelled | OrderState::ApiCancelled)
    }
}

/// One row of an open-orders download
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OpenOrderRecord {
    pub order_id: i64,
    pub contract: Contract,
    pub order: Order,
    pub state: OrderState,
}
