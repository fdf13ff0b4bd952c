use serde::{Deserialize, Serialize};

use crate::core::{Contract, ExecutionFilter, Order, SecType};

/// Every outbound message the orchestration layer can ask the transport to
/// encode and send. Exactly one command is issued per primitive operation;
/// subscription commands have a matching explicit cancel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Command {
    PlaceOrder {
        order_id: i64,
        contract: Contract,
        order: Order,
    },
    CancelOrder { order_id: i64 },

    RequestContractDetails { req_id: i64, contract: Contract },
    RequestOpenOrders,
    RequestPositions,
    RequestExecutions { req_id: i64, filter: ExecutionFilter },

    RequestAccountUpdates { subscribe: bool, account: String },

    RequestMarketData {
        req_id: i64,
        contract: Contract,
        snapshot: bool,
    },
    CancelMarketData { req_id: i64 },

    RequestPnl { req_id: i64, account: String },
    CancelPnl { req_id: i64 },

    RequestSecurityDefinitionParams {
        req_id: i64,
        symbol: String,
        sec_type: SecType,
        underlying_contract_id: i64,
    },
}
