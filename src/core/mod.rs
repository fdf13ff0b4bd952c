pub mod constants;
pub mod contract;
pub mod order;
pub mod records;

pub use contract::{Contract, ContractDetails, OptionRight, SecType};
pub use order::{
    OcaType, OpenOrderRecord, Order, OrderAction, OrderKind, OrderState, TimeInForce,
};
pub use records::{
    AccountField, ExecutionFilter, ExecutionRecord, OptionChainParams, PnlUpdate, Position,
    TickKind,
};
