pub mod command;
pub mod events;
pub mod hub;
pub mod port;

#[cfg(test)]
pub(crate) mod mock;

pub use command::Command;
pub use events::{
    AccountEvent, BrokerEvent, ConnectionEvent, ContractEvent, ErrorEvent, ExecutionEvent,
    MarketEvent, OrderEvent, PositionEvent,
};
pub use hub::{EventHub, HubSnapshot};
pub use port::{EventStream, TransportPort};
