// Core data model
pub mod core;

// Configuration
pub mod config;

// Errors
pub mod error;

// Transport boundary and event fan-out
pub mod transport;

// Connection lifecycle and identity allocation
pub mod connection;

// Request correlation engine
pub mod correlation;

// Operation surface: primitives and compound workflows
pub mod trading;


// Re-export the types most applications touch
pub use config::{ClientConfig, Timeouts};
pub use connection::{ConnectionController, ConnectionState, OrderIdSequencer};
pub use correlation::{CallOptions, Correlator, Step};
pub use error::{ConnectError, RequestError};
pub use trading::{AccountLedger, BracketOutcome, BracketSpec, BrokerClient, MarketStream};
pub use transport::{BrokerEvent, Command, EventHub, EventStream, TransportPort};
