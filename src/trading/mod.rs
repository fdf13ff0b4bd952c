pub mod account;
pub mod bracket;
pub mod client;
pub mod liquidation;
pub mod market;
pub mod orders;
pub mod queries;

#[cfg(test)]
pub(crate) mod testkit;

pub use account::AccountLedger;
pub use bracket::{BracketOutcome, BracketSpec};
pub use client::BrokerClient;
pub use market::MarketStream;
