use serde::{Deserialize, Serialize};

/// Security type of a tradable instrument
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum SecType {
    #[default]
    Stock,
    Option,
    Future,
    Forex,
    Index,
    FutureOption,
    Warrant,
    Combo,
}

/// Option right for derivative contracts
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OptionRight {
    Call,
    Put,
}

/// An instrument as the broker identifies it.
///
/// Only `symbol`, `sec_type`, `exchange` and `currency` are required to route
/// most stock orders; the remaining fields narrow down derivatives. An
/// under-specified contract is legal and may resolve to multiple
/// `ContractDetails` rows on lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Contract {
    pub symbol: String,
    pub sec_type: SecType,
    pub exchange: String,
    pub currency: String,
    /// Broker-assigned numeric id, 0 when not yet resolved
    pub contract_id: i64,
    pub local_symbol: Option<String>,
    pub last_trade_date: Option<String>,
    pub strike: Option<f64>,
    pub right: Option<OptionRight>,
    pub multiplier: Option<String>,
}

impl Contract {
    /// US stock routed through the broker's smart router
    pub fn stock(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            sec_type: SecType::Stock,
            exchange: "SMART".to_string(),
            currency: "USD".to_string(),
            contract_id: 0,
            local_symbol: None,
            last_trade_date: None,
            strike: None,
            right: None,
            multiplier: None,
        }
    }

    /// Same contract with a different execution venue
    pub fn with_exchange(mut self, exchange: impl Into<String>) -> Self {
        self.exchange = exchange.into();
        self
    }
}

/// Fully resolved contract metadata returned by a contract-details lookup
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContractDetails {
    pub contract: Contract,
    pub long_name: String,
    pub market_name: String,
    pub min_tick: f64,
    pub valid_exchanges: Vec<String>,
    pub order_types: Vec<String>,
    pub time_zone_id: Option<String>,
    pub trading_hours: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_contract_defaults_to_smart_usd() {
        let c = Contract::stock("MSFT");
        assert_eq!(c.symbol, "MSFT");
        assert_eq!(c.sec_type, SecType::Stock);
        assert_eq!(c.exchange, "SMART");
        assert_eq!(c.currency, "USD");
    }

    #[test]
    fn exchange_override_replaces_routing() {
        let c = Contract::stock("MSFT").with_exchange("ISLAND");
        assert_eq!(c.exchange, "ISLAND");
    }
}
