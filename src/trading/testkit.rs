//! Shared fixtures for the operation tests: a connected client over the
//! scripted transport, plus record builders.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::config::ClientConfig;
use crate::core::{
    AccountField, Contract, ExecutionRecord, OpenOrderRecord, Order, OrderAction, OrderState,
};
use crate::transport::mock::MockTransport;
use crate::transport::BrokerEvent;

use super::client::BrokerClient;

pub(crate) async fn connected_client() -> (Arc<MockTransport>, BrokerClient) {
    let transport = Arc::new(MockTransport::new());
    let mut config = ClientConfig::default();
    config.timeouts.settle = Duration::from_millis(1);
    config.timeouts.connect = Duration::from_millis(500);
    config.timeouts.query = Duration::from_millis(500);
    config.timeouts.id_seed = Duration::from_millis(500);

    let client = BrokerClient::new(Arc::clone(&transport) as _, config);
    client.ensure_connected().await.unwrap();
    (transport, client)
}

pub(crate) fn open_order_record(order_id: i64, symbol: &str, state: OrderState) -> OpenOrderRecord {
    OpenOrderRecord {
        order_id,
        contract: Contract::stock(symbol),
        order: Order::limit(OrderAction::Buy, 100.0, 50.0),
        state,
    }
}

pub(crate) fn execution_record(order_id: i64, symbol: &str) -> ExecutionRecord {
    ExecutionRecord {
        execution_id: format!("0000e0d5.{order_id}"),
        order_id,
        contract: Contract::stock(symbol),
        side: OrderAction::Buy,
        shares: 100.0,
        price: 50.0,
        account: "ACCT1".to_string(),
        exchange: "ISLAND".to_string(),
        time: Utc::now(),
    }
}

pub(crate) fn account_value(
    account: &str,
    key: &str,
    value: &str,
    currency: Option<&str>,
) -> BrokerEvent {
    BrokerEvent::AccountValue {
        field: AccountField {
            key: key.to_string(),
            value: value.to_string(),
            currency: currency.map(str::to_string),
            account: account.to_string(),
            updated_at: Utc::now(),
        },
    }
}
