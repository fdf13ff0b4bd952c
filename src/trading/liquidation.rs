use std::collections::HashSet;

use tracing::{info, instrument, warn};

use crate::core::Order;
use crate::correlation::CallOptions;
use crate::error::RequestError;

use super::client::BrokerClient;

impl BrokerClient {
    /// Cancel every working order on one instrument.
    ///
    /// `Ok(false)` when nothing was working. Otherwise the conjunction of the
    /// individual cancels, best-effort: a leg that errors is logged and
    /// counted as a failure instead of aborting the sweep. The open-order
    /// stream can report one logical order several times, so ids are
    /// de-duplicated before cancelling.
    #[instrument(skip(self, opts))]
    pub async fn cancel_orders_for_instrument(
        &self,
        symbol: &str,
        opts: &CallOptions,
    ) -> Result<bool, RequestError> {
        let open = self.open_orders(opts).await?;

        let mut seen = HashSet::new();
        let targets: Vec<i64> = open
            .into_iter()
            .filter(|record| record.contract.symbol == symbol)
            .filter_map(|record| seen.insert(record.order_id).then_some(record.order_id))
            .collect();
        if targets.is_empty() {
            return Ok(false);
        }

        let mut all_cancelled = true;
        for order_id in targets {
            match self.cancel_order(order_id, opts).await {
                Ok(cancelled) => all_cancelled &= cancelled,
                Err(e) => {
                    warn!(order_id, error = %e, "cancel failed, continuing sweep");
                    all_cancelled = false;
                }
            }
        }
        Ok(all_cancelled)
    }

    /// Flatten one instrument's position.
    ///
    /// Cancels the instrument's working orders, then offsets the current
    /// position with a market order: long positions are sold, shorts are
    /// bought back, sized to the absolute quantity. The position snapshot
    /// does not retain the venue the position was built on, so the caller
    /// supplies the execution exchange. When no nonzero position exists for
    /// the symbol, returns `Ok(false)` without issuing any order.
    #[instrument(skip(self, opts))]
    pub async fn liquidate_position(
        &self,
        symbol: &str,
        exchange: &str,
        opts: &CallOptions,
    ) -> Result<bool, RequestError> {
        self.cancel_orders_for_instrument(symbol, opts).await?;

        let positions = self.positions(opts).await?;
        let Some(position) = positions
            .into_iter()
            .find(|p| p.contract.symbol == symbol && p.quantity != 0.0)
        else {
            info!(symbol, "no open position to liquidate");
            return Ok(false);
        };

        // closing_action is Some for any nonzero quantity
        let action = position.closing_action().expect("nonzero position");
        let contract = position.contract.clone().with_exchange(exchange);
        let order = Order::market(action, position.quantity.abs());

        let order_id = self.next_order_id().await?;
        info!(
            symbol,
            order_id,
            quantity = order.quantity,
            ?action,
            "placing liquidation order"
        );
        self.place_order(order_id, &contract, &order, opts).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constants::ERR_CANNOT_CANCEL_STATE;
    use crate::core::{Contract, OrderAction, OrderState, Position};
    use crate::trading::testkit::{connected_client, open_order_record};
    use crate::transport::{BrokerEvent, Command};

    fn respond_positions(
        transport: &crate::transport::mock::MockTransport,
        positions: Vec<Position>,
    ) {
        transport.respond(move |command| match command {
            Command::RequestPositions => {
                let mut events: Vec<BrokerEvent> = positions
                    .iter()
                    .map(|position| BrokerEvent::Position {
                        position: position.clone(),
                    })
                    .collect();
                events.push(BrokerEvent::PositionEnd);
                events
            }
            _ => vec![],
        });
    }

    fn respond_no_open_orders(transport: &crate::transport::mock::MockTransport) {
        transport.respond(|command| match command {
            Command::RequestOpenOrders => vec![BrokerEvent::OpenOrderEnd],
            _ => vec![],
        });
    }

    fn accept_orders(transport: &crate::transport::mock::MockTransport) {
        transport.respond(|command| match command {
            Command::PlaceOrder { order_id, .. } => vec![BrokerEvent::OrderStatus {
                order_id: *order_id,
                state: OrderState::Submitted,
                filled: 0.0,
                remaining: 1.0,
                avg_fill_price: 0.0,
            }],
            _ => vec![],
        });
    }

    fn position(symbol: &str, quantity: f64) -> Position {
        Position {
            account: "ACCT1".to_string(),
            contract: Contract::stock(symbol),
            quantity,
            average_cost: 100.0,
        }
    }

    #[tokio::test]
    async fn long_position_is_sold_on_the_requested_venue() {
        let (transport, client) = connected_client().await;
        respond_no_open_orders(&transport);
        respond_positions(&transport, vec![position("MSFT", 300.0)]);
        accept_orders(&transport);

        let done = client
            .liquidate_position("MSFT", "ISLAND", &CallOptions::default())
            .await
            .unwrap();
        assert!(done);

        let (contract, order) = transport
            .sent()
            .into_iter()
            .filter_map(|command| match command {
                Command::PlaceOrder { contract, order, .. } => Some((contract, order)),
                _ => None,
            })
            .next()
            .expect("liquidation order");
        assert_eq!(order.action, OrderAction::Sell);
        assert_eq!(order.quantity, 300.0);
        assert_eq!(contract.exchange, "ISLAND");
    }

    #[tokio::test]
    async fn short_position_is_bought_back() {
        let (transport, client) = connected_client().await;
        respond_no_open_orders(&transport);
        respond_positions(&transport, vec![position("MSFT", -75.0)]);
        accept_orders(&transport);

        assert!(client
            .liquidate_position("MSFT", "SMART", &CallOptions::default())
            .await
            .unwrap());

        let order = transport
            .sent()
            .into_iter()
            .filter_map(|command| match command {
                Command::PlaceOrder { order, .. } => Some(order),
                _ => None,
            })
            .next()
            .unwrap();
        assert_eq!(order.action, OrderAction::Buy);
        assert_eq!(order.quantity, 75.0);
    }

    #[tokio::test]
    async fn zero_or_absent_position_issues_no_order() {
        let (transport, client) = connected_client().await;
        respond_no_open_orders(&transport);
        respond_positions(
            &transport,
            vec![position("MSFT", 0.0), position("AAPL", 10.0)],
        );

        let done = client
            .liquidate_position("MSFT", "SMART", &CallOptions::default())
            .await
            .unwrap();
        assert!(!done);

        let placed = transport
            .sent()
            .into_iter()
            .any(|command| matches!(command, Command::PlaceOrder { .. }));
        assert!(!placed);
    }

    #[tokio::test]
    async fn cancel_sweep_deduplicates_and_reports_conjunction() {
        let (transport, client) = connected_client().await;
        transport.respond(|command| match command {
            Command::RequestOpenOrders => vec![
                BrokerEvent::OpenOrder {
                    record: open_order_record(41, "MSFT", OrderState::Submitted),
                },
                // same logical order reported twice
                BrokerEvent::OpenOrder {
                    record: open_order_record(41, "MSFT", OrderState::Submitted),
                },
                BrokerEvent::OpenOrder {
                    record: open_order_record(42, "MSFT", OrderState::Submitted),
                },
                BrokerEvent::OpenOrder {
                    record: open_order_record(43, "AAPL", OrderState::Submitted),
                },
                BrokerEvent::OpenOrderEnd,
            ],
            _ => vec![],
        });
        transport.respond(|command| match command {
            Command::CancelOrder { order_id: 41 } => vec![BrokerEvent::OrderStatus {
                order_id: 41,
                state: OrderState::Cancelled,
                filled: 0.0,
                remaining: 1.0,
                avg_fill_price: 0.0,
            }],
            Command::CancelOrder { order_id: 42 } => vec![BrokerEvent::Error {
                id: 42,
                code: ERR_CANNOT_CANCEL_STATE,
                message: "cannot cancel".to_string(),
            }],
            _ => vec![],
        });

        let all = client
            .cancel_orders_for_instrument("MSFT", &CallOptions::default())
            .await
            .unwrap();
        assert!(!all);

        let cancels: Vec<i64> = transport
            .sent()
            .into_iter()
            .filter_map(|command| match command {
                Command::CancelOrder { order_id } => Some(order_id),
                _ => None,
            })
            .collect();
        // 41 cancelled once despite the duplicate row; 43 untouched
        assert_eq!(cancels, vec![41, 42]);
    }

    #[tokio::test]
    async fn no_matching_orders_returns_false_without_cancels() {
        let (transport, client) = connected_client().await;
        respond_no_open_orders(&transport);

        let any = client
            .cancel_orders_for_instrument("MSFT", &CallOptions::default())
            .await
            .unwrap();
        assert!(!any);
        assert!(!transport
            .sent()
            .into_iter()
            .any(|command| matches!(command, Command::CancelOrder { .. })));
    }
}
