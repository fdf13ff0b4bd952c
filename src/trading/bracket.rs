use tracing::{info, instrument, warn};

use crate::core::{Contract, Order, OrderAction};
use crate::correlation::CallOptions;
use crate::error::RequestError;

use super::client::BrokerClient;

/// Parameters of a bracket: an entry plus a profit-taking and a protective
/// leg on the opposite side.
#[derive(Debug, Clone)]
pub struct BracketSpec {
    pub action: OrderAction,
    pub quantity: f64,
    /// Entry limit price; a market entry when `None`
    pub entry_limit: Option<f64>,
    pub take_profit: f64,
    pub stop_trigger: f64,
    /// Makes the protective leg a stop-limit instead of a plain stop
    pub stop_limit: Option<f64>,
}

/// Per-leg verdicts of a bracket placement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BracketOutcome {
    pub entry_id: i64,
    pub take_profit_id: i64,
    pub stop_id: i64,
    pub entry: bool,
    pub take_profit: bool,
    pub stop: bool,
}

impl BracketOutcome {
    /// True only when every leg was accepted
    pub fn all_accepted(&self) -> bool {
        self.entry && self.take_profit && self.stop
    }
}

impl BrokerClient {
    /// Place a three-leg bracket.
    ///
    /// The legs get three consecutive identities; the profit and stop legs
    /// are children of the entry, and only the final (stop) leg carries
    /// `transmit = true`, so the broker releases the whole group when it
    /// processes that last leg. All three placements are dispatched
    /// concurrently and the result is their conjunction.
    ///
    /// This is client-side sequencing only. The broker accepts or rejects
    /// legs independently: a partial failure leaves the surviving legs on the
    /// book, the per-leg verdicts in the returned outcome are how callers
    /// detect and reconcile that state. Release of the group also assumes the
    /// broker processes legs in send order even under concurrent dispatch.
    #[instrument(skip(self, contract, spec, opts), fields(symbol = %contract.symbol))]
    pub async fn place_bracket_order(
        &self,
        contract: &Contract,
        spec: &BracketSpec,
        opts: &CallOptions,
    ) -> Result<BracketOutcome, RequestError> {
        let entry_id = self.next_order_id().await?;
        let take_profit_id = self.next_order_id().await?;
        let stop_id = self.next_order_id().await?;

        let entry = match spec.entry_limit {
            Some(price) => Order::limit(spec.action, spec.quantity, price),
            None => Order::market(spec.action, spec.quantity),
        }
        .held();

        let closing = spec.action.reversed();
        let take_profit = Order::limit(closing, spec.quantity, spec.take_profit)
            .child_of(entry_id)
            .held();
        let stop = match spec.stop_limit {
            Some(limit) => Order::stop_limit(closing, spec.quantity, spec.stop_trigger, limit),
            None => Order::stop(closing, spec.quantity, spec.stop_trigger),
        }
        .child_of(entry_id);

        let (entry_result, take_profit_result, stop_result) = tokio::join!(
            self.place_order(entry_id, contract, &entry, opts),
            self.place_order(take_profit_id, contract, &take_profit, opts),
            self.place_order(stop_id, contract, &stop, opts),
        );

        let outcome = BracketOutcome {
            entry_id,
            take_profit_id,
            stop_id,
            entry: entry_result?,
            take_profit: take_profit_result?,
            stop: stop_result?,
        };

        if outcome.all_accepted() {
            info!(entry_id, "bracket accepted");
        } else {
            warn!(
                entry = outcome.entry,
                take_profit = outcome.take_profit,
                stop = outcome.stop,
                "bracket partially rejected, book needs reconciliation"
            );
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constants::ERR_UNSUPPORTED_ORDER_TYPE;
    use crate::core::{OrderKind, OrderState};
    use crate::trading::testkit::connected_client;
    use crate::transport::{BrokerEvent, Command};

    fn sample_spec() -> BracketSpec {
        BracketSpec {
            action: OrderAction::Buy,
            quantity: 100.0,
            entry_limit: Some(50.0),
            take_profit: 55.0,
            stop_trigger: 48.0,
            stop_limit: None,
        }
    }

    fn accept_all(transport: &crate::transport::mock::MockTransport) {
        transport.respond(|command| match command {
            Command::PlaceOrder { order_id, .. } => vec![BrokerEvent::OrderStatus {
                order_id: *order_id,
                state: OrderState::PreSubmitted,
                filled: 0.0,
                remaining: 100.0,
                avg_fill_price: 0.0,
            }],
            _ => vec![],
        });
    }

    #[tokio::test]
    async fn legs_are_linked_and_only_the_stop_transmits() {
        let (transport, client) = connected_client().await;
        accept_all(&transport);

        let outcome = client
            .place_bracket_order(
                &Contract::stock("MSFT"),
                &sample_spec(),
                &CallOptions::default(),
            )
            .await
            .unwrap();
        assert!(outcome.all_accepted());

        let placed: Vec<(i64, Order)> = transport
            .sent()
            .into_iter()
            .filter_map(|command| match command {
                Command::PlaceOrder { order_id, order, .. } => Some((order_id, order)),
                _ => None,
            })
            .collect();
        assert_eq!(placed.len(), 3);

        let (entry_id, entry) = &placed[0];
        let (_, take_profit) = &placed[1];
        let (_, stop) = &placed[2];

        // consecutive identities
        assert_eq!(placed[1].0, entry_id + 1);
        assert_eq!(placed[2].0, entry_id + 2);

        assert_eq!(entry.kind, OrderKind::Limit);
        assert_eq!(entry.parent_id, 0);
        assert!(!entry.transmit);

        assert_eq!(take_profit.kind, OrderKind::Limit);
        assert_eq!(take_profit.action, OrderAction::Sell);
        assert_eq!(take_profit.parent_id, *entry_id);
        assert!(!take_profit.transmit);

        assert_eq!(stop.kind, OrderKind::Stop);
        assert_eq!(stop.action, OrderAction::Sell);
        assert_eq!(stop.parent_id, *entry_id);
        assert!(stop.transmit);
    }

    #[tokio::test]
    async fn one_rejected_leg_fails_the_conjunction_but_keeps_leg_verdicts() {
        let (transport, client) = connected_client().await;
        transport.respond(|command| match command {
            Command::PlaceOrder { order_id, order, .. } => {
                // reject the protective stop leg, accept the rest
                if order.kind == OrderKind::Stop {
                    vec![BrokerEvent::Error {
                        id: *order_id,
                        code: ERR_UNSUPPORTED_ORDER_TYPE,
                        message: "unsupported order type".to_string(),
                    }]
                } else {
                    vec![BrokerEvent::OrderStatus {
                        order_id: *order_id,
                        state: OrderState::Submitted,
                        filled: 0.0,
                        remaining: 100.0,
                        avg_fill_price: 0.0,
                    }]
                }
            }
            _ => vec![],
        });

        let outcome = client
            .place_bracket_order(
                &Contract::stock("MSFT"),
                &sample_spec(),
                &CallOptions::default(),
            )
            .await
            .unwrap();

        assert!(!outcome.all_accepted());
        assert!(outcome.entry);
        assert!(outcome.take_profit);
        assert!(!outcome.stop);
    }

    #[tokio::test]
    async fn stop_limit_price_switches_the_protective_leg_kind() {
        let (transport, client) = connected_client().await;
        accept_all(&transport);

        let mut spec = sample_spec();
        spec.stop_limit = Some(47.8);
        client
            .place_bracket_order(&Contract::stock("MSFT"), &spec, &CallOptions::default())
            .await
            .unwrap();

        let stop = transport
            .sent()
            .into_iter()
            .filter_map(|command| match command {
                Command::PlaceOrder { order, .. } if order.kind == OrderKind::StopLimit => {
                    Some(order)
                }
                _ => None,
            })
            .next()
            .expect("stop-limit leg");
        assert_eq!(stop.aux_price, Some(48.0));
        assert_eq!(stop.limit_price, Some(47.8));
    }
}
