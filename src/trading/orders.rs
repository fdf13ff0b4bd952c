use tracing::{debug, instrument};

use crate::core::constants::{is_cancel_rejection, is_place_rejection, ERR_ORDER_CANCELLED};
use crate::core::{Contract, Order};
use crate::correlation::{CallOptions, Step};
use crate::error::RequestError;
use crate::transport::{BrokerEvent, Command};

use super::client::BrokerClient;

impl BrokerClient {
    /// Place one order and wait for the broker's verdict.
    ///
    /// `Ok(true)` once the broker reports the order accepted (pre-submitted,
    /// submitted, or filled outright for marketable orders). `Ok(false)` on a
    /// recognized rejection (unsupported order type, ambiguous contract) so
    /// compound workflows can aggregate partial failure without unwinding.
    /// Any other broker error for this identity is an `Err`.
    #[instrument(skip(self, contract, order, opts), fields(symbol = %contract.symbol))]
    pub async fn place_order(
        &self,
        order_id: i64,
        contract: &Contract,
        order: &Order,
        opts: &CallOptions,
    ) -> Result<bool, RequestError> {
        let command = Command::PlaceOrder {
            order_id,
            contract: contract.clone(),
            order: order.clone(),
        };

        self.correlator
            .execute(
                order_id,
                command,
                self.config.timeouts.query,
                opts,
                move |event| match event {
                    BrokerEvent::OrderStatus { order_id: id, state, .. }
                        if *id == order_id && state.is_accepted() =>
                    {
                        Step::Done(true)
                    }
                    BrokerEvent::OpenOrder { record }
                        if record.order_id == order_id && record.state.is_accepted() =>
                    {
                        Step::Done(true)
                    }
                    BrokerEvent::Error { code, message, .. } if is_place_rejection(*code) => {
                        debug!(order_id, code, message = %message, "order rejected");
                        Step::Done(false)
                    }
                    _ => Step::Pending,
                },
            )
            .await
    }

    /// Cancel one working order.
    ///
    /// `Ok(true)` when the broker reports the order cancelled, via a status
    /// transition or the cancellation-confirmed error code, so cancelling an
    /// already-dead order still succeeds. `Ok(false)` when the broker refuses
    /// the cancel outright (unknown id, uncancellable state).
    #[instrument(skip(self, opts))]
    pub async fn cancel_order(
        &self,
        order_id: i64,
        opts: &CallOptions,
    ) -> Result<bool, RequestError> {
        self.correlator
            .execute(
                order_id,
                Command::CancelOrder { order_id },
                self.config.timeouts.query,
                opts,
                move |event| match event {
                    BrokerEvent::OrderStatus { order_id: id, state, .. }
                        if *id == order_id && state.is_cancelled() =>
                    {
                        Step::Done(true)
                    }
                    BrokerEvent::Error { code, .. } if *code == ERR_ORDER_CANCELLED => {
                        Step::Done(true)
                    }
                    BrokerEvent::Error { code, message, .. } if is_cancel_rejection(*code) => {
                        debug!(order_id, code, message = %message, "cancel refused");
                        Step::Done(false)
                    }
                    _ => Step::Pending,
                },
            )
            .await
    }
}
