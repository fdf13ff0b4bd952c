use std::mem;

use tracing::instrument;

use crate::core::{
    Contract, ContractDetails, ExecutionFilter, ExecutionRecord, OpenOrderRecord,
    OptionChainParams, Position, SecType,
};
use crate::correlation::{CallOptions, Step};
use crate::error::RequestError;
use crate::transport::{BrokerEvent, Command};

use super::client::BrokerClient;

/// Accumulate-until-end queries.
///
/// Every query here follows the same shape: allocate an identity, subscribe,
/// send one command, append matching rows, resolve when the end marker for
/// that identity arrives. Results are provisional until the end marker; the
/// caller never sees a partial list.
impl BrokerClient {
    /// Resolve an instrument description to full contract metadata.
    ///
    /// An under-specified description legitimately matches several contracts;
    /// all of them are returned.
    #[instrument(skip(self, opts), fields(symbol = %contract.symbol))]
    pub async fn contract_details(
        &self,
        contract: &Contract,
        opts: &CallOptions,
    ) -> Result<Vec<ContractDetails>, RequestError> {
        let req_id = self.next_order_id().await?;
        let command = Command::RequestContractDetails {
            req_id,
            contract: contract.clone(),
        };

        let mut rows: Vec<ContractDetails> = Vec::new();
        self.correlator
            .execute(
                req_id,
                command,
                self.config.timeouts.query,
                opts,
                move |event| match event {
                    BrokerEvent::ContractDetails { req_id: id, details } if *id == req_id => {
                        rows.push(details.clone());
                        Step::Pending
                    }
                    BrokerEvent::ContractDetailsEnd { req_id: id } if *id == req_id => {
                        Step::Done(mem::take(&mut rows))
                    }
                    _ => Step::Pending,
                },
            )
            .await
    }

    /// Download the currently working orders.
    ///
    /// The broker reports these as one global stream; rows are kept in
    /// delivery order, duplicates included. Consumers that need one row per
    /// order de-duplicate by order id.
    #[instrument(skip(self, opts))]
    pub async fn open_orders(
        &self,
        opts: &CallOptions,
    ) -> Result<Vec<OpenOrderRecord>, RequestError> {
        let req_id = self.next_order_id().await?;

        let mut rows: Vec<OpenOrderRecord> = Vec::new();
        self.correlator
            .execute(
                req_id,
                Command::RequestOpenOrders,
                self.config.timeouts.query,
                opts,
                move |event| match event {
                    BrokerEvent::OpenOrder { record } => {
                        rows.push(record.clone());
                        Step::Pending
                    }
                    BrokerEvent::OpenOrderEnd => Step::Done(mem::take(&mut rows)),
                    _ => Step::Pending,
                },
            )
            .await
    }

    /// Download the account's current positions
    #[instrument(skip(self, opts))]
    pub async fn positions(&self, opts: &CallOptions) -> Result<Vec<Position>, RequestError> {
        let req_id = self.next_order_id().await?;

        let mut rows: Vec<Position> = Vec::new();
        self.correlator
            .execute(
                req_id,
                Command::RequestPositions,
                self.config.timeouts.query,
                opts,
                move |event| match event {
                    BrokerEvent::Position { position } => {
                        rows.push(position.clone());
                        Step::Pending
                    }
                    BrokerEvent::PositionEnd => Step::Done(mem::take(&mut rows)),
                    _ => Step::Pending,
                },
            )
            .await
    }

    /// Download executions matching a server-side filter
    #[instrument(skip(self, filter, opts))]
    pub async fn executions(
        &self,
        filter: &ExecutionFilter,
        opts: &CallOptions,
    ) -> Result<Vec<ExecutionRecord>, RequestError> {
        let req_id = self.next_order_id().await?;
        let command = Command::RequestExecutions {
            req_id,
            filter: filter.clone(),
        };

        let mut rows: Vec<ExecutionRecord> = Vec::new();
        self.correlator
            .execute(
                req_id,
                command,
                self.config.timeouts.query,
                opts,
                move |event| match event {
                    BrokerEvent::ExecutionData { req_id: id, execution } if *id == req_id => {
                        rows.push(execution.clone());
                        Step::Pending
                    }
                    BrokerEvent::ExecutionDataEnd { req_id: id } if *id == req_id => {
                        Step::Done(mem::take(&mut rows))
                    }
                    _ => Step::Pending,
                },
            )
            .await
    }

    /// Option chain parameters for an underlying, one row per exchange
    #[instrument(skip(self, opts), fields(symbol = %symbol))]
    pub async fn option_chain_params(
        &self,
        symbol: &str,
        sec_type: SecType,
        underlying_contract_id: i64,
        opts: &CallOptions,
    ) -> Result<Vec<OptionChainParams>, RequestError> {
        let req_id = self.next_order_id().await?;
        let command = Command::RequestSecurityDefinitionParams {
            req_id,
            symbol: symbol.to_string(),
            sec_type,
            underlying_contract_id,
        };

        let mut rows: Vec<OptionChainParams> = Vec::new();
        self.correlator
            .execute(
                req_id,
                command,
                self.config.timeouts.security_definition,
                opts,
                move |event| match event {
                    BrokerEvent::SecurityDefinition { req_id: id, params } if *id == req_id => {
                        rows.push(params.clone());
                        Step::Pending
                    }
                    BrokerEvent::SecurityDefinitionEnd { req_id: id } if *id == req_id => {
                        Step::Done(mem::take(&mut rows))
                    }
                    _ => Step::Pending,
                },
            )
            .await
    }
}
