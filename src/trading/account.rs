use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::instrument;

use crate::core::AccountField;
use crate::correlation::{CallOptions, Step};
use crate::error::RequestError;
use crate::transport::{BrokerEvent, Command};

use super::client::BrokerClient;

/// Concurrent field table accumulated from the account-update stream.
///
/// Keyed by account and field name; duplicate keys within one download keep
/// the last value written. A download defines an epoch: starting a new one
/// clears the account's provisional entries so a stale earlier download can
/// never leak into a fresh snapshot.
#[derive(Debug, Clone, Default)]
pub struct AccountLedger {
    fields: Arc<DashMap<(String, String), AccountField>>,
}

impl AccountLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub(super) fn begin_epoch(&self, account: &str) {
        self.fields.retain(|(acct, _), _| acct != account);
    }

    pub(super) fn record(&self, field: AccountField) {
        self.fields
            .insert((field.account.clone(), field.key.clone()), field);
    }

    /// Current values for one account, keyed by field name
    pub fn snapshot(&self, account: &str) -> HashMap<String, AccountField> {
        self.fields
            .iter()
            .filter(|entry| entry.key().0 == account)
            .map(|entry| (entry.key().1.clone(), entry.value().clone()))
            .collect()
    }
}

impl BrokerClient {
    /// Download a consistent snapshot of an account's fields.
    ///
    /// Subscribes to the account-update stream, accumulates rows into the
    /// ledger (last write wins), resolves when the broker signals the
    /// download complete, then drops the stream subscription. The returned
    /// map is the post-download snapshot; nothing is handed out while the
    /// download is still provisional.
    #[instrument(skip(self, opts), fields(account = %account))]
    pub async fn account_fields(
        &self,
        account: &str,
        opts: &CallOptions,
    ) -> Result<HashMap<String, AccountField>, RequestError> {
        let req_id = self.next_order_id().await?;
        self.ledger.begin_epoch(account);

        let subscribe = Command::RequestAccountUpdates {
            subscribe: true,
            account: account.to_string(),
        };

        let ledger = self.ledger.clone();
        let wanted = account.to_string();
        let result = self
            .correlator
            .execute(
                req_id,
                subscribe,
                self.config.timeouts.query,
                opts,
                move |event| match event {
                    BrokerEvent::AccountValue { field } if field.account == wanted => {
                        ledger.record(field.clone());
                        Step::Pending
                    }
                    BrokerEvent::AccountDownloadEnd { account } if *account == wanted => {
                        Step::Done(())
                    }
                    _ => Step::Pending,
                },
            )
            .await;

        // stop the stream on every outcome; best-effort, the subscription
        // dies with the connection anyway
        let _ = self
            .connection
            .send(Command::RequestAccountUpdates {
                subscribe: false,
                account: account.to_string(),
            })
            .await;

        result.map(|()| self.ledger.snapshot(account))
    }

    /// Read-only access to the accumulated account fields
    pub fn account_ledger(&self) -> &AccountLedger {
        &self.ledger
    }
}
