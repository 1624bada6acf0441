use super::account::{Account, AccountId, Balance};
use super::transaction::{NewTransaction, Transaction, TransactionId, TransactionStatus};
use crate::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;

/// Shared handles for dynamic dispatch over the storage backends.
pub type AccountStoreRef = Arc<dyn AccountStore>;
pub type TransactionStoreRef = Arc<dyn TransactionStore>;

/// Persistence port for accounts. Pure storage: no balance logic lives here.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn upsert(&self, account: Account) -> Result<()>;

    async fn get(&self, id: AccountId) -> Result<Option<Account>>;

    /// Replaces the stored balance. Callers pair the sender and receiver
    /// updates inside one lock scope; the store itself stays oblivious.
    async fn set_balance(&self, id: AccountId, balance: Balance) -> Result<()>;

    /// Replaces both stored balances in one atomic step: either both writes
    /// land or neither does, with no await point between them, so an
    /// abandoned caller cannot leave half a transfer applied.
    async fn set_balance_pair(
        &self,
        first: (AccountId, Balance),
        second: (AccountId, Balance),
    ) -> Result<()>;

    async fn all(&self) -> Result<Vec<Account>>;
}

/// Persistence port for the durable transfer log.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Persists a new record, assigning its id and creation timestamp.
    async fn insert(&self, tx: NewTransaction) -> Result<Transaction>;

    /// Applies a lifecycle transition. Fails with
    /// [`crate::error::TransferError::TerminalStatus`] if the stored record
    /// is already terminal, so a terminal status can never be rewritten.
    async fn update_status(&self, id: TransactionId, status: TransactionStatus) -> Result<()>;

    async fn find_by_id(&self, id: TransactionId) -> Result<Option<Transaction>>;

    /// Every transaction in which the account appears as sender or receiver.
    async fn find_for_account(&self, account: AccountId) -> Result<Vec<Transaction>>;

    /// Pending transactions whose scheduled date equals `date`. The status
    /// filter is what makes re-running an interrupted sweep idempotent.
    async fn find_due_on(&self, date: NaiveDate) -> Result<Vec<Transaction>>;

    /// Administrative removal; no balance side effect.
    async fn delete(&self, id: TransactionId) -> Result<()>;

    async fn all(&self) -> Result<Vec<Transaction>>;
}
