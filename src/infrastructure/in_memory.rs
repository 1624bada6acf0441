use crate::domain::account::{Account, AccountId, Balance};
use crate::domain::ports::{AccountStore, TransactionStore};
use crate::domain::transaction::{NewTransaction, Transaction, TransactionId, TransactionStatus};
use crate::error::{Result, TransferError};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

/// A thread-safe in-memory account store.
///
/// Uses `Arc<RwLock<HashMap>>` for shared concurrent access. The default
/// backend for tests and batch runs where persistence is not required.
#[derive(Default, Clone)]
pub struct InMemoryAccountStore {
    accounts: Arc<RwLock<HashMap<AccountId, Account>>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-seeded with the given accounts.
    pub fn with_accounts(accounts: impl IntoIterator<Item = Account>) -> Self {
        let map = accounts
            .into_iter()
            .map(|account| (account.id, account))
            .collect();
        Self {
            accounts: Arc::new(RwLock::new(map)),
        }
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn upsert(&self, account: Account) -> Result<()> {
        let mut accounts = self.accounts.write().await;
        accounts.insert(account.id, account);
        Ok(())
    }

    async fn get(&self, id: AccountId) -> Result<Option<Account>> {
        let accounts = self.accounts.read().await;
        Ok(accounts.get(&id).cloned())
    }

    async fn set_balance(&self, id: AccountId, balance: Balance) -> Result<()> {
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .get_mut(&id)
            .ok_or(TransferError::UnknownAccount(id))?;
        account.balance = balance;
        Ok(())
    }

    async fn set_balance_pair(
        &self,
        first: (AccountId, Balance),
        second: (AccountId, Balance),
    ) -> Result<()> {
        let mut accounts = self.accounts.write().await;
        // Validate both before touching either.
        for (id, _) in [first, second] {
            if !accounts.contains_key(&id) {
                return Err(TransferError::UnknownAccount(id));
            }
        }
        for (id, balance) in [first, second] {
            let account = accounts
                .get_mut(&id)
                .ok_or(TransferError::UnknownAccount(id))?;
            account.balance = balance;
        }
        Ok(())
    }

    async fn all(&self) -> Result<Vec<Account>> {
        let accounts = self.accounts.read().await;
        let mut all: Vec<Account> = accounts.values().cloned().collect();
        all.sort_by_key(|account| account.id);
        Ok(all)
    }
}

/// A thread-safe in-memory transaction log with a monotonic id sequence.
#[derive(Default, Clone)]
pub struct InMemoryTransactionStore {
    transactions: Arc<RwLock<HashMap<TransactionId, Transaction>>>,
    next_id: Arc<AtomicU64>,
}

impl InMemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn insert(&self, tx: NewTransaction) -> Result<Transaction> {
        let id = TransactionId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let record = Transaction {
            id,
            amount: tx.amount,
            sender: tx.sender,
            receiver: tx.receiver,
            status: tx.status,
            scheduled_on: tx.scheduled_on,
            description: tx.description,
            created_at: Utc::now(),
        };
        let mut transactions = self.transactions.write().await;
        transactions.insert(id, record.clone());
        Ok(record)
    }

    async fn update_status(&self, id: TransactionId, status: TransactionStatus) -> Result<()> {
        let mut transactions = self.transactions.write().await;
        let record = transactions.get_mut(&id).ok_or(TransferError::NotFound(id))?;
        if record.status.is_terminal() {
            return Err(TransferError::TerminalStatus(id));
        }
        record.status = status;
        Ok(())
    }

    async fn find_by_id(&self, id: TransactionId) -> Result<Option<Transaction>> {
        let transactions = self.transactions.read().await;
        Ok(transactions.get(&id).cloned())
    }

    async fn find_for_account(&self, account: AccountId) -> Result<Vec<Transaction>> {
        let transactions = self.transactions.read().await;
        let mut matches: Vec<Transaction> = transactions
            .values()
            .filter(|tx| tx.sender == account || tx.receiver == account)
            .cloned()
            .collect();
        matches.sort_by_key(|tx| tx.id);
        Ok(matches)
    }

    async fn find_due_on(&self, date: NaiveDate) -> Result<Vec<Transaction>> {
        let transactions = self.transactions.read().await;
        let mut due: Vec<Transaction> = transactions
            .values()
            .filter(|tx| tx.status == TransactionStatus::Pending && tx.scheduled_on == date)
            .cloned()
            .collect();
        due.sort_by_key(|tx| tx.id);
        Ok(due)
    }

    async fn delete(&self, id: TransactionId) -> Result<()> {
        let mut transactions = self.transactions.write().await;
        transactions
            .remove(&id)
            .map(|_| ())
            .ok_or(TransferError::NotFound(id))
    }

    async fn all(&self) -> Result<Vec<Transaction>> {
        let transactions = self.transactions.read().await;
        let mut all: Vec<Transaction> = transactions.values().cloned().collect();
        all.sort_by_key(|tx| tx.id);
        Ok(all)
    }
}
