use crate::domain::account::{Account, AccountId, Balance};
use crate::domain::ports::{AccountStore, TransactionStore};
use crate::domain::transaction::{NewTransaction, Transaction, TransactionId, TransactionStatus};
use crate::error::{Result, TransferError};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options, WriteBatch};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Column family for account states.
pub const CF_ACCOUNTS: &str = "accounts";
/// Column family for the transaction log.
pub const CF_TRANSACTIONS: &str = "transactions";

/// A persistent store backed by RocksDB.
///
/// Accounts and transactions live in separate column families with
/// big-endian id keys and `serde_json` values. The transaction id sequence
/// resumes from the highest persisted id on open, so ids stay unique across
/// restarts. `Clone` shares the underlying `Arc<DB>`.
#[derive(Clone)]
pub struct RocksDbStore {
    db: Arc<DB>,
    next_tx_id: Arc<AtomicU64>,
}

impl RocksDbStore {
    /// Opens or creates a database at `path`, ensuring both column families
    /// exist and restoring the transaction id sequence.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_accounts = ColumnFamilyDescriptor::new(CF_ACCOUNTS, Options::default());
        let cf_transactions = ColumnFamilyDescriptor::new(CF_TRANSACTIONS, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_accounts, cf_transactions])?;

        let last_id = {
            let cf = db
                .cf_handle(CF_TRANSACTIONS)
                .ok_or_else(|| TransferError::Storage("missing transactions column family".into()))?;
            // Keys are big-endian ids, so the last key is the highest id.
            match db.iterator_cf(cf, IteratorMode::End).next() {
                Some(entry) => {
                    let (key, _) = entry?;
                    let bytes: [u8; 8] = key.as_ref().try_into().map_err(|_| {
                        TransferError::Storage("malformed transaction key".to_string())
                    })?;
                    u64::from_be_bytes(bytes)
                }
                None => 0,
            }
        };

        Ok(Self {
            db: Arc::new(db),
            next_tx_id: Arc::new(AtomicU64::new(last_id)),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| TransferError::Storage(format!("missing column family: {name}")))
    }

    fn get_account(&self, id: AccountId) -> Result<Option<Account>> {
        let cf = self.cf(CF_ACCOUNTS)?;
        match self.db.get_cf(cf, id.0.to_be_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn get_transaction(&self, id: TransactionId) -> Result<Option<Transaction>> {
        let cf = self.cf(CF_TRANSACTIONS)?;
        match self.db.get_cf(cf, id.0.to_be_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn put_transaction(&self, tx: &Transaction) -> Result<()> {
        let cf = self.cf(CF_TRANSACTIONS)?;
        self.db
            .put_cf(cf, tx.id.0.to_be_bytes(), serde_json::to_vec(tx)?)?;
        Ok(())
    }
}

#[async_trait]
impl AccountStore for RocksDbStore {
    async fn upsert(&self, account: Account) -> Result<()> {
        let cf = self.cf(CF_ACCOUNTS)?;
        self.db
            .put_cf(cf, account.id.0.to_be_bytes(), serde_json::to_vec(&account)?)?;
        Ok(())
    }

    async fn get(&self, id: AccountId) -> Result<Option<Account>> {
        self.get_account(id)
    }

    async fn set_balance(&self, id: AccountId, balance: Balance) -> Result<()> {
        let mut account = AccountStore::get(self, id)
            .await?
            .ok_or(TransferError::UnknownAccount(id))?;
        account.balance = balance;
        self.upsert(account).await
    }

    async fn set_balance_pair(
        &self,
        first: (AccountId, Balance),
        second: (AccountId, Balance),
    ) -> Result<()> {
        let cf = self.cf(CF_ACCOUNTS)?;
        let mut batch = WriteBatch::default();
        for (id, balance) in [first, second] {
            let mut account = self.get_account(id)?.ok_or(TransferError::UnknownAccount(id))?;
            account.balance = balance;
            batch.put_cf(cf, id.0.to_be_bytes(), serde_json::to_vec(&account)?);
        }
        // One atomic write: a crash can never leave half the pair applied.
        self.db.write(batch)?;
        Ok(())
    }

    async fn all(&self) -> Result<Vec<Account>> {
        let cf = self.cf(CF_ACCOUNTS)?;
        let mut accounts = Vec::new();
        for entry in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_, value) = entry?;
            accounts.push(serde_json::from_slice(&value)?);
        }
        Ok(accounts)
    }
}

#[async_trait]
impl TransactionStore for RocksDbStore {
    async fn insert(&self, tx: NewTransaction) -> Result<Transaction> {
        let id = TransactionId(self.next_tx_id.fetch_add(1, Ordering::SeqCst) + 1);
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
        self.put_transaction(&record)?;
        Ok(record)
    }

    async fn update_status(&self, id: TransactionId, status: TransactionStatus) -> Result<()> {
        let mut record = self
            .get_transaction(id)?
            .ok_or(TransferError::NotFound(id))?;
        if record.status.is_terminal() {
            return Err(TransferError::TerminalStatus(id));
        }
        record.status = status;
        self.put_transaction(&record)
    }

    async fn find_by_id(&self, id: TransactionId) -> Result<Option<Transaction>> {
        self.get_transaction(id)
    }

    async fn find_for_account(&self, account: AccountId) -> Result<Vec<Transaction>> {
        let cf = self.cf(CF_TRANSACTIONS)?;
        let mut matches = Vec::new();
        for entry in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_, value) = entry?;
            let tx: Transaction = serde_json::from_slice(&value)?;
            if tx.sender == account || tx.receiver == account {
                matches.push(tx);
            }
        }
        Ok(matches)
    }

    async fn find_due_on(&self, date: NaiveDate) -> Result<Vec<Transaction>> {
        let cf = self.cf(CF_TRANSACTIONS)?;
        let mut due = Vec::new();
        for entry in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_, value) = entry?;
            let tx: Transaction = serde_json::from_slice(&value)?;
            if tx.status == TransactionStatus::Pending && tx.scheduled_on == date {
                due.push(tx);
            }
        }
        Ok(due)
    }

    async fn delete(&self, id: TransactionId) -> Result<()> {
        let cf = self.cf(CF_TRANSACTIONS)?;
        if self.get_transaction(id)?.is_none() {
            return Err(TransferError::NotFound(id));
        }
        self.db.delete_cf(cf, id.0.to_be_bytes())?;
        Ok(())
    }

    async fn all(&self) -> Result<Vec<Transaction>> {
        let cf = self.cf(CF_TRANSACTIONS)?;
        let mut all = Vec::new();
        for entry in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_, value) = entry?;
            all.push(serde_json::from_slice(&value)?);
        }
        Ok(all)
    }
}
