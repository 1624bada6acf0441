use crate::domain::account::AccountId;
use crate::domain::transaction::TransactionId;
use chrono::NaiveDate;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TransferError>;

/// Failures surfaced by the engine.
///
/// An insufficient-balance decline is *not* represented here; it is a normal
/// business outcome reported through [`crate::application::orchestrator::Outcome`].
#[derive(Error, Debug)]
pub enum TransferError {
    #[error("transfer amount must be positive")]
    InvalidAmount,
    #[error("sender and receiver must be different accounts")]
    SameAccount,
    #[error("unknown account: {0}")]
    UnknownAccount(AccountId),
    #[error("scheduled date {0} is in the past")]
    SchedulePast(NaiveDate),
    #[error("insufficient funds")]
    InsufficientFunds,
    #[error("transaction not found: {0}")]
    NotFound(TransactionId),
    #[error("transaction {0} already has a terminal status")]
    TerminalStatus(TransactionId),
    #[error("transaction {0} timed out during execution")]
    Timeout(TransactionId),
    #[error("scheduler error: {0}")]
    Scheduler(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl From<serde_json::Error> for TransferError {
    fn from(err: serde_json::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for TransferError {
    fn from(err: rocksdb::Error) -> Self {
        Self::Storage(err.to_string())
    }
}
