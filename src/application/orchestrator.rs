use super::locks::AccountLocks;
use crate::clock::Clock;
use crate::domain::account::AccountId;
use crate::domain::ports::{AccountStoreRef, TransactionStoreRef};
use crate::domain::transaction::{
    NewTransaction, Transaction, TransactionId, TransactionStatus, TransferRequest,
};
use crate::error::{Result, TransferError};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The definitive result of a submission.
///
/// A decline (insufficient funds) is a normal outcome, not an error, so the
/// sweeper and synchronous callers can apply different retry policies to
/// declines versus infrastructure failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Balances were mutated; the transaction is `Completed`.
    Executed,
    /// Insufficient funds; the transaction is `Cancelled`, balances untouched.
    Declined,
    /// Future-dated; recorded as `Pending` for the sweep, balances untouched.
    Scheduled,
}

/// The core of the engine: accepts transfer requests, decides between
/// immediate and deferred execution, and performs the atomic balance
/// mutation between the two accounts.
///
/// All collaborators are injected; the orchestrator holds no global state.
pub struct TransferOrchestrator {
    accounts: AccountStoreRef,
    transactions: TransactionStoreRef,
    locks: AccountLocks,
    clock: Arc<dyn Clock>,
}

impl TransferOrchestrator {
    pub fn new(
        accounts: AccountStoreRef,
        transactions: TransactionStoreRef,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            accounts,
            transactions,
            locks: AccountLocks::new(),
            clock,
        }
    }

    /// Submits a transfer request.
    ///
    /// Invalid input is rejected before any record is persisted. A valid
    /// request is recorded as `Pending` exactly once and then either
    /// executed immediately (scheduled for today) or left for the sweep
    /// (future-dated).
    pub async fn submit(&self, request: TransferRequest) -> Result<Outcome> {
        let today = self.clock.today();
        let scheduled_on = request.scheduled_on.unwrap_or(today);
        self.validate(&request, scheduled_on).await?;

        let tx = self
            .transactions
            .insert(NewTransaction {
                amount: request.amount,
                sender: request.sender,
                receiver: request.receiver,
                status: TransactionStatus::Pending,
                scheduled_on,
                description: request.description,
            })
            .await?;

        if scheduled_on > today {
            info!(id = %tx.id, %scheduled_on, "transfer deferred");
            return Ok(Outcome::Scheduled);
        }
        match self.execute(&tx).await? {
            Some(outcome) => Ok(outcome),
            // A concurrent sweep claimed the record between insert and
            // execution; report whatever it settled to.
            None => {
                let settled = self
                    .transactions
                    .find_by_id(tx.id)
                    .await?
                    .ok_or(TransferError::NotFound(tx.id))?;
                match settled.status {
                    TransactionStatus::Completed => Ok(Outcome::Executed),
                    TransactionStatus::Cancelled => Ok(Outcome::Declined),
                    _ => Err(TransferError::TerminalStatus(tx.id)),
                }
            }
        }
    }

    /// Executes a due transaction on behalf of the sweep.
    ///
    /// Returns `None` for a record that is no longer `Pending`, so an
    /// interrupted sweep can be re-run without reprocessing already-terminal
    /// transactions.
    pub async fn execute_due(&self, tx: &Transaction) -> Result<Option<Outcome>> {
        self.execute(tx).await
    }

    /// Marks a transaction `Failed`. Used by the sweep when a transfer's
    /// execution future was abandoned on timeout.
    pub async fn mark_failed(&self, id: TransactionId) -> Result<()> {
        self.transactions
            .update_status(id, TransactionStatus::Failed)
            .await
    }

    pub async fn find_by_id(&self, id: TransactionId) -> Result<Option<Transaction>> {
        self.transactions.find_by_id(id).await
    }

    pub async fn find_for_account(&self, account: AccountId) -> Result<Vec<Transaction>> {
        self.transactions.find_for_account(account).await
    }

    /// Administrative removal of a record; never touches balances.
    pub async fn delete(&self, id: TransactionId) -> Result<()> {
        self.transactions.delete(id).await
    }

    async fn validate(&self, request: &TransferRequest, scheduled_on: chrono::NaiveDate) -> Result<()> {
        if request.sender == request.receiver {
            return Err(TransferError::SameAccount);
        }
        if scheduled_on < self.clock.today() {
            return Err(TransferError::SchedulePast(scheduled_on));
        }
        for id in [request.sender, request.receiver] {
            if self.accounts.get(id).await?.is_none() {
                return Err(TransferError::UnknownAccount(id));
            }
        }
        Ok(())
    }

    /// The immediate-execution path: claim the record, read both balances,
    /// decline or move the funds, commit a terminal status. Runs under the
    /// ordered pair lock so the read-modify-write never interleaves with
    /// another transfer touching either account.
    ///
    /// Returns `None` when the record was settled by a concurrent executor
    /// while this one waited for the lock; the `Pending` check must happen
    /// under the lock or two racing executors would both move the funds.
    async fn execute(&self, tx: &Transaction) -> Result<Option<Outcome>> {
        // Submission validates this, but records planted directly in the
        // store reach here too; a same-account pair cannot be locked.
        if tx.sender == tx.receiver {
            self.transactions
                .update_status(tx.id, TransactionStatus::Failed)
                .await?;
            return Err(TransferError::SameAccount);
        }
        let _guards = self.locks.lock_pair(tx.sender, tx.receiver).await;

        let current = self
            .transactions
            .find_by_id(tx.id)
            .await?
            .ok_or(TransferError::NotFound(tx.id))?;
        if current.status != TransactionStatus::Pending {
            debug!(id = %tx.id, status = %current.status, "transaction already settled");
            return Ok(None);
        }

        match self.move_funds(&current).await {
            Ok(true) => {
                self.transactions
                    .update_status(tx.id, TransactionStatus::Completed)
                    .await?;
                info!(id = %tx.id, sender = %tx.sender, receiver = %tx.receiver,
                      amount = %tx.amount, "transfer completed");
                Ok(Some(Outcome::Executed))
            }
            Ok(false) => {
                self.transactions
                    .update_status(tx.id, TransactionStatus::Cancelled)
                    .await?;
                info!(id = %tx.id, sender = %tx.sender, amount = %tx.amount,
                      "transfer declined: insufficient funds");
                Ok(Some(Outcome::Declined))
            }
            Err(err) => {
                // Record the terminal status before surfacing the error, so
                // the caller never sees a failure without a matching record.
                if let Err(mark_err) = self
                    .transactions
                    .update_status(tx.id, TransactionStatus::Failed)
                    .await
                {
                    warn!(id = %tx.id, error = %mark_err, "could not mark transfer failed");
                }
                Err(err)
            }
        }
    }

    /// Returns `Ok(false)` on a decline; balances are only written when both
    /// sides of the transfer fit, and both land in one store call so an
    /// abandoned execution can never commit the debit without the credit.
    async fn move_funds(&self, tx: &Transaction) -> Result<bool> {
        let mut sender = self
            .accounts
            .get(tx.sender)
            .await?
            .ok_or(TransferError::UnknownAccount(tx.sender))?;
        let mut receiver = self
            .accounts
            .get(tx.receiver)
            .await?
            .ok_or(TransferError::UnknownAccount(tx.receiver))?;

        if !sender.can_cover(tx.amount) {
            return Ok(false);
        }
        sender.debit(tx.amount)?;
        receiver.credit(tx.amount);

        self.accounts
            .set_balance_pair(
                (sender.id, sender.balance),
                (receiver.id, receiver.balance),
            )
            .await?;
        Ok(true)
    }
}
