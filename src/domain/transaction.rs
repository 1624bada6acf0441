use super::account::{AccountId, Amount};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque transaction identity, assigned by the store on first persistence.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TransactionId(pub u64);

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The four-state transaction lifecycle.
///
/// `Pending` is the only non-terminal state. The legal transitions are
/// exactly `Pending -> Completed`, `Pending -> Cancelled` and
/// `Pending -> Failed`; nothing ever leaves a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    /// Balances were mutated and the transfer succeeded.
    Completed,
    /// Business-rule decline: the sender could not cover the amount.
    Cancelled,
    /// Infrastructure or unexpected failure during execution.
    Failed,
}

impl TransactionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn can_transition_to(&self, next: Self) -> bool {
        matches!(self, Self::Pending) && next.is_terminal()
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// A caller's request to move `amount` from `sender` to `receiver`.
///
/// `scheduled_on = None` means "today"; a future date defers execution to
/// the daily sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferRequest {
    pub sender: AccountId,
    pub receiver: AccountId,
    pub amount: Amount,
    pub description: String,
    pub scheduled_on: Option<NaiveDate>,
}

/// A transaction as handed to the store for first persistence, before an id
/// and creation timestamp exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub amount: Amount,
    pub sender: AccountId,
    pub receiver: AccountId,
    pub status: TransactionStatus,
    pub scheduled_on: NaiveDate,
    pub description: String,
}

/// The durable record of one transfer attempt and its outcome.
///
/// Created exactly once by the orchestrator; immutable after reaching a
/// terminal status; never deleted in normal operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub amount: Amount,
    pub sender: AccountId,
    pub receiver: AccountId,
    pub status: TransactionStatus,
    pub scheduled_on: NaiveDate,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_is_the_only_non_terminal_state() {
        assert!(!TransactionStatus::Pending.is_terminal());
        assert!(TransactionStatus::Completed.is_terminal());
        assert!(TransactionStatus::Cancelled.is_terminal());
        assert!(TransactionStatus::Failed.is_terminal());
    }

    #[test]
    fn test_legal_transitions() {
        let pending = TransactionStatus::Pending;
        assert!(pending.can_transition_to(TransactionStatus::Completed));
        assert!(pending.can_transition_to(TransactionStatus::Cancelled));
        assert!(pending.can_transition_to(TransactionStatus::Failed));
    }

    #[test]
    fn test_no_transition_reenters_pending() {
        for status in [
            TransactionStatus::Pending,
            TransactionStatus::Completed,
            TransactionStatus::Cancelled,
            TransactionStatus::Failed,
        ] {
            assert!(!status.can_transition_to(TransactionStatus::Pending));
        }
    }

    #[test]
    fn test_terminal_states_admit_no_transition() {
        for terminal in [
            TransactionStatus::Completed,
            TransactionStatus::Cancelled,
            TransactionStatus::Failed,
        ] {
            for next in [
                TransactionStatus::Completed,
                TransactionStatus::Cancelled,
                TransactionStatus::Failed,
            ] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }
}
