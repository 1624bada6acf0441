use crate::domain::account::AccountId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-account async locks serializing balance read-modify-write sequences.
///
/// This replaces reliance on a storage engine's serializable isolation: the
/// exclusivity is explicit and testable. Locks for a pair are always taken
/// in ascending `AccountId` order, so transfers over overlapping pairs can
/// never deadlock, while disjoint pairs proceed fully in parallel.
///
/// Entries are never evicted: the map holds one `Arc<Mutex<()>>` per account
/// ever transferred, a few dozen bytes each, bounded by the account set. An
/// eviction scheme would have to prove no task still awaits the entry, which
/// the current account cardinality does not warrant.
#[derive(Default)]
pub struct AccountLocks {
    locks: Mutex<HashMap<AccountId, Arc<Mutex<()>>>>,
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    async fn entry(&self, id: AccountId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(id).or_default().clone()
    }

    /// Acquires both accounts' locks, lowest id first. The guards release on
    /// drop, so holding the returned pair scopes the exclusive section.
    pub async fn lock_pair(
        &self,
        a: AccountId,
        b: AccountId,
    ) -> (OwnedMutexGuard<()>, OwnedMutexGuard<()>) {
        debug_assert_ne!(a, b, "a transfer involves two distinct accounts");
        let (first, second) = if a < b { (a, b) } else { (b, a) };
        let first_guard = self.entry(first).await.lock_owned().await;
        let second_guard = self.entry(second).await.lock_owned().await;
        (first_guard, second_guard)
    }
}
