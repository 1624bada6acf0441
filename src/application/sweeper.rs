use super::orchestrator::{Outcome, TransferOrchestrator};
use crate::clock::Clock;
use crate::domain::ports::TransactionStoreRef;
use crate::error::{Result, TransferError};
use cron::Schedule;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Fires at UTC midnight, once per engine day.
const DAILY_AT_MIDNIGHT: &str = "0 0 0 * * *";

const DEFAULT_PER_TRANSFER_TIMEOUT: Duration = Duration::from_secs(30);

/// Tally of one sweep over the day's due transactions.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub executed: usize,
    pub declined: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl SweepReport {
    pub fn processed(&self) -> usize {
        self.executed + self.declined + self.failed + self.skipped
    }
}

/// Recurring task that finds transactions scheduled for the current day and
/// re-submits them to the orchestrator's immediate-execution path.
pub struct ScheduledSweeper {
    orchestrator: Arc<TransferOrchestrator>,
    transactions: TransactionStoreRef,
    clock: Arc<dyn Clock>,
    per_transfer_timeout: Duration,
}

impl ScheduledSweeper {
    pub fn new(
        orchestrator: Arc<TransferOrchestrator>,
        transactions: TransactionStoreRef,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            orchestrator,
            transactions,
            clock,
            per_transfer_timeout: DEFAULT_PER_TRANSFER_TIMEOUT,
        }
    }

    /// Bounds how long a single due transfer may run before it is abandoned
    /// and marked `Failed`, so one stuck transfer cannot stall the batch.
    pub fn with_per_transfer_timeout(mut self, timeout: Duration) -> Self {
        self.per_transfer_timeout = timeout;
        self
    }

    /// Processes every transaction due today, each independently: a failure
    /// on one is recorded on that transaction and the sweep moves on.
    ///
    /// The due query filters on `Pending`, so re-running a sweep that was
    /// interrupted mid-batch never reprocesses settled transactions.
    pub async fn sweep(&self) -> Result<SweepReport> {
        let today = self.clock.today();
        let due = self.transactions.find_due_on(today).await?;
        info!(%today, due = due.len(), "sweep started");

        let mut report = SweepReport::default();
        for tx in &due {
            let execution = self.orchestrator.execute_due(tx);
            match tokio::time::timeout(self.per_transfer_timeout, execution).await {
                Ok(Ok(Some(Outcome::Executed))) => report.executed += 1,
                Ok(Ok(Some(Outcome::Declined))) => report.declined += 1,
                Ok(Ok(Some(Outcome::Scheduled))) | Ok(Ok(None)) => report.skipped += 1,
                Ok(Err(err)) => {
                    // Already marked Failed by the execution path.
                    warn!(id = %tx.id, error = %err, "due transfer failed");
                    report.failed += 1;
                }
                Err(_) => {
                    let err = TransferError::Timeout(tx.id);
                    warn!(id = %tx.id, error = %err, "due transfer abandoned");
                    if let Err(mark_err) = self.orchestrator.mark_failed(tx.id).await {
                        warn!(id = %tx.id, error = %mark_err,
                              "could not mark timed-out transfer failed");
                    }
                    report.failed += 1;
                }
            }
        }

        info!(
            executed = report.executed,
            declined = report.declined,
            failed = report.failed,
            skipped = report.skipped,
            "sweep finished"
        );
        Ok(report)
    }

    /// Runs the daily cadence until `shutdown` flips.
    ///
    /// Sweeps once immediately at startup (covering a midnight fire missed
    /// while the process was down), then sleeps until each next fire time.
    /// Shutdown between transfers leaves no unsafe state: a partial sweep is
    /// resumed by the next run's `Pending`-filtered query.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let schedule = Schedule::from_str(DAILY_AT_MIDNIGHT)
            .map_err(|err| TransferError::Scheduler(err.to_string()))?;

        if let Err(err) = self.sweep().await {
            error!(error = %err, "startup sweep failed");
        }

        loop {
            let now = self.clock.now();
            let Some(next_fire) = schedule.after(&now).next() else {
                return Err(TransferError::Scheduler(
                    "no upcoming fire time".to_string(),
                ));
            };
            let wait = (next_fire - now).to_std().unwrap_or(Duration::ZERO);
            info!(%next_fire, "sweeper sleeping until next fire");

            tokio::select! {
                _ = tokio::time::sleep(wait) => {
                    if let Err(err) = self.sweep().await {
                        error!(error = %err, "sweep failed");
                    }
                }
                _ = shutdown.changed() => {
                    info!("sweeper shutting down");
                    return Ok(());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::domain::account::{Account, AccountId, Amount, Balance};
    use crate::domain::ports::{AccountStore, TransactionStore};
    use crate::domain::transaction::{NewTransaction, TransactionStatus, TransferRequest};
    use crate::infrastructure::in_memory::{InMemoryAccountStore, InMemoryTransactionStore};
    use rust_decimal_macros::dec;

    struct Harness {
        orchestrator: Arc<TransferOrchestrator>,
        sweeper: ScheduledSweeper,
        accounts: Arc<InMemoryAccountStore>,
        transactions: Arc<InMemoryTransactionStore>,
        clock: FixedClock,
    }

    fn harness(balances: &[(u64, rust_decimal::Decimal)]) -> Harness {
        let accounts = Arc::new(InMemoryAccountStore::with_accounts(
            balances
                .iter()
                .map(|&(id, balance)| Account::new(AccountId(id), Balance::new(balance))),
        ));
        let transactions = Arc::new(InMemoryTransactionStore::new());
        let clock = FixedClock::at("2026-08-27T12:00:00Z".parse().unwrap());
        let orchestrator = Arc::new(TransferOrchestrator::new(
            accounts.clone(),
            transactions.clone(),
            Arc::new(clock.clone()),
        ));
        let sweeper = ScheduledSweeper::new(
            orchestrator.clone(),
            transactions.clone(),
            Arc::new(clock.clone()),
        );
        Harness {
            orchestrator,
            sweeper,
            accounts,
            transactions,
            clock,
        }
    }

    async fn submit_deferred(h: &Harness, sender: u64, receiver: u64, amount: rust_decimal::Decimal) {
        let outcome = h
            .orchestrator
            .submit(TransferRequest {
                sender: AccountId(sender),
                receiver: AccountId(receiver),
                amount: Amount::new(amount).unwrap(),
                description: "deferred".to_string(),
                scheduled_on: Some(h.clock.today() + chrono::Duration::days(1)),
            })
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Scheduled);
    }

    #[tokio::test]
    async fn test_sweep_executes_transfers_due_today() {
        let h = harness(&[(1, dec!(100.00)), (2, dec!(0.00))]);
        submit_deferred(&h, 1, 2, dec!(20.00)).await;

        // Not due yet: nothing happens.
        let report = h.sweeper.sweep().await.unwrap();
        assert_eq!(report.processed(), 0);

        h.clock.advance_days(1);
        let report = h.sweeper.sweep().await.unwrap();
        assert_eq!(report.executed, 1);

        let sender = h.accounts.get(AccountId(1)).await.unwrap().unwrap();
        let receiver = h.accounts.get(AccountId(2)).await.unwrap().unwrap();
        assert_eq!(sender.balance, Balance::new(dec!(80.00)));
        assert_eq!(receiver.balance, Balance::new(dec!(20.00)));

        let log = h.transactions.all().await.unwrap();
        assert_eq!(log[0].status, TransactionStatus::Completed);
    }

    #[tokio::test]
    async fn test_sweep_is_idempotent() {
        let h = harness(&[(1, dec!(100.00)), (2, dec!(0.00))]);
        submit_deferred(&h, 1, 2, dec!(20.00)).await;

        h.clock.advance_days(1);
        h.sweeper.sweep().await.unwrap();
        let report = h.sweeper.sweep().await.unwrap();
        assert_eq!(report, SweepReport::default());

        let sender = h.accounts.get(AccountId(1)).await.unwrap().unwrap();
        assert_eq!(sender.balance, Balance::new(dec!(80.00)));
    }

    #[tokio::test]
    async fn test_one_failure_does_not_abort_the_batch() {
        let h = harness(&[(1, dec!(100.00)), (2, dec!(0.00))]);
        let tomorrow = h.clock.today() + chrono::Duration::days(1);

        // A record whose sender no longer resolves, inserted behind the
        // orchestrator's validation to simulate infrastructure drift.
        h.transactions
            .insert(NewTransaction {
                amount: Amount::new(dec!(5.00)).unwrap(),
                sender: AccountId(99),
                receiver: AccountId(2),
                status: TransactionStatus::Pending,
                scheduled_on: tomorrow,
                description: "orphaned".to_string(),
            })
            .await
            .unwrap();
        submit_deferred(&h, 1, 2, dec!(20.00)).await;

        h.clock.advance_days(1);
        let report = h.sweeper.sweep().await.unwrap();
        assert_eq!(report.failed, 1);
        assert_eq!(report.executed, 1);

        let log = h.transactions.all().await.unwrap();
        assert_eq!(log[0].status, TransactionStatus::Failed);
        assert_eq!(log[1].status, TransactionStatus::Completed);
    }

    #[tokio::test]
    async fn test_sweep_declines_when_funds_ran_out() {
        let h = harness(&[(1, dec!(100.00)), (2, dec!(0.00))]);
        submit_deferred(&h, 1, 2, dec!(70.00)).await;
        submit_deferred(&h, 1, 2, dec!(70.00)).await;

        h.clock.advance_days(1);
        let report = h.sweeper.sweep().await.unwrap();
        assert_eq!(report.executed, 1);
        assert_eq!(report.declined, 1);

        let sender = h.accounts.get(AccountId(1)).await.unwrap().unwrap();
        assert_eq!(sender.balance, Balance::new(dec!(30.00)));
    }

    #[tokio::test]
    async fn test_run_sweeps_at_startup_and_stops_on_shutdown() {
        let h = harness(&[(1, dec!(100.00)), (2, dec!(0.00))]);
        submit_deferred(&h, 1, 2, dec!(20.00)).await;
        h.clock.advance_days(1);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let sweeper = h.sweeper;
        let handle = tokio::spawn(async move { sweeper.run(shutdown_rx).await });

        // Give the startup sweep a moment, then signal shutdown.
        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("run should stop on shutdown")
            .unwrap()
            .unwrap();

        let sender = h.accounts.get(AccountId(1)).await.unwrap().unwrap();
        assert_eq!(sender.balance, Balance::new(dec!(80.00)));
    }
}
