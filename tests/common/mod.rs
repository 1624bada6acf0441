use payflow::application::orchestrator::TransferOrchestrator;
use payflow::application::sweeper::ScheduledSweeper;
use payflow::clock::FixedClock;
use payflow::domain::account::{Account, AccountId, Amount, Balance};
use payflow::domain::ports::AccountStore;
use payflow::domain::transaction::TransferRequest;
use payflow::infrastructure::in_memory::{InMemoryAccountStore, InMemoryTransactionStore};
use rust_decimal::Decimal;
use std::sync::Arc;

pub struct Engine {
    pub orchestrator: Arc<TransferOrchestrator>,
    pub accounts: Arc<InMemoryAccountStore>,
    pub transactions: Arc<InMemoryTransactionStore>,
    pub clock: FixedClock,
}

impl Engine {
    pub fn sweeper(&self) -> ScheduledSweeper {
        ScheduledSweeper::new(
            self.orchestrator.clone(),
            self.transactions.clone(),
            Arc::new(self.clock.clone()),
        )
    }

    pub async fn balance_of(&self, id: u64) -> Balance {
        self.accounts
            .get(AccountId(id))
            .await
            .unwrap()
            .expect("account exists")
            .balance
    }

    pub async fn total_funds(&self) -> Decimal {
        self.accounts
            .all()
            .await
            .unwrap()
            .iter()
            .map(|account| account.balance.0)
            .sum()
    }
}

/// An engine over in-memory stores, seeded with the given balances and a
/// clock fixed at 2026-08-27 midday UTC.
pub fn engine(balances: &[(u64, Decimal)]) -> Engine {
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
    Engine {
        orchestrator,
        accounts,
        transactions,
        clock,
    }
}

pub fn transfer(sender: u64, receiver: u64, amount: Decimal) -> TransferRequest {
    TransferRequest {
        sender: AccountId(sender),
        receiver: AccountId(receiver),
        amount: Amount::new(amount).expect("positive amount"),
        description: "test transfer".to_string(),
        scheduled_on: None,
    }
}

pub fn transfer_on(
    sender: u64,
    receiver: u64,
    amount: Decimal,
    scheduled_on: chrono::NaiveDate,
) -> TransferRequest {
    TransferRequest {
        scheduled_on: Some(scheduled_on),
        ..transfer(sender, receiver, amount)
    }
}
