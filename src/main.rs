use clap::{Parser, ValueEnum};
use miette::{IntoDiagnostic, Result};
use payflow::application::orchestrator::{Outcome, TransferOrchestrator};
use payflow::application::sweeper::ScheduledSweeper;
use payflow::clock::SystemClock;
use payflow::domain::ports::{AccountStore, AccountStoreRef, TransactionStore, TransactionStoreRef};
use payflow::infrastructure::in_memory::{InMemoryAccountStore, InMemoryTransactionStore};
use payflow::interfaces::csv::account_reader::AccountReader;
use payflow::interfaces::csv::report_writer::ReportWriter;
use payflow::interfaces::csv::transfer_reader::TransferReader;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Report {
    /// Final account balances.
    Accounts,
    /// The full transfer log.
    Transactions,
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Seed accounts CSV file (account, balance)
    accounts: PathBuf,

    /// Transfer requests CSV file (sender, receiver, amount, scheduled_on, description)
    transfers: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[cfg(feature = "storage-rocksdb")]
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Run one due-transfer sweep after processing the batch.
    #[arg(long)]
    sweep: bool,

    /// Which report to print to stdout.
    #[arg(long, value_enum, default_value_t = Report::Accounts)]
    report: Report,
}

fn stores(cli: &Cli) -> Result<(AccountStoreRef, TransactionStoreRef)> {
    #[cfg(feature = "storage-rocksdb")]
    if let Some(db_path) = &cli.db_path {
        let store =
            payflow::infrastructure::rocksdb::RocksDbStore::open(db_path).into_diagnostic()?;
        return Ok((Arc::new(store.clone()), Arc::new(store)));
    }
    let _ = cli;
    Ok((
        Arc::new(InMemoryAccountStore::new()),
        Arc::new(InMemoryTransactionStore::new()),
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let (accounts, transactions) = stores(&cli)?;

    let seed_file = File::open(&cli.accounts).into_diagnostic()?;
    for account in AccountReader::new(seed_file).accounts() {
        let account = account.into_diagnostic()?;
        accounts.upsert(account).await.into_diagnostic()?;
    }

    let clock = Arc::new(SystemClock);
    let orchestrator = Arc::new(TransferOrchestrator::new(
        accounts.clone(),
        transactions.clone(),
        clock.clone(),
    ));

    let transfer_file = File::open(&cli.transfers).into_diagnostic()?;
    for request in TransferReader::new(transfer_file).requests() {
        match request {
            Ok(request) => match orchestrator.submit(request).await {
                Ok(Outcome::Executed) => info!("transfer executed"),
                Ok(Outcome::Declined) => info!("transfer declined"),
                Ok(Outcome::Scheduled) => info!("transfer scheduled"),
                Err(e) => eprintln!("Error processing transfer: {e}"),
            },
            Err(e) => eprintln!("Error reading transfer: {e}"),
        }
    }

    if cli.sweep {
        let sweeper = ScheduledSweeper::new(orchestrator, transactions.clone(), clock);
        let report = sweeper.sweep().await.into_diagnostic()?;
        info!(
            executed = report.executed,
            declined = report.declined,
            failed = report.failed,
            "sweep complete"
        );
    }

    let stdout = io::stdout();
    let mut writer = ReportWriter::new(stdout.lock());
    match cli.report {
        Report::Accounts => {
            let accounts = accounts.all().await.into_diagnostic()?;
            writer.write_accounts(&accounts).into_diagnostic()?;
        }
        Report::Transactions => {
            let transactions = transactions.all().await.into_diagnostic()?;
            writer.write_transactions(&transactions).into_diagnostic()?;
        }
    }

    Ok(())
}
