use crate::domain::account::Account;
use crate::domain::transaction::Transaction;
use crate::error::Result;
use std::io::Write;

/// Writes engine state as CSV reports.
pub struct ReportWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    /// Final account balances: `account, balance`.
    pub fn write_accounts(&mut self, accounts: &[Account]) -> Result<()> {
        self.writer.write_record(["account", "balance"])?;
        for account in accounts {
            self.writer
                .write_record([account.id.to_string(), account.balance.to_string()])?;
        }
        self.writer.flush()?;
        Ok(())
    }

    /// The transfer log: `id, sender, receiver, amount, status, scheduled_on`.
    pub fn write_transactions(&mut self, transactions: &[Transaction]) -> Result<()> {
        self.writer.write_record([
            "id",
            "sender",
            "receiver",
            "amount",
            "status",
            "scheduled_on",
        ])?;
        for tx in transactions {
            self.writer.write_record([
                tx.id.to_string(),
                tx.sender.to_string(),
                tx.receiver.to_string(),
                tx.amount.to_string(),
                tx.status.to_string(),
                tx.scheduled_on.to_string(),
            ])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
