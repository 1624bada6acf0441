use crate::domain::account::{Account, AccountId, Balance};
use crate::error::{Result, TransferError};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize)]
struct AccountRow {
    account: u64,
    // Parsed from the raw text so "100.00" keeps its scale; csv's untyped
    // deserialization would route it through f64.
    #[serde(with = "rust_decimal::serde::str")]
    balance: Decimal,
}

/// Streams seed accounts from a CSV source with `account, balance` columns.
pub struct AccountReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> AccountReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(source);
        Self { reader }
    }

    pub fn accounts(self) -> impl Iterator<Item = Result<Account>> {
        self.reader.into_deserialize::<AccountRow>().map(|row| {
            row.map_err(TransferError::from)
                .map(|row| Account::new(AccountId(row.account), Balance::new(row.balance)))
        })
    }
}
