use crate::domain::account::{AccountId, Amount};
use crate::domain::transaction::TransferRequest;
use crate::error::{Result, TransferError};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize)]
struct TransferRow {
    sender: u64,
    receiver: u64,
    // Parsed from the raw text so "30.00" keeps its two decimal places;
    // csv's untyped deserialization would route it through f64.
    #[serde(with = "rust_decimal::serde::str")]
    amount: Decimal,
    #[serde(default)]
    scheduled_on: Option<NaiveDate>,
    #[serde(default)]
    description: String,
}

impl TryFrom<TransferRow> for TransferRequest {
    type Error = TransferError;

    fn try_from(row: TransferRow) -> Result<Self> {
        Ok(Self {
            sender: AccountId(row.sender),
            receiver: AccountId(row.receiver),
            amount: Amount::new(row.amount)?,
            description: row.description,
            scheduled_on: row.scheduled_on,
        })
    }
}

/// Streams transfer requests from a CSV source.
///
/// Columns: `sender, receiver, amount, scheduled_on, description`. An empty
/// `scheduled_on` means today; a non-positive amount fails that row without
/// aborting the stream.
pub struct TransferReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> TransferReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily reads and converts rows, so large batches stream without
    /// loading the whole file.
    pub fn requests(self) -> impl Iterator<Item = Result<TransferRequest>> {
        self.reader.into_deserialize::<TransferRow>().map(|row| {
            row.map_err(TransferError::from)
                .and_then(TransferRequest::try_from)
        })
    }
}
