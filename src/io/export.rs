use anyhow::Result;
use std::io::Write;

use crate::application::LedgerService;
use crate::domain::{TransactionFilter, format_cents};

/// CSV columns, shared with the CSV importer.
pub const CSV_HEADER: [&str; 5] = ["id", "date", "type", "description", "amount"];

/// Exporter for converting ledger data to various formats
pub struct Exporter<'a> {
    service: &'a LedgerService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a LedgerService) -> Self {
        Self { service }
    }

    /// Export transactions as a JSON array in the storage record format
    pub fn export_json<W: Write>(&self, mut writer: W) -> Result<usize> {
        let transactions = self.service.list_transactions(TransactionFilter::All);

        let json = serde_json::to_string_pretty(&transactions)?;
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        Ok(transactions.len())
    }

    /// Export transactions to CSV format
    pub fn export_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let transactions = self.service.list_transactions(TransactionFilter::All);
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(CSV_HEADER)?;

        for transaction in &transactions {
            csv_writer.write_record(&[
                transaction.id.to_string(),
                transaction.date.to_rfc3339(),
                transaction.transaction_type.as_str().to_string(),
                transaction.description.clone(),
                format_cents(transaction.amount_cents),
            ])?;
        }

        csv_writer.flush()?;
        Ok(transactions.len())
    }
}
