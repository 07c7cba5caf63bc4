use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashSet;
use std::io::Read;

use crate::application::LedgerService;
use crate::domain::{
    Cents, Transaction, TransactionDraft, TransactionFilter, TransactionType, ValidationError,
    parse_cents,
};

/// Result of an import operation
#[derive(Debug, Clone, Default)]
pub struct ImportResult {
    pub imported: usize,
    pub skipped: usize,
    pub errors: Vec<ImportError>,
}

/// Error that occurred during import
#[derive(Debug, Clone)]
pub struct ImportError {
    /// 1-based record number for JSON, file line for CSV
    pub line: usize,
    pub field: Option<String>,
    pub error: String,
}

/// Options for import operations
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    pub dry_run: bool,
    pub skip_duplicates: bool,
    /// Swap the whole ledger for the imported records (JSON only)
    pub replace: bool,
}

type DuplicateKey = (String, Cents, TransactionType, DateTime<Utc>);

fn duplicate_key(draft: &TransactionDraft, date: DateTime<Utc>) -> DuplicateKey {
    (
        draft.description.clone(),
        draft.amount_cents,
        draft.transaction_type,
        date,
    )
}

fn validation_error(line: usize, error: ValidationError) -> ImportError {
    let field = match error {
        ValidationError::EmptyDescription => "description",
        ValidationError::NonPositiveAmount(_) | ValidationError::AmountTooLarge(_) => "amount",
    };
    ImportError {
        line,
        field: Some(field.to_string()),
        error: error.to_string(),
    }
}

/// Importer for loading data into the ledger
pub struct Importer<'a> {
    service: &'a mut LedgerService,
}

impl<'a> Importer<'a> {
    pub fn new(service: &'a mut LedgerService) -> Self {
        Self { service }
    }

    /// Import transactions from a JSON array in the storage record format.
    /// Appended records get fresh ids and keep their dates.
    pub async fn import_json<R: Read>(
        &mut self,
        reader: R,
        options: ImportOptions,
    ) -> Result<ImportResult> {
        let values: Vec<serde_json::Value> = serde_json::from_reader(reader)?;
        let mut errors = Vec::new();
        let mut records = Vec::with_capacity(values.len());

        for (index, value) in values.into_iter().enumerate() {
            let line = index + 1;
            let record = match serde_json::from_value::<Transaction>(value) {
                Ok(r) => r,
                Err(e) => {
                    errors.push(ImportError {
                        line,
                        field: None,
                        error: format!("Invalid record: {}", e),
                    });
                    continue;
                }
            };
            match record.to_draft().validate() {
                Ok(draft) => records.push((line, draft, record)),
                Err(e) => errors.push(validation_error(line, e)),
            }
        }

        if options.replace {
            return self.replace_with(records, errors, options.dry_run).await;
        }

        let entries = records
            .into_iter()
            .map(|(line, draft, record)| (line, draft, record.date))
            .collect();
        self.append(entries, errors, options).await
    }

    /// Import transactions from CSV with the columns written by the exporter.
    /// The id column is ignored.
    pub async fn import_csv<R: Read>(
        &mut self,
        reader: R,
        options: ImportOptions,
    ) -> Result<ImportResult> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut errors = Vec::new();
        let mut entries = Vec::new();

        for (line_num, result) in csv_reader.records().enumerate() {
            let line = line_num + 2; // +2 for header and 0-indexing

            let record = match result {
                Ok(r) => r,
                Err(e) => {
                    errors.push(ImportError {
                        line,
                        field: None,
                        error: format!("CSV parse error: {}", e),
                    });
                    continue;
                }
            };

            let date_str = record.get(1).unwrap_or("");
            let type_str = record.get(2).unwrap_or("");
            let description = record.get(3).unwrap_or("");
            let amount_str = record.get(4).unwrap_or("");

            let date = match parse_timestamp(date_str) {
                Ok(d) => d,
                Err(e) => {
                    errors.push(ImportError {
                        line,
                        field: Some("date".to_string()),
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            let Some(transaction_type) = TransactionType::from_str(type_str) else {
                errors.push(ImportError {
                    line,
                    field: Some("type".to_string()),
                    error: format!("Invalid type: '{}'", type_str),
                });
                continue;
            };

            let amount_cents = match parse_cents(amount_str) {
                Ok(a) => a,
                Err(e) => {
                    errors.push(ImportError {
                        line,
                        field: Some("amount".to_string()),
                        error: format!("Invalid amount: {}", e),
                    });
                    continue;
                }
            };

            match TransactionDraft::new(description, amount_cents, transaction_type).validate() {
                Ok(draft) => entries.push((line, draft, date)),
                Err(e) => errors.push(validation_error(line, e)),
            }
        }

        self.append(entries, errors, options).await
    }

    async fn append(
        &mut self,
        entries: Vec<(usize, TransactionDraft, DateTime<Utc>)>,
        errors: Vec<ImportError>,
        options: ImportOptions,
    ) -> Result<ImportResult> {
        let mut seen: HashSet<DuplicateKey> = self
            .service
            .list_transactions(TransactionFilter::All)
            .iter()
            .map(|t| duplicate_key(&t.to_draft(), t.date))
            .collect();

        let mut skipped = 0;
        let mut accepted = Vec::with_capacity(entries.len());
        for (_, draft, date) in entries {
            if options.skip_duplicates && !seen.insert(duplicate_key(&draft, date)) {
                skipped += 1;
                continue;
            }
            accepted.push((draft, date));
        }

        let imported = accepted.len();
        if !options.dry_run {
            self.service.import_transactions(accepted).await?;
        }

        Ok(ImportResult {
            imported,
            skipped,
            errors,
        })
    }

    async fn replace_with(
        &mut self,
        records: Vec<(usize, TransactionDraft, Transaction)>,
        mut errors: Vec<ImportError>,
        dry_run: bool,
    ) -> Result<ImportResult> {
        // A partial replacement would silently drop data.
        if !errors.is_empty() {
            return Ok(ImportResult {
                imported: 0,
                skipped: records.len(),
                errors,
            });
        }

        let mut ids = HashSet::with_capacity(records.len());
        for (line, _, record) in &records {
            if !ids.insert(record.id) {
                errors.push(ImportError {
                    line: *line,
                    field: Some("id".to_string()),
                    error: format!("Duplicate id {}", record.id),
                });
            }
        }
        if !errors.is_empty() {
            return Ok(ImportResult {
                imported: 0,
                skipped: records.len(),
                errors,
            });
        }

        let imported = records.len();
        if !dry_run {
            let transactions = records
                .into_iter()
                .map(|(_, draft, record)| Transaction {
                    description: draft.description,
                    ..record
                })
                .collect();
            self.service.replace_all(transactions).await?;
        }

        Ok(ImportResult {
            imported,
            skipped: 0,
            errors,
        })
    }
}

// Helper function to parse timestamp
fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    // Try RFC3339 first
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    // Try YYYY-MM-DD format
    if let Some(dt) = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    {
        return Ok(dt.and_utc());
    }

    anyhow::bail!("Invalid timestamp format: '{}'", s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp() {
        let ts = parse_timestamp("2024-01-15T10:30:00+02:00").unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-01-15T08:30:00+00:00");

        let day = parse_timestamp("2024-01-15").unwrap();
        assert_eq!(day.to_rfc3339(), "2024-01-15T00:00:00+00:00");

        assert!(parse_timestamp("15/01/2024").is_err());
        assert!(parse_timestamp("").is_err());
    }
}
