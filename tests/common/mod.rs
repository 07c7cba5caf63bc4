// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use pocketbook::application::LedgerService;
use pocketbook::domain::{Transaction, TransactionDraft};
use pocketbook::storage::{LEDGER_KEY, Repository};
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(LedgerService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let service = LedgerService::init(&db_path(&temp_dir)).await?;
    Ok((service, temp_dir))
}

pub fn db_path(temp_dir: &TempDir) -> String {
    temp_dir.path().join("test.db").to_str().unwrap().to_string()
}

/// Open a second service over the same database, as a fresh process would.
pub async fn reopen(temp_dir: &TempDir) -> Result<LedgerService> {
    Ok(LedgerService::connect(&db_path(temp_dir)).await?)
}

/// Direct access to the key-value table underneath the service.
pub async fn raw_repo(temp_dir: &TempDir) -> Result<Repository> {
    Repository::connect(&format!("sqlite:{}", db_path(temp_dir))).await
}

/// The JSON currently stored under the ledger key.
pub async fn stored_ledger(temp_dir: &TempDir) -> Result<Option<String>> {
    let repo = raw_repo(temp_dir).await?;
    let raw = repo.get(LEDGER_KEY).await?;
    repo.close().await;
    Ok(raw)
}

/// Test fixture: the salary and rent entries used throughout the scenarios
pub struct SalaryAndRent {
    pub salary: Transaction,
    pub rent: Transaction,
}

impl SalaryAndRent {
    pub async fn create(service: &mut LedgerService) -> Result<Self> {
        let salary = service
            .create_transaction(TransactionDraft::income("Salary", 500000))
            .await?;
        let rent = service
            .create_transaction(TransactionDraft::expense("Rent", 120000))
            .await?;
        Ok(Self { salary, rent })
    }
}
