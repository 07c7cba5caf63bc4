use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::domain::{
    Ledger, Totals, Transaction, TransactionDraft, TransactionFilter, TransactionId,
};
use crate::storage::{LEDGER_KEY, Repository};

use super::{AppError, SummaryReport};

/// The ledger store. Owns the in-memory ledger and the repository it is
/// flushed to after every mutation.
/// This is the primary interface for any client (CLI, importers, tests).
pub struct LedgerService {
    repo: Repository,
    ledger: Ledger,
}

/// Decode the stored JSON array into a ledger, checking every invariant.
pub fn decode_ledger(raw: &str) -> Result<Ledger, AppError> {
    let records: Vec<Transaction> = serde_json::from_str(raw)?;
    Ok(Ledger::from_transactions(records)?)
}

/// Encode the ledger as the stored JSON array.
pub fn encode_ledger(ledger: &Ledger) -> Result<String, AppError> {
    Ok(serde_json::to_string(ledger.transactions())?)
}

impl LedgerService {
    /// Create a ledger service over the given repository, loading whatever
    /// ledger it holds.
    pub async fn open(repo: Repository) -> Result<Self, AppError> {
        let ledger = Self::load(&repo).await?;
        Ok(Self { repo, ledger })
    }

    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Self::open(repo).await
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Self::open(repo).await
    }

    /// Read the ledger from storage. Missing or corrupt data gives an empty
    /// ledger; only a failing storage read is an error.
    async fn load(repo: &Repository) -> Result<Ledger, AppError> {
        let Some(raw) = repo.get(LEDGER_KEY).await? else {
            debug!("No stored ledger, starting empty");
            return Ok(Ledger::new());
        };

        match decode_ledger(&raw) {
            Ok(ledger) => {
                debug!(count = ledger.len(), "Loaded ledger");
                Ok(ledger)
            }
            Err(e) => {
                warn!("Stored ledger is unreadable, starting empty: {}", e);
                Ok(Ledger::new())
            }
        }
    }

    /// Write the full ledger under the ledger key, replacing the old value.
    async fn persist(&self) -> Result<(), AppError> {
        let json = encode_ledger(&self.ledger)?;
        self.repo.put(LEDGER_KEY, &json).await?;
        debug!(count = self.ledger.len(), "Persisted ledger");
        Ok(())
    }

    /// Close the underlying repository.
    pub async fn close(self) {
        self.repo.close().await;
    }

    // ========================
    // Mutations
    // ========================

    /// Record a new transaction dated now.
    pub async fn create_transaction(
        &mut self,
        draft: TransactionDraft,
    ) -> Result<Transaction, AppError> {
        let transaction = self.ledger.create(draft, Utc::now())?;
        info!(
            id = transaction.id,
            kind = transaction.transaction_type.as_str(),
            "Created transaction"
        );
        self.persist().await?;
        Ok(transaction)
    }

    /// Replace description, amount and type of an existing transaction.
    pub async fn update_transaction(
        &mut self,
        id: TransactionId,
        draft: TransactionDraft,
    ) -> Result<Transaction, AppError> {
        let transaction = self.ledger.update(id, draft)?;
        info!(id, "Updated transaction");
        self.persist().await?;
        Ok(transaction)
    }

    /// Create when `target` is `None`, otherwise update the targeted record.
    pub async fn submit(
        &mut self,
        target: Option<TransactionId>,
        draft: TransactionDraft,
    ) -> Result<Transaction, AppError> {
        match target {
            Some(id) => self.update_transaction(id, draft).await,
            None => self.create_transaction(draft).await,
        }
    }

    /// Delete a transaction. Deleting an unknown id changes nothing and
    /// writes nothing.
    pub async fn delete_transaction(
        &mut self,
        id: TransactionId,
    ) -> Result<Option<Transaction>, AppError> {
        let Some(removed) = self.ledger.delete(id) else {
            debug!(id, "Delete ignored, no such transaction");
            return Ok(None);
        };
        info!(id, "Deleted transaction");
        self.persist().await?;
        Ok(Some(removed))
    }

    /// Append entries that keep their original dates, writing once at the end.
    pub async fn import_transactions(
        &mut self,
        entries: Vec<(TransactionDraft, DateTime<Utc>)>,
    ) -> Result<Vec<Transaction>, AppError> {
        let mut staged = self.ledger.clone();
        let mut created = Vec::with_capacity(entries.len());
        for (draft, date) in entries {
            created.push(staged.create(draft, date)?);
        }

        if created.is_empty() {
            return Ok(created);
        }
        self.ledger = staged;
        info!(count = created.len(), "Imported transactions");
        self.persist().await?;
        Ok(created)
    }

    /// Replace the whole ledger with the given records, ids included.
    pub async fn replace_all(&mut self, records: Vec<Transaction>) -> Result<(), AppError> {
        self.ledger = Ledger::from_transactions(records)?;
        info!(count = self.ledger.len(), "Replaced ledger");
        self.persist().await
    }

    /// Remove every transaction.
    pub async fn clear(&mut self) -> Result<usize, AppError> {
        let removed = self.ledger.len();
        self.ledger.clear();
        info!(removed, "Cleared ledger");
        self.persist().await?;
        Ok(removed)
    }

    // ========================
    // Queries
    // ========================

    /// Get a single transaction, e.g. to load it back for editing.
    pub fn get_transaction(&self, id: TransactionId) -> Result<Transaction, AppError> {
        self.ledger
            .get(id)
            .cloned()
            .ok_or(AppError::TransactionNotFound(id))
    }

    /// List transactions in ledger order.
    pub fn list_transactions(&self, filter: TransactionFilter) -> Vec<Transaction> {
        self.ledger.list(filter).into_iter().cloned().collect()
    }

    pub fn totals(&self) -> Totals {
        self.ledger.totals()
    }

    pub fn summary(&self) -> SummaryReport {
        SummaryReport::from_transactions(self.ledger.transactions())
    }

    pub fn len(&self) -> usize {
        self.ledger.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ledger.is_empty()
    }
}
