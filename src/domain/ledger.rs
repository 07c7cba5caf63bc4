use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    Cents, Transaction, TransactionDraft, TransactionFilter, TransactionId, TransactionType,
    ValidationError,
};

/// Aggregate totals derived from the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Totals {
    pub income: Cents,
    pub expense: Cents,
    pub net: Cents,
}

/// Compute income, expense and net totals from a list of transactions.
/// Net = sum of income - sum of expenses
///
/// Sums saturate at the bounds of `Cents` instead of overflowing.
pub fn compute_totals<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> Totals {
    let (income, expense) = transactions.into_iter().fold(
        (0 as Cents, 0 as Cents),
        |(income, expense), t| match t.transaction_type {
            TransactionType::Income => (income.saturating_add(t.amount_cents), expense),
            TransactionType::Expense => (income, expense.saturating_add(t.amount_cents)),
        },
    );

    Totals {
        income,
        expense,
        net: income.saturating_sub(expense),
    }
}

/// Largest id a ledger holds: 2^53 - 1, the largest integer a JSON number
/// carries exactly in every reader of the stored array.
pub const MAX_TRANSACTION_ID: TransactionId = (1 << 53) - 1;

/// The ordered collection of transactions.
///
/// Order is insertion order; updates keep an entry where it is. Ids come from
/// a counter that only moves forward, so a deleted id is never handed out again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ledger {
    transactions: Vec<Transaction>,
    next_id: TransactionId,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            transactions: Vec::new(),
            next_id: 1,
        }
    }

    /// Rebuild a ledger from stored records, checking every invariant.
    /// Ids must be unique and at most [`MAX_TRANSACTION_ID`].
    pub fn from_transactions(transactions: Vec<Transaction>) -> Result<Self, LedgerError> {
        let mut seen = HashSet::with_capacity(transactions.len());
        for transaction in &transactions {
            transaction
                .check()
                .map_err(|error| LedgerError::InvalidRecord {
                    id: transaction.id,
                    error,
                })?;
            if transaction.id > MAX_TRANSACTION_ID {
                return Err(LedgerError::IdOutOfRange(transaction.id));
            }
            if !seen.insert(transaction.id) {
                return Err(LedgerError::DuplicateId(transaction.id));
            }
        }

        let next_id = transactions
            .iter()
            .map(|t| t.id)
            .max()
            .map_or(1, |max| max + 1);

        Ok(Self {
            transactions,
            next_id,
        })
    }

    /// Append a new entry. The id and date are assigned here.
    /// Fails with `IdsExhausted` once the counter passes [`MAX_TRANSACTION_ID`].
    pub fn create(
        &mut self,
        draft: TransactionDraft,
        now: DateTime<Utc>,
    ) -> Result<Transaction, LedgerError> {
        let draft = draft.validate()?;
        if self.next_id > MAX_TRANSACTION_ID {
            return Err(LedgerError::IdsExhausted);
        }

        let transaction = Transaction {
            id: self.next_id,
            description: draft.description,
            amount_cents: draft.amount_cents,
            transaction_type: draft.transaction_type,
            date: now,
        };
        self.next_id += 1;
        self.transactions.push(transaction.clone());

        Ok(transaction)
    }

    /// Replace description, amount and type of an existing entry in place.
    /// The draft is validated before the lookup.
    pub fn update(
        &mut self,
        id: TransactionId,
        draft: TransactionDraft,
    ) -> Result<Transaction, LedgerError> {
        let draft = draft.validate()?;

        let transaction = self
            .transactions
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(LedgerError::NotFound(id))?;

        transaction.description = draft.description;
        transaction.amount_cents = draft.amount_cents;
        transaction.transaction_type = draft.transaction_type;

        Ok(transaction.clone())
    }

    /// Remove an entry. Returns `None` when no entry has that id.
    pub fn delete(&mut self, id: TransactionId) -> Option<Transaction> {
        let index = self.transactions.iter().position(|t| t.id == id)?;
        Some(self.transactions.remove(index))
    }

    pub fn get(&self, id: TransactionId) -> Option<&Transaction> {
        self.transactions.iter().find(|t| t.id == id)
    }

    pub fn list(&self, filter: TransactionFilter) -> Vec<&Transaction> {
        self.transactions
            .iter()
            .filter(|t| filter.matches(t))
            .collect()
    }

    /// Always recomputed from the current entries.
    pub fn totals(&self) -> Totals {
        compute_totals(&self.transactions)
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn clear(&mut self) {
        self.transactions.clear();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    Validation(ValidationError),
    NotFound(TransactionId),
    DuplicateId(TransactionId),
    IdOutOfRange(TransactionId),
    IdsExhausted,
    InvalidRecord {
        id: TransactionId,
        error: ValidationError,
    },
}

impl From<ValidationError> for LedgerError {
    fn from(error: ValidationError) -> Self {
        LedgerError::Validation(error)
    }
}

impl std::fmt::Display for LedgerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerError::Validation(error) => write!(f, "{}", error),
            LedgerError::NotFound(id) => write!(f, "no transaction with id {}", id),
            LedgerError::DuplicateId(id) => write!(f, "duplicate transaction id {}", id),
            LedgerError::IdOutOfRange(id) => write!(
                f,
                "transaction id {} is above the limit {}",
                id, MAX_TRANSACTION_ID
            ),
            LedgerError::IdsExhausted => write!(f, "no transaction ids left"),
            LedgerError::InvalidRecord { id, error } => {
                write!(f, "invalid transaction {}: {}", id, error)
            }
        }
    }
}

impl std::error::Error for LedgerError {}
