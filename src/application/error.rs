use thiserror::Error;

use crate::domain::{LedgerError, TransactionId, ValidationError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid transaction: {0}")]
    Validation(#[from] ValidationError),

    #[error("Transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    #[error("Invalid ledger data: {0}")]
    InvalidLedger(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl From<LedgerError> for AppError {
    fn from(error: LedgerError) -> Self {
        match error {
            LedgerError::Validation(error) => AppError::Validation(error),
            LedgerError::NotFound(id) => AppError::TransactionNotFound(id),
            other => AppError::InvalidLedger(other.to_string()),
        }
    }
}
