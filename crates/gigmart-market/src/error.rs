use crate::types::TaskId;
use gigmart_common::AppError;
use gigmart_ledger::LedgerError;
use thiserror::Error;

/// Marketplace error types
#[derive(Error, Debug, Clone)]
pub enum MarketError {
    /// Malformed or out-of-range input
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Caller is not the actor this operation requires
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Operation is not legal from the task's current status
    #[error("Invalid state transition: from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// Available balance cannot cover the requested escrow
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: String, available: String },

    /// No task with this id
    #[error("Task not found: {0}")]
    NotFound(TaskId),

    /// The ledger failed for a non-domain reason
    #[error("Ledger error: {0}")]
    Ledger(String),
}

impl MarketError {
    pub(crate) fn from_escrow(err: AppError) -> Self {
        match err {
            AppError::InsufficientBalance { needed, available } => MarketError::InsufficientFunds {
                required: needed,
                available,
            },
            other => MarketError::Ledger(other.to_string()),
        }
    }

    pub(crate) fn from_ledger(err: LedgerError) -> Self {
        match err {
            LedgerError::InsufficientFunds {
                required, available, ..
            } => MarketError::InsufficientFunds {
                required: required.to_string(),
                available: available.to_string(),
            },
            other => MarketError::Ledger(other.to_string()),
        }
    }
}

/// Result type for marketplace operations
pub type Result<T> = std::result::Result<T, MarketError>;
