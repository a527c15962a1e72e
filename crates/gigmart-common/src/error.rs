use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid state transition: {0}")]
    InvalidTransition(String),

    #[error("Escrow operation failed: {0}")]
    EscrowError(String),

    #[error("Lock not found: {0}")]
    LockNotFound(String),

    #[error("Insufficient balance: needed {needed}, available {available}")]
    InsufficientBalance { needed: String, available: String },
}

pub type Result<T> = std::result::Result<T, AppError>;
