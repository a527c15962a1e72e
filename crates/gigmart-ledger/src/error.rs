use crate::types::{AccountId, Currency, TokenAmount};
use thiserror::Error;

/// Ledger error types
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Spendable balance cannot cover the requested movement
    #[error("Insufficient funds for {account} in {currency}: required {required}, available {available}")]
    InsufficientFunds {
        account: AccountId,
        currency: Currency,
        required: TokenAmount,
        available: TokenAmount,
    },

    /// Locked balance cannot cover the requested unlock
    #[error("Insufficient locked funds for {account} in {currency}: required {required}, locked {locked}")]
    InsufficientLocked {
        account: AccountId,
        currency: Currency,
        required: TokenAmount,
        locked: TokenAmount,
    },

    /// Balance arithmetic would overflow
    #[error("Balance overflow for {account} in {currency}")]
    Overflow {
        account: AccountId,
        currency: Currency,
    },

    /// Transfers require two distinct accounts
    #[error("Cannot transfer to the same account: {0}")]
    SelfTransfer(AccountId),

    /// Failure inside the storage backend
    #[error("Ledger backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;
