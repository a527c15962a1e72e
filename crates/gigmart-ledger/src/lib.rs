//! Ledger accounting primitive for the Gigmart marketplace.
//!
//! Tracks per-account, per-currency balances with a spendable/locked split,
//! executes transfers inside storage snapshot transactions, and keeps an
//! account-scoped transfer history. The marketplace engine treats this crate
//! as its trusted money store; escrow semantics are layered on top of the
//! lock/unlock primitives here.

pub mod balance;
pub mod error;
pub mod storage;
pub mod types;

pub use balance::{AccountInfo, BalanceManager};
pub use error::{LedgerError, Result};
pub use storage::{LedgerStorage, MemoryLedger, TransferRecord};
pub use types::{AccountId, Currency, TokenAmount, TOKEN_BASE_UNIT, TOKEN_DECIMALS};
