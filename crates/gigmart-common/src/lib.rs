//! Shared plumbing for Gigmart marketplace crates.
//!
//! Provides the [`LifecycleState`] trait that status enums implement, the
//! [`EscrowManager`] that layers named, metadata-tracked locks over the
//! ledger's balance primitives, and the common error type for both.

pub mod error;
pub mod escrow;
pub mod lifecycle;
pub mod types;

pub use error::{AppError, Result};
pub use escrow::{EscrowManager, EscrowType, LockMetadata};
pub use lifecycle::LifecycleState;
pub use types::LockId;
