//! # Gigmart Market
//!
//! Task lifecycle and escrow accounting for a decentralized micro-task
//! marketplace.
//!
//! ## Overview
//!
//! Posters publish small units of work with a reward; the reward plus the
//! platform fee is locked in escrow the moment the task is created, so a
//! worker who delivers is always paid from funds that already exist. Workers
//! claim tasks, submit results for review, and build a reputation from rated
//! completions. Either party can contest an in-flight task and hand the
//! decision to the platform admin.
//!
//! ## Architecture
//!
//! - **Engine**: [`MarketEngine`] serializes every mutating operation, checks
//!   preconditions, moves funds, then updates task state
//! - **Registry**: in-memory task table with open/poster/worker indexes
//! - **Escrow**: reward and fee held as two ledger locks per task, released
//!   or refunded on settlement
//! - **Reputation**: per-worker completion counts, earnings per currency and
//!   average rating
//! - **Disputes**: a case log of who contested what and how it was settled
//! - **Events**: every successful mutation broadcasts a [`MarketEvent`]
//!
//! ## Lifecycle
//!
//! ```text
//! Open ──> Assigned ──> InReview ──> Completed
//!   │          │            │
//!   │          └──────┬─────┘
//!   v                 v
//! Cancelled <── Disputed ──> Completed
//! ```
//!
//! Completed and Cancelled are terminal; Disputed tasks leave only through
//! an admin resolution.

pub mod config;
pub mod dispute;
pub mod engine;
pub mod error;
pub mod events;
pub mod registry;
pub mod reputation;
pub mod types;

pub use config::{fee_for, PlatformConfig, DEFAULT_FEE_BPS, MAX_FEE_BPS};
pub use dispute::{DisputeCase, DisputeLog, DisputeStatus};
pub use engine::{MarketEngine, MarketStats};
pub use error::{MarketError, Result};
pub use events::{EventBus, MarketEvent};
pub use registry::TaskRegistry;
pub use reputation::{ReputationLedger, ReputationRecord};
pub use types::{
    DisputeOutcome, Task, TaskDraft, TaskId, TaskStatus, MAX_RATING, MIN_RATING,
};
