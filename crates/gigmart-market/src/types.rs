use crate::error::{MarketError, Result};
use gigmart_common::LifecycleState;
use gigmart_ledger::types::{AccountId, Currency, TokenAmount};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type TaskId = u64;

/// Lowest rating a poster can give on approval
pub const MIN_RATING: u8 = 1;
/// Highest rating a poster can give on approval
pub const MAX_RATING: u8 = 5;

/// Task lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    /// Published and waiting for a worker
    Open,
    /// Claimed by a worker
    Assigned,
    /// Work submitted, awaiting poster approval
    InReview,
    /// Approved and paid out
    Completed,
    /// Retired with escrow refunded to the poster
    Cancelled,
    /// Contested by a party, awaiting admin resolution
    Disputed,
}

impl TaskStatus {
    /// Canonical label for this status
    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Open => "open",
            TaskStatus::Assigned => "assigned",
            TaskStatus::InReview => "in_review",
            TaskStatus::Completed => "completed",
            TaskStatus::Cancelled => "cancelled",
            TaskStatus::Disputed => "disputed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl LifecycleState for TaskStatus {
    fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Cancelled)
    }

    fn can_transition_to(&self, next: &Self) -> bool {
        use TaskStatus::*;
        matches!(
            (self, next),
            (Open, Assigned)
                | (Open, Cancelled)
                | (Assigned, InReview)
                | (Assigned, Disputed)
                | (InReview, Completed)
                | (InReview, Disputed)
                | (Disputed, Completed)
                | (Disputed, Cancelled)
        )
    }
}

/// How an admin settles a disputed task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisputeOutcome {
    /// Pay the worker as if the work had been approved
    PayWorker,
    /// Return the full escrow to the poster
    RefundPoster,
}

/// Input for creating a task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub category: String,
    pub reward: TokenAmount,
    pub currency: Currency,
    /// Advisory deadline, expressed as hours from creation
    pub deadline_hours: u64,
}

/// A task and its complete marketplace state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub poster: AccountId,
    pub worker: Option<AccountId>,
    pub title: String,
    pub description: String,
    pub category: String,
    pub reward: TokenAmount,
    pub currency: Currency,
    /// Platform fee snapshotted at creation; later fee changes never touch it
    pub fee: TokenAmount,
    pub status: TaskStatus,
    pub created_at: i64,
    /// Advisory only; nothing happens when it passes
    pub deadline: i64,
    pub funds_escrowed: bool,
    pub rating: Option<u8>,
}

impl Task {
    /// Total amount held in escrow while the task is live
    pub fn escrow_total(&self) -> TokenAmount {
        self.reward.saturating_add(self.fee)
    }

    /// True if the account is the poster or the assigned worker
    pub fn is_party(&self, account: &AccountId) -> bool {
        self.poster == *account || self.worker.as_ref() == Some(account)
    }

    /// Validate and apply a status transition
    pub fn transition_to(&mut self, new_status: TaskStatus) -> Result<()> {
        if !self.status.can_transition_to(&new_status) {
            return Err(MarketError::InvalidTransition {
                from: self.status.label().to_string(),
                to: new_status.label().to_string(),
            });
        }

        tracing::debug!(
            task_id = self.id,
            from = %self.status,
            to = %new_status,
            "Task state transition"
        );
        self.status = new_status;
        Ok(())
    }
}
