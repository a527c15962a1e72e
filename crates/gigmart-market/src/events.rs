//! Event notifications for marketplace state changes.
//!
//! Every successful mutation emits a typed event on a broadcast bus so hosts
//! can push updates to clients instead of polling task lists. Emission never
//! blocks and never fails; subscribers that fall behind simply miss the
//! oldest events.

use crate::types::{DisputeOutcome, TaskId};
use chrono::{DateTime, Utc};
use gigmart_ledger::types::Currency;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

/// Maximum number of events buffered before old events are dropped
const EVENT_BUFFER: usize = 1000;

/// Types of events that can be emitted by the marketplace
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum MarketEvent {
    /// A task was published and its escrow locked
    TaskCreated {
        task_id: TaskId,
        poster: String,
        reward: String,
        fee: String,
        currency: Currency,
        #[serde(with = "chrono::serde::ts_seconds")]
        timestamp: DateTime<Utc>,
    },

    /// A worker claimed an open task
    TaskAssigned {
        task_id: TaskId,
        worker: String,
        #[serde(with = "chrono::serde::ts_seconds")]
        timestamp: DateTime<Utc>,
    },

    /// The worker submitted the task for review
    TaskSubmitted {
        task_id: TaskId,
        worker: String,
        #[serde(with = "chrono::serde::ts_seconds")]
        timestamp: DateTime<Utc>,
    },

    /// The poster approved the work and the escrow paid out
    TaskCompleted {
        task_id: TaskId,
        worker: String,
        reward: String,
        fee: String,
        currency: Currency,
        rating: Option<u8>,
        #[serde(with = "chrono::serde::ts_seconds")]
        timestamp: DateTime<Utc>,
    },

    /// The poster cancelled an open task and the escrow was refunded
    TaskCancelled {
        task_id: TaskId,
        poster: String,
        refunded: String,
        currency: Currency,
        #[serde(with = "chrono::serde::ts_seconds")]
        timestamp: DateTime<Utc>,
    },

    /// A party contested an in-flight task
    TaskDisputed {
        task_id: TaskId,
        raised_by: String,
        #[serde(with = "chrono::serde::ts_seconds")]
        timestamp: DateTime<Utc>,
    },

    /// An admin settled a disputed task
    DisputeResolved {
        task_id: TaskId,
        outcome: DisputeOutcome,
        resolved_by: String,
        #[serde(with = "chrono::serde::ts_seconds")]
        timestamp: DateTime<Utc>,
    },

    /// The platform fee changed (existing tasks keep their snapshot)
    PlatformFeeUpdated {
        old_bps: u32,
        new_bps: u32,
        #[serde(with = "chrono::serde::ts_seconds")]
        timestamp: DateTime<Utc>,
    },

    /// The admin role moved to a new account
    AdminTransferred {
        old_admin: String,
        new_admin: String,
        #[serde(with = "chrono::serde::ts_seconds")]
        timestamp: DateTime<Utc>,
    },

    /// Accumulated platform fees were paid out to the admin
    FeesWithdrawn {
        currency: Currency,
        amount: String,
        to: String,
        #[serde(with = "chrono::serde::ts_seconds")]
        timestamp: DateTime<Utc>,
    },
}

impl MarketEvent {
    /// Short name for logs and metrics
    pub fn event_type(&self) -> &'static str {
        match self {
            MarketEvent::TaskCreated { .. } => "task_created",
            MarketEvent::TaskAssigned { .. } => "task_assigned",
            MarketEvent::TaskSubmitted { .. } => "task_submitted",
            MarketEvent::TaskCompleted { .. } => "task_completed",
            MarketEvent::TaskCancelled { .. } => "task_cancelled",
            MarketEvent::TaskDisputed { .. } => "task_disputed",
            MarketEvent::DisputeResolved { .. } => "dispute_resolved",
            MarketEvent::PlatformFeeUpdated { .. } => "platform_fee_updated",
            MarketEvent::AdminTransferred { .. } => "admin_transferred",
            MarketEvent::FeesWithdrawn { .. } => "fees_withdrawn",
        }
    }
}

/// Broadcast bus carrying [`MarketEvent`]s to any number of subscribers
pub struct EventBus {
    tx: broadcast::Sender<MarketEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_BUFFER);
        Self { tx }
    }

    /// Emit an event to all subscribers
    pub fn emit(&self, event: MarketEvent) {
        match self.tx.send(event.clone()) {
            Ok(subscriber_count) => {
                debug!(
                    event_type = event.event_type(),
                    subscribers = subscriber_count,
                    "Event emitted"
                );
            }
            Err(_) => {
                // No subscribers, this is normal and not an error
                debug!(
                    event_type = event.event_type(),
                    "Event emitted but no subscribers listening"
                );
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MarketEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn has_subscribers(&self) -> bool {
        self.subscriber_count() > 0
    }
}
