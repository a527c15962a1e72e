//! Marketplace engine coordinating tasks, escrow, reputation and disputes.
//!
//! Mutating operations serialize on the task registry lock and hold it from
//! precondition check through state update, so two racing calls against the
//! same task resolve to one winner and one clean error. Ledger movements
//! complete before task state changes; an operation that fails midway never
//! reports a payout it did not make.

use crate::config::{fee_for, PlatformConfig, MAX_FEE_BPS};
use crate::dispute::{DisputeCase, DisputeLog};
use crate::error::{MarketError, Result};
use crate::events::{EventBus, MarketEvent};
use crate::registry::TaskRegistry;
use crate::reputation::{ReputationLedger, ReputationRecord};
use crate::types::{DisputeOutcome, Task, TaskDraft, TaskId, TaskStatus, MAX_RATING, MIN_RATING};
use chrono::Utc;
use gigmart_common::{EscrowManager, EscrowType, LifecycleState};
use gigmart_ledger::types::{AccountId, Currency, TokenAmount};
use gigmart_ledger::BalanceManager;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

/// Aggregate snapshot of marketplace activity
#[derive(Debug, Clone, Serialize)]
pub struct MarketStats {
    pub total_tasks: u64,
    pub open_tasks: u64,
    pub assigned_tasks: u64,
    pub in_review_tasks: u64,
    pub completed_tasks: u64,
    pub cancelled_tasks: u64,
    pub disputed_tasks: u64,
    /// Rewards paid out to workers, per currency
    pub completed_volume: HashMap<Currency, TokenAmount>,
    /// Distinct accounts seen as poster or worker
    pub participants: u64,
}

/// Coordinates the full task lifecycle: escrowed creation, assignment,
/// review, payout, cancellation and dispute resolution.
pub struct MarketEngine {
    registry: Arc<RwLock<TaskRegistry>>,
    config: Arc<RwLock<PlatformConfig>>,
    balances: Arc<BalanceManager>,
    escrow: Arc<EscrowManager>,
    reputation: Arc<ReputationLedger>,
    disputes: Arc<DisputeLog>,
    events: Arc<EventBus>,
}

impl MarketEngine {
    /// Build an engine over the given ledger. Fails if the config is invalid.
    pub fn new(config: PlatformConfig, balances: Arc<BalanceManager>) -> Result<Self> {
        config.validate()?;
        let escrow = Arc::new(EscrowManager::new(balances.clone()));

        info!(
            admin = %config.admin,
            fee_bps = config.fee_bps,
            currencies = ?config.currencies,
            "🏪 Marketplace engine started"
        );

        Ok(Self {
            registry: Arc::new(RwLock::new(TaskRegistry::new())),
            config: Arc::new(RwLock::new(config)),
            balances,
            escrow,
            reputation: Arc::new(ReputationLedger::new()),
            disputes: Arc::new(DisputeLog::new()),
            events: Arc::new(EventBus::new()),
        })
    }

    /// Publish a task and lock its reward plus the platform fee in escrow.
    ///
    /// The fee is snapshotted from the current config; later fee changes
    /// never touch tasks that already exist.
    pub async fn create_task(&self, poster: AccountId, draft: TaskDraft) -> Result<TaskId> {
        let start = std::time::Instant::now();

        if draft.title.trim().is_empty() {
            return Err(MarketError::Validation(
                "Task title must not be empty".to_string(),
            ));
        }
        if draft.description.trim().is_empty() {
            return Err(MarketError::Validation(
                "Task description must not be empty".to_string(),
            ));
        }
        if draft.category.trim().is_empty() {
            return Err(MarketError::Validation(
                "Task category must not be empty".to_string(),
            ));
        }
        if draft.reward.is_zero() {
            return Err(MarketError::Validation(
                "Task reward must be positive".to_string(),
            ));
        }

        let fee_bps = {
            let config = self.config.read().await;
            if !config.currency_enabled(draft.currency) {
                return Err(MarketError::Validation(format!(
                    "Currency {} is not available on this deployment",
                    draft.currency
                )));
            }
            config.fee_bps
        };

        let fee = fee_for(draft.reward, fee_bps);
        let escrow_total = draft
            .reward
            .checked_add(fee)
            .ok_or_else(|| MarketError::Validation("Reward plus platform fee overflows".to_string()))?;

        let mut registry = self.registry.write().await;
        let task_id = registry.peek_next_id();

        // Check the combined amount up front so a poster who can cover the
        // reward but not the fee gets one error naming the full requirement.
        let available = self
            .balances
            .get_unlocked_balance(poster, draft.currency)
            .await
            .map_err(MarketError::from_ledger)?;
        if available < escrow_total {
            return Err(MarketError::InsufficientFunds {
                required: escrow_total.to_string(),
                available: available.to_string(),
            });
        }

        let reward_lock = self
            .escrow
            .lock(
                EscrowType::TaskReward { task_id, poster },
                draft.reward,
                draft.currency,
            )
            .await
            .map_err(MarketError::from_escrow)?;

        if let Err(e) = self
            .escrow
            .lock(EscrowType::TaskFee { task_id, poster }, fee, draft.currency)
            .await
        {
            // Return the reward lock before surfacing the error
            if let Err(rollback) = self.escrow.refund(&reward_lock).await {
                warn!(
                    task_id,
                    error = %rollback,
                    "Failed to refund reward escrow after fee lock failure"
                );
            } else if let Err(rollback) = self.escrow.remove_lock(&reward_lock).await {
                warn!(
                    task_id,
                    error = %rollback,
                    "Failed to drop reward lock after fee lock failure"
                );
            }
            return Err(MarketError::from_escrow(e));
        }

        let now = Utc::now().timestamp();
        let deadline_secs =
            i64::try_from(draft.deadline_hours.saturating_mul(3600)).unwrap_or(i64::MAX);
        let reward = draft.reward;
        let currency = draft.currency;
        let task = Task {
            id: task_id,
            poster,
            worker: None,
            title: draft.title,
            description: draft.description,
            category: draft.category,
            reward,
            currency,
            fee,
            status: TaskStatus::Open,
            created_at: now,
            deadline: now.saturating_add(deadline_secs),
            funds_escrowed: true,
            rating: None,
        };

        info!(
            task_id,
            poster = %poster,
            title = %task.title,
            category = %task.category,
            currency = %currency,
            reward = reward.to_tokens(),
            fee = fee.to_tokens(),
            fee_bps,
            duration_ms = start.elapsed().as_millis() as u64,
            "📋 Task created"
        );

        registry.insert(task);
        drop(registry);

        self.events.emit(MarketEvent::TaskCreated {
            task_id,
            poster: poster.to_hex(),
            reward: reward.to_string(),
            fee: fee.to_string(),
            currency,
            timestamp: Utc::now(),
        });

        Ok(task_id)
    }

    /// Claim an open task. First caller wins; everyone else gets an error.
    pub async fn accept_task(&self, worker: AccountId, task_id: TaskId) -> Result<()> {
        let mut registry = self.registry.write().await;
        {
            let task = registry.get_mut(task_id)?;
            if task.poster == worker {
                return Err(MarketError::Unauthorized(
                    "Posters cannot accept their own tasks".to_string(),
                ));
            }
            task.transition_to(TaskStatus::Assigned)?;
            task.worker = Some(worker);
        }
        registry.retire_open(task_id);
        registry.index_worker(worker, task_id);
        drop(registry);

        info!(task_id, worker = %worker, "🤝 Task assigned");
        self.events.emit(MarketEvent::TaskAssigned {
            task_id,
            worker: worker.to_hex(),
            timestamp: Utc::now(),
        });
        Ok(())
    }

    /// Hand in assigned work for poster review.
    pub async fn submit_task(&self, worker: AccountId, task_id: TaskId) -> Result<()> {
        let mut registry = self.registry.write().await;
        let task = registry.get_mut(task_id)?;
        if task.worker != Some(worker) {
            return Err(MarketError::Unauthorized(
                "Only the assigned worker can submit work".to_string(),
            ));
        }
        task.transition_to(TaskStatus::InReview)?;
        drop(registry);

        info!(task_id, worker = %worker, "📤 Work submitted for review");
        self.events.emit(MarketEvent::TaskSubmitted {
            task_id,
            worker: worker.to_hex(),
            timestamp: Utc::now(),
        });
        Ok(())
    }

    /// Approve submitted work: pay the worker, collect the fee, rate the
    /// worker and close the task.
    pub async fn approve_task(&self, poster: AccountId, task_id: TaskId, rating: u8) -> Result<()> {
        let start = std::time::Instant::now();
        let mut registry = self.registry.write().await;

        let (worker, reward, fee, currency) = {
            let task = registry.get(task_id)?;
            if task.poster != poster {
                return Err(MarketError::Unauthorized(
                    "Only the poster can approve work".to_string(),
                ));
            }
            if task.status != TaskStatus::InReview {
                return Err(MarketError::InvalidTransition {
                    from: task.status.label().to_string(),
                    to: TaskStatus::Completed.label().to_string(),
                });
            }
            if !(MIN_RATING..=MAX_RATING).contains(&rating) {
                return Err(MarketError::Validation(format!(
                    "Rating {} outside the {}..={} range",
                    rating, MIN_RATING, MAX_RATING
                )));
            }
            let worker = task.worker.ok_or_else(|| {
                MarketError::Ledger(format!("Task {} is in review without a worker", task_id))
            })?;
            (worker, task.reward, task.fee, task.currency)
        };

        // Funds move first; state only changes once both releases settled
        let reward_lock = EscrowType::TaskReward { task_id, poster }.to_lock_id();
        self.escrow
            .release(&reward_lock, worker)
            .await
            .map_err(MarketError::from_escrow)?;
        self.escrow
            .remove_lock(&reward_lock)
            .await
            .map_err(MarketError::from_escrow)?;

        let fee_lock = EscrowType::TaskFee { task_id, poster }.to_lock_id();
        self.escrow
            .release(&fee_lock, AccountId::platform())
            .await
            .map_err(MarketError::from_escrow)?;
        self.escrow
            .remove_lock(&fee_lock)
            .await
            .map_err(MarketError::from_escrow)?;

        let task = registry.get_mut(task_id)?;
        task.transition_to(TaskStatus::Completed)?;
        task.funds_escrowed = false;
        task.rating = Some(rating);

        self.reputation
            .record_completion(worker, reward, currency, Some(rating))
            .await;
        drop(registry);

        info!(
            task_id,
            poster = %poster,
            worker = %worker,
            currency = %currency,
            reward = reward.to_tokens(),
            fee = fee.to_tokens(),
            rating,
            duration_ms = start.elapsed().as_millis() as u64,
            "✅ Task completed"
        );
        self.events.emit(MarketEvent::TaskCompleted {
            task_id,
            worker: worker.to_hex(),
            reward: reward.to_string(),
            fee: fee.to_string(),
            currency,
            rating: Some(rating),
            timestamp: Utc::now(),
        });
        Ok(())
    }

    /// Cancel an open task and refund the full escrow to the poster.
    pub async fn cancel_task(&self, poster: AccountId, task_id: TaskId) -> Result<()> {
        let mut registry = self.registry.write().await;

        let (refunded, currency) = {
            let task = registry.get(task_id)?;
            if task.poster != poster {
                return Err(MarketError::Unauthorized(
                    "Only the poster can cancel a task".to_string(),
                ));
            }
            if task.status != TaskStatus::Open {
                return Err(MarketError::InvalidTransition {
                    from: task.status.label().to_string(),
                    to: TaskStatus::Cancelled.label().to_string(),
                });
            }
            (task.escrow_total(), task.currency)
        };

        let reward_lock = EscrowType::TaskReward { task_id, poster }.to_lock_id();
        self.escrow
            .refund(&reward_lock)
            .await
            .map_err(MarketError::from_escrow)?;
        self.escrow
            .remove_lock(&reward_lock)
            .await
            .map_err(MarketError::from_escrow)?;

        let fee_lock = EscrowType::TaskFee { task_id, poster }.to_lock_id();
        self.escrow
            .refund(&fee_lock)
            .await
            .map_err(MarketError::from_escrow)?;
        self.escrow
            .remove_lock(&fee_lock)
            .await
            .map_err(MarketError::from_escrow)?;

        let task = registry.get_mut(task_id)?;
        task.transition_to(TaskStatus::Cancelled)?;
        task.funds_escrowed = false;
        registry.retire_open(task_id);
        drop(registry);

        info!(
            task_id,
            poster = %poster,
            currency = %currency,
            refunded = refunded.to_tokens(),
            "🛑 Task cancelled"
        );
        self.events.emit(MarketEvent::TaskCancelled {
            task_id,
            poster: poster.to_hex(),
            refunded: refunded.to_string(),
            currency,
            timestamp: Utc::now(),
        });
        Ok(())
    }

    /// Contest an assigned or in-review task. Escrow stays locked until an
    /// admin resolves the dispute.
    pub async fn dispute_task(&self, caller: AccountId, task_id: TaskId) -> Result<()> {
        let mut registry = self.registry.write().await;
        let task = registry.get_mut(task_id)?;
        if !task.is_party(&caller) {
            return Err(MarketError::Unauthorized(
                "Only the poster or assigned worker can dispute a task".to_string(),
            ));
        }
        if !task.status.can_transition_to(&TaskStatus::Disputed) {
            return Err(MarketError::InvalidTransition {
                from: task.status.label().to_string(),
                to: TaskStatus::Disputed.label().to_string(),
            });
        }
        self.disputes.open_case(task_id, caller).await?;
        task.transition_to(TaskStatus::Disputed)?;
        drop(registry);

        info!(task_id, raised_by = %caller, "⚖️ Task disputed");
        self.events.emit(MarketEvent::TaskDisputed {
            task_id,
            raised_by: caller.to_hex(),
            timestamp: Utc::now(),
        });
        Ok(())
    }

    /// Settle a disputed task. Admin only.
    ///
    /// `PayWorker` settles exactly like an approval except no rating is
    /// recorded; `RefundPoster` returns the full escrow and cancels.
    pub async fn resolve_dispute(
        &self,
        caller: AccountId,
        task_id: TaskId,
        outcome: DisputeOutcome,
    ) -> Result<()> {
        let start = std::time::Instant::now();
        let admin = self.config.read().await.admin;

        let mut registry = self.registry.write().await;
        let target = match outcome {
            DisputeOutcome::PayWorker => TaskStatus::Completed,
            DisputeOutcome::RefundPoster => TaskStatus::Cancelled,
        };

        let (poster, worker, reward, fee, currency) = {
            let task = registry.get(task_id)?;
            if caller != admin {
                return Err(MarketError::Unauthorized(
                    "Only the platform admin can resolve disputes".to_string(),
                ));
            }
            if task.status != TaskStatus::Disputed {
                return Err(MarketError::InvalidTransition {
                    from: task.status.label().to_string(),
                    to: target.label().to_string(),
                });
            }
            (task.poster, task.worker, task.reward, task.fee, task.currency)
        };

        let reward_lock = EscrowType::TaskReward { task_id, poster }.to_lock_id();
        let fee_lock = EscrowType::TaskFee { task_id, poster }.to_lock_id();
        match outcome {
            DisputeOutcome::PayWorker => {
                let worker = worker.ok_or_else(|| {
                    MarketError::Ledger(format!("Task {} is disputed without a worker", task_id))
                })?;
                self.escrow
                    .release(&reward_lock, worker)
                    .await
                    .map_err(MarketError::from_escrow)?;
                self.escrow
                    .remove_lock(&reward_lock)
                    .await
                    .map_err(MarketError::from_escrow)?;
                self.escrow
                    .release(&fee_lock, AccountId::platform())
                    .await
                    .map_err(MarketError::from_escrow)?;
                self.escrow
                    .remove_lock(&fee_lock)
                    .await
                    .map_err(MarketError::from_escrow)?;
                self.reputation
                    .record_completion(worker, reward, currency, None)
                    .await;
            }
            DisputeOutcome::RefundPoster => {
                self.escrow
                    .refund(&reward_lock)
                    .await
                    .map_err(MarketError::from_escrow)?;
                self.escrow
                    .remove_lock(&reward_lock)
                    .await
                    .map_err(MarketError::from_escrow)?;
                self.escrow
                    .refund(&fee_lock)
                    .await
                    .map_err(MarketError::from_escrow)?;
                self.escrow
                    .remove_lock(&fee_lock)
                    .await
                    .map_err(MarketError::from_escrow)?;
            }
        }

        let task = registry.get_mut(task_id)?;
        task.transition_to(target)?;
        task.funds_escrowed = false;

        let case = self.disputes.resolve_case(task_id, caller, outcome).await?;
        drop(registry);

        info!(
            task_id,
            resolved_by = %caller,
            raised_by = %case.raised_by,
            outcome = ?outcome,
            status = %target,
            currency = %currency,
            reward = reward.to_tokens(),
            fee = fee.to_tokens(),
            duration_ms = start.elapsed().as_millis() as u64,
            "⚖️ Dispute resolved"
        );
        self.events.emit(MarketEvent::DisputeResolved {
            task_id,
            outcome,
            resolved_by: caller.to_hex(),
            timestamp: Utc::now(),
        });
        Ok(())
    }

    /// Change the platform fee for tasks created from now on. Admin only.
    pub async fn update_platform_fee(&self, caller: AccountId, new_fee_bps: u32) -> Result<()> {
        let old_bps = {
            let mut config = self.config.write().await;
            if caller != config.admin {
                return Err(MarketError::Unauthorized(
                    "Only the platform admin can change the fee".to_string(),
                ));
            }
            if new_fee_bps > MAX_FEE_BPS {
                return Err(MarketError::Validation(format!(
                    "Fee {} bps exceeds maximum {} bps",
                    new_fee_bps, MAX_FEE_BPS
                )));
            }
            let old = config.fee_bps;
            config.fee_bps = new_fee_bps;
            old
        };

        info!(old_bps, new_bps = new_fee_bps, "⚙️ Platform fee updated");
        self.events.emit(MarketEvent::PlatformFeeUpdated {
            old_bps,
            new_bps: new_fee_bps,
            timestamp: Utc::now(),
        });
        Ok(())
    }

    /// Hand the admin role to another account. Admin only.
    pub async fn transfer_admin_role(&self, caller: AccountId, new_admin: AccountId) -> Result<()> {
        let old_admin = {
            let mut config = self.config.write().await;
            if caller != config.admin {
                return Err(MarketError::Unauthorized(
                    "Only the current admin can transfer the admin role".to_string(),
                ));
            }
            if new_admin.is_zero() || new_admin == AccountId::platform() {
                return Err(MarketError::Validation(
                    "Admin must be a regular account".to_string(),
                ));
            }
            let old = config.admin;
            config.admin = new_admin;
            old
        };

        info!(old_admin = %old_admin, new_admin = %new_admin, "👑 Admin role transferred");
        self.events.emit(MarketEvent::AdminTransferred {
            old_admin: old_admin.to_hex(),
            new_admin: new_admin.to_hex(),
            timestamp: Utc::now(),
        });
        Ok(())
    }

    /// Pay accumulated platform fees out to the admin. Admin only.
    ///
    /// Returns the amount withdrawn; an empty pot is a no-op, not an error.
    pub async fn withdraw_platform_fees(
        &self,
        caller: AccountId,
        currency: Currency,
    ) -> Result<TokenAmount> {
        {
            let config = self.config.read().await;
            if caller != config.admin {
                return Err(MarketError::Unauthorized(
                    "Only the platform admin can withdraw fees".to_string(),
                ));
            }
        }

        let pot = self
            .balances
            .get_balance(AccountId::platform(), currency)
            .await
            .map_err(MarketError::from_ledger)?;
        if pot.is_zero() {
            debug!(currency = %currency, "No platform fees to withdraw");
            return Ok(TokenAmount::ZERO);
        }

        self.balances
            .transfer(AccountId::platform(), caller, currency, pot)
            .await
            .map_err(MarketError::from_ledger)?;

        info!(
            currency = %currency,
            amount = pot.to_tokens(),
            to = %caller,
            "💼 Platform fees withdrawn"
        );
        self.events.emit(MarketEvent::FeesWithdrawn {
            currency,
            amount: pot.to_string(),
            to: caller.to_hex(),
            timestamp: Utc::now(),
        });
        Ok(pot)
    }

    // --- queries ---

    pub async fn get_task(&self, task_id: TaskId) -> Result<Task> {
        let registry = self.registry.read().await;
        registry.get(task_id).map(|task| task.clone())
    }

    pub async fn list_open_tasks(&self) -> Vec<Task> {
        let registry = self.registry.read().await;
        Self::collect_tasks(&registry, registry.list_open())
    }

    pub async fn list_all_tasks(&self) -> Vec<Task> {
        let registry = self.registry.read().await;
        Self::collect_tasks(&registry, registry.list_all())
    }

    /// All tasks ever posted by this account, terminal ones included.
    pub async fn list_tasks_by_poster(&self, account: &AccountId) -> Vec<Task> {
        let registry = self.registry.read().await;
        Self::collect_tasks(&registry, registry.list_by_poster(account))
    }

    /// All tasks this account was ever assigned, terminal ones included.
    pub async fn list_tasks_by_worker(&self, account: &AccountId) -> Vec<Task> {
        let registry = self.registry.read().await;
        Self::collect_tasks(&registry, registry.list_by_worker(account))
    }

    pub async fn list_tasks_with_status(&self, status: TaskStatus) -> Vec<Task> {
        let registry = self.registry.read().await;
        Self::collect_tasks(&registry, registry.list_with_status(status))
    }

    /// Tasks currently awaiting admin resolution.
    pub async fn list_disputed_tasks(&self) -> Vec<Task> {
        self.list_tasks_with_status(TaskStatus::Disputed).await
    }

    pub async fn task_count(&self) -> u64 {
        self.registry.read().await.task_count()
    }

    pub async fn get_reputation(&self, worker: &AccountId) -> ReputationRecord {
        self.reputation.get(worker).await
    }

    pub async fn get_dispute(&self, task_id: TaskId) -> Result<DisputeCase> {
        self.disputes.get(task_id).await
    }

    pub async fn open_disputes(&self) -> Vec<DisputeCase> {
        self.disputes.open_cases().await
    }

    pub async fn platform_fee_bps(&self) -> u32 {
        self.config.read().await.fee_bps
    }

    pub async fn admin(&self) -> AccountId {
        self.config.read().await.admin
    }

    pub async fn enabled_currencies(&self) -> Vec<Currency> {
        self.config.read().await.currencies.clone()
    }

    pub async fn market_stats(&self) -> MarketStats {
        let registry = self.registry.read().await;
        let mut stats = MarketStats {
            total_tasks: registry.task_count(),
            open_tasks: 0,
            assigned_tasks: 0,
            in_review_tasks: 0,
            completed_tasks: 0,
            cancelled_tasks: 0,
            disputed_tasks: 0,
            completed_volume: HashMap::new(),
            participants: 0,
        };
        let mut participants: HashSet<AccountId> = HashSet::new();

        for task in registry.tasks() {
            match task.status {
                TaskStatus::Open => stats.open_tasks += 1,
                TaskStatus::Assigned => stats.assigned_tasks += 1,
                TaskStatus::InReview => stats.in_review_tasks += 1,
                TaskStatus::Completed => {
                    stats.completed_tasks += 1;
                    let volume = stats
                        .completed_volume
                        .entry(task.currency)
                        .or_insert(TokenAmount::ZERO);
                    *volume = volume.saturating_add(task.reward);
                }
                TaskStatus::Cancelled => stats.cancelled_tasks += 1,
                TaskStatus::Disputed => stats.disputed_tasks += 1,
            }
            participants.insert(task.poster);
            if let Some(worker) = task.worker {
                participants.insert(worker);
            }
        }

        stats.participants = participants.len() as u64;
        stats
    }

    /// Subscribe to marketplace events
    pub fn subscribe(&self) -> broadcast::Receiver<MarketEvent> {
        self.events.subscribe()
    }

    /// The ledger backing this marketplace; hosts credit deposits through it
    pub fn balance_manager(&self) -> Arc<BalanceManager> {
        self.balances.clone()
    }

    fn collect_tasks(registry: &TaskRegistry, ids: Vec<TaskId>) -> Vec<Task> {
        ids.into_iter()
            .filter_map(|id| registry.get(id).ok().map(|task| task.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gigmart_ledger::storage::MemoryLedger;

    fn admin() -> AccountId {
        AccountId::from_bytes([0xAA; 20])
    }

    fn poster() -> AccountId {
        AccountId::from_bytes([1; 20])
    }

    fn worker() -> AccountId {
        AccountId::from_bytes([2; 20])
    }

    fn draft(reward: f64, currency: Currency) -> TaskDraft {
        TaskDraft {
            title: "Translate onboarding guide".to_string(),
            description: "English to German, roughly two pages".to_string(),
            category: "writing".to_string(),
            reward: TokenAmount::from_tokens(reward),
            currency,
            deadline_hours: 48,
        }
    }

    async fn test_engine() -> MarketEngine {
        let storage = Arc::new(MemoryLedger::new());
        let balances = Arc::new(BalanceManager::new(storage));
        for currency in Currency::all() {
            balances
                .credit(poster(), currency, TokenAmount::from_tokens(100.0))
                .await
                .unwrap();
        }
        MarketEngine::new(PlatformConfig::new(admin()), balances).unwrap()
    }

    #[tokio::test]
    async fn test_create_task_escrows_reward_plus_fee() {
        let engine = test_engine().await;
        let task_id = engine
            .create_task(poster(), draft(5.0, Currency::Stable))
            .await
            .unwrap();

        let task = engine.get_task(task_id).await.unwrap();
        assert_eq!(task.status, TaskStatus::Open);
        assert_eq!(task.fee, TokenAmount::from_tokens(0.125));
        assert!(task.funds_escrowed);
        assert_eq!(task.rating, None);

        let balances = engine.balance_manager();
        assert_eq!(
            balances
                .get_locked_balance(poster(), Currency::Stable)
                .await
                .unwrap(),
            TokenAmount::from_tokens(5.125)
        );
        assert_eq!(
            balances
                .get_unlocked_balance(poster(), Currency::Stable)
                .await
                .unwrap(),
            TokenAmount::from_tokens(94.875)
        );
        assert_eq!(engine.list_open_tasks().await.len(), 1);
    }

    #[tokio::test]
    async fn test_create_task_rejects_bad_payloads() {
        let engine = test_engine().await;

        let mut blank_title = draft(5.0, Currency::Stable);
        blank_title.title = "   ".to_string();
        let err = engine.create_task(poster(), blank_title).await.unwrap_err();
        assert!(matches!(err, MarketError::Validation(_)));

        let mut zero_reward = draft(5.0, Currency::Stable);
        zero_reward.reward = TokenAmount::ZERO;
        let err = engine.create_task(poster(), zero_reward).await.unwrap_err();
        assert!(matches!(err, MarketError::Validation(_)));

        let err = engine
            .create_task(poster(), draft(1000.0, Currency::Stable))
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::InsufficientFunds { .. }));

        // Nothing was escrowed by any of the failures
        assert_eq!(
            engine
                .balance_manager()
                .get_locked_balance(poster(), Currency::Stable)
                .await
                .unwrap(),
            TokenAmount::ZERO
        );
        assert_eq!(engine.task_count().await, 0);
    }

    #[tokio::test]
    async fn test_create_task_respects_enabled_currencies() {
        let storage = Arc::new(MemoryLedger::new());
        let balances = Arc::new(BalanceManager::new(storage));
        balances
            .credit(poster(), Currency::Native, TokenAmount::from_tokens(50.0))
            .await
            .unwrap();
        let engine = MarketEngine::new(
            PlatformConfig::with_currencies(admin(), vec![Currency::Stable]),
            balances,
        )
        .unwrap();

        let err = engine
            .create_task(poster(), draft(5.0, Currency::Native))
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::Validation(_)));
    }

    #[tokio::test]
    async fn test_accept_task_rules() {
        let engine = test_engine().await;
        let task_id = engine
            .create_task(poster(), draft(5.0, Currency::Stable))
            .await
            .unwrap();

        let err = engine.accept_task(poster(), task_id).await.unwrap_err();
        assert!(matches!(err, MarketError::Unauthorized(_)));

        engine.accept_task(worker(), task_id).await.unwrap();
        let task = engine.get_task(task_id).await.unwrap();
        assert_eq!(task.status, TaskStatus::Assigned);
        assert_eq!(task.worker, Some(worker()));
        assert!(engine.list_open_tasks().await.is_empty());

        // A second accept finds the task no longer open
        let late = AccountId::from_bytes([3; 20]);
        let err = engine.accept_task(late, task_id).await.unwrap_err();
        assert!(matches!(err, MarketError::InvalidTransition { .. }));
        assert_eq!(engine.get_task(task_id).await.unwrap().worker, Some(worker()));
    }

    #[tokio::test]
    async fn test_fee_updates_spare_existing_tasks() {
        let engine = test_engine().await;
        let first = engine
            .create_task(poster(), draft(5.0, Currency::Stable))
            .await
            .unwrap();

        let err = engine.update_platform_fee(poster(), 500).await.unwrap_err();
        assert!(matches!(err, MarketError::Unauthorized(_)));
        let err = engine.update_platform_fee(admin(), 1_001).await.unwrap_err();
        assert!(matches!(err, MarketError::Validation(_)));

        engine.update_platform_fee(admin(), 500).await.unwrap();
        assert_eq!(engine.platform_fee_bps().await, 500);

        let second = engine
            .create_task(poster(), draft(5.0, Currency::Stable))
            .await
            .unwrap();

        let first_task = engine.get_task(first).await.unwrap();
        let second_task = engine.get_task(second).await.unwrap();
        assert_eq!(first_task.fee, TokenAmount::from_tokens(0.125));
        assert_eq!(second_task.fee, TokenAmount::from_tokens(0.25));
    }

    #[tokio::test]
    async fn test_admin_role_transfer() {
        let engine = test_engine().await;
        let successor = AccountId::from_bytes([0xBB; 20]);

        let err = engine
            .transfer_admin_role(admin(), AccountId::platform())
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::Validation(_)));

        engine.transfer_admin_role(admin(), successor).await.unwrap();
        assert_eq!(engine.admin().await, successor);

        // The old admin lost its powers
        let err = engine.update_platform_fee(admin(), 100).await.unwrap_err();
        assert!(matches!(err, MarketError::Unauthorized(_)));
        engine.update_platform_fee(successor, 100).await.unwrap();
    }
}
