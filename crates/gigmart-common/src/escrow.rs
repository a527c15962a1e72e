use crate::{AppError, LockId, Result};
use gigmart_ledger::types::{AccountId, Currency, TokenAmount};
use gigmart_ledger::{BalanceManager, LedgerError};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Types of escrow locks used across the marketplace
#[derive(Debug, Clone)]
pub enum EscrowType {
    /// Reward owed to the worker when a task completes
    TaskReward { task_id: u64, poster: AccountId },

    /// Platform fee collected when a task completes
    TaskFee { task_id: u64, poster: AccountId },
}

impl EscrowType {
    pub fn to_lock_id(&self) -> LockId {
        match self {
            EscrowType::TaskReward { task_id, poster } => LockId::new(format!(
                "task_reward_{}_{}",
                task_id,
                hex::encode(&poster.as_bytes()[..8])
            )),
            EscrowType::TaskFee { task_id, poster } => LockId::new(format!(
                "task_fee_{}_{}",
                task_id,
                hex::encode(&poster.as_bytes()[..8])
            )),
        }
    }

    pub fn owner(&self) -> AccountId {
        match self {
            EscrowType::TaskReward { poster, .. } => *poster,
            EscrowType::TaskFee { poster, .. } => *poster,
        }
    }
}

/// Lock metadata for tracking
#[derive(Debug, Clone)]
pub struct LockMetadata {
    pub escrow_type: EscrowType,
    pub amount: TokenAmount,
    pub currency: Currency,
    pub locked_at: i64,
    pub owner: AccountId,
}

/// Escrow manager wraps BalanceManager to provide marketplace-level escrow
pub struct EscrowManager {
    balance_mgr: Arc<BalanceManager>,
    locks: Arc<RwLock<HashMap<LockId, LockMetadata>>>,
}

impl EscrowManager {
    pub fn new(balance_mgr: Arc<BalanceManager>) -> Self {
        Self {
            balance_mgr,
            locks: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Lock funds for escrow
    pub async fn lock(
        &self,
        escrow_type: EscrowType,
        amount: TokenAmount,
        currency: Currency,
    ) -> Result<LockId> {
        let start = std::time::Instant::now();
        let lock_id = escrow_type.to_lock_id();
        let owner = escrow_type.owner();

        // Capture balance before
        let balance_before = self
            .balance_mgr
            .get_balance(owner, currency)
            .await
            .map_err(|e| AppError::EscrowError(e.to_string()))?;

        // Lock the funds using BalanceManager
        self.balance_mgr
            .lock(owner, currency, amount)
            .await
            .map_err(|e| match e {
                LedgerError::InsufficientFunds {
                    required, available, ..
                } => AppError::InsufficientBalance {
                    needed: required.to_string(),
                    available: available.to_string(),
                },
                other => AppError::EscrowError(other.to_string()),
            })?;

        // Capture locked balance after
        let locked_after = self
            .balance_mgr
            .get_locked_balance(owner, currency)
            .await
            .map_err(|e| AppError::EscrowError(e.to_string()))?;

        // Track the lock
        let mut locks = self.locks.write().await;
        locks.insert(
            lock_id.clone(),
            LockMetadata {
                escrow_type: escrow_type.clone(),
                amount,
                currency,
                locked_at: chrono::Utc::now().timestamp(),
                owner,
            },
        );

        info!(
            lock_id = %lock_id,
            owner = %owner,
            currency = %currency,
            amount = amount.to_tokens(),
            balance_before = balance_before.to_tokens(),
            locked_after = locked_after.to_tokens(),
            escrow_type = ?escrow_type,
            duration_ms = start.elapsed().as_millis() as u64,
            "💰 Escrow locked"
        );

        Ok(lock_id)
    }

    /// Release locked funds to a recipient
    pub async fn release(&self, lock_id: &LockId, to: AccountId) -> Result<()> {
        let start = std::time::Instant::now();
        let locks = self.locks.read().await;
        let metadata = locks
            .get(lock_id)
            .ok_or_else(|| AppError::LockNotFound(lock_id.to_string()))?;

        // Capture recipient balance before
        let to_balance_before = self
            .balance_mgr
            .get_balance(to, metadata.currency)
            .await
            .map_err(|e| AppError::EscrowError(e.to_string()))?;

        // Unlock funds from owner
        self.balance_mgr
            .unlock(metadata.owner, metadata.currency, metadata.amount)
            .await
            .map_err(|e| AppError::EscrowError(e.to_string()))?;

        // Transfer to recipient
        self.balance_mgr
            .transfer(metadata.owner, to, metadata.currency, metadata.amount)
            .await
            .map_err(|e| AppError::EscrowError(e.to_string()))?;

        // Capture recipient balance after
        let to_balance_after = self
            .balance_mgr
            .get_balance(to, metadata.currency)
            .await
            .map_err(|e| AppError::EscrowError(e.to_string()))?;

        info!(
            lock_id = %lock_id,
            from = %metadata.owner,
            to = %to,
            currency = %metadata.currency,
            amount = metadata.amount.to_tokens(),
            to_balance_before = to_balance_before.to_tokens(),
            to_balance_after = to_balance_after.to_tokens(),
            duration_ms = start.elapsed().as_millis() as u64,
            "💸 Escrow released"
        );

        Ok(())
    }

    /// Refund locked funds back to owner
    pub async fn refund(&self, lock_id: &LockId) -> Result<()> {
        let start = std::time::Instant::now();
        let locks = self.locks.read().await;
        let metadata = locks
            .get(lock_id)
            .ok_or_else(|| AppError::LockNotFound(lock_id.to_string()))?;

        // Capture locked balance before
        let locked_before = self
            .balance_mgr
            .get_locked_balance(metadata.owner, metadata.currency)
            .await
            .map_err(|e| AppError::EscrowError(e.to_string()))?;

        // Simply unlock the funds (returns to owner's balance)
        self.balance_mgr
            .unlock(metadata.owner, metadata.currency, metadata.amount)
            .await
            .map_err(|e| AppError::EscrowError(e.to_string()))?;

        // Capture locked balance after
        let locked_after = self
            .balance_mgr
            .get_locked_balance(metadata.owner, metadata.currency)
            .await
            .map_err(|e| AppError::EscrowError(e.to_string()))?;

        info!(
            lock_id = %lock_id,
            owner = %metadata.owner,
            currency = %metadata.currency,
            amount = metadata.amount.to_tokens(),
            locked_before = locked_before.to_tokens(),
            locked_after = locked_after.to_tokens(),
            duration_ms = start.elapsed().as_millis() as u64,
            "🔄 Escrow refunded"
        );

        Ok(())
    }

    /// Get lock metadata
    pub async fn get_lock(&self, lock_id: &LockId) -> Result<LockMetadata> {
        let locks = self.locks.read().await;
        locks
            .get(lock_id)
            .cloned()
            .ok_or_else(|| AppError::LockNotFound(lock_id.to_string()))
    }

    /// Check if a lock exists
    pub async fn lock_exists(&self, lock_id: &LockId) -> bool {
        let locks = self.locks.read().await;
        locks.contains_key(lock_id)
    }

    /// Remove lock from tracking (after funds are released/refunded)
    pub async fn remove_lock(&self, lock_id: &LockId) -> Result<()> {
        let mut locks = self.locks.write().await;
        locks
            .remove(lock_id)
            .ok_or_else(|| AppError::LockNotFound(lock_id.to_string()))?;

        debug!(lock_id = %lock_id, "Lock removed from tracking");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gigmart_ledger::storage::MemoryLedger;

    #[tokio::test]
    async fn test_escrow_lifecycle() {
        let storage = Arc::new(MemoryLedger::new());
        let balance_mgr = Arc::new(BalanceManager::new(storage));
        let escrow_mgr = EscrowManager::new(balance_mgr.clone());

        let owner = AccountId::from_bytes([1; 20]);
        let recipient = AccountId::from_bytes([2; 20]);

        // Credit owner with funds
        balance_mgr
            .credit(owner, Currency::Stable, TokenAmount::from_tokens(100.0))
            .await
            .unwrap();

        // Lock funds
        let escrow_type = EscrowType::TaskReward { task_id: 1, poster: owner };
        let lock_id = escrow_mgr
            .lock(escrow_type, TokenAmount::from_tokens(50.0), Currency::Stable)
            .await
            .unwrap();

        // Verify locked balance
        let locked = balance_mgr
            .get_locked_balance(owner, Currency::Stable)
            .await
            .unwrap();
        assert_eq!(locked, TokenAmount::from_tokens(50.0));

        // Release funds
        escrow_mgr.release(&lock_id, recipient).await.unwrap();
        escrow_mgr.remove_lock(&lock_id).await.unwrap();

        // Verify recipient got funds
        let recipient_balance = balance_mgr
            .get_balance(recipient, Currency::Stable)
            .await
            .unwrap();
        assert_eq!(recipient_balance, TokenAmount::from_tokens(50.0));
        assert!(!escrow_mgr.lock_exists(&lock_id).await);
    }

    #[tokio::test]
    async fn test_escrow_refund() {
        let storage = Arc::new(MemoryLedger::new());
        let balance_mgr = Arc::new(BalanceManager::new(storage));
        let escrow_mgr = EscrowManager::new(balance_mgr.clone());

        let owner = AccountId::from_bytes([3; 20]);
        balance_mgr
            .credit(owner, Currency::Native, TokenAmount::from_tokens(20.0))
            .await
            .unwrap();

        let lock_id = escrow_mgr
            .lock(
                EscrowType::TaskFee { task_id: 7, poster: owner },
                TokenAmount::from_tokens(5.0),
                Currency::Native,
            )
            .await
            .unwrap();

        escrow_mgr.refund(&lock_id).await.unwrap();
        escrow_mgr.remove_lock(&lock_id).await.unwrap();

        assert_eq!(
            balance_mgr
                .get_locked_balance(owner, Currency::Native)
                .await
                .unwrap(),
            TokenAmount::ZERO
        );
        assert_eq!(
            balance_mgr
                .get_unlocked_balance(owner, Currency::Native)
                .await
                .unwrap(),
            TokenAmount::from_tokens(20.0)
        );
    }

    #[tokio::test]
    async fn test_lock_insufficient_funds() {
        let storage = Arc::new(MemoryLedger::new());
        let balance_mgr = Arc::new(BalanceManager::new(storage));
        let escrow_mgr = EscrowManager::new(balance_mgr.clone());

        let owner = AccountId::from_bytes([4; 20]);
        balance_mgr
            .credit(owner, Currency::Stable, TokenAmount::from_tokens(1.0))
            .await
            .unwrap();

        let err = escrow_mgr
            .lock(
                EscrowType::TaskReward { task_id: 2, poster: owner },
                TokenAmount::from_tokens(2.0),
                Currency::Stable,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InsufficientBalance { .. }));
        assert!(!escrow_mgr
            .lock_exists(&EscrowType::TaskReward { task_id: 2, poster: owner }.to_lock_id())
            .await);
    }
}
