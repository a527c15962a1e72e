use crate::types::{AccountId, Currency, TokenAmount};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

// Transfer record for history tracking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRecord {
    pub from: AccountId,
    pub to: AccountId,
    pub currency: Currency,
    pub amount: TokenAmount,
    pub timestamp: DateTime<Utc>,
    pub tx_hash: String,
    pub status: String,
}

// Type aliases for complex types
type BalanceMap = HashMap<(AccountId, Currency), TokenAmount>;
type TransactionBackup = Option<(BalanceMap, BalanceMap)>;

#[async_trait]
pub trait LedgerStorage: Send + Sync {
    async fn get_balance(&self, account: AccountId, currency: Currency) -> Result<TokenAmount>;
    async fn set_balance(
        &self,
        account: AccountId,
        currency: Currency,
        balance: TokenAmount,
    ) -> Result<()>;
    async fn get_locked_balance(
        &self,
        account: AccountId,
        currency: Currency,
    ) -> Result<TokenAmount>;
    async fn set_locked_balance(
        &self,
        account: AccountId,
        currency: Currency,
        locked: TokenAmount,
    ) -> Result<()>;
    async fn get_all_accounts(&self) -> Result<Vec<AccountId>>;

    async fn begin_transaction(&self) -> Result<()>;
    async fn commit_transaction(&self) -> Result<()>;
    async fn rollback_transaction(&self) -> Result<()>;

    // Transfer history methods
    async fn record_transfer(&self, record: TransferRecord) -> Result<()>;
    async fn transfer_history(&self, account: AccountId) -> Result<Vec<TransferRecord>>;
}

pub struct MemoryLedger {
    balances: Arc<RwLock<BalanceMap>>,
    locked_balances: Arc<RwLock<BalanceMap>>,
    transaction_backup: Arc<RwLock<TransactionBackup>>,
    transfer_history: Arc<RwLock<Vec<TransferRecord>>>,
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self {
            balances: Arc::new(RwLock::new(HashMap::new())),
            locked_balances: Arc::new(RwLock::new(HashMap::new())),
            transaction_backup: Arc::new(RwLock::new(None)),
            transfer_history: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

#[async_trait]
impl LedgerStorage for MemoryLedger {
    async fn get_balance(&self, account: AccountId, currency: Currency) -> Result<TokenAmount> {
        let balances = self.balances.read().await;
        Ok(balances
            .get(&(account, currency))
            .copied()
            .unwrap_or(TokenAmount::ZERO))
    }

    async fn set_balance(
        &self,
        account: AccountId,
        currency: Currency,
        balance: TokenAmount,
    ) -> Result<()> {
        let mut balances = self.balances.write().await;
        let old_balance = balances
            .get(&(account, currency))
            .copied()
            .unwrap_or(TokenAmount::ZERO);

        if balance == TokenAmount::ZERO {
            balances.remove(&(account, currency));
        } else {
            balances.insert((account, currency), balance);
        }

        if old_balance != balance {
            info!(
                account = %account,
                currency = %currency,
                balance_before = old_balance.to_tokens(),
                balance_after = balance.to_tokens(),
                storage_type = "memory",
                "💾 Balance stored"
            );
        }
        Ok(())
    }

    async fn get_locked_balance(
        &self,
        account: AccountId,
        currency: Currency,
    ) -> Result<TokenAmount> {
        let locked = self.locked_balances.read().await;
        Ok(locked
            .get(&(account, currency))
            .copied()
            .unwrap_or(TokenAmount::ZERO))
    }

    async fn set_locked_balance(
        &self,
        account: AccountId,
        currency: Currency,
        locked: TokenAmount,
    ) -> Result<()> {
        let mut locked_balances = self.locked_balances.write().await;
        let old_locked = locked_balances
            .get(&(account, currency))
            .copied()
            .unwrap_or(TokenAmount::ZERO);

        if locked == TokenAmount::ZERO {
            locked_balances.remove(&(account, currency));
        } else {
            locked_balances.insert((account, currency), locked);
        }

        if old_locked != locked {
            info!(
                account = %account,
                currency = %currency,
                locked_before = old_locked.to_tokens(),
                locked_after = locked.to_tokens(),
                storage_type = "memory",
                "🔒 Locked balance stored"
            );
        }
        Ok(())
    }

    async fn get_all_accounts(&self) -> Result<Vec<AccountId>> {
        let balances = self.balances.read().await;
        let locked = self.locked_balances.read().await;

        let mut accounts: Vec<AccountId> = Vec::new();
        for (account, _) in balances.keys() {
            if !accounts.contains(account) {
                accounts.push(*account);
            }
        }
        for (account, _) in locked.keys() {
            if !accounts.contains(account) {
                accounts.push(*account);
            }
        }

        Ok(accounts)
    }

    async fn begin_transaction(&self) -> Result<()> {
        let balances = self.balances.read().await;
        let locked = self.locked_balances.read().await;

        let mut backup = self.transaction_backup.write().await;
        *backup = Some((balances.clone(), locked.clone()));

        debug!(
            entries_count = balances.len(),
            locked_entries_count = locked.len(),
            storage_type = "memory",
            "📝 Transaction began (snapshot created)"
        );
        Ok(())
    }

    async fn commit_transaction(&self) -> Result<()> {
        let mut backup = self.transaction_backup.write().await;
        let had_backup = backup.is_some();
        *backup = None;

        if had_backup {
            debug!(
                storage_type = "memory",
                "✅ Transaction committed (snapshot discarded)"
            );
        }
        Ok(())
    }

    async fn rollback_transaction(&self) -> Result<()> {
        let mut backup = self.transaction_backup.write().await;

        if let Some((balance_backup, locked_backup)) = backup.take() {
            let mut balances = self.balances.write().await;
            let mut locked = self.locked_balances.write().await;

            *balances = balance_backup;
            *locked = locked_backup;

            info!(
                entries_after = balances.len(),
                locked_entries_after = locked.len(),
                storage_type = "memory",
                "❌ Transaction rolled back (snapshot restored)"
            );
        }

        Ok(())
    }

    async fn record_transfer(&self, record: TransferRecord) -> Result<()> {
        let mut history = self.transfer_history.write().await;

        debug!(
            from = %record.from,
            to = %record.to,
            currency = %record.currency,
            amount = record.amount.to_tokens(),
            tx_hash = %record.tx_hash,
            history_size = history.len() + 1,
            storage_type = "memory",
            "📦 Transfer recorded"
        );

        history.push(record);
        Ok(())
    }

    async fn transfer_history(&self, account: AccountId) -> Result<Vec<TransferRecord>> {
        let history = self.transfer_history.read().await;
        let mut filtered: Vec<TransferRecord> = history
            .iter()
            .filter(|record| record.from == account || record.to == account)
            .cloned()
            .collect();

        // Newest first
        filtered.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        debug!(
            account = %account,
            result_count = filtered.len(),
            storage_type = "memory",
            "Transfer history query completed"
        );

        Ok(filtered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_balances_are_per_currency() {
        let storage = MemoryLedger::new();
        let account = AccountId::from_bytes([1; 20]);

        storage
            .set_balance(account, Currency::Stable, TokenAmount::from_tokens(10.0))
            .await
            .unwrap();

        assert_eq!(
            storage.get_balance(account, Currency::Stable).await.unwrap(),
            TokenAmount::from_tokens(10.0)
        );
        assert_eq!(
            storage.get_balance(account, Currency::Native).await.unwrap(),
            TokenAmount::ZERO
        );
    }

    #[tokio::test]
    async fn test_zero_balances_are_pruned() {
        let storage = MemoryLedger::new();
        let account = AccountId::from_bytes([2; 20]);

        storage
            .set_balance(account, Currency::Native, TokenAmount::from_tokens(5.0))
            .await
            .unwrap();
        assert_eq!(storage.get_all_accounts().await.unwrap().len(), 1);

        storage
            .set_balance(account, Currency::Native, TokenAmount::ZERO)
            .await
            .unwrap();
        assert!(storage.get_all_accounts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rollback_restores_snapshot() {
        let storage = MemoryLedger::new();
        let account = AccountId::from_bytes([3; 20]);

        storage
            .set_balance(account, Currency::Stable, TokenAmount::from_tokens(50.0))
            .await
            .unwrap();

        storage.begin_transaction().await.unwrap();
        storage
            .set_balance(account, Currency::Stable, TokenAmount::from_tokens(1.0))
            .await
            .unwrap();
        storage
            .set_locked_balance(account, Currency::Stable, TokenAmount::from_tokens(1.0))
            .await
            .unwrap();
        storage.rollback_transaction().await.unwrap();

        assert_eq!(
            storage.get_balance(account, Currency::Stable).await.unwrap(),
            TokenAmount::from_tokens(50.0)
        );
        assert_eq!(
            storage
                .get_locked_balance(account, Currency::Stable)
                .await
                .unwrap(),
            TokenAmount::ZERO
        );
    }

    #[tokio::test]
    async fn test_transfer_history_is_account_scoped() {
        let storage = MemoryLedger::new();
        let a = AccountId::from_bytes([4; 20]);
        let b = AccountId::from_bytes([5; 20]);
        let c = AccountId::from_bytes([6; 20]);

        for (from, to) in [(a, b), (b, c)] {
            storage
                .record_transfer(TransferRecord {
                    from,
                    to,
                    currency: Currency::Stable,
                    amount: TokenAmount::from_tokens(1.0),
                    timestamp: Utc::now(),
                    tx_hash: format!("{}{}", from, to),
                    status: "confirmed".to_string(),
                })
                .await
                .unwrap();
        }

        assert_eq!(storage.transfer_history(a).await.unwrap().len(), 1);
        assert_eq!(storage.transfer_history(b).await.unwrap().len(), 2);
        assert_eq!(storage.transfer_history(c).await.unwrap().len(), 1);
    }
}
