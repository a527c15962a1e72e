use crate::error::{LedgerError, Result};
use crate::storage::{LedgerStorage, TransferRecord};
use crate::types::{AccountId, Currency, TokenAmount};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct AccountInfo {
    pub account: AccountId,
    pub currency: Currency,
    pub balance: TokenAmount,
    pub locked_balance: TokenAmount,
    pub last_activity: i64,
}

pub struct BalanceManager {
    storage: Arc<dyn LedgerStorage>,
    cache: Arc<RwLock<HashMap<(AccountId, Currency), AccountInfo>>>,
}

impl BalanceManager {
    pub fn new(storage: Arc<dyn LedgerStorage>) -> Self {
        Self {
            storage,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn get_balance(&self, account: AccountId, currency: Currency) -> Result<TokenAmount> {
        // Check cache first
        {
            let cache = self.cache.read().await;
            if let Some(info) = cache.get(&(account, currency)) {
                return Ok(info.balance);
            }
        }

        // Load from storage
        let balance = self.storage.get_balance(account, currency).await?;

        // Update cache
        let mut cache = self.cache.write().await;
        cache.insert(
            (account, currency),
            AccountInfo {
                account,
                currency,
                balance,
                locked_balance: TokenAmount::ZERO,
                last_activity: Utc::now().timestamp(),
            },
        );

        Ok(balance)
    }

    pub async fn credit(
        &self,
        account: AccountId,
        currency: Currency,
        amount: TokenAmount,
    ) -> Result<()> {
        if amount == TokenAmount::ZERO {
            return Ok(());
        }

        let current = self.get_balance(account, currency).await?;
        let new_balance = current
            .checked_add(amount)
            .ok_or(LedgerError::Overflow { account, currency })?;

        // Update storage
        self.storage.set_balance(account, currency, new_balance).await?;

        // Update cache
        let mut cache = self.cache.write().await;
        if let Some(info) = cache.get_mut(&(account, currency)) {
            info.balance = new_balance;
            info.last_activity = Utc::now().timestamp();
        } else {
            cache.insert(
                (account, currency),
                AccountInfo {
                    account,
                    currency,
                    balance: new_balance,
                    locked_balance: TokenAmount::ZERO,
                    last_activity: Utc::now().timestamp(),
                },
            );
        }

        info!(
            account = %account,
            currency = %currency,
            amount = amount.to_tokens(),
            balance_before = current.to_tokens(),
            balance_after = new_balance.to_tokens(),
            "💰 Balance credited"
        );
        Ok(())
    }

    pub async fn debit(
        &self,
        account: AccountId,
        currency: Currency,
        amount: TokenAmount,
    ) -> Result<()> {
        if amount == TokenAmount::ZERO {
            return Ok(());
        }

        let current = self.get_balance(account, currency).await?;
        let locked = self.get_locked_balance(account, currency).await?;

        // Only the unlocked portion is spendable
        let spendable = current.saturating_sub(locked);
        if spendable < amount {
            return Err(LedgerError::InsufficientFunds {
                account,
                currency,
                required: amount,
                available: spendable,
            });
        }
        let new_balance = current.saturating_sub(amount);

        // Update storage
        self.storage.set_balance(account, currency, new_balance).await?;

        // Update cache
        let mut cache = self.cache.write().await;
        if let Some(info) = cache.get_mut(&(account, currency)) {
            info.balance = new_balance;
            info.last_activity = Utc::now().timestamp();
        }

        info!(
            account = %account,
            currency = %currency,
            amount = amount.to_tokens(),
            balance_before = current.to_tokens(),
            balance_after = new_balance.to_tokens(),
            "💸 Balance debited"
        );
        Ok(())
    }

    pub async fn transfer(
        &self,
        from: AccountId,
        to: AccountId,
        currency: Currency,
        amount: TokenAmount,
    ) -> Result<()> {
        if amount == TokenAmount::ZERO {
            return Ok(());
        }

        if from == to {
            return Err(LedgerError::SelfTransfer(from));
        }

        // Atomic transfer using a storage transaction
        debug!(
            from = %from,
            to = %to,
            currency = %currency,
            amount = amount.to_tokens(),
            "📝 Beginning transfer transaction"
        );
        self.storage.begin_transaction().await?;

        match self.transfer_internal(from, to, currency, amount).await {
            Ok(tx_hash) => {
                self.storage.commit_transaction().await?;

                // Record the successful transfer
                let record = TransferRecord {
                    from,
                    to,
                    currency,
                    amount,
                    timestamp: Utc::now(),
                    tx_hash: tx_hash.clone(),
                    status: "confirmed".to_string(),
                };

                // Record transfer (ignore errors to not fail the transfer)
                if let Err(e) = self.storage.record_transfer(record).await {
                    debug!(
                        tx_hash = %tx_hash,
                        error = %e,
                        "Failed to record transfer"
                    );
                }

                info!(
                    from = %from,
                    to = %to,
                    currency = %currency,
                    amount = amount.to_tokens(),
                    tx_hash = %tx_hash,
                    status = "confirmed",
                    "✅ Transfer committed"
                );
                Ok(())
            }
            Err(e) => {
                info!(
                    from = %from,
                    to = %to,
                    currency = %currency,
                    amount = amount.to_tokens(),
                    error = %e,
                    "❌ Transfer rolled back"
                );
                self.storage.rollback_transaction().await?;
                Err(e)
            }
        }
    }

    async fn transfer_internal(
        &self,
        from: AccountId,
        to: AccountId,
        currency: Currency,
        amount: TokenAmount,
    ) -> Result<String> {
        // Lock cache for the entire transfer to ensure atomicity
        let mut cache = self.cache.write().await;

        // Get current balances from storage (not cache) for consistency
        let from_balance = self.storage.get_balance(from, currency).await?;
        let from_locked = self.storage.get_locked_balance(from, currency).await?;

        // Only the unlocked portion is spendable; escrowed funds stay put
        // until an explicit unlock
        let spendable = from_balance.saturating_sub(from_locked);
        if spendable < amount {
            return Err(LedgerError::InsufficientFunds {
                account: from,
                currency,
                required: amount,
                available: spendable,
            });
        }

        let to_balance = self.storage.get_balance(to, currency).await?;

        // Calculate new balances
        let new_from_balance = from_balance.saturating_sub(amount);
        let new_to_balance = to_balance
            .checked_add(amount)
            .ok_or(LedgerError::Overflow {
                account: to,
                currency,
            })?;

        // Update storage atomically
        self.storage
            .set_balance(from, currency, new_from_balance)
            .await?;
        self.storage.set_balance(to, currency, new_to_balance).await?;

        // Update cache (already locked above)
        let now = Utc::now().timestamp();

        cache
            .entry((from, currency))
            .and_modify(|info| {
                info.balance = new_from_balance;
                info.last_activity = now;
            })
            .or_insert(AccountInfo {
                account: from,
                currency,
                balance: new_from_balance,
                locked_balance: TokenAmount::ZERO,
                last_activity: now,
            });

        cache
            .entry((to, currency))
            .and_modify(|info| {
                info.balance = new_to_balance;
                info.last_activity = now;
            })
            .or_insert(AccountInfo {
                account: to,
                currency,
                balance: new_to_balance,
                locked_balance: TokenAmount::ZERO,
                last_activity: now,
            });

        // Transfer hash binds both parties, the currency and the time
        let mut hasher = blake3::Hasher::new();
        hasher.update(from.as_bytes());
        hasher.update(to.as_bytes());
        hasher.update(&[currency.as_byte()]);
        hasher.update(&amount.to_base_units().to_le_bytes());
        hasher.update(&now.to_le_bytes());
        let tx_hash = hex::encode(hasher.finalize().as_bytes());

        Ok(tx_hash)
    }

    pub async fn lock(
        &self,
        account: AccountId,
        currency: Currency,
        amount: TokenAmount,
    ) -> Result<()> {
        // Seed cold cache entries from storage
        let stored_balance = self.storage.get_balance(account, currency).await?;
        let stored_locked = self.storage.get_locked_balance(account, currency).await?;

        let mut cache = self.cache.write().await;
        let info = cache.entry((account, currency)).or_insert(AccountInfo {
            account,
            currency,
            balance: stored_balance,
            locked_balance: stored_locked,
            last_activity: Utc::now().timestamp(),
        });

        let old_locked = info.locked_balance;

        // Ensure sufficient unlocked balance
        let unlocked = info.balance.saturating_sub(info.locked_balance);
        if unlocked < amount {
            return Err(LedgerError::InsufficientFunds {
                account,
                currency,
                required: amount,
                available: unlocked,
            });
        }

        info.locked_balance = info.locked_balance.saturating_add(amount);

        // Persist to storage
        self.storage
            .set_locked_balance(account, currency, info.locked_balance)
            .await?;

        info!(
            account = %account,
            currency = %currency,
            amount = amount.to_tokens(),
            locked_before = old_locked.to_tokens(),
            locked_after = info.locked_balance.to_tokens(),
            total_balance = info.balance.to_tokens(),
            "🔒 Balance locked"
        );
        Ok(())
    }

    pub async fn unlock(
        &self,
        account: AccountId,
        currency: Currency,
        amount: TokenAmount,
    ) -> Result<()> {
        // Seed cold cache entries from storage
        let stored_balance = self.storage.get_balance(account, currency).await?;
        let stored_locked = self.storage.get_locked_balance(account, currency).await?;

        let mut cache = self.cache.write().await;
        let info = cache.entry((account, currency)).or_insert(AccountInfo {
            account,
            currency,
            balance: stored_balance,
            locked_balance: stored_locked,
            last_activity: Utc::now().timestamp(),
        });

        let old_locked = info.locked_balance;

        if info.locked_balance < amount {
            return Err(LedgerError::InsufficientLocked {
                account,
                currency,
                required: amount,
                locked: info.locked_balance,
            });
        }

        info.locked_balance = info.locked_balance.saturating_sub(amount);

        // Persist to storage
        self.storage
            .set_locked_balance(account, currency, info.locked_balance)
            .await?;

        info!(
            account = %account,
            currency = %currency,
            amount = amount.to_tokens(),
            locked_before = old_locked.to_tokens(),
            locked_after = info.locked_balance.to_tokens(),
            total_balance = info.balance.to_tokens(),
            "🔓 Balance unlocked"
        );
        Ok(())
    }

    pub async fn get_locked_balance(
        &self,
        account: AccountId,
        currency: Currency,
    ) -> Result<TokenAmount> {
        let cache = self.cache.read().await;
        if let Some(info) = cache.get(&(account, currency)) {
            Ok(info.locked_balance)
        } else {
            Ok(self.storage.get_locked_balance(account, currency).await?)
        }
    }

    pub async fn get_unlocked_balance(
        &self,
        account: AccountId,
        currency: Currency,
    ) -> Result<TokenAmount> {
        let balance = self.get_balance(account, currency).await?;
        let locked = self.get_locked_balance(account, currency).await?;
        Ok(balance.saturating_sub(locked))
    }

    pub async fn get_all_accounts(&self) -> Result<Vec<AccountInfo>> {
        let accounts = self.storage.get_all_accounts().await?;
        let mut result = Vec::new();

        for account in accounts {
            for currency in Currency::all() {
                let balance = self.get_balance(account, currency).await?;
                let locked = self.get_locked_balance(account, currency).await?;

                result.push(AccountInfo {
                    account,
                    currency,
                    balance,
                    locked_balance: locked,
                    last_activity: Utc::now().timestamp(),
                });
            }
        }

        Ok(result)
    }

    pub async fn clear_cache(&self) {
        let mut cache = self.cache.write().await;
        let cache_size = cache.len();
        cache.clear();
        info!(entries_cleared = cache_size, "🧹 Balance cache cleared");
    }

    pub async fn transfer_history(&self, account: AccountId) -> Result<Vec<TransferRecord>> {
        Ok(self.storage.transfer_history(account).await?)
    }
}
