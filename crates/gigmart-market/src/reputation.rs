use gigmart_ledger::types::{AccountId, Currency, TokenAmount};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Per-worker completion history.
///
/// The rating average is surfaced as an exact sum/count pair; callers who
/// want a float compute it at read time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReputationRecord {
    pub tasks_completed: u64,
    /// Lifetime earnings, kept separately per currency
    pub earned: HashMap<Currency, TokenAmount>,
    pub rating_sum: u64,
    pub rating_count: u64,
}

impl ReputationRecord {
    pub fn average_rating(&self) -> f64 {
        if self.rating_count == 0 {
            0.0
        } else {
            self.rating_sum as f64 / self.rating_count as f64
        }
    }

    pub fn earned_in(&self, currency: Currency) -> TokenAmount {
        self.earned
            .get(&currency)
            .copied()
            .unwrap_or(TokenAmount::ZERO)
    }
}

/// Tracks worker reputation across the marketplace
pub struct ReputationLedger {
    records: Arc<RwLock<HashMap<AccountId, ReputationRecord>>>,
}

impl Default for ReputationLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl ReputationLedger {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Record a paid completion. A rating is present only when the poster
    /// approved the work themselves; admin resolutions pay without rating.
    pub async fn record_completion(
        &self,
        worker: AccountId,
        reward: TokenAmount,
        currency: Currency,
        rating: Option<u8>,
    ) {
        let mut records = self.records.write().await;
        let record = records.entry(worker).or_default();

        record.tasks_completed += 1;
        let earned = record.earned.entry(currency).or_insert(TokenAmount::ZERO);
        *earned = earned.saturating_add(reward);
        if let Some(rating) = rating {
            record.rating_sum += rating as u64;
            record.rating_count += 1;
        }

        debug!(
            worker = %worker,
            currency = %currency,
            reward = reward.to_tokens(),
            rating = ?rating,
            tasks_completed = record.tasks_completed,
            "Reputation updated"
        );
    }

    /// Fetch a worker's record; unknown workers read as the empty record
    pub async fn get(&self, worker: &AccountId) -> ReputationRecord {
        let records = self.records.read().await;
        records.get(worker).cloned().unwrap_or_default()
    }

    /// Number of workers with at least one completion
    pub async fn worker_count(&self) -> usize {
        let records = self.records.read().await;
        records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_worker_reads_empty() {
        let ledger = ReputationLedger::new();
        let record = ledger.get(&AccountId::from_bytes([1; 20])).await;

        assert_eq!(record.tasks_completed, 0);
        assert_eq!(record.rating_count, 0);
        assert_eq!(record.average_rating(), 0.0);
        assert_eq!(record.earned_in(Currency::Stable), TokenAmount::ZERO);
    }

    #[tokio::test]
    async fn test_ratings_average_exactly() {
        let ledger = ReputationLedger::new();
        let worker = AccountId::from_bytes([2; 20]);

        ledger
            .record_completion(worker, TokenAmount::from_tokens(1.0), Currency::Stable, Some(4))
            .await;
        ledger
            .record_completion(worker, TokenAmount::from_tokens(1.0), Currency::Stable, Some(5))
            .await;

        let record = ledger.get(&worker).await;
        assert_eq!(record.tasks_completed, 2);
        assert_eq!(record.rating_sum, 9);
        assert_eq!(record.rating_count, 2);
        assert_eq!(record.average_rating(), 4.5);
    }

    #[tokio::test]
    async fn test_unrated_completion_counts_without_rating() {
        let ledger = ReputationLedger::new();
        let worker = AccountId::from_bytes([3; 20]);

        ledger
            .record_completion(worker, TokenAmount::from_tokens(3.0), Currency::Native, None)
            .await;

        let record = ledger.get(&worker).await;
        assert_eq!(record.tasks_completed, 1);
        assert_eq!(record.rating_count, 0);
        assert_eq!(record.average_rating(), 0.0);
        assert_eq!(record.earned_in(Currency::Native), TokenAmount::from_tokens(3.0));
    }

    #[tokio::test]
    async fn test_earnings_accumulate_per_currency() {
        let ledger = ReputationLedger::new();
        let worker = AccountId::from_bytes([4; 20]);

        ledger
            .record_completion(worker, TokenAmount::from_tokens(2.0), Currency::Stable, Some(5))
            .await;
        ledger
            .record_completion(worker, TokenAmount::from_tokens(3.5), Currency::Stable, Some(4))
            .await;
        ledger
            .record_completion(worker, TokenAmount::from_tokens(10.0), Currency::Native, Some(5))
            .await;

        let record = ledger.get(&worker).await;
        assert_eq!(record.earned_in(Currency::Stable), TokenAmount::from_tokens(5.5));
        assert_eq!(record.earned_in(Currency::Native), TokenAmount::from_tokens(10.0));
        assert_eq!(ledger.worker_count().await, 1);
    }
}
