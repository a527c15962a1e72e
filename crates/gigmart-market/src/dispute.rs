use crate::error::{MarketError, Result};
use crate::types::{DisputeOutcome, TaskId};
use chrono::Utc;
use gigmart_ledger::types::AccountId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Status of a dispute case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisputeStatus {
    Open,
    Resolved,
}

/// An open or settled dispute over a task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisputeCase {
    pub task_id: TaskId,
    pub raised_by: AccountId,
    pub raised_at: i64,
    pub status: DisputeStatus,
    pub outcome: Option<DisputeOutcome>,
    pub resolved_by: Option<AccountId>,
    pub resolved_at: Option<i64>,
}

/// Tracks dispute cases, at most one per task.
///
/// A task can only ever be disputed once because leaving `Disputed` is
/// terminal, so the case map is keyed by task id.
pub struct DisputeLog {
    cases: Arc<RwLock<HashMap<TaskId, DisputeCase>>>,
}

impl Default for DisputeLog {
    fn default() -> Self {
        Self::new()
    }
}

impl DisputeLog {
    pub fn new() -> Self {
        Self {
            cases: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Open a case for a task
    pub async fn open_case(&self, task_id: TaskId, raised_by: AccountId) -> Result<()> {
        let mut cases = self.cases.write().await;
        if cases.contains_key(&task_id) {
            return Err(MarketError::Validation(format!(
                "Task {} already has a dispute case",
                task_id
            )));
        }

        cases.insert(
            task_id,
            DisputeCase {
                task_id,
                raised_by,
                raised_at: Utc::now().timestamp(),
                status: DisputeStatus::Open,
                outcome: None,
                resolved_by: None,
                resolved_at: None,
            },
        );

        info!(task_id, raised_by = %raised_by, "⚖️ Dispute case opened");
        Ok(())
    }

    /// Settle a case and return the updated record
    pub async fn resolve_case(
        &self,
        task_id: TaskId,
        resolved_by: AccountId,
        outcome: DisputeOutcome,
    ) -> Result<DisputeCase> {
        let mut cases = self.cases.write().await;
        let case = cases
            .get_mut(&task_id)
            .ok_or(MarketError::NotFound(task_id))?;

        if case.status == DisputeStatus::Resolved {
            return Err(MarketError::Validation(format!(
                "Dispute for task {} is already resolved",
                task_id
            )));
        }

        case.status = DisputeStatus::Resolved;
        case.outcome = Some(outcome);
        case.resolved_by = Some(resolved_by);
        case.resolved_at = Some(Utc::now().timestamp());

        info!(
            task_id,
            outcome = ?outcome,
            resolved_by = %resolved_by,
            "⚖️ Dispute case resolved"
        );
        Ok(case.clone())
    }

    /// Fetch the case for a task
    pub async fn get(&self, task_id: TaskId) -> Result<DisputeCase> {
        let cases = self.cases.read().await;
        cases
            .get(&task_id)
            .cloned()
            .ok_or(MarketError::NotFound(task_id))
    }

    /// All unresolved cases, oldest task first
    pub async fn open_cases(&self) -> Vec<DisputeCase> {
        let cases = self.cases.read().await;
        let mut open: Vec<DisputeCase> = cases
            .values()
            .filter(|case| case.status == DisputeStatus::Open)
            .cloned()
            .collect();
        open.sort_by_key(|case| case.task_id);
        open
    }

    pub async fn case_count(&self) -> usize {
        let cases = self.cases.read().await;
        cases.len()
    }
}
