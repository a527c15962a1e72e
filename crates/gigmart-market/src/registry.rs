use crate::error::{MarketError, Result};
use crate::types::{Task, TaskId, TaskStatus};
use gigmart_ledger::types::AccountId;
use std::collections::HashMap;

/// Owns task records, id allocation and the query indexes.
///
/// The registry is a plain synchronous structure; the engine wraps it in a
/// single `RwLock` and holds the write guard for the whole of each mutating
/// operation, which is what makes task transitions atomic.
pub struct TaskRegistry {
    tasks: HashMap<TaskId, Task>,
    next_id: TaskId,
    open_ids: Vec<TaskId>,
    by_poster: HashMap<AccountId, Vec<TaskId>>,
    by_worker: HashMap<AccountId, Vec<TaskId>>,
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self {
            tasks: HashMap::new(),
            next_id: 1,
            open_ids: Vec::new(),
            by_poster: HashMap::new(),
            by_worker: HashMap::new(),
        }
    }

    /// The id the next inserted task will get. Nothing is consumed until
    /// `insert` runs, so a creation abandoned after escrow failure leaves
    /// no gap.
    pub fn peek_next_id(&self) -> TaskId {
        self.next_id
    }

    /// Insert a freshly created task and index it
    pub fn insert(&mut self, task: Task) -> TaskId {
        debug_assert_eq!(task.id, self.next_id);
        let id = task.id;

        self.open_ids.push(id);
        self.by_poster.entry(task.poster).or_default().push(id);
        self.tasks.insert(id, task);
        self.next_id = id + 1;

        id
    }

    pub fn get(&self, id: TaskId) -> Result<&Task> {
        self.tasks.get(&id).ok_or(MarketError::NotFound(id))
    }

    pub fn get_mut(&mut self, id: TaskId) -> Result<&mut Task> {
        self.tasks.get_mut(&id).ok_or(MarketError::NotFound(id))
    }

    /// Drop an id from the open index; called exactly once, when the task
    /// leaves `Open`.
    pub fn retire_open(&mut self, id: TaskId) {
        self.open_ids.retain(|&open_id| open_id != id);
    }

    /// Append to the worker's historical index; never pruned afterwards
    pub fn index_worker(&mut self, worker: AccountId, id: TaskId) {
        self.by_worker.entry(worker).or_default().push(id);
    }

    /// Number of tasks ever created
    pub fn task_count(&self) -> u64 {
        self.tasks.len() as u64
    }

    pub fn list_open(&self) -> Vec<TaskId> {
        self.open_ids.clone()
    }

    /// All task ids in creation order
    pub fn list_all(&self) -> Vec<TaskId> {
        let mut ids: Vec<TaskId> = self.tasks.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn list_by_poster(&self, account: &AccountId) -> Vec<TaskId> {
        self.by_poster.get(account).cloned().unwrap_or_default()
    }

    pub fn list_by_worker(&self, account: &AccountId) -> Vec<TaskId> {
        self.by_worker.get(account).cloned().unwrap_or_default()
    }

    pub fn list_with_status(&self, status: TaskStatus) -> Vec<TaskId> {
        let mut ids: Vec<TaskId> = self
            .tasks
            .values()
            .filter(|task| task.status == status)
            .map(|task| task.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gigmart_ledger::types::{Currency, TokenAmount};

    fn draft_task(registry: &TaskRegistry, poster: AccountId) -> Task {
        Task {
            id: registry.peek_next_id(),
            poster,
            worker: None,
            title: "Write a product description".to_string(),
            description: "Roughly 200 words".to_string(),
            category: "writing".to_string(),
            reward: TokenAmount::from_tokens(2.0),
            currency: Currency::Stable,
            fee: TokenAmount::from_tokens(0.05),
            status: TaskStatus::Open,
            created_at: 0,
            deadline: 0,
            funds_escrowed: true,
            rating: None,
        }
    }

    #[test]
    fn test_ids_are_monotonic_from_one() {
        let mut registry = TaskRegistry::new();
        let poster = AccountId::from_bytes([1; 20]);

        assert_eq!(registry.peek_next_id(), 1);
        let first = registry.insert(draft_task(&registry, poster));
        let second = registry.insert(draft_task(&registry, poster));
        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert_eq!(registry.task_count(), 2);
        assert_eq!(registry.list_all(), vec![1, 2]);
    }

    #[test]
    fn test_peeking_consumes_nothing() {
        let registry = TaskRegistry::new();
        assert_eq!(registry.peek_next_id(), 1);
        assert_eq!(registry.peek_next_id(), 1);
        assert_eq!(registry.task_count(), 0);
    }

    #[test]
    fn test_open_index_retires_exactly_once() {
        let mut registry = TaskRegistry::new();
        let poster = AccountId::from_bytes([1; 20]);

        let id = registry.insert(draft_task(&registry, poster));
        assert_eq!(registry.list_open(), vec![id]);

        registry.retire_open(id);
        assert!(registry.list_open().is_empty());

        // A second retire is a no-op
        registry.retire_open(id);
        assert!(registry.list_open().is_empty());
    }

    #[test]
    fn test_poster_and_worker_indexes_are_historical() {
        let mut registry = TaskRegistry::new();
        let poster = AccountId::from_bytes([1; 20]);
        let worker = AccountId::from_bytes([2; 20]);

        let id = registry.insert(draft_task(&registry, poster));
        registry.index_worker(worker, id);
        registry.retire_open(id);
        registry.get_mut(id).unwrap().status = TaskStatus::Cancelled;

        // Terminal tasks stay listed for both parties
        assert_eq!(registry.list_by_poster(&poster), vec![id]);
        assert_eq!(registry.list_by_worker(&worker), vec![id]);
        assert!(registry.list_by_worker(&poster).is_empty());
    }

    #[test]
    fn test_get_unknown_task_is_not_found() {
        let registry = TaskRegistry::new();
        assert!(matches!(
            registry.get(42).unwrap_err(),
            MarketError::NotFound(42)
        ));
    }

    #[test]
    fn test_list_with_status_filters() {
        let mut registry = TaskRegistry::new();
        let poster = AccountId::from_bytes([1; 20]);

        let first = registry.insert(draft_task(&registry, poster));
        let second = registry.insert(draft_task(&registry, poster));
        registry.get_mut(second).unwrap().status = TaskStatus::Disputed;

        assert_eq!(registry.list_with_status(TaskStatus::Open), vec![first]);
        assert_eq!(registry.list_with_status(TaskStatus::Disputed), vec![second]);
        assert!(registry.list_with_status(TaskStatus::Completed).is_empty());
    }
}
