/// Trait for lifecycle states
///
/// Status enums implement this to express their transition table in one
/// place; entities validate every mutation against it before applying.
pub trait LifecycleState: Send + Sync + Clone + std::fmt::Debug {
    /// Check if this is a terminal state
    fn is_terminal(&self) -> bool;

    /// Check if transition to another state is valid
    fn can_transition_to(&self, next: &Self) -> bool;
}
