//! Host process status gates.

/// Answers the three questions every handler asks before touching pool state:
/// are we a coordinator, is the chain synced, are we shutting down.
pub trait NodeStatus: Send + Sync {
    fn is_coordinator(&self) -> bool;
    fn is_synced(&self) -> bool;
    fn is_shutting_down(&self) -> bool;
}
