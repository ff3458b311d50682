//! Shared cross-platform state types.

/// Unified sync state surfaced to terminal UIs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncState {
    /// Local writes are queued and have not reached the backend.
    Offline,
    /// A flush pass is currently draining the queue.
    Syncing,
    /// The queue is empty.
    Synced,
}
