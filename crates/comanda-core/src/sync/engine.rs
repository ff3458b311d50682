//! Sync engine and queue flusher

use super::resolver::{ConflictResolver, ReplayOutcome};
use crate::db::{ConflictLog, Database, WriteQueue};
use crate::error::{Error, Result};
use crate::models::{ConflictRecord, QueuedWrite, WriteId, WritePayload};
use crate::remote::RemoteStore;
use crate::state::SyncState;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Default retry count at which a queued write is surfaced as stalled
const DEFAULT_STALL_THRESHOLD: u32 = 5;

/// Engine tuning knobs
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Retry count at which [`SyncEngine::stalled`] surfaces an item
    pub stall_threshold: u32,
}

impl EngineConfig {
    /// Set the stall threshold
    #[must_use]
    pub const fn with_stall_threshold(mut self, threshold: u32) -> Self {
        self.stall_threshold = threshold;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            stall_threshold: DEFAULT_STALL_THRESHOLD,
        }
    }
}

/// Tally of one flush pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Items the pass attempted (the whole start-of-pass snapshot)
    pub attempted: usize,
    /// Items delivered to the backend (inserted or upserted)
    pub applied: usize,
    /// Items discarded after losing a last-write-wins comparison
    pub conflicts: usize,
    /// Items that failed dispatch and remain queued
    pub failed: usize,
}

/// Result of a flush trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// A pass ran over the queue snapshot
    Completed(FlushReport),
    /// Another pass was in flight; this trigger did nothing
    AlreadyRunning,
}

impl FlushOutcome {
    /// The pass report, if a pass actually ran
    #[must_use]
    pub const fn report(&self) -> Option<&FlushReport> {
        match self {
            Self::Completed(report) => Some(report),
            Self::AlreadyRunning => None,
        }
    }
}

/// Offline-first sync engine.
///
/// Terminals write through [`enqueue`](Self::enqueue) whenever the
/// backend is unreachable; a connectivity-recovery trigger calls
/// [`flush`](Self::flush) to drain the queue. The engine never detects
/// connectivity itself.
pub struct SyncEngine<R> {
    db: Arc<Database>,
    remote: R,
    config: EngineConfig,
    flush_gate: Mutex<()>,
}

impl<R: RemoteStore> SyncEngine<R> {
    /// Create an engine over a shared store handle and a remote service
    pub fn new(db: Arc<Database>, remote: R) -> Self {
        Self::with_config(db, remote, EngineConfig::default())
    }

    /// Create an engine with explicit tuning
    pub fn with_config(db: Arc<Database>, remote: R, config: EngineConfig) -> Self {
        Self {
            db,
            remote,
            config,
            flush_gate: Mutex::new(()),
        }
    }

    /// Durably queue a mutation for later delivery
    pub async fn enqueue(&self, payload: WritePayload) -> Result<WriteId> {
        WriteQueue::new(self.db.connection()).enqueue(payload).await
    }

    /// Number of queued writes awaiting delivery
    pub async fn pending_count(&self) -> Result<u64> {
        WriteQueue::new(self.db.connection()).pending_count().await
    }

    /// Queued writes whose retry counter has reached the stall threshold
    pub async fn stalled(&self) -> Result<Vec<QueuedWrite>> {
        WriteQueue::new(self.db.connection())
            .stalled(self.config.stall_threshold)
            .await
    }

    /// Most recently logged conflicts, newest first
    pub async fn conflicts(&self, limit: usize) -> Result<Vec<ConflictRecord>> {
        ConflictLog::new(self.db.connection()).recent(limit).await
    }

    /// Current sync state for UI status surfaces
    pub async fn state(&self) -> Result<SyncState> {
        let Ok(_idle) = self.flush_gate.try_lock() else {
            return Ok(SyncState::Syncing);
        };

        if self.pending_count().await? == 0 {
            Ok(SyncState::Synced)
        } else {
            Ok(SyncState::Offline)
        }
    }

    /// Drain the queue once, oldest write first
    pub async fn flush(&self) -> Result<FlushOutcome> {
        self.flush_with_progress(|_| {}).await
    }

    /// Drain the queue once, reporting the remaining count after each
    /// delivered or discarded item.
    ///
    /// Single-flight: if a pass is already running this trigger returns
    /// [`FlushOutcome::AlreadyRunning`] without touching the queue. The
    /// pass replays the start-of-pass snapshot strictly in timestamp
    /// order; writes enqueued mid-pass wait for the next trigger. A
    /// failed dispatch bumps the item's retry counter and moves on, so
    /// one bad item cannot stall the rest of the queue.
    pub async fn flush_with_progress(
        &self,
        mut on_progress: impl FnMut(u64),
    ) -> Result<FlushOutcome> {
        let Ok(_guard) = self.flush_gate.try_lock() else {
            tracing::debug!("flush already in progress, ignoring trigger");
            return Ok(FlushOutcome::AlreadyRunning);
        };

        let conn = self.db.connection();
        let queue = WriteQueue::new(conn);
        let resolver = ConflictResolver::new(conn, &self.remote);

        let snapshot = queue.pending().await?;
        if snapshot.is_empty() {
            return Ok(FlushOutcome::Completed(FlushReport::default()));
        }

        let mut report = FlushReport::default();
        for write in &snapshot {
            report.attempted += 1;
            match resolver.replay(write).await {
                Ok(outcome) => {
                    queue.remove(&write.id).await?;
                    on_progress(queue.pending_count().await?);
                    match outcome {
                        ReplayOutcome::Inserted | ReplayOutcome::Applied => report.applied += 1,
                        ReplayOutcome::Conflicted => report.conflicts += 1,
                    }
                }
                Err(Error::Remote(err)) => {
                    queue.bump_retries(&write.id).await?;
                    report.failed += 1;
                    tracing::warn!(
                        id = %write.id,
                        kind = %write.kind(),
                        error = %err,
                        "replay failed, write stays queued"
                    );
                }
                Err(other) => return Err(other),
            }
        }

        tracing::info!(
            attempted = report.attempted,
            applied = report.applied,
            conflicts = report.conflicts,
            failed = report.failed,
            "flush pass complete"
        );
        Ok(FlushOutcome::Completed(report))
    }
}
