//! Last-write-wins conflict resolution

use crate::db::ConflictLog;
use crate::error::Result;
use crate::models::{ConflictRecord, QueuedWrite};
use crate::remote::RemoteStore;
use crate::util::now_millis;
use libsql::Connection;

/// What happened to a queued write during replay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayOutcome {
    /// Pure creation, no existing remote row to compare against
    Inserted,
    /// The local write won (or the remote row was absent) and was upserted
    Applied,
    /// The server had a newer version; the write was logged and discarded
    Conflicted,
}

/// Replays one queued write against the remote service.
///
/// Conflict policy is last-write-wins at record granularity: whichever
/// side carries the later timestamp fully replaces the other. There is
/// no field-level merge.
pub struct ConflictResolver<'a, R> {
    conn: &'a Connection,
    remote: &'a R,
}

impl<'a, R: RemoteStore> ConflictResolver<'a, R> {
    /// Create a resolver over the given conflict log and remote service
    pub const fn new(conn: &'a Connection, remote: &'a R) -> Self {
        Self { conn, remote }
    }

    /// Decide and dispatch one queued write.
    ///
    /// The caller removes the write from the queue on any `Ok` outcome;
    /// conflicted writes are not retried. Remote failures propagate so
    /// the caller can keep the item queued.
    pub async fn replay(&self, write: &QueuedWrite) -> Result<ReplayOutcome> {
        let collection = write.kind().collection();

        // Append-only kinds have no existing row to conflict with
        if write.kind().append_only() {
            self.remote
                .insert(collection, write.payload.to_record()?)
                .await?;
            return Ok(ReplayOutcome::Inserted);
        }

        let Some(record_id) = write.payload.record_id() else {
            self.remote
                .insert(collection, write.payload.to_record()?)
                .await?;
            return Ok(ReplayOutcome::Inserted);
        };

        let remote_ts = self.remote.timestamps(collection, record_id).await?;
        if let Some(server_timestamp) = remote_ts.and_then(|ts| ts.last_modified()) {
            if server_timestamp > write.timestamp {
                let conflict = ConflictRecord::from_write(write, server_timestamp);
                ConflictLog::new(self.conn).record(&conflict).await?;
                tracing::warn!(
                    id = %write.id,
                    kind = %write.kind(),
                    local = write.timestamp,
                    server = server_timestamp,
                    "server version is newer, discarding local write"
                );
                return Ok(ReplayOutcome::Conflicted);
            }
        }

        let mut record = write.payload.to_record()?;
        if let Some(fields) = record.as_object_mut() {
            fields.insert("updated_at".to_string(), now_millis().into());
        }
        self.remote.upsert(collection, record).await?;
        tracing::debug!(id = %write.id, kind = %write.kind(), "applied local write");
        Ok(ReplayOutcome::Applied)
    }
}
