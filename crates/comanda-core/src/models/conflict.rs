//! Sync conflict model

use super::write::{QueuedWrite, WriteId, WriteKind, WritePayload};
use crate::util::now_millis;
use serde::{Deserialize, Serialize};

/// Audit entry for a local mutation superseded by a newer remote write.
///
/// Written once when the resolver discards a queued write; never updated
/// and never deleted by the engine. Retention is an operational concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictRecord {
    /// Copied from the originating queued write
    pub id: WriteId,
    /// Kind of the discarded mutation
    pub kind: WriteKind,
    /// The queued write's timestamp that lost the comparison (Unix ms)
    pub local_timestamp: i64,
    /// The remote record's timestamp that won (Unix ms)
    pub server_timestamp: i64,
    /// Resolution timestamp (Unix ms)
    pub resolved_at: i64,
    /// The discarded mutation, retained for inspection and recovery
    pub payload: WritePayload,
}

impl ConflictRecord {
    /// Build the audit entry for a write the server superseded
    #[must_use]
    pub fn from_write(write: &QueuedWrite, server_timestamp: i64) -> Self {
        Self {
            id: write.id,
            kind: write.kind(),
            local_timestamp: write.timestamp,
            server_timestamp,
            resolved_at: now_millis(),
            payload: write.payload.clone(),
        }
    }
}
