//! Conflict log repository

#![allow(clippy::cast_possible_wrap)] // SQLite uses i64 for LIMIT

use crate::error::{Error, Result};
use crate::models::ConflictRecord;
use libsql::{Connection, Row};

/// Repository over the append-only conflict audit log.
///
/// Entries are written once by the resolver when a local mutation loses
/// a last-write-wins comparison. The engine never deletes them.
pub struct ConflictLog<'a> {
    conn: &'a Connection,
}

impl<'a> ConflictLog<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Append a resolved conflict to the log
    pub async fn record(&self, conflict: &ConflictRecord) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO conflict_log
                 (id, kind, local_timestamp, server_timestamp, resolved_at, payload)
                 VALUES (?, ?, ?, ?, ?, ?)",
                (
                    conflict.id.as_str(),
                    conflict.kind.as_str(),
                    conflict.local_timestamp,
                    conflict.server_timestamp,
                    conflict.resolved_at,
                    serde_json::to_string(&conflict.payload)?,
                ),
            )
            .await?;
        Ok(())
    }

    /// Most recently resolved conflicts, newest first
    pub async fn recent(&self, limit: usize) -> Result<Vec<ConflictRecord>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, local_timestamp, server_timestamp, resolved_at, payload
                 FROM conflict_log
                 ORDER BY resolved_at DESC
                 LIMIT ?",
                [limit as i64],
            )
            .await?;

        let mut conflicts = Vec::new();
        while let Some(row) = rows.next().await? {
            conflicts.push(Self::parse_conflict(&row)?);
        }
        Ok(conflicts)
    }

    /// Number of conflicts recorded so far
    pub async fn count(&self) -> Result<u64> {
        let mut rows = self
            .conn
            .query("SELECT COUNT(*) FROM conflict_log", ())
            .await?;

        let count: i64 = if let Some(row) = rows.next().await? {
            row.get(0)?
        } else {
            0
        };

        Ok(count.unsigned_abs())
    }

    /// Parse a conflict record from a database row
    fn parse_conflict(row: &Row) -> Result<ConflictRecord> {
        let id: String = row.get(0)?;
        let payload: String = row.get(4)?;
        let payload: crate::models::WritePayload = serde_json::from_str(&payload)?;

        Ok(ConflictRecord {
            id: id
                .parse()
                .map_err(|_| Error::InvalidInput(format!("Invalid conflict id: {id}")))?,
            kind: payload.kind(),
            local_timestamp: row.get(1)?,
            server_timestamp: row.get(2)?,
            resolved_at: row.get(3)?,
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::{QueuedWrite, TableState, TableStatusUpdate, WritePayload};
    use pretty_assertions::assert_eq;

    async fn setup() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    fn sample_write(table_id: &str) -> QueuedWrite {
        QueuedWrite::new(WritePayload::TableStatus(TableStatusUpdate {
            table_id: table_id.to_string(),
            status: TableState::Reserved,
        }))
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_record_and_read_back() {
        let db = setup().await;
        let log = ConflictLog::new(db.connection());

        let write = sample_write("t1");
        let conflict = ConflictRecord::from_write(&write, write.timestamp + 100);
        log.record(&conflict).await.unwrap();

        assert_eq!(log.count().await.unwrap(), 1);

        let recent = log.recent(10).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0], conflict);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_recent_orders_newest_first() {
        let db = setup().await;
        let log = ConflictLog::new(db.connection());

        for (table, resolved_at) in [("t1", 100), ("t2", 300), ("t3", 200)] {
            let write = sample_write(table);
            let mut conflict = ConflictRecord::from_write(&write, write.timestamp + 1);
            conflict.resolved_at = resolved_at;
            log.record(&conflict).await.unwrap();
        }

        let recent = log.recent(2).await.unwrap();
        let stamps: Vec<i64> = recent.iter().map(|c| c.resolved_at).collect();
        assert_eq!(stamps, vec![300, 200]);
    }
}
