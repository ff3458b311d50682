//! Durable write queue

use crate::error::{Error, Result};
use crate::models::{QueuedWrite, WriteId, WritePayload};
use libsql::{Connection, Row};

/// Repository over the pending-write queue.
///
/// The queue is append-only from the terminal's point of view; only the
/// flusher removes items (after a successful apply or a logged conflict)
/// or bumps their retry counter.
pub struct WriteQueue<'a> {
    conn: &'a Connection,
}

impl<'a> WriteQueue<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Durably record a mutation for later delivery, returning its id.
    ///
    /// The write is stamped with the current wall clock; that timestamp
    /// is the authority for ordering and last-write-wins comparison and
    /// is never rewritten afterwards.
    pub async fn enqueue(&self, payload: WritePayload) -> Result<WriteId> {
        payload.validate()?;

        let write = QueuedWrite::new(payload);
        self.insert_write(&write).await?;

        tracing::debug!(id = %write.id, kind = %write.kind(), "queued offline write");
        Ok(write.id)
    }

    async fn insert_write(&self, write: &QueuedWrite) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO write_queue (id, kind, payload, timestamp, retries)
                 VALUES (?, ?, ?, ?, ?)",
                (
                    write.id.as_str(),
                    write.kind().as_str(),
                    serde_json::to_string(&write.payload)?,
                    write.timestamp,
                    i64::from(write.retries),
                ),
            )
            .await?;
        Ok(())
    }

    /// Number of items currently queued
    pub async fn pending_count(&self) -> Result<u64> {
        let mut rows = self
            .conn
            .query("SELECT COUNT(*) FROM write_queue", ())
            .await?;

        let count: i64 = if let Some(row) = rows.next().await? {
            row.get(0)?
        } else {
            0
        };

        Ok(count.unsigned_abs())
    }

    /// All queued items, oldest first.
    ///
    /// The flusher replays this snapshot in order; ties on the millisecond
    /// clock fall back to the time-sortable id.
    pub async fn pending(&self) -> Result<Vec<QueuedWrite>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, payload, timestamp, retries FROM write_queue
                 ORDER BY timestamp ASC, id ASC",
                (),
            )
            .await?;

        let mut writes = Vec::new();
        while let Some(row) = rows.next().await? {
            writes.push(Self::parse_write(&row)?);
        }
        Ok(writes)
    }

    /// Items whose retry counter has reached the given threshold, oldest
    /// first. These need operator attention; the engine never drops them.
    pub async fn stalled(&self, threshold: u32) -> Result<Vec<QueuedWrite>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, payload, timestamp, retries FROM write_queue
                 WHERE retries >= ?
                 ORDER BY timestamp ASC, id ASC",
                [i64::from(threshold)],
            )
            .await?;

        let mut writes = Vec::new();
        while let Some(row) = rows.next().await? {
            writes.push(Self::parse_write(&row)?);
        }
        Ok(writes)
    }

    /// Remove an item after a successful apply or a logged conflict
    pub async fn remove(&self, id: &WriteId) -> Result<()> {
        let rows = self
            .conn
            .execute("DELETE FROM write_queue WHERE id = ?", [id.as_str()])
            .await?;

        if rows == 0 {
            return Err(Error::NotFound(id.to_string()));
        }

        Ok(())
    }

    /// Record one more failed replay attempt.
    ///
    /// Only the counter changes; the timestamp keeps its original value.
    pub async fn bump_retries(&self, id: &WriteId) -> Result<()> {
        let rows = self
            .conn
            .execute(
                "UPDATE write_queue SET retries = retries + 1 WHERE id = ?",
                [id.as_str()],
            )
            .await?;

        if rows == 0 {
            return Err(Error::NotFound(id.to_string()));
        }

        Ok(())
    }

    /// Insert a write with an explicit timestamp, for ordering tests
    #[cfg(test)]
    pub(crate) async fn enqueue_at(&self, payload: WritePayload, timestamp: i64) -> Result<WriteId> {
        payload.validate()?;

        let mut write = QueuedWrite::new(payload);
        write.timestamp = timestamp;
        self.insert_write(&write).await?;
        Ok(write.id)
    }

    /// Parse a queued write from a database row
    fn parse_write(row: &Row) -> Result<QueuedWrite> {
        let id: String = row.get(0)?;
        let payload: String = row.get(1)?;
        let timestamp: i64 = row.get(2)?;
        let retries: i64 = row.get(3)?;

        Ok(QueuedWrite {
            id: id
                .parse()
                .map_err(|_| Error::InvalidInput(format!("Invalid write id: {id}")))?,
            payload: serde_json::from_str(&payload)?,
            timestamp,
            retries: u32::try_from(retries).unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::{
        OrderDraft, OrderStatus, TableState, TableStatusUpdate, WriteKind,
    };
    use pretty_assertions::assert_eq;

    async fn setup() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    fn table_update(table_id: &str) -> WritePayload {
        WritePayload::TableStatus(TableStatusUpdate {
            table_id: table_id.to_string(),
            status: TableState::Occupied,
        })
    }

    fn order_draft() -> WritePayload {
        WritePayload::Order(OrderDraft {
            id: None,
            restaurant_id: "r1".to_string(),
            table_id: None,
            lines: vec![],
            total_cents: 1200,
            status: OrderStatus::Placed,
        })
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_enqueue_and_read_back() {
        let db = setup().await;
        let queue = WriteQueue::new(db.connection());

        let id = queue.enqueue(table_update("t1")).await.unwrap();
        assert_eq!(queue.pending_count().await.unwrap(), 1);

        let pending = queue.pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, id);
        assert_eq!(pending[0].kind(), WriteKind::TableStatus);
        assert_eq!(pending[0].retries, 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_enqueue_rejects_malformed_payload() {
        let db = setup().await;
        let queue = WriteQueue::new(db.connection());

        let err = queue.enqueue(table_update("")).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(queue.pending_count().await.unwrap(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_pending_sorted_by_timestamp() {
        let db = setup().await;
        let queue = WriteQueue::new(db.connection());

        queue.enqueue_at(table_update("late"), 2000).await.unwrap();
        queue.enqueue_at(table_update("early"), 1000).await.unwrap();
        queue.enqueue_at(table_update("mid"), 1500).await.unwrap();

        let pending = queue.pending().await.unwrap();
        let stamps: Vec<i64> = pending.iter().map(|w| w.timestamp).collect();
        assert_eq!(stamps, vec![1000, 1500, 2000]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_remove() {
        let db = setup().await;
        let queue = WriteQueue::new(db.connection());

        let id = queue.enqueue(order_draft()).await.unwrap();
        queue.remove(&id).await.unwrap();
        assert_eq!(queue.pending_count().await.unwrap(), 0);

        let err = queue.remove(&id).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_bump_retries_keeps_timestamp() {
        let db = setup().await;
        let queue = WriteQueue::new(db.connection());

        let id = queue.enqueue_at(order_draft(), 1234).await.unwrap();
        queue.bump_retries(&id).await.unwrap();
        queue.bump_retries(&id).await.unwrap();

        let pending = queue.pending().await.unwrap();
        assert_eq!(pending[0].retries, 2);
        assert_eq!(pending[0].timestamp, 1234);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_stalled_threshold() {
        let db = setup().await;
        let queue = WriteQueue::new(db.connection());

        let stuck = queue.enqueue(order_draft()).await.unwrap();
        let fresh = queue.enqueue(table_update("t2")).await.unwrap();
        for _ in 0..3 {
            queue.bump_retries(&stuck).await.unwrap();
        }

        let stalled = queue.stalled(3).await.unwrap();
        assert_eq!(stalled.len(), 1);
        assert_eq!(stalled[0].id, stuck);
        assert_ne!(stalled[0].id, fresh);
    }
}
