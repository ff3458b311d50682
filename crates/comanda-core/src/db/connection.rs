//! Database connection management

use crate::error::{Error, Result};
use libsql::{Builder, Connection, Database as LibSqlDatabase};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::OnceCell;

use super::migrations;

/// Database wrapper for libSQL connections
///
/// This is the engine's only durable storage; if it cannot be opened the
/// engine cannot function, so every failure here is surfaced as a hard
/// error rather than degrading to an in-process cache. Open is
/// idempotent: migrations are versioned and re-running them is a no-op,
/// so callers racing to open the same path converge on one schema. Share
/// a single handle (e.g. `Arc<Database>`) rather than reopening.
pub struct Database {
    _db: LibSqlDatabase,
    conn: Connection,
}

impl Database {
    /// Open a local database at the given path, creating it if it doesn't exist
    ///
    /// Runs migrations automatically.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();
        let db = Builder::new_local(&path_str).build().await?;
        let conn = db.connect()?;

        let database = Self { _db: db, conn };
        database.configure().await?;
        database.migrate().await?;
        Ok(database)
    }

    /// Open an in-memory database (useful for testing)
    pub async fn open_in_memory() -> Result<Self> {
        let db = Builder::new_local(":memory:").build().await?;
        let conn = db.connect()?;

        let database = Self { _db: db, conn };
        database.configure().await?;
        database.migrate().await?;
        Ok(database)
    }

    /// Configure `SQLite` for crash safety and performance
    async fn configure(&self) -> Result<()> {
        // WAL and NORMAL sync are not available on every backing store
        self.conn
            .execute("PRAGMA journal_mode = WAL;", ())
            .await
            .ok();
        self.conn
            .execute("PRAGMA synchronous = NORMAL;", ())
            .await
            .ok();
        self.conn.execute("PRAGMA foreign_keys = ON;", ()).await?;
        Ok(())
    }

    /// Run database migrations
    async fn migrate(&self) -> Result<()> {
        migrations::run(&self.conn).await
    }

    /// Get a reference to the underlying connection
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }
}

/// Lazily-initialized shared store handle.
///
/// Concurrent first callers share one initialization instead of racing
/// to open and migrate the store twice; later callers get the same
/// `Arc`. An open failure is returned to every waiting caller.
pub struct SharedDatabase {
    path: PathBuf,
    cell: OnceCell<Arc<Database>>,
}

impl SharedDatabase {
    /// Create a handle for the store at the given path; nothing is
    /// opened until the first [`get`](Self::get).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cell: OnceCell::new(),
        }
    }

    /// Open the store on first call, then hand out the shared handle
    pub async fn get(&self) -> Result<Arc<Database>> {
        let db = self
            .cell
            .get_or_try_init(|| async { Ok::<_, Error>(Arc::new(Database::open(&self.path).await?)) })
            .await?;
        Ok(Arc::clone(db))
    }
}
