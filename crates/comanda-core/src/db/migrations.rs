//! Database migrations

use crate::error::Result;
use libsql::Connection;

/// Current schema version
const CURRENT_VERSION: i32 = 2;

/// Run all pending migrations
pub async fn run(conn: &Connection) -> Result<()> {
    let version = get_version(conn).await?;

    if version < 1 {
        migrate_v1(conn).await?;
    }
    if version < 2 {
        migrate_v2(conn).await?;
    }

    Ok(())
}

/// Get the current schema version
async fn get_version(conn: &Connection) -> Result<i32> {
    // Check if schema_version table exists
    let mut rows = conn
        .query(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            (),
        )
        .await?;

    let exists: bool = if let Some(row) = rows.next().await? {
        row.get::<i32>(0)? != 0
    } else {
        false
    };

    if !exists {
        return Ok(0);
    }

    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM schema_version", ())
        .await?;

    let version: i32 = if let Some(row) = rows.next().await? {
        row.get(0)?
    } else {
        0
    };

    Ok(version)
}

/// Apply one migration's statements inside a transaction
async fn apply(conn: &Connection, statements: &[&str]) -> Result<()> {
    // libsql doesn't have execute_batch, so we run each statement separately
    conn.execute("BEGIN TRANSACTION", ()).await?;

    for stmt in statements {
        if let Err(e) = conn.execute(stmt, ()).await {
            conn.execute("ROLLBACK", ()).await.ok();
            return Err(e.into());
        }
    }

    if let Err(e) = conn.execute("COMMIT", ()).await {
        conn.execute("ROLLBACK", ()).await.ok();
        return Err(e.into());
    }

    Ok(())
}

/// Migration to version 1: write queue and conflict log
async fn migrate_v1(conn: &Connection) -> Result<()> {
    let statements = [
        // Schema version tracking
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        )",
        // Pending mutations, drained oldest-first
        "CREATE TABLE IF NOT EXISTS write_queue (
            id TEXT PRIMARY KEY,
            kind TEXT NOT NULL,
            payload TEXT NOT NULL,
            timestamp INTEGER NOT NULL,
            retries INTEGER NOT NULL DEFAULT 0
        )",
        "CREATE INDEX IF NOT EXISTS idx_write_queue_timestamp ON write_queue(timestamp ASC)",
        // Mutations discarded by last-write-wins resolution
        "CREATE TABLE IF NOT EXISTS conflict_log (
            id TEXT PRIMARY KEY,
            kind TEXT NOT NULL,
            local_timestamp INTEGER NOT NULL,
            server_timestamp INTEGER NOT NULL,
            resolved_at INTEGER NOT NULL,
            payload TEXT NOT NULL
        )",
        "CREATE INDEX IF NOT EXISTS idx_conflict_log_resolved_at ON conflict_log(resolved_at DESC)",
        // Record migration version
        "INSERT INTO schema_version (version) VALUES (1)",
    ];

    apply(conn, &statements).await?;

    tracing::info!("Migrated database to version 1");
    Ok(())
}

/// Migration to version 2: read-only catalog caches
async fn migrate_v2(conn: &Connection) -> Result<()> {
    let statements = [
        // Flat cache; the full snapshot lives in the body column
        "CREATE TABLE IF NOT EXISTS restaurants (
            id TEXT PRIMARY KEY,
            restaurant_id TEXT,
            body TEXT NOT NULL
        )",
        // Partitioned caches, scoped by owning restaurant
        "CREATE TABLE IF NOT EXISTS menu_categories (
            id TEXT PRIMARY KEY,
            restaurant_id TEXT,
            body TEXT NOT NULL
        )",
        "CREATE INDEX IF NOT EXISTS idx_menu_categories_restaurant
         ON menu_categories(restaurant_id)",
        "CREATE TABLE IF NOT EXISTS menu_items (
            id TEXT PRIMARY KEY,
            restaurant_id TEXT,
            body TEXT NOT NULL
        )",
        "CREATE INDEX IF NOT EXISTS idx_menu_items_restaurant
         ON menu_items(restaurant_id)",
        "CREATE TABLE IF NOT EXISTS dining_tables (
            id TEXT PRIMARY KEY,
            restaurant_id TEXT,
            body TEXT NOT NULL
        )",
        "CREATE INDEX IF NOT EXISTS idx_dining_tables_restaurant
         ON dining_tables(restaurant_id)",
        "INSERT INTO schema_version (version) VALUES (2)",
    ];

    apply(conn, &statements).await?;

    tracing::info!("Migrated database to version {CURRENT_VERSION}");
    Ok(())
}
