//! Read-only catalog cache

use crate::error::Result;
use crate::models::{DiningTable, MenuCategory, MenuItem, Restaurant};
use libsql::Connection;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A record the catalog cache can hold.
///
/// Each entity maps to one local table storing the full JSON snapshot;
/// partitioned entities additionally carry the owning restaurant for
/// scoped lookups.
pub trait CachedEntity: Serialize + DeserializeOwned {
    /// Local cache table backing this entity
    const TABLE: &'static str;

    /// Primary key
    fn id(&self) -> &str;

    /// Partition key; `None` for flat collections
    fn restaurant_id(&self) -> Option<&str>;
}

impl CachedEntity for Restaurant {
    const TABLE: &'static str = "restaurants";

    fn id(&self) -> &str {
        &self.id
    }

    fn restaurant_id(&self) -> Option<&str> {
        None
    }
}

impl CachedEntity for MenuCategory {
    const TABLE: &'static str = "menu_categories";

    fn id(&self) -> &str {
        &self.id
    }

    fn restaurant_id(&self) -> Option<&str> {
        Some(&self.restaurant_id)
    }
}

impl CachedEntity for MenuItem {
    const TABLE: &'static str = "menu_items";

    fn id(&self) -> &str {
        &self.id
    }

    fn restaurant_id(&self) -> Option<&str> {
        Some(&self.restaurant_id)
    }
}

impl CachedEntity for DiningTable {
    const TABLE: &'static str = "dining_tables";

    fn id(&self) -> &str {
        &self.id
    }

    fn restaurant_id(&self) -> Option<&str> {
        Some(&self.restaurant_id)
    }
}

/// Repository over the denormalized catalog caches.
///
/// Snapshots are written in bulk after a successful fetch and read back
/// while offline; the sync engine never edits them, so staleness is the
/// only failure mode and the next fetch resolves it.
pub struct CatalogCache<'a> {
    conn: &'a Connection,
}

impl<'a> CatalogCache<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Upsert every item in one transaction, all-or-nothing.
    ///
    /// Existing rows with the same id are replaced wholesale; rows absent
    /// from `items` are left untouched.
    pub async fn cache_all<T: CachedEntity>(&self, items: &[T]) -> Result<()> {
        // Serialize up front so a bad item cannot abort mid-transaction
        let mut rows = Vec::with_capacity(items.len());
        for item in items {
            rows.push((
                item.id().to_string(),
                item.restaurant_id().map(ToString::to_string),
                serde_json::to_string(item)?,
            ));
        }

        // Table names come from the sealed trait impls above, never from input
        let sql = format!(
            "INSERT OR REPLACE INTO {} (id, restaurant_id, body) VALUES (?, ?, ?)",
            T::TABLE
        );

        self.conn.execute("BEGIN TRANSACTION", ()).await?;
        for (id, restaurant_id, body) in rows {
            if let Err(e) = self.conn.execute(&sql, (id, restaurant_id, body)).await {
                self.conn.execute("ROLLBACK", ()).await.ok();
                return Err(e.into());
            }
        }
        if let Err(e) = self.conn.execute("COMMIT", ()).await {
            self.conn.execute("ROLLBACK", ()).await.ok();
            return Err(e.into());
        }

        tracing::debug!(table = T::TABLE, count = items.len(), "cached snapshot");
        Ok(())
    }

    /// Single lookup by primary key; `None` when absent
    pub async fn by_id<T: CachedEntity>(&self, id: &str) -> Result<Option<T>> {
        let sql = format!("SELECT body FROM {} WHERE id = ?", T::TABLE);
        let mut rows = self.conn.query(&sql, [id]).await?;

        match rows.next().await? {
            Some(row) => {
                let body: String = row.get(0)?;
                Ok(Some(serde_json::from_str(&body)?))
            }
            None => Ok(None),
        }
    }

    /// All cached items owned by the given restaurant, in unspecified order
    pub async fn for_restaurant<T: CachedEntity>(&self, restaurant_id: &str) -> Result<Vec<T>> {
        let sql = format!("SELECT body FROM {} WHERE restaurant_id = ?", T::TABLE);
        let mut rows = self.conn.query(&sql, [restaurant_id]).await?;

        let mut items = Vec::new();
        while let Some(row) = rows.next().await? {
            let body: String = row.get(0)?;
            items.push(serde_json::from_str(&body)?);
        }
        Ok(items)
    }

    /// All cached items in the collection
    pub async fn all<T: CachedEntity>(&self) -> Result<Vec<T>> {
        let sql = format!("SELECT body FROM {}", T::TABLE);
        let mut rows = self.conn.query(&sql, ()).await?;

        let mut items = Vec::new();
        while let Some(row) = rows.next().await? {
            let body: String = row.get(0)?;
            items.push(serde_json::from_str(&body)?);
        }
        Ok(items)
    }

    /// Number of cached items in the collection
    pub async fn count<T: CachedEntity>(&self) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", T::TABLE);
        let mut rows = self.conn.query(&sql, ()).await?;

        let count: i64 = if let Some(row) = rows.next().await? {
            row.get(0)?
        } else {
            0
        };

        Ok(count.unsigned_abs())
    }
}
