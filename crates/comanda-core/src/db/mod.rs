//! Local durable store for Comanda

mod cache;
mod connection;
mod conflicts;
mod migrations;
mod queue;

pub use cache::{CachedEntity, CatalogCache};
pub use connection::{Database, SharedDatabase};
pub use conflicts::ConflictLog;
pub use queue::WriteQueue;
