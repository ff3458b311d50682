//! comanda-core - Core library for Comanda
//!
//! Offline-first sync engine for restaurant point-of-sale terminals: a
//! durable local store (write queue, conflict log, catalog caches) and
//! the flush/replay machinery that reconciles queued writes with the
//! backend using last-write-wins resolution.

pub mod db;
pub mod error;
pub mod models;
pub mod remote;
pub mod state;
pub mod sync;
pub mod util;

pub use error::{Error, Result};
pub use models::{QueuedWrite, WriteId, WriteKind, WritePayload};
pub use state::SyncState;
pub use sync::{EngineConfig, FlushOutcome, FlushReport, SyncEngine};
