//! Remote record service contract
//!
//! The engine consumes the backend through this seam; it never talks to
//! a transport directly. [`http::RestRemoteStore`] is the production
//! implementation, tests substitute an in-memory one.

mod http;

pub use http::RestRemoteStore;

use serde::Deserialize;
use thiserror::Error;

/// Errors from the remote record service.
///
/// Dispatch failures leave the failed item in the queue for the next
/// flush; the unavailable/rejected split exists so logs and operators
/// can tell an outage from a payload the backend keeps refusing.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Misconfigured client (bad endpoint, missing credentials)
    #[error("Invalid remote configuration: {0}")]
    InvalidConfiguration(String),
    /// Transport-level failure: timeout, connection refused, 5xx
    #[error("Remote unavailable: {0}")]
    Unavailable(String),
    /// The backend understood the request and refused it
    #[error("Remote rejected write: {message} ({status})")]
    Rejected { status: u16, message: String },
}

/// Last-modified metadata for a remote record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct RemoteTimestamps {
    pub updated_at: Option<i64>,
    pub created_at: Option<i64>,
}

impl RemoteTimestamps {
    /// The timestamp used for last-write-wins comparison: the update
    /// stamp when present, the creation stamp otherwise.
    #[must_use]
    pub const fn last_modified(&self) -> Option<i64> {
        match self.updated_at {
            Some(ts) => Some(ts),
            None => self.created_at,
        }
    }
}

/// The backend record service consumed by the sync engine
#[allow(async_fn_in_trait)]
pub trait RemoteStore {
    /// Insert a new record into the collection
    async fn insert(
        &self,
        collection: &str,
        record: serde_json::Value,
    ) -> Result<(), RemoteError>;

    /// Update-or-create a record by primary key
    async fn upsert(
        &self,
        collection: &str,
        record: serde_json::Value,
    ) -> Result<(), RemoteError>;

    /// Fetch a record's last-modified metadata; `None` when the record
    /// does not exist remotely
    async fn timestamps(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<RemoteTimestamps>, RemoteError>;
}
