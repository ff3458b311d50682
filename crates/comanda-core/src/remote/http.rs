//! HTTP record service client

use super::{RemoteError, RemoteStore, RemoteTimestamps};
use crate::util::compact_text;
use reqwest::{Response, StatusCode};
use serde::Deserialize;

/// Record service client speaking a PostgREST-style REST protocol.
///
/// Each collection is a route under the base URL; upserts are inserts
/// with merge-duplicates resolution, and timestamp probes are narrow
/// selects so replaying a large queue doesn't pull record bodies.
#[derive(Debug)]
pub struct RestRemoteStore {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl RestRemoteStore {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, RemoteError> {
        let base_url = normalize_base_url(base_url.into())?;
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(RemoteError::InvalidConfiguration(
                "api key must not be empty".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| RemoteError::InvalidConfiguration(e.to_string()))?;

        Ok(Self {
            base_url,
            api_key,
            client,
        })
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/{collection}", self.base_url)
    }

    async fn post(
        &self,
        collection: &str,
        record: &serde_json::Value,
        prefer: &str,
    ) -> Result<(), RemoteError> {
        let response = self
            .client
            .post(self.collection_url(collection))
            .bearer_auth(&self.api_key)
            .header("Accept", "application/json")
            .header("Prefer", prefer)
            .json(record)
            .send()
            .await
            .map_err(transport_error)?;

        check_status(response).await
    }
}

impl RemoteStore for RestRemoteStore {
    async fn insert(
        &self,
        collection: &str,
        record: serde_json::Value,
    ) -> Result<(), RemoteError> {
        self.post(collection, &record, "return=minimal").await
    }

    async fn upsert(
        &self,
        collection: &str,
        record: serde_json::Value,
    ) -> Result<(), RemoteError> {
        self.post(collection, &record, "resolution=merge-duplicates,return=minimal")
            .await
    }

    async fn timestamps(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<RemoteTimestamps>, RemoteError> {
        let url = format!(
            "{}?id=eq.{}&select=updated_at,created_at",
            self.collection_url(collection),
            urlencoding::encode(id),
        );

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let rows = response
            .json::<Vec<RemoteTimestamps>>()
            .await
            .map_err(transport_error)?;
        Ok(rows.into_iter().next())
    }
}

fn transport_error(err: reqwest::Error) -> RemoteError {
    RemoteError::Unavailable(err.to_string())
}

async fn check_status(response: Response) -> Result<(), RemoteError> {
    if response.status().is_success() {
        Ok(())
    } else {
        Err(status_error(response).await)
    }
}

async fn status_error(response: Response) -> RemoteError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    if status.is_server_error() {
        RemoteError::Unavailable(format!("HTTP {}", status.as_u16()))
    } else {
        RemoteError::Rejected {
            status: status.as_u16(),
            message: parse_api_error(status, &body),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    message: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return compact_text(&message);
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        compact_text(trimmed)
    }
}

fn normalize_base_url(raw: String) -> Result<String, RemoteError> {
    let url = raw.trim();
    if url.is_empty() {
        return Err(RemoteError::InvalidConfiguration(
            "base URL must not be empty".to_string(),
        ));
    }
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(url.trim_end_matches('/').to_string())
    } else {
        Err(RemoteError::InvalidConfiguration(
            "base URL must include http:// or https://".to_string(),
        ))
    }
}
