//! HTTP client for a running `hub serve`.
//!
//! Remote CLI commands go through [`HubClient`]. Server error bodies are
//! decoded into [`Error::Remote`] so the CLI keeps the server's code;
//! connection failures become [`Error::Unreachable`].

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{FileRecord, Idea, NewSource, Source, SyncLog};
use crate::server::{DeleteSourceResponse, IdeasPushRequest};
use crate::sync::{IdeasPushSummary, LocalSyncRequest, SyncSummary};

/// Sync calls can run for a long time on large trees.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

pub struct HubClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HubClient {
    #[must_use]
    pub fn new(base_url: &str, api_key: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T> {
        let response = request
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| Error::Unreachable(format!("{}: {e}", self.base_url)))?;

        let status = response.status();
        debug!(status = status.as_u16(), url = %response.url(), "hub response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let parsed = serde_json::from_str::<serde_json::Value>(&body).ok();
            let field = |name: &str| {
                parsed
                    .as_ref()
                    .and_then(|v| v["error"][name].as_str())
                    .map(ToString::to_string)
            };
            return Err(Error::Remote {
                status: status.as_u16(),
                code: field("code").unwrap_or_else(|| "unknown".to_string()),
                message: field("message").unwrap_or(body),
            });
        }

        response
            .json()
            .await
            .map_err(|e| Error::Other(format!("Invalid response from hub server: {e}")))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(self.client.get(self.url(path))).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        self.send(self.client.post(self.url(path)).json(body)).await
    }

    // ==================
    // Sources
    // ==================

    pub async fn list_sources(&self) -> Result<Vec<Source>> {
        self.get("/api/sources").await
    }

    pub async fn create_source(&self, source: &NewSource) -> Result<Source> {
        self.post("/api/sources", source).await
    }

    pub async fn get_source(&self, id: &str) -> Result<Source> {
        self.get(&format!("/api/sources/{id}")).await
    }

    pub async fn delete_source(&self, id: &str) -> Result<DeleteSourceResponse> {
        self.send(self.client.delete(self.url(&format!("/api/sources/{id}"))))
            .await
    }

    pub async fn list_files(&self, source_id: &str) -> Result<Vec<FileRecord>> {
        self.get(&format!("/api/sources/{source_id}/files")).await
    }

    pub async fn list_logs(&self, source_id: &str, limit: usize) -> Result<Vec<SyncLog>> {
        self.get(&format!("/api/sources/{source_id}/logs?limit={limit}"))
            .await
    }

    // ==================
    // Sync
    // ==================

    pub async fn github_sync(&self, source_id: &str) -> Result<SyncSummary> {
        self.post(
            &format!("/api/sources/{source_id}/github-sync"),
            &serde_json::json!({}),
        )
        .await
    }

    pub async fn sync_local(&self, request: &LocalSyncRequest) -> Result<SyncSummary> {
        self.post("/api/sync/local", request).await
    }

    // ==================
    // Ideas
    // ==================

    pub async fn list_ideas(&self) -> Result<Vec<Idea>> {
        self.get("/api/ideas").await
    }

    pub async fn push_ideas(&self, request: &IdeasPushRequest) -> Result<IdeasPushSummary> {
        self.post("/api/ideas/push", request).await
    }
}
