//! HTTP service (`hub serve`).
//!
//! # Endpoints
//!
//! | Method   | Path                              | Description                  |
//! |----------|-----------------------------------|------------------------------|
//! | `GET`    | `/health`                         | Health check (no auth)       |
//! | `GET`    | `/api/sources`                    | List sources                 |
//! | `POST`   | `/api/sources`                    | Create a source              |
//! | `GET`    | `/api/sources/{id}`               | Show a source                |
//! | `DELETE` | `/api/sources/{id}`               | Delete a source and its files|
//! | `GET`    | `/api/sources/{id}/files`         | List a source's files        |
//! | `GET`    | `/api/sources/{id}/logs`          | Recent sync logs             |
//! | `POST`   | `/api/sources/{id}/github-sync`   | Run a GitHub-tree sync       |
//! | `POST`   | `/api/files/delete`               | Bulk delete files by id      |
//! | `POST`   | `/api/sync/local`                 | Push local files             |
//! | `GET`    | `/api/ideas`                      | List ideas                   |
//! | `POST`   | `/api/ideas/push`                 | Push ideas                   |
//!
//! Every `/api` route requires an API key. Errors use
//! `{ "error": { "code": ..., "message": ... } }`.

mod auth;
mod error;
mod handlers;

pub use auth::Caller;
pub use error::ApiError;
pub use handlers::{DeleteFilesRequest, DeleteFilesResponse, DeleteSourceResponse, IdeasPushRequest};

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::error::{Error, Result};
use crate::github::GithubClient;
use crate::storage::Store;
use crate::sync::GithubSyncOptions;

/// Everything a request handler needs, built once per process.
pub struct AppContext {
    pub store: Arc<dyn Store>,
    pub github: GithubClient,
    pub github_options: GithubSyncOptions,
}

/// Build the router over a shared context.
pub fn router(ctx: Arc<AppContext>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route(
            "/sources",
            get(handlers::list_sources).post(handlers::create_source),
        )
        .route(
            "/sources/{id}",
            get(handlers::get_source).delete(handlers::delete_source),
        )
        .route("/sources/{id}/files", get(handlers::list_files))
        .route("/sources/{id}/logs", get(handlers::list_logs))
        .route("/sources/{id}/github-sync", post(handlers::github_sync))
        .route("/files/delete", post(handlers::delete_files))
        .route("/sync/local", post(handlers::local_sync))
        .route("/ideas", get(handlers::list_ideas))
        .route("/ideas/push", post(handlers::ideas_push));

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api", api)
        .layer(cors)
        .with_state(ctx)
}

/// Bind and serve until the process is terminated.
///
/// # Errors
///
/// Returns an error if the address cannot be bound.
pub async fn serve(ctx: Arc<AppContext>, bind: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|e| Error::Config(format!("cannot bind {bind}: {e}")))?;
    let addr = listener.local_addr()?;
    info!(%addr, "hub server listening");

    axum::serve(listener, router(ctx)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        ApiKey, FileRecord, FileUpload, Idea, IdeaDraft, IdeaStatus, Source, SourceMode, SyncLog,
        SyncLogStatus,
    };
    use crate::storage::SqliteStorage;
    use crate::sync::{IdeasPushSummary, LocalSyncRequest, SyncSummary};
    use serde_json::{Value, json};

    struct TestServer {
        base: String,
        key: String,
        http: reqwest::Client,
    }

    impl TestServer {
        fn url(&self, path: &str) -> String {
            format!("{}{path}", self.base)
        }

        async fn get(&self, path: &str) -> reqwest::Response {
            self.http
                .get(self.url(path))
                .bearer_auth(&self.key)
                .send()
                .await
                .unwrap()
        }

        async fn post(&self, path: &str, body: Value) -> reqwest::Response {
            self.http
                .post(self.url(path))
                .bearer_auth(&self.key)
                .json(&body)
                .send()
                .await
                .unwrap()
        }
    }

    async fn start() -> TestServer {
        let store = Arc::new(SqliteStorage::open_memory().unwrap());
        let (key, raw) = ApiKey::generate("user_1", "test");
        store.insert_api_key(&key).unwrap();

        let ctx = Arc::new(AppContext {
            store,
            // Nothing listens here; GitHub calls fail fast
            github: GithubClient::with_base("http://127.0.0.1:9", None),
            github_options: GithubSyncOptions::default(),
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(ctx)).await.unwrap();
        });

        TestServer {
            base: format!("http://{addr}"),
            key: raw,
            http: reqwest::Client::new(),
        }
    }

    async fn create_source(server: &TestServer, mode: &str, path: &str) -> Source {
        let resp = server
            .post("/api/sources", json!({"name": "test", "mode": mode, "path": path}))
            .await;
        assert_eq!(resp.status(), 201);
        resp.json().await.unwrap()
    }

    #[tokio::test]
    async fn test_health_and_auth() {
        let server = start().await;

        let health: Value = server
            .http
            .get(server.url("/health"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(health["status"], "ok");

        let resp = server.http.get(server.url("/api/sources")).send().await.unwrap();
        assert_eq!(resp.status(), 401);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"]["code"], "unauthorized");

        let resp = server
            .http
            .get(server.url("/api/sources"))
            .header("x-api-key", "hub_wrong")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 401);

        let resp = server
            .http
            .get(server.url("/api/sources"))
            .header("x-api-key", &server.key)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }

    #[tokio::test]
    async fn test_source_crud() {
        let server = start().await;

        let resp = server
            .post("/api/sources", json!({"name": "bad", "mode": "github", "path": "nope"}))
            .await;
        assert_eq!(resp.status(), 400);

        let source = create_source(&server, "local_sync", "/home/me/notes").await;
        assert_eq!(source.mode, SourceMode::LocalSync);

        let listed: Vec<Source> = server.get("/api/sources").await.json().await.unwrap();
        assert_eq!(listed.len(), 1);

        let resp = server.get("/api/sources/src_missing").await;
        assert_eq!(resp.status(), 404);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"]["code"], "source_not_found");

        let resp = server
            .http
            .delete(server.url(&format!("/api/sources/{}", source.id)))
            .bearer_auth(&server.key)
            .send()
            .await
            .unwrap();
        let deleted: DeleteSourceResponse = resp.json().await.unwrap();
        assert_eq!(deleted.id, source.id);

        let listed: Vec<Source> = server.get("/api/sources").await.json().await.unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn test_local_sync_round() {
        let server = start().await;
        let source = create_source(&server, "local_sync", "/notes").await;

        let request = LocalSyncRequest {
            source_id: source.id.clone(),
            files: vec![
                FileUpload {
                    path: "a.md".into(),
                    content: Some("alpha".into()),
                    ..FileUpload::default()
                },
                FileUpload {
                    path: "b.md".into(),
                    content: Some("beta".into()),
                    ..FileUpload::default()
                },
            ],
            ..LocalSyncRequest::default()
        };
        let summary: SyncSummary = server
            .post("/api/sync/local", serde_json::to_value(&request).unwrap())
            .await
            .json()
            .await
            .unwrap();
        assert_eq!(summary.files_added, 2);
        assert_eq!(summary.status, SyncLogStatus::Success);
        assert!(summary.synced_at.is_some());

        let request = LocalSyncRequest {
            source_id: source.id.clone(),
            files: request.files[..1].to_vec(),
            deleted_paths: vec!["b.md".into()],
            ..LocalSyncRequest::default()
        };
        let summary: SyncSummary = server
            .post("/api/sync/local", serde_json::to_value(&request).unwrap())
            .await
            .json()
            .await
            .unwrap();
        assert_eq!(summary.files_unchanged, 1);
        assert_eq!(summary.files_deleted, 1);

        let files: Vec<FileRecord> = server
            .get(&format!("/api/sources/{}/files", source.id))
            .await
            .json()
            .await
            .unwrap();
        assert_eq!(files.len(), 1);

        let logs: Vec<SyncLog> = server
            .get(&format!("/api/sources/{}/logs", source.id))
            .await
            .json()
            .await
            .unwrap();
        assert_eq!(logs.len(), 2);
        assert!(logs.iter().all(|l| l.api_key_id.is_some()));

        let resp = server
            .post("/api/files/delete", json!({"ids": [files[0].id.clone()]}))
            .await;
        let deleted: DeleteFilesResponse = resp.json().await.unwrap();
        assert_eq!(deleted.deleted, 1);
    }

    #[tokio::test]
    async fn test_sync_routing_errors() {
        let server = start().await;
        let link = create_source(&server, "link", "https://example.com").await;

        let resp = server
            .post("/api/sync/local", json!({"source_id": link.id, "files": []}))
            .await;
        assert_eq!(resp.status(), 400);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"]["code"], "wrong_source_mode");

        let resp = server
            .post("/api/sync/local", json!({"source_id": "src_nope"}))
            .await;
        assert_eq!(resp.status(), 404);

        let gh = create_source(&server, "github", "octo/hello").await;
        let resp = server
            .post(&format!("/api/sources/{}/github-sync", gh.id), json!({}))
            .await;
        assert_eq!(resp.status(), 502);

        let logs: Vec<SyncLog> = server
            .get(&format!("/api/sources/{}/logs", gh.id))
            .await
            .json()
            .await
            .unwrap();
        assert_eq!(logs[0].status, SyncLogStatus::Error);
    }

    #[tokio::test]
    async fn test_ideas_push_and_list() {
        let server = start().await;
        let body = IdeasPushRequest {
            ideas: vec![IdeaDraft {
                content: "Ship it #release".into(),
                status: IdeaStatus::Active,
                done: false,
                tags: vec!["release".into()],
                refs: vec![],
            }],
            delete_remote: false,
        };

        let summary: IdeasPushSummary = server
            .post("/api/ideas/push", serde_json::to_value(&body).unwrap())
            .await
            .json()
            .await
            .unwrap();
        assert_eq!(summary.ideas_added, 1);

        let ideas: Vec<Idea> = server.get("/api/ideas").await.json().await.unwrap();
        assert_eq!(ideas.len(), 1);
        assert_eq!(ideas[0].tags, vec!["release"]);
    }
}
