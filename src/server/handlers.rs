//! Route handlers.
//!
//! Handlers authenticate through [`Caller`], call the store or a sync
//! orchestrator, and return JSON. Blocking sync flows run on the blocking
//! pool; the GitHub flow is awaited directly.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::AppContext;
use super::auth::Caller;
use super::error::ApiError;
use crate::model::{FileRecord, Idea, IdeaDraft, NewSource, Source, SyncLog};
use crate::storage::StoreError;
use crate::sync::{
    IdeasPushSummary, LocalSyncRequest, SyncSummary, push_ideas, sync_github, sync_local,
};
use crate::validate::validate_source_path;

type Ctx = State<Arc<AppContext>>;

// ============ GET /health ============

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ============ Sources ============

pub async fn list_sources(State(ctx): Ctx, caller: Caller) -> Result<Json<Vec<Source>>, ApiError> {
    Ok(Json(ctx.store.list_sources(&caller.owner_id)?))
}

pub async fn create_source(
    State(ctx): Ctx,
    caller: Caller,
    Json(body): Json<NewSource>,
) -> Result<(StatusCode, Json<Source>), ApiError> {
    if body.name.trim().is_empty() {
        return Err(ApiError::bad_request("source name must not be empty"));
    }
    validate_source_path(body.mode, &body.path).map_err(ApiError::bad_request)?;

    let source = body.into_source(&caller.owner_id);
    ctx.store.insert_source(&source)?;
    info!(source_id = %source.id, mode = %source.mode, "source created");
    Ok((StatusCode::CREATED, Json(source)))
}

fn load_source(ctx: &AppContext, owner_id: &str, id: &str) -> Result<Source, ApiError> {
    ctx.store
        .get_source(owner_id, id)?
        .ok_or_else(|| ApiError::source_not_found(id))
}

pub async fn get_source(
    State(ctx): Ctx,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<Source>, ApiError> {
    Ok(Json(load_source(&ctx, &caller.owner_id, &id)?))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteSourceResponse {
    pub id: String,
    pub files_deleted: usize,
}

pub async fn delete_source(
    State(ctx): Ctx,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<DeleteSourceResponse>, ApiError> {
    let files_deleted = match ctx.store.delete_source(&caller.owner_id, &id) {
        Ok(n) => n,
        Err(StoreError::NotFound(_)) => return Err(ApiError::source_not_found(&id)),
        Err(e) => return Err(e.into()),
    };
    info!(source_id = %id, files_deleted, "source deleted");
    Ok(Json(DeleteSourceResponse { id, files_deleted }))
}

// ============ Files ============

pub async fn list_files(
    State(ctx): Ctx,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<Vec<FileRecord>>, ApiError> {
    let source = load_source(&ctx, &caller.owner_id, &id)?;
    Ok(Json(ctx.store.list_files(&caller.owner_id, &source.id)?))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteFilesRequest {
    pub ids: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteFilesResponse {
    pub deleted: usize,
}

pub async fn delete_files(
    State(ctx): Ctx,
    caller: Caller,
    Json(body): Json<DeleteFilesRequest>,
) -> Result<Json<DeleteFilesResponse>, ApiError> {
    let deleted = if body.ids.is_empty() {
        0
    } else {
        ctx.store.delete_files(&caller.owner_id, &body.ids)?
    };
    Ok(Json(DeleteFilesResponse { deleted }))
}

// ============ Sync logs ============

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    #[serde(default = "default_log_limit")]
    pub limit: usize,
}

const fn default_log_limit() -> usize {
    20
}

pub async fn list_logs(
    State(ctx): Ctx,
    caller: Caller,
    Path(id): Path<String>,
    Query(query): Query<LogsQuery>,
) -> Result<Json<Vec<SyncLog>>, ApiError> {
    let source = load_source(&ctx, &caller.owner_id, &id)?;
    let limit = query.limit.clamp(1, 200);
    Ok(Json(ctx.store.list_sync_logs(&caller.owner_id, Some(&source.id), limit)?))
}

// ============ Sync ============

pub async fn github_sync(
    State(ctx): Ctx,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<SyncSummary>, ApiError> {
    let summary = sync_github(
        ctx.store.as_ref(),
        &ctx.github,
        &caller.owner_id,
        &id,
        &ctx.github_options,
        Some(&caller.api_key_id),
    )
    .await?;
    Ok(Json(summary))
}

pub async fn local_sync(
    State(ctx): Ctx,
    caller: Caller,
    Json(request): Json<LocalSyncRequest>,
) -> Result<Json<SyncSummary>, ApiError> {
    let summary = tokio::task::spawn_blocking(move || {
        sync_local(
            ctx.store.as_ref(),
            &caller.owner_id,
            request,
            Some(&caller.api_key_id),
        )
    })
    .await??;
    Ok(Json(summary))
}

// ============ Ideas ============

pub async fn list_ideas(State(ctx): Ctx, caller: Caller) -> Result<Json<Vec<Idea>>, ApiError> {
    Ok(Json(ctx.store.list_ideas(&caller.owner_id)?))
}

/// Body of `POST /api/ideas/push`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdeasPushRequest {
    #[serde(default)]
    pub ideas: Vec<IdeaDraft>,

    /// Delete stored ideas missing from `ideas`
    #[serde(default)]
    pub delete_remote: bool,
}

pub async fn ideas_push(
    State(ctx): Ctx,
    caller: Caller,
    Json(body): Json<IdeasPushRequest>,
) -> Result<Json<IdeasPushSummary>, ApiError> {
    let summary = tokio::task::spawn_blocking(move || {
        push_ideas(
            ctx.store.as_ref(),
            &caller.owner_id,
            body.ideas,
            body.delete_remote,
            Some(&caller.api_key_id),
        )
    })
    .await??;
    Ok(Json(summary))
}
