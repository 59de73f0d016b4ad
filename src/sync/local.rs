//! Local-file push sync.
//!
//! The CLI collects a directory tree and posts it here. The uploaded set is
//! diffed against the stored rows of a `local_sync` source by path. Explicit
//! `deleted_paths` are always honored; remote-only rows found by the diff
//! are deleted only when the caller sets `delete_missing`.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::diff::{diff, PathMatch};
use super::run::{resolve_source, RunCounts, SyncRun};
use super::types::{SyncError, SyncResult, SyncSummary};
use super::millis_to_rfc3339;
use crate::model::file::normalize_path;
use crate::model::{now_millis, FileUpload, LocalFile, SourceMode, SyncFlow, SyncLogStatus};
use crate::storage::Store;

/// Body of a local-sync push.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocalSyncRequest {
    pub source_id: String,

    #[serde(default)]
    pub files: Vec<FileUpload>,

    /// Paths removed locally since the last push
    #[serde(default)]
    pub deleted_paths: Vec<String>,

    /// Compute counts without writing anything
    #[serde(default)]
    pub dry_run: bool,

    /// Also delete stored rows that are absent from `files`
    #[serde(default)]
    pub delete_missing: bool,
}

/// Run one local-sync pass.
///
/// The source is looked up within `owner_id`; once resolved, the source's
/// own owner scopes every row touched.
///
/// # Errors
///
/// Returns an error for an invalid request, an unknown or non-`local_sync`
/// source, or when the stored snapshot cannot be read. Per-file failures
/// are reported in the summary instead.
pub fn sync_local(
    store: &dyn Store,
    owner_id: &str,
    request: LocalSyncRequest,
    api_key_id: Option<&str>,
) -> SyncResult<SyncSummary> {
    if request.source_id.trim().is_empty() {
        return Err(SyncError::InvalidRequest("source_id is required".to_string()));
    }
    if let Some(bad) = request.files.iter().find(|f| normalize_path(&f.path).is_empty()) {
        return Err(SyncError::InvalidRequest(format!(
            "file path must not be empty (got {:?})",
            bad.path
        )));
    }

    let source = resolve_source(store, owner_id, &request.source_id, SourceMode::LocalSync)?;
    let owner = source.owner_id.as_str();

    let run = if request.dry_run {
        None
    } else {
        Some(SyncRun::start(store, owner, Some(&source.id), SyncFlow::LocalSync, api_key_id)?)
    };
    let remote = match store.list_files(owner, &source.id) {
        Ok(remote) => remote,
        Err(e) => {
            if let Some(run) = run {
                run.fail(&e.to_string());
            }
            return Err(e.into());
        }
    };
    let local: Vec<LocalFile> = request.files.into_iter().map(LocalFile::from_upload).collect();
    let uploaded: HashSet<String> = local.iter().map(|f| f.path.clone()).collect();
    let remote_paths: HashSet<&str> = remote.iter().map(|f| f.path.as_str()).collect();

    let changes = diff(&PathMatch, local, &remote);
    debug!(
        source = %source.id,
        create = changes.to_create.len(),
        update = changes.to_update.len(),
        remote_only = changes.to_delete.len(),
        unchanged = changes.unchanged,
        "local sync diff"
    );

    let mut warnings = Vec::new();
    let mut seen = HashSet::new();
    let mut deletions = Vec::new();
    let diff_deletes = changes
        .to_delete
        .iter()
        .filter(|_| request.delete_missing)
        .map(|f| f.path.clone());
    for path in request
        .deleted_paths
        .iter()
        .map(|p| normalize_path(p))
        .chain(diff_deletes)
    {
        if path.is_empty() || !seen.insert(path.clone()) {
            continue;
        }
        if uploaded.contains(&path) {
            warnings.push(format!("{path}: listed as deleted but also uploaded, kept"));
            continue;
        }
        deletions.push(path);
    }

    let Some(run) = run else {
        return Ok(SyncSummary {
            files_added: changes.to_create.len(),
            files_updated: changes.to_update.len(),
            files_deleted: deletions
                .iter()
                .filter(|p| remote_paths.contains(p.as_str()))
                .count(),
            files_unchanged: changes.unchanged,
            errors: Vec::new(),
            warnings,
            failed_deletes: Vec::new(),
            status: SyncLogStatus::Success,
            dry_run: true,
            synced_at: None,
        });
    };

    let mut counts = RunCounts::default();
    let mut errors = Vec::new();
    let mut failed_deletes = Vec::new();

    for file in &changes.to_create {
        match store.upsert_file(owner, &source.id, file) {
            Ok(_) => counts.added += 1,
            Err(e) => errors.push(format!("{}: {e}", file.path)),
        }
    }

    for update in &changes.to_update {
        match store.update_file(owner, &update.remote.id, &update.patch) {
            Ok(_) => counts.updated += 1,
            Err(e) => errors.push(format!("{}: {e}", update.remote.path)),
        }
    }

    for path in &deletions {
        match store.delete_file_by_path(owner, &source.id, path) {
            Ok(n) => counts.deleted += n,
            Err(e) => {
                errors.push(format!("{path}: {e}"));
                failed_deletes.push(path.clone());
            }
        }
    }

    let status = run.finish(counts, &errors);

    let synced_at = if status == SyncLogStatus::Error {
        None
    } else {
        let now = now_millis();
        if let Err(e) = store.touch_source_synced(owner, &source.id, now) {
            warn!(source = %source.id, error = %e, "failed to record synced_at");
        }
        millis_to_rfc3339(now)
    };

    info!(
        source = %source.id,
        added = counts.added,
        updated = counts.updated,
        deleted = counts.deleted,
        errors = errors.len(),
        status = status.as_str(),
        "local sync finished"
    );

    Ok(SyncSummary {
        files_added: counts.added,
        files_updated: counts.updated,
        files_deleted: counts.deleted,
        files_unchanged: changes.unchanged,
        errors,
        warnings,
        failed_deletes,
        status,
        dry_run: false,
        synced_at,
    })
}
