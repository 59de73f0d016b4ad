//! Types for sync operations.
//!
//! Results are structured values carrying counts and per-item error strings.
//! Only failures that stop a run before anything is applied surface as a
//! [`SyncError`].

use serde::{Deserialize, Serialize};

use crate::github::GithubError;
use crate::model::SyncLogStatus;
use crate::storage::StoreError;

/// Outcome of a file sync run (GitHub or local push).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSummary {
    pub files_added: usize,
    pub files_updated: usize,
    pub files_deleted: usize,
    pub files_unchanged: usize,

    /// Every per-item failure, uncapped
    pub errors: Vec<String>,

    /// Non-fatal notices (truncated upstream tree, skipped deletes)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,

    /// Paths whose requested deletion failed and are still stored
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_deletes: Vec<String>,

    pub status: SyncLogStatus,

    #[serde(default)]
    pub dry_run: bool,

    /// RFC 3339 completion time; `None` for dry runs
    pub synced_at: Option<String>,
}

/// Outcome of an ideas push.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdeasPushSummary {
    pub ideas_added: usize,
    pub ideas_updated: usize,
    pub ideas_deleted: usize,
    pub ideas_unchanged: usize,

    /// Remote-only ideas preserved because deletion was not requested
    pub ideas_kept: usize,

    pub errors: Vec<String>,
    pub status: SyncLogStatus,
}

/// Errors that stop a sync run before any mutation is applied.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Source not found: {0}")]
    SourceNotFound(String),

    #[error("Source {source_id} is a {actual} source, expected {expected}")]
    WrongMode {
        source_id: String,
        expected: String,
        actual: String,
    },

    #[error("Invalid sync request: {0}")]
    InvalidRequest(String),

    #[error("Upstream fetch failed: {0}")]
    Upstream(#[from] GithubError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type for sync operations.
pub type SyncResult<T> = std::result::Result<T, SyncError>;
