//! Storage layer for Hub.
//!
//! Every sync flow talks to persistence through the [`Store`] trait: a
//! narrow, row-oriented adapter whose operations are all scoped by an owner
//! identity. [`SqliteStorage`] is the bundled implementation:
//! - WAL mode for concurrent reads
//! - `(owner_id, source_id, path)` uniqueness as the file upsert key
//! - Explicit file removal when a source is deleted
//!
//! # Submodules
//!
//! - [`schema`] - Database schema definitions
//! - [`sqlite`] - SQLite storage implementation

pub mod schema;
pub mod sqlite;

use thiserror::Error;

use crate::model::sync_log::SyncLogUpdate;
use crate::model::{
    ApiKey, FilePatch, FileRecord, Idea, IdeaDraft, IdeaPatch, LocalFile, Source, SyncLog,
};

pub use sqlite::SqliteStorage;

/// Result type alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Closed set of store failure kinds, so callers can match on the kind
/// instead of inspecting messages.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    /// The backing store could not be reached or opened.
    #[error("store unavailable: {0}")]
    Network(String),

    #[error("{0}")]
    Unknown(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        use rusqlite::ErrorCode as Code;

        match &err {
            rusqlite::Error::QueryReturnedNoRows => Self::NotFound(err.to_string()),
            rusqlite::Error::SqliteFailure(e, _) => match e.code {
                Code::ConstraintViolation => Self::Conflict(err.to_string()),
                Code::CannotOpen | Code::DatabaseBusy | Code::DatabaseLocked => {
                    Self::Network(err.to_string())
                }
                _ => Self::Unknown(err.to_string()),
            },
            _ => Self::Unknown(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Unknown(err.to_string())
    }
}

/// Row-oriented persistence used by the sync orchestrators and the HTTP
/// service.
///
/// Implementations must be shareable across threads; the server holds one
/// instance behind an `Arc` for the whole process.
pub trait Store: Send + Sync {
    // ==================
    // Sources
    // ==================

    fn list_sources(&self, owner_id: &str) -> StoreResult<Vec<Source>>;

    fn get_source(&self, owner_id: &str, id: &str) -> StoreResult<Option<Source>>;

    fn insert_source(&self, source: &Source) -> StoreResult<()>;

    /// Record a completed sync on the source.
    fn touch_source_synced(&self, owner_id: &str, id: &str, at: i64) -> StoreResult<()>;

    /// Delete a source and its files. Returns the number of files removed.
    fn delete_source(&self, owner_id: &str, id: &str) -> StoreResult<usize>;

    // ==================
    // Files
    // ==================

    fn list_files(&self, owner_id: &str, source_id: &str) -> StoreResult<Vec<FileRecord>>;

    /// Insert or replace the row keyed by `(owner_id, source_id, file.path)`.
    fn upsert_file(
        &self,
        owner_id: &str,
        source_id: &str,
        file: &LocalFile,
    ) -> StoreResult<FileRecord>;

    fn update_file(&self, owner_id: &str, id: &str, patch: &FilePatch) -> StoreResult<FileRecord>;

    fn delete_file_by_path(&self, owner_id: &str, source_id: &str, path: &str)
    -> StoreResult<usize>;

    fn delete_files(&self, owner_id: &str, ids: &[String]) -> StoreResult<usize>;

    fn delete_files_for_source(&self, owner_id: &str, source_id: &str) -> StoreResult<usize>;

    // ==================
    // Ideas
    // ==================

    fn list_ideas(&self, owner_id: &str) -> StoreResult<Vec<Idea>>;

    fn insert_idea(&self, owner_id: &str, draft: &IdeaDraft) -> StoreResult<Idea>;

    fn update_idea(&self, owner_id: &str, id: &str, patch: &IdeaPatch) -> StoreResult<Idea>;

    fn delete_idea(&self, owner_id: &str, id: &str) -> StoreResult<usize>;

    // ==================
    // Sync logs
    // ==================

    fn start_sync_log(&self, log: &SyncLog) -> StoreResult<()>;

    fn finish_sync_log(&self, id: &str, update: &SyncLogUpdate) -> StoreResult<()>;

    /// Most recent logs first.
    fn list_sync_logs(
        &self,
        owner_id: &str,
        source_id: Option<&str>,
        limit: usize,
    ) -> StoreResult<Vec<SyncLog>>;

    // ==================
    // API keys
    // ==================

    fn insert_api_key(&self, key: &ApiKey) -> StoreResult<()>;

    fn find_api_key(&self, key_hash: &str) -> StoreResult<Option<ApiKey>>;

    fn touch_api_key(&self, id: &str, at: i64) -> StoreResult<()>;
}
