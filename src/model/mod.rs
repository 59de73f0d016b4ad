//! Data models for Hub.
//!
//! This module contains all domain models:
//! - Source (github / link / local_sync origins)
//! - FileRecord, LocalFile and FilePatch
//! - Idea, IdeaDraft and IdeaPatch
//! - SyncLog
//! - ApiKey

pub mod api_key;
pub mod file;
pub mod idea;
pub mod source;
pub mod sync_log;

pub use api_key::ApiKey;
pub use file::{FilePatch, FileRecord, FileUpload, LocalFile};
pub use idea::{Idea, IdeaDraft, IdeaPatch, IdeaStatus};
pub use source::{NewSource, Source, SourceMode};
pub use sync_log::{SyncFlow, SyncLog, SyncLogStatus};

/// Current time as Unix milliseconds, the timestamp unit for every row.
#[must_use]
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate a short prefixed identifier (e.g. `src_1a2b3c4d5e6f`).
#[must_use]
pub fn new_id(prefix: &str) -> String {
    format!("{prefix}_{}", &uuid::Uuid::new_v4().simple().to_string()[..12])
}
