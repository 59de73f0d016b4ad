//! The reconciliation engine.
//!
//! Three flows share one diff core:
//!
//! - **GitHub**: repository tree → files of a `github` source (no deletes)
//! - **Local push**: collected directory → files of a `local_sync` source
//! - **Ideas**: flat file ⇄ ideas, matched by normalized content
//!
//! Each flow resolves and scopes its target, diffs desired state against
//! stored state, applies the difference item by item, and records the
//! outcome in a sync log. Per-item failures never abort a run; they are
//! counted and decide between `success`, `partial` and `error`.
//!
//! # Example
//!
//! ```ignore
//! use hub::sync::{sync_local, LocalSyncRequest};
//!
//! let summary = sync_local(&store, "user_1", request, None)?;
//! println!("{} added, {} updated", summary.files_added, summary.files_updated);
//! ```

mod collect;
pub mod diff;
mod file;
pub mod github;
mod hash;
pub mod ideas;
pub mod local;
pub mod run;
mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use collect::{collect_local, CollectOptions, Collected, DEFAULT_EXCLUDES, DEFAULT_MAX_PUSH_SIZE};
pub use file::atomic_write;
pub use github::{sync_github, GithubSyncOptions};
pub use hash::content_hash;
pub use ideas::{pull_ideas, push_ideas, PullOutcome};
pub use local::{sync_local, LocalSyncRequest};
pub use types::{IdeasPushSummary, SyncError, SyncResult, SyncSummary};

/// Render Unix milliseconds as RFC 3339.
pub(crate) fn millis_to_rfc3339(ms: i64) -> Option<String> {
    chrono::DateTime::from_timestamp_millis(ms).map(|d| d.to_rfc3339())
}
