//! Sync run bookkeeping.
//!
//! A [`SyncRun`] owns the sync-log row of one reconciliation pass. It is
//! opened with status `syncing` and consumed by [`SyncRun::finish`] or
//! [`SyncRun::fail`], so a run is finalized exactly once.

use tracing::{debug, warn};

use super::types::{SyncError, SyncResult};
use crate::model::sync_log::{summarize_errors, SyncLogUpdate};
use crate::model::{now_millis, Source, SourceMode, SyncFlow, SyncLog, SyncLogStatus};
use crate::storage::Store;

/// Applied mutation counts for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounts {
    pub added: usize,
    pub updated: usize,
    pub deleted: usize,
}

impl RunCounts {
    #[must_use]
    pub const fn total(&self) -> usize {
        self.added + self.updated + self.deleted
    }
}

/// An open sync-log entry.
pub struct SyncRun<'s> {
    store: &'s dyn Store,
    log: SyncLog,
}

impl<'s> SyncRun<'s> {
    /// Write the `syncing` row.
    ///
    /// # Errors
    ///
    /// Returns an error if the log row cannot be written; nothing else has
    /// happened yet, so the caller aborts.
    pub fn start(
        store: &'s dyn Store,
        owner_id: &str,
        source_id: Option<&str>,
        flow: SyncFlow,
        api_key_id: Option<&str>,
    ) -> SyncResult<Self> {
        let log = SyncLog::start(owner_id, source_id, flow, api_key_id);
        store.start_sync_log(&log)?;
        debug!(log_id = %log.id, flow = flow.as_str(), "sync run started");
        Ok(Self { store, log })
    }

    /// Finalize after the apply phase. Returns the final status.
    ///
    /// A failure to write the final row is logged and otherwise ignored:
    /// the mutations already happened and the caller still gets its result.
    pub fn finish(self, counts: RunCounts, errors: &[String]) -> SyncLogStatus {
        let status = SyncLogStatus::from_outcome(counts.total(), errors.len());
        self.write(status, counts, summarize_errors(errors));
        status
    }

    /// Finalize a run that stopped before applying anything.
    pub fn fail(self, message: &str) {
        self.write(
            SyncLogStatus::Error,
            RunCounts::default(),
            Some(message.to_string()),
        );
    }

    fn write(self, status: SyncLogStatus, counts: RunCounts, error_message: Option<String>) {
        let update = SyncLogUpdate {
            status,
            files_added: to_i64(counts.added),
            files_updated: to_i64(counts.updated),
            files_deleted: to_i64(counts.deleted),
            error_message,
            completed_at: now_millis(),
        };
        match self.store.finish_sync_log(&self.log.id, &update) {
            Ok(()) => debug!(log_id = %self.log.id, status = status.as_str(), "sync run finished"),
            Err(e) => warn!(log_id = %self.log.id, error = %e, "failed to finalize sync log"),
        }
    }
}

fn to_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// Resolve a source owned by `owner_id` and check its mode.
///
/// # Errors
///
/// Returns `SourceNotFound` for a missing or foreign source and `WrongMode`
/// when the source is routed to another flow.
pub fn resolve_source(
    store: &dyn Store,
    owner_id: &str,
    source_id: &str,
    expected: SourceMode,
) -> SyncResult<Source> {
    let source = store
        .get_source(owner_id, source_id)?
        .ok_or_else(|| SyncError::SourceNotFound(source_id.to_string()))?;

    if source.mode != expected {
        return Err(SyncError::WrongMode {
            source_id: source.id,
            expected: expected.as_str().to_string(),
            actual: source.mode.as_str().to_string(),
        });
    }
    Ok(source)
}
