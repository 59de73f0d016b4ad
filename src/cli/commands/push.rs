//! `hub push`: collect a directory and sync it into a `local_sync` source.
//!
//! Paths removed since the previous push from the same root are sent as
//! `deleted_paths`, computed from the per-source push state.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use super::{block_on, print_problems, remote, report_sync};
use crate::cli::{Cli, PushArgs};
use crate::config::{HubConfig, PushState, read_push_state, write_push_state};
use crate::error::{Error, Result};
use crate::model::{SyncLogStatus, now_millis};
use crate::sync::{
    CollectOptions, DEFAULT_MAX_PUSH_SIZE, LocalSyncRequest, SyncSummary, collect_local,
};

/// Execute the push command.
///
/// # Errors
///
/// Returns an error if the directory cannot be read, the server is
/// unreachable or rejects the push, or every change failed.
pub fn execute(args: &PushArgs, cli: &Cli, json: bool) -> Result<()> {
    let config = HubConfig::load()?;
    let client = remote(cli, &config)?;

    let root = args
        .dir
        .canonicalize()
        .map_err(|e| Error::InvalidArgument(format!("{}: {e}", args.dir.display())))?;
    let root_str = root.to_string_lossy().to_string();

    let options = CollectOptions {
        include: args.include.clone(),
        exclude: args.exclude.clone(),
        max_file_size: args.max_size.unwrap_or(DEFAULT_MAX_PUSH_SIZE),
        ..CollectOptions::default()
    };
    let collected = collect_local(&root, &options)?;

    let current: BTreeSet<String> = collected.paths().into_iter().collect();
    let deleted_paths = read_push_state(&args.source)
        .map(|state| state.deleted_paths(&root_str, current.iter().map(String::as_str)))
        .unwrap_or_default();
    debug!(
        files = current.len(),
        deleted = deleted_paths.len(),
        skipped = collected.skipped.len(),
        "push prepared"
    );

    let request = LocalSyncRequest {
        source_id: args.source.clone(),
        files: collected.files,
        deleted_paths,
        dry_run: args.dry_run,
        delete_missing: args.delete_missing,
    };
    let summary = block_on(client.sync_local(&request))??;

    if !summary.dry_run && summary.status != SyncLogStatus::Error {
        let state = PushState {
            source_id: args.source.clone(),
            root: root_str,
            paths: next_state_paths(current, &summary),
            pushed_at: now_millis(),
        };
        if let Err(e) = write_push_state(&state) {
            warn!(source = %args.source, error = %e, "failed to save push state");
        }
    }

    if !json {
        let skipped: Vec<String> = collected.skipped.iter().map(|s| format!("skipped {s}")).collect();
        print_problems(&[], &skipped);
    }
    report_sync(&summary, json)
}

/// Paths to remember for the next push.
///
/// A path whose deletion failed stays in the state so the next push lists
/// it in `deleted_paths` again.
fn next_state_paths(current: BTreeSet<String>, summary: &SyncSummary) -> BTreeSet<String> {
    let mut paths = current;
    paths.extend(summary.failed_deletes.iter().cloned());
    paths
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_delete_is_resent_next_push() {
        let previous = PushState {
            source_id: "src_1".into(),
            root: "/notes".into(),
            paths: ["a.md", "b.md"].into_iter().map(String::from).collect(),
            pushed_at: 1,
        };
        let current: BTreeSet<String> = ["a.md".to_string()].into();
        assert_eq!(previous.deleted_paths("/notes", current.iter().map(String::as_str)), vec!["b.md"]);

        let summary = SyncSummary {
            files_added: 1,
            errors: vec!["b.md: injected failure".into()],
            failed_deletes: vec!["b.md".into()],
            status: SyncLogStatus::Partial,
            ..SyncSummary::default()
        };
        let saved = PushState {
            paths: next_state_paths(current.clone(), &summary),
            ..previous
        };
        assert_eq!(saved.deleted_paths("/notes", current.iter().map(String::as_str)), vec!["b.md"]);
    }

    #[test]
    fn test_successful_delete_is_forgotten() {
        let current: BTreeSet<String> = ["a.md".to_string()].into();
        let summary = SyncSummary {
            files_deleted: 1,
            status: SyncLogStatus::Success,
            ..SyncSummary::default()
        };
        assert_eq!(next_state_paths(current.clone(), &summary), current);
    }
}
