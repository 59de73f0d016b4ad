//! Ideas push and pull.
//!
//! Ideas carry no stable identifier in the flat file, so local and stored
//! ideas pair up by normalized content. Push preserves remote-only ideas
//! unless `delete_remote` is set. Pull regenerates the file from the stored
//! ideas, optionally keeping local-only lines.

use std::collections::HashSet;

use serde::Serialize;
use tracing::info;

use super::diff::{diff, normalize_content, ContentMatch};
use super::run::{RunCounts, SyncRun};
use super::types::{IdeasPushSummary, SyncError, SyncResult};
use crate::ideas::{generate, IdeaLine, IdeasDocument};
use crate::model::{Idea, IdeaDraft, SyncFlow};
use crate::storage::Store;

/// Push local ideas to the store.
///
/// # Errors
///
/// Returns an error for a draft with empty or multi-line content, or when
/// the stored ideas cannot be read. Per-idea failures are reported in the summary.
pub fn push_ideas(
    store: &dyn Store,
    owner_id: &str,
    drafts: Vec<IdeaDraft>,
    delete_remote: bool,
    api_key_id: Option<&str>,
) -> SyncResult<IdeasPushSummary> {
    if drafts.iter().any(|d| d.content.trim().is_empty()) {
        return Err(SyncError::InvalidRequest(
            "idea content must not be empty".to_string(),
        ));
    }
    if drafts.iter().any(|d| d.content.contains(['\n', '\r'])) {
        return Err(SyncError::InvalidRequest(
            "idea content must be a single line".to_string(),
        ));
    }

    let run = SyncRun::start(store, owner_id, None, SyncFlow::Ideas, api_key_id)?;
    let remote = match store.list_ideas(owner_id) {
        Ok(remote) => remote,
        Err(e) => {
            run.fail(&e.to_string());
            return Err(e.into());
        }
    };
    let changes = diff(&ContentMatch, drafts, &remote);

    let mut counts = RunCounts::default();
    let mut errors = Vec::new();

    for draft in &changes.to_create {
        match store.insert_idea(owner_id, draft) {
            Ok(_) => counts.added += 1,
            Err(e) => errors.push(format!("{}: {e}", draft.content)),
        }
    }

    for update in &changes.to_update {
        match store.update_idea(owner_id, &update.remote.id, &update.patch) {
            Ok(_) => counts.updated += 1,
            Err(e) => errors.push(format!("{}: {e}", update.remote.content)),
        }
    }

    let mut kept = 0;
    if delete_remote {
        for idea in &changes.to_delete {
            match store.delete_idea(owner_id, &idea.id) {
                Ok(n) => counts.deleted += n,
                Err(e) => errors.push(format!("{}: {e}", idea.content)),
            }
        }
    } else {
        kept = changes.to_delete.len();
    }

    let status = run.finish(counts, &errors);
    info!(
        added = counts.added,
        updated = counts.updated,
        deleted = counts.deleted,
        kept,
        errors = errors.len(),
        status = status.as_str(),
        "ideas push finished"
    );

    Ok(IdeasPushSummary {
        ideas_added: counts.added,
        ideas_updated: counts.updated,
        ideas_deleted: counts.deleted,
        ideas_unchanged: changes.unchanged,
        ideas_kept: kept,
        errors,
        status,
    })
}

/// Result of a pull: the regenerated file and what went into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullOutcome {
    pub text: String,
    pub remote_count: usize,

    /// Local-only ideas carried over by a merge
    pub kept_local: usize,
}

/// Build the ideas file from stored ideas.
///
/// Without `merge` the result reflects the store alone. With `merge`,
/// local ideas whose normalized content matches no stored idea are kept.
#[must_use]
pub fn pull_ideas(remote: &[Idea], local: Option<&IdeasDocument>, merge: bool) -> PullOutcome {
    let mut lines: Vec<IdeaLine> = remote.iter().map(IdeaLine::from).collect();
    let mut kept_local = 0;

    if merge {
        if let Some(local) = local {
            let known: HashSet<String> = remote.iter().map(|i| normalize_content(&i.content)).collect();
            for idea in local.iter().filter(|i| !known.contains(&normalize_content(&i.content))) {
                lines.push(IdeaLine::from(idea));
                kept_local += 1;
            }
        }
    }

    PullOutcome {
        text: generate(&lines),
        remote_count: remote.len(),
        kept_local,
    }
}
