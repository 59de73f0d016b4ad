//! Diff engine.
//!
//! Partitions a local record set against a remote snapshot into creates,
//! updates (with minimal patches), and deletes. The pairing rule and the
//! compared fields come from a [`MatchStrategy`]; files and ideas each have
//! one.
//!
//! Accounting always holds:
//! `to_create + matched == local` and `to_delete + matched == remote`, where
//! `matched == to_update + unchanged`.

use std::collections::HashMap;
use std::hash::Hash;

use crate::model::{FilePatch, FileRecord, Idea, IdeaDraft, IdeaPatch, LocalFile};

/// How local and remote records correspond, and which fields are compared.
pub trait MatchStrategy {
    type Local;
    type Remote;
    type Key: Eq + Hash;
    type Patch;

    fn local_key(&self, local: &Self::Local) -> Self::Key;

    fn remote_key(&self, remote: &Self::Remote) -> Self::Key;

    /// The changed fields, or `None` when the pair is identical.
    fn changes(&self, local: &Self::Local, remote: &Self::Remote) -> Option<Self::Patch>;
}

/// A matched pair whose fields differ.
#[derive(Debug)]
pub struct PendingUpdate<'r, R, P> {
    pub remote: &'r R,
    pub patch: P,
}

/// Result of a diff pass.
#[derive(Debug)]
pub struct Diff<'r, L, R, P> {
    pub to_create: Vec<L>,
    pub to_update: Vec<PendingUpdate<'r, R, P>>,
    pub to_delete: Vec<&'r R>,
    pub unchanged: usize,
}

impl<L, R, P> Diff<'_, L, R, P> {
    /// Whether applying this diff would change nothing.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.to_create.is_empty() && self.to_update.is_empty() && self.to_delete.is_empty()
    }

    #[must_use]
    pub fn matched(&self) -> usize {
        self.to_update.len() + self.unchanged
    }
}

/// Compute the change set turning `remote` into `local`.
///
/// Remote records are indexed by key (first occurrence wins). Each local
/// record claims its counterpart at most once: a later local record with an
/// already claimed key becomes a create. Remote records never claimed,
/// including remote duplicates of a claimed key, land in `to_delete`.
pub fn diff<'r, S>(
    strategy: &S,
    local: Vec<S::Local>,
    remote: &'r [S::Remote],
) -> Diff<'r, S::Local, S::Remote, S::Patch>
where
    S: MatchStrategy,
{
    let mut index: HashMap<S::Key, usize> = HashMap::with_capacity(remote.len());
    for (i, record) in remote.iter().enumerate() {
        index.entry(strategy.remote_key(record)).or_insert(i);
    }

    let mut claimed = vec![false; remote.len()];
    let mut result = Diff {
        to_create: Vec::new(),
        to_update: Vec::new(),
        to_delete: Vec::new(),
        unchanged: 0,
    };

    for record in local {
        let key = strategy.local_key(&record);
        match index.get(&key).copied() {
            Some(i) if !claimed[i] => {
                claimed[i] = true;
                let counterpart = &remote[i];
                match strategy.changes(&record, counterpart) {
                    Some(patch) => result.to_update.push(PendingUpdate {
                        remote: counterpart,
                        patch,
                    }),
                    None => result.unchanged += 1,
                }
            }
            _ => result.to_create.push(record),
        }
    }

    result.to_delete = remote
        .iter()
        .zip(&claimed)
        .filter(|(_, claimed)| !**claimed)
        .map(|(record, _)| record)
        .collect();

    result
}

// ==================
// Files: match by path
// ==================

/// Files correspond when they share a path within one source.
///
/// Compared fields are the fingerprint, size, and MIME type. A fingerprint
/// change carries the new content with it.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathMatch;

impl MatchStrategy for PathMatch {
    type Local = LocalFile;
    type Remote = FileRecord;
    type Key = String;
    type Patch = FilePatch;

    fn local_key(&self, local: &LocalFile) -> String {
        local.path.clone()
    }

    fn remote_key(&self, remote: &FileRecord) -> String {
        remote.path.clone()
    }

    fn changes(&self, local: &LocalFile, remote: &FileRecord) -> Option<FilePatch> {
        let mut patch = FilePatch::default();

        if local.file_hash != remote.file_hash {
            patch.file_hash = Some(local.file_hash.clone());
            patch.content = Some(local.content.clone());
        }
        if local.size != remote.size {
            patch.size = Some(local.size);
        }
        if local.mime_type != remote.mime_type {
            patch.mime_type = Some(local.mime_type.clone());
        }

        (!patch.is_empty()).then_some(patch)
    }
}

// ==================
// Ideas: match by normalized content
// ==================

/// Ideas correspond when their normalized content is equal.
///
/// Any edit to an idea's text breaks the pairing: the edited line is seen
/// as a new idea and the old row as remote-only.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentMatch;

/// Matching key for ideas: trimmed and lowercased.
#[must_use]
pub fn normalize_content(content: &str) -> String {
    content.trim().to_lowercase()
}

fn same_set(a: &[String], b: &[String]) -> bool {
    let mut a: Vec<&String> = a.iter().collect();
    let mut b: Vec<&String> = b.iter().collect();
    a.sort();
    a.dedup();
    b.sort();
    b.dedup();
    a == b
}

impl MatchStrategy for ContentMatch {
    type Local = IdeaDraft;
    type Remote = Idea;
    type Key = String;
    type Patch = IdeaPatch;

    fn local_key(&self, local: &IdeaDraft) -> String {
        normalize_content(&local.content)
    }

    fn remote_key(&self, remote: &Idea) -> String {
        normalize_content(&remote.content)
    }

    fn changes(&self, local: &IdeaDraft, remote: &Idea) -> Option<IdeaPatch> {
        let patch = IdeaPatch {
            status: (local.status != remote.status).then_some(local.status),
            done: (local.done != remote.done).then_some(local.done),
            tags: (!same_set(&local.tags, &remote.tags)).then(|| local.tags.clone()),
            refs: (!same_set(&local.refs, &remote.refs)).then(|| local.refs.clone()),
        };

        (!patch.is_empty()).then_some(patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::IdeaStatus;

    fn remote_file(id: &str, path: &str, content: &str) -> FileRecord {
        let local = LocalFile::from_content(path, content.to_string());
        FileRecord {
            id: id.to_string(),
            owner_id: "user_1".into(),
            source_id: "src_1".into(),
            path: local.path,
            name: local.name,
            content: local.content,
            size: local.size,
            mime_type: local.mime_type,
            file_hash: local.file_hash,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn remote_idea(id: &str, content: &str, status: IdeaStatus) -> Idea {
        Idea {
            id: id.to_string(),
            owner_id: "user_1".into(),
            content: content.to_string(),
            status,
            done: false,
            tags: Vec::new(),
            refs: Vec::new(),
            created_at: 0,
            updated_at: 0,
        }
    }

    fn draft(content: &str, status: IdeaStatus) -> IdeaDraft {
        IdeaDraft {
            content: content.to_string(),
            status,
            done: false,
            tags: Vec::new(),
            refs: Vec::new(),
        }
    }

    #[test]
    fn test_remote_only_file_is_deleted() {
        let local = vec![LocalFile::from_content("a.txt", "hash1".into())];
        let remote = vec![
            remote_file("f1", "a.txt", "hash1"),
            remote_file("f2", "b.txt", "hash2"),
        ];

        let result = diff(&PathMatch, local, &remote);
        assert!(result.to_create.is_empty());
        assert!(result.to_update.is_empty());
        assert_eq!(result.to_delete.len(), 1);
        assert_eq!(result.to_delete[0].path, "b.txt");
        assert_eq!(result.unchanged, 1);
    }

    #[test]
    fn test_changed_file_patch_carries_content() {
        let local = vec![LocalFile::from_content("a.txt", "new body".into())];
        let remote = vec![remote_file("f1", "a.txt", "old")];

        let result = diff(&PathMatch, local, &remote);
        assert_eq!(result.to_update.len(), 1);
        let update = &result.to_update[0];
        assert_eq!(update.remote.id, "f1");
        assert_eq!(update.patch.content, Some(Some("new body".to_string())));
        assert_eq!(update.patch.size, Some(8));
        assert!(update.patch.mime_type.is_none());
        assert!(update.patch.name.is_none());
    }

    #[test]
    fn test_second_run_is_idempotent() {
        let files = ["a.md", "b.md", "c/d.md"];
        let remote: Vec<FileRecord> = files
            .iter()
            .enumerate()
            .map(|(i, p)| remote_file(&format!("f{i}"), p, p))
            .collect();
        let local: Vec<LocalFile> = files
            .iter()
            .map(|p| LocalFile::from_content(p, (*p).to_string()))
            .collect();

        let result = diff(&PathMatch, local, &remote);
        assert!(result.is_noop());
        assert_eq!(result.unchanged, files.len());
    }

    #[test]
    fn test_accounting_holds() {
        let local = vec![
            draft("one", IdeaStatus::Inbox),
            draft("two", IdeaStatus::Active),
            draft("three", IdeaStatus::Inbox),
            draft("ONE ", IdeaStatus::Inbox),
        ];
        let remote = vec![
            remote_idea("i1", "one", IdeaStatus::Inbox),
            remote_idea("i2", "two", IdeaStatus::Inbox),
            remote_idea("i3", "four", IdeaStatus::Inbox),
            remote_idea("i4", "Two", IdeaStatus::Inbox),
        ];
        let (n_local, n_remote) = (local.len(), remote.len());

        let result = diff(&ContentMatch, local, &remote);
        assert_eq!(result.to_create.len() + result.matched(), n_local);
        assert_eq!(result.to_delete.len() + result.matched(), n_remote);
    }

    #[test]
    fn test_duplicate_local_key_becomes_create() {
        let local = vec![draft("Buy milk", IdeaStatus::Inbox), draft("buy milk", IdeaStatus::Inbox)];
        let remote = vec![remote_idea("i1", "Buy milk", IdeaStatus::Inbox)];

        let result = diff(&ContentMatch, local, &remote);
        assert_eq!(result.unchanged, 1);
        assert_eq!(result.to_create.len(), 1);
        assert_eq!(result.to_create[0].content, "buy milk");
        assert!(result.to_delete.is_empty());
    }

    #[test]
    fn test_content_match_ignores_case_and_whitespace() {
        let local = vec![draft(" buy MILK ", IdeaStatus::Inbox)];
        let remote = vec![remote_idea("i1", "Buy milk", IdeaStatus::Inbox)];

        let result = diff(&ContentMatch, local, &remote);
        assert_eq!(result.unchanged, 1);
        assert!(result.is_noop());
    }

    #[test]
    fn test_idea_patch_only_changed_fields() {
        let mut local = draft("Ship it", IdeaStatus::Archive);
        local.done = true;
        local.tags = vec!["b".into(), "a".into()];
        let mut remote = remote_idea("i1", "ship it", IdeaStatus::Active);
        remote.tags = vec!["a".into(), "b".into()];

        let remote = vec![remote];
        let result = diff(&ContentMatch, vec![local], &remote);
        let patch = &result.to_update[0].patch;
        assert_eq!(patch.status, Some(IdeaStatus::Archive));
        assert_eq!(patch.done, Some(true));
        assert!(patch.tags.is_none(), "tag order must not matter");
        assert!(patch.refs.is_none());
    }

    #[test]
    fn test_edited_idea_is_create_plus_orphan() {
        let local = vec![draft("Buy oat milk", IdeaStatus::Inbox)];
        let remote = vec![remote_idea("i1", "Buy milk", IdeaStatus::Inbox)];

        let result = diff(&ContentMatch, local, &remote);
        assert_eq!(result.to_create.len(), 1);
        assert_eq!(result.to_delete.len(), 1);
        assert_eq!(result.to_delete[0].id, "i1");
    }
}
