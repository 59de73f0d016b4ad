//! GitHub-tree sync.
//!
//! Pulls a repository's tree into the file rows of a `github` source. The
//! upstream snapshot is fetched completely before anything is written; any
//! fetch failure aborts the run with status `error`. Rows for files that
//! disappeared upstream are left in place.

use std::path::Path;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::diff::{diff, PathMatch};
use super::millis_to_rfc3339;
use super::run::{resolve_source, RunCounts, SyncRun};
use super::types::{SyncError, SyncResult, SyncSummary};
use crate::github::{GithubError, RepoFetcher, TreeEntry};
use crate::model::{now_millis, LocalFile, SourceMode, SyncFlow, SyncLogStatus};
use crate::storage::Store;

/// Extensions synced when the configuration does not override them.
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    "md", "mdx", "markdown", "txt", "rst", "adoc", "rs", "ts", "tsx", "js", "jsx", "mjs", "json",
    "toml", "yaml", "yml", "py", "go", "java", "kt", "rb", "c", "h", "cpp", "hpp", "cs", "swift",
    "html", "css", "scss", "sh", "sql", "graphql", "proto", "vue", "svelte",
];

/// Files above this size are skipped (512 KiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 512 * 1024;

/// Pause between blob fetches.
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(100);

/// Filtering and pacing for a GitHub sync.
#[derive(Debug, Clone)]
pub struct GithubSyncOptions {
    /// Lowercase extensions without the dot; a bare file name also matches
    pub extensions: Vec<String>,
    pub max_file_size: u64,
    pub request_delay: Duration,
}

impl Default for GithubSyncOptions {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(ToString::to_string).collect(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            request_delay: DEFAULT_REQUEST_DELAY,
        }
    }
}

impl GithubSyncOptions {
    /// Whether a tree entry should be synced at all.
    #[must_use]
    pub fn accepts(&self, entry: &TreeEntry) -> bool {
        if !entry.is_blob() || entry.size.unwrap_or(0) > self.max_file_size {
            return false;
        }
        let path = Path::new(&entry.path);
        let by_extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .is_some_and(|ext| self.extensions.iter().any(|a| *a == ext));
        let by_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| self.extensions.iter().any(|a| a == name));
        by_extension || by_name
    }
}

/// Run one GitHub sync pass for `source_id`.
///
/// # Errors
///
/// Returns an error for an unknown or non-`github` source, a malformed
/// `owner/repo` path, or any upstream failure. Upstream failures are also
/// recorded as an `error` sync log.
pub async fn sync_github<F: RepoFetcher>(
    store: &dyn Store,
    fetcher: &F,
    owner_id: &str,
    source_id: &str,
    options: &GithubSyncOptions,
    api_key_id: Option<&str>,
) -> SyncResult<SyncSummary> {
    let source = resolve_source(store, owner_id, source_id, SourceMode::Github)?;
    let owner = source.owner_id.clone();
    let (repo_owner, repo) = source.github_repo().ok_or_else(|| {
        SyncError::InvalidRequest(format!(
            "source path '{}' is not an owner/repo GitHub reference",
            source.path
        ))
    })?;

    let run = SyncRun::start(store, &owner, Some(&source.id), SyncFlow::Github, api_key_id)?;

    let snapshot = match fetch_snapshot(fetcher, repo_owner, repo, source.branch.as_deref(), options).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            run.fail(&e.to_string());
            return Err(SyncError::Upstream(e));
        }
    };

    let remote = match store.list_files(&owner, &source.id) {
        Ok(remote) => remote,
        Err(e) => {
            run.fail(&e.to_string());
            return Err(SyncError::Store(e));
        }
    };

    let changes = diff(&PathMatch, snapshot.files, &remote);
    debug!(
        source = %source.id,
        create = changes.to_create.len(),
        update = changes.to_update.len(),
        upstream_missing = changes.to_delete.len(),
        unchanged = changes.unchanged,
        "github sync diff"
    );

    let mut counts = RunCounts::default();
    let mut errors = Vec::new();

    for file in &changes.to_create {
        match store.upsert_file(&owner, &source.id, file) {
            Ok(_) => counts.added += 1,
            Err(e) => errors.push(format!("{}: {e}", file.path)),
        }
    }

    for update in &changes.to_update {
        match store.update_file(&owner, &update.remote.id, &update.patch) {
            Ok(_) => counts.updated += 1,
            Err(e) => errors.push(format!("{}: {e}", update.remote.path)),
        }
    }

    let status = run.finish(counts, &errors);

    let synced_at = if status == SyncLogStatus::Error {
        None
    } else {
        let now = now_millis();
        if let Err(e) = store.touch_source_synced(&owner, &source.id, now) {
            warn!(source = %source.id, error = %e, "failed to record synced_at");
        }
        millis_to_rfc3339(now)
    };

    info!(
        source = %source.id,
        repo = %format!("{repo_owner}/{repo}"),
        branch = %snapshot.branch,
        added = counts.added,
        updated = counts.updated,
        errors = errors.len(),
        status = status.as_str(),
        "github sync finished"
    );

    Ok(SyncSummary {
        files_added: counts.added,
        files_updated: counts.updated,
        files_deleted: 0,
        files_unchanged: changes.unchanged,
        errors,
        warnings: snapshot.warnings,
        failed_deletes: Vec::new(),
        status,
        dry_run: false,
        synced_at,
    })
}

struct Snapshot {
    branch: String,
    files: Vec<LocalFile>,
    warnings: Vec<String>,
}

async fn fetch_snapshot<F: RepoFetcher>(
    fetcher: &F,
    repo_owner: &str,
    repo: &str,
    branch: Option<&str>,
    options: &GithubSyncOptions,
) -> Result<Snapshot, GithubError> {
    let branch = match branch.map(str::trim).filter(|b| !b.is_empty()) {
        Some(branch) => branch.to_string(),
        None => fetcher.default_branch(repo_owner, repo).await?,
    };

    let tree = fetcher.tree(repo_owner, repo, &branch).await?;
    let mut warnings = Vec::new();
    if tree.truncated {
        warnings.push(format!(
            "GitHub truncated the tree for {repo_owner}/{repo}@{branch}; some files were not listed"
        ));
    }

    let candidates: Vec<&TreeEntry> = tree.entries.iter().filter(|e| options.accepts(e)).collect();
    debug!(
        listed = tree.entries.len(),
        accepted = candidates.len(),
        %branch,
        "github tree filtered"
    );

    let mut files = Vec::with_capacity(candidates.len());
    for (i, entry) in candidates.into_iter().enumerate() {
        let Some(url) = entry.url.as_deref() else {
            warnings.push(format!("{}: no blob URL, skipped", entry.path));
            continue;
        };
        if i > 0 && !options.request_delay.is_zero() {
            tokio::time::sleep(options.request_delay).await;
        }
        match fetcher.blob(url).await {
            Ok(text) => files.push(LocalFile::from_content(&entry.path, text)),
            Err(GithubError::Decode(reason)) => {
                warnings.push(format!("{}: {reason}, skipped", entry.path));
            }
            Err(e) => return Err(e),
        }
    }

    Ok(Snapshot {
        branch,
        files,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;
    use crate::github::RepoTree;
    use crate::model::Source;
    use crate::storage::SqliteStorage;

    #[derive(Default)]
    struct FakeRepo {
        default_branch: String,
        tree: RepoTree,
        blobs: HashMap<String, Result<String, u16>>,
        requested_branches: Mutex<Vec<String>>,
    }

    impl FakeRepo {
        fn new(files: &[(&str, &str)]) -> Self {
            let mut repo = Self {
                default_branch: "main".into(),
                ..Self::default()
            };
            for (path, content) in files {
                repo.add(path, content);
            }
            repo
        }

        fn add(&mut self, path: &str, content: &str) {
            let url = format!("blob://{path}");
            self.tree.entries.push(TreeEntry {
                path: path.to_string(),
                kind: "blob".into(),
                size: Some(content.len() as u64),
                url: Some(url.clone()),
                sha: String::new(),
            });
            self.blobs.insert(url, Ok(content.to_string()));
        }
    }

    impl RepoFetcher for FakeRepo {
        async fn default_branch(&self, _owner: &str, _repo: &str) -> Result<String, GithubError> {
            Ok(self.default_branch.clone())
        }

        async fn tree(&self, _owner: &str, _repo: &str, branch: &str) -> Result<RepoTree, GithubError> {
            self.requested_branches.lock().unwrap().push(branch.to_string());
            Ok(self.tree.clone())
        }

        async fn blob(&self, url: &str) -> Result<String, GithubError> {
            match self.blobs.get(url) {
                Some(Ok(text)) => Ok(text.clone()),
                Some(Err(status)) => Err(GithubError::Status {
                    status: *status,
                    message: "boom".into(),
                }),
                None => Err(GithubError::Decode("not utf-8".into())),
            }
        }
    }

    fn options() -> GithubSyncOptions {
        GithubSyncOptions {
            request_delay: Duration::ZERO,
            ..GithubSyncOptions::default()
        }
    }

    fn github_source(store: &dyn Store, branch: Option<&str>) -> Source {
        let mut source = Source::new("user_1", "Repo", SourceMode::Github, "https://github.com/acme/notes");
        source.branch = branch.map(ToString::to_string);
        store.insert_source(&source).unwrap();
        source
    }

    #[test]
    fn test_accepts_filters_kind_extension_and_size() {
        let opts = GithubSyncOptions {
            max_file_size: 10,
            ..GithubSyncOptions::default()
        };
        let entry = |path: &str, kind: &str, size: u64| TreeEntry {
            path: path.into(),
            kind: kind.into(),
            size: Some(size),
            url: None,
            sha: String::new(),
        };
        assert!(opts.accepts(&entry("docs/README.MD", "blob", 5)));
        assert!(!opts.accepts(&entry("docs", "tree", 0)));
        assert!(!opts.accepts(&entry("logo.png", "blob", 5)));
        assert!(!opts.accepts(&entry("big.md", "blob", 11)));
    }

    #[tokio::test]
    async fn test_sync_creates_then_is_idempotent() {
        let store = SqliteStorage::open_memory().unwrap();
        let source = github_source(&store, None);
        let mut repo = FakeRepo::new(&[("README.md", "# hi"), ("src/lib.rs", "fn x() {}")]);
        repo.add("logo.png", "binary");

        let first = sync_github(&store, &repo, "user_1", &source.id, &options(), None)
            .await
            .unwrap();
        assert_eq!(first.files_added, 2);
        assert_eq!(first.status, SyncLogStatus::Success);
        assert_eq!(repo.requested_branches.lock().unwrap()[0], "main");

        let second = sync_github(&store, &repo, "user_1", &source.id, &options(), None)
            .await
            .unwrap();
        assert_eq!(second.files_added, 0);
        assert_eq!(second.files_updated, 0);
        assert_eq!(second.files_unchanged, 2);

        let stored = store.get_source("user_1", &source.id).unwrap().unwrap();
        assert!(stored.synced_at.is_some());
    }

    #[tokio::test]
    async fn test_sync_updates_and_never_deletes() {
        let store = SqliteStorage::open_memory().unwrap();
        let source = github_source(&store, Some("dev"));
        let repo = FakeRepo::new(&[("a.md", "one"), ("b.md", "two")]);
        sync_github(&store, &repo, "user_1", &source.id, &options(), None)
            .await
            .unwrap();

        let repo = FakeRepo::new(&[("a.md", "one, edited")]);
        let result = sync_github(&store, &repo, "user_1", &source.id, &options(), None)
            .await
            .unwrap();
        assert_eq!(result.files_updated, 1);
        assert_eq!(result.files_deleted, 0);
        assert_eq!(repo.requested_branches.lock().unwrap()[0], "dev");
        assert_eq!(store.list_files("user_1", &source.id).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_truncated_tree_is_a_warning() {
        let store = SqliteStorage::open_memory().unwrap();
        let source = github_source(&store, None);
        let mut repo = FakeRepo::new(&[("a.md", "one")]);
        repo.tree.truncated = true;

        let result = sync_github(&store, &repo, "user_1", &source.id, &options(), None)
            .await
            .unwrap();
        assert_eq!(result.status, SyncLogStatus::Success);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("truncated"));
    }

    #[tokio::test]
    async fn test_upstream_failure_aborts_without_mutation() {
        let store = SqliteStorage::open_memory().unwrap();
        let source = github_source(&store, None);
        let mut repo = FakeRepo::new(&[("a.md", "one"), ("b.md", "two")]);
        repo.blobs.insert("blob://b.md".into(), Err(502));

        let err = sync_github(&store, &repo, "user_1", &source.id, &options(), Some("key_1"))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Upstream(_)));
        assert!(store.list_files("user_1", &source.id).unwrap().is_empty());

        let log = &store.list_sync_logs("user_1", Some(&source.id), 1).unwrap()[0];
        assert_eq!(log.status, SyncLogStatus::Error);
        assert!(log.error_message.as_deref().unwrap().contains("502"));
        assert!(store.get_source("user_1", &source.id).unwrap().unwrap().synced_at.is_none());
    }

    #[tokio::test]
    async fn test_undecodable_blob_is_skipped() {
        let store = SqliteStorage::open_memory().unwrap();
        let source = github_source(&store, None);
        let mut repo = FakeRepo::new(&[("a.md", "one"), ("b.md", "two")]);
        repo.blobs.remove("blob://b.md");

        let result = sync_github(&store, &repo, "user_1", &source.id, &options(), None)
            .await
            .unwrap();
        assert_eq!(result.files_added, 1);
        assert_eq!(result.warnings.len(), 1);
    }

    #[tokio::test]
    async fn test_rejects_non_github_source() {
        let store = SqliteStorage::open_memory().unwrap();
        let source = Source::new("user_1", "Bookmark", SourceMode::Link, "https://example.com");
        store.insert_source(&source).unwrap();
        let repo = FakeRepo::new(&[]);

        let err = sync_github(&store, &repo, "user_1", &source.id, &options(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::WrongMode { .. }));
        assert!(store.list_sync_logs("user_1", None, 5).unwrap().is_empty());
    }
}
