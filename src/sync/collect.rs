//! Local directory collection for `hub push`.
//!
//! Walks a root, applies include/exclude globs against `/`-separated
//! relative paths, and reads every remaining text file into a [`FileUpload`].
//! Binary (non-UTF-8) and oversized files are skipped and reported.

use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::model::{FileUpload, LocalFile};

/// Excluded no matter what the caller passes.
pub const DEFAULT_EXCLUDES: &[&str] = &["**/.git/**", "**/target/**", "**/node_modules/**"];

/// Default upper bound for a pushed file (1 MiB).
pub const DEFAULT_MAX_PUSH_SIZE: u64 = 1024 * 1024;

#[derive(Debug, Clone)]
pub struct CollectOptions {
    /// Empty means everything
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub max_file_size: u64,
    pub follow_symlinks: bool,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            include: Vec::new(),
            exclude: Vec::new(),
            max_file_size: DEFAULT_MAX_PUSH_SIZE,
            follow_symlinks: false,
        }
    }
}

/// Files gathered from a local root.
#[derive(Debug, Default)]
pub struct Collected {
    /// Sorted by path
    pub files: Vec<FileUpload>,
    /// `path: reason` for every file left out
    pub skipped: Vec<String>,
}

impl Collected {
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        self.files.iter().map(|f| f.path.clone()).collect()
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|e| Error::InvalidArgument(format!("bad glob '{pattern}': {e}")))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| Error::InvalidArgument(format!("bad glob set: {e}")))
}

/// Collect the text files under `root`.
///
/// # Errors
///
/// Returns an error if the root does not exist, a glob is malformed, or the
/// walk itself fails.
pub fn collect_local(root: &Path, options: &CollectOptions) -> Result<Collected> {
    if !root.is_dir() {
        return Err(Error::InvalidArgument(format!(
            "not a directory: {}",
            root.display()
        )));
    }

    let include_set = if options.include.is_empty() {
        None
    } else {
        Some(build_globset(&options.include)?)
    };

    let mut excludes: Vec<String> = DEFAULT_EXCLUDES.iter().map(ToString::to_string).collect();
    excludes.extend(options.exclude.iter().cloned());
    let exclude_set = build_globset(&excludes)?;

    let mut collected = Collected::default();

    let walker = WalkDir::new(root).follow_links(options.follow_symlinks);
    for entry in walker {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().replace('\\', "/");

        if exclude_set.is_match(&rel_str) {
            trace!(path = %rel_str, "excluded");
            continue;
        }
        if include_set.as_ref().is_some_and(|set| !set.is_match(&rel_str)) {
            continue;
        }

        let size = entry.metadata().map_err(std::io::Error::from)?.len();
        if size > options.max_file_size {
            collected
                .skipped
                .push(format!("{rel_str}: {size} bytes exceeds {}", options.max_file_size));
            continue;
        }

        let Ok(content) = std::fs::read_to_string(path) else {
            collected.skipped.push(format!("{rel_str}: not UTF-8 text"));
            continue;
        };

        let local = LocalFile::from_content(&rel_str, content);
        collected.files.push(FileUpload {
            path: local.path,
            name: Some(local.name),
            content: local.content,
            size: Some(local.size),
            mime_type: Some(local.mime_type),
            file_hash: Some(local.file_hash),
        });
    }

    // Sort for deterministic ordering
    collected.files.sort_by(|a, b| a.path.cmp(&b.path));
    debug!(
        root = %root.display(),
        files = collected.files.len(),
        skipped = collected.skipped.len(),
        "collected local files"
    );

    Ok(collected)
}
