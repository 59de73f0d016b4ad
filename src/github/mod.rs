//! GitHub upstream access.
//!
//! The GitHub sync flow only needs three reads: a repository's default
//! branch, its recursive tree, and individual blobs. They sit behind
//! [`RepoFetcher`] so the orchestrator can run against a canned tree in
//! tests.

mod client;

pub use client::{GithubClient, DEFAULT_API_BASE};

use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from the GitHub API.
#[derive(Error, Debug)]
pub enum GithubError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GitHub returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("unexpected response: {0}")]
    Decode(String),
}

/// One entry of a recursive git tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub path: String,

    /// `blob`, `tree`, or `commit` (submodule)
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub size: Option<u64>,

    /// Blob API URL; absent for submodules
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub sha: String,
}

impl TreeEntry {
    #[must_use]
    pub fn is_blob(&self) -> bool {
        self.kind == "blob"
    }
}

/// A full repository tree listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoTree {
    #[serde(rename = "tree")]
    pub entries: Vec<TreeEntry>,

    /// Set by GitHub when the listing exceeded its limits
    #[serde(default)]
    pub truncated: bool,
}

/// Read access to a repository.
pub trait RepoFetcher: Send + Sync {
    /// The branch used when a source does not name one.
    fn default_branch(
        &self,
        owner: &str,
        repo: &str,
    ) -> impl Future<Output = Result<String, GithubError>> + Send;

    fn tree(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> impl Future<Output = Result<RepoTree, GithubError>> + Send;

    /// Fetch and decode one blob as UTF-8 text.
    fn blob(&self, url: &str) -> impl Future<Output = Result<String, GithubError>> + Send;
}
