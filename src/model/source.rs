//! Source model.
//!
//! A source is a named origin of content a user owns: a GitHub repository,
//! a bookmark-style link, or a locally synced directory tree.

use serde::{Deserialize, Serialize};

use super::{new_id, now_millis};

/// How a source's content arrives.
///
/// The mode decides which sync flow may target the source; a flow run
/// against a source of another mode is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceMode {
    /// `path` is `owner/repo`; synced from the GitHub tree API.
    Github,
    /// `path` is an opaque URL; never synced.
    Link,
    /// `path` is a local filesystem root pushed by the CLI.
    LocalSync,
}

impl SourceMode {
    /// Get the string representation for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Github => "github",
            Self::Link => "link",
            Self::LocalSync => "local_sync",
        }
    }
}

impl std::fmt::Display for SourceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SourceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "github" | "gh" => Ok(Self::Github),
            "link" | "url" => Ok(Self::Link),
            "local_sync" | "local" => Ok(Self::LocalSync),
            _ => Err(format!("Unknown source mode: {s}")),
        }
    }
}

/// A source owned by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Unique identifier (`src_` prefix)
    pub id: String,

    /// Owner identity used to scope every row
    pub owner_id: String,

    /// Display name
    pub name: String,

    /// Sync routing mode
    pub mode: SourceMode,

    /// `owner/repo`, URL, or local root depending on `mode`
    pub path: String,

    /// Branch to sync (GitHub only, defaults to the repository default)
    pub branch: Option<String>,

    pub description: Option<String>,

    /// Last successful or partial sync (Unix milliseconds)
    pub synced_at: Option<i64>,

    pub created_at: i64,
    pub updated_at: i64,
}

impl Source {
    /// Create a new source with a generated ID.
    pub fn new(owner_id: &str, name: &str, mode: SourceMode, path: &str) -> Self {
        let now = now_millis();
        Self {
            id: new_id("src"),
            owner_id: owner_id.to_string(),
            name: name.to_string(),
            mode,
            path: path.to_string(),
            branch: None,
            description: None,
            synced_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Split a GitHub source path into `(owner, repo)`.
    #[must_use]
    pub fn github_repo(&self) -> Option<(&str, &str)> {
        parse_github_repo(&self.path)
    }
}

/// Split `owner/repo` or `https://github.com/owner/repo(.git)`.
#[must_use]
pub fn parse_github_repo(path: &str) -> Option<(&str, &str)> {
    let trimmed = path
        .trim()
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_start_matches("github.com/")
        .trim_end_matches('/');
    let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);

    let (owner, repo) = trimmed.split_once('/')?;
    if owner.is_empty() || repo.is_empty() || repo.contains('/') {
        return None;
    }
    Some((owner, repo))
}

/// Request body for creating a source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSource {
    pub name: String,
    pub mode: SourceMode,
    pub path: String,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl NewSource {
    /// Materialize into a stored source for `owner_id`.
    #[must_use]
    pub fn into_source(self, owner_id: &str) -> Source {
        let mut source = Source::new(owner_id, &self.name, self.mode, &self.path);
        source.branch = self.branch.filter(|b| !b.trim().is_empty());
        source.description = self.description;
        source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_source() {
        let source = Source::new("user_1", "Notes", SourceMode::LocalSync, "/home/me/notes");
        assert!(source.id.starts_with("src_"));
        assert_eq!(source.id.len(), 16);
        assert_eq!(source.mode, SourceMode::LocalSync);
        assert!(source.synced_at.is_none());
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("github".parse::<SourceMode>().unwrap(), SourceMode::Github);
        assert_eq!("local-sync".parse::<SourceMode>().unwrap(), SourceMode::LocalSync);
        assert_eq!("LOCAL".parse::<SourceMode>().unwrap(), SourceMode::LocalSync);
        assert!("ftp".parse::<SourceMode>().is_err());
    }

    #[test]
    fn test_github_repo_forms() {
        let mut source = Source::new("u", "r", SourceMode::Github, "rust-lang/rust");
        assert_eq!(source.github_repo(), Some(("rust-lang", "rust")));

        source.path = "https://github.com/tokio-rs/axum.git".to_string();
        assert_eq!(source.github_repo(), Some(("tokio-rs", "axum")));

        source.path = "not-a-repo".to_string();
        assert_eq!(source.github_repo(), None);

        source.path = "a/b/c".to_string();
        assert_eq!(source.github_repo(), None);
    }

    #[test]
    fn test_mode_serde() {
        let json = serde_json::to_string(&SourceMode::LocalSync).unwrap();
        assert_eq!(json, "\"local_sync\"");
    }
}
