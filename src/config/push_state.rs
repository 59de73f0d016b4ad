//! Per-source push state.
//!
//! `hub push` records which paths it sent for a source so the next push can
//! tell the server which files disappeared locally. One JSON file per source
//! under `<hub dir>/state/`, written temp-then-rename with owner-only
//! permissions.

use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::hub_dir;

/// Paths last pushed for one source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushState {
    pub source_id: String,

    /// Local root the paths are relative to
    pub root: String,

    pub paths: BTreeSet<String>,

    /// Unix milliseconds of the push that wrote this state
    pub pushed_at: i64,
}

impl PushState {
    /// Paths pushed last time that are missing from `current`.
    ///
    /// Only meaningful when the push comes from the same root; a different
    /// root yields nothing.
    #[must_use]
    pub fn deleted_paths<'a, I>(&self, root: &str, current: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        if self.root != root {
            return Vec::new();
        }
        let current: BTreeSet<&str> = current.into_iter().collect();
        self.paths
            .iter()
            .filter(|p| !current.contains(p.as_str()))
            .cloned()
            .collect()
    }
}

fn state_dir() -> Option<PathBuf> {
    hub_dir().map(|dir| dir.join("state"))
}

/// Sanitize a source id for use as a filename.
fn sanitize_key(key: &str) -> Option<String> {
    let sanitized: String = key
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .take(100)
        .collect();

    if sanitized.is_empty() {
        None
    } else {
        Some(sanitized)
    }
}

fn state_path(dir: &Path, source_id: &str) -> Option<PathBuf> {
    sanitize_key(source_id).map(|key| dir.join(format!("{key}.json")))
}

/// Read the push state for a source.
///
/// Returns `None` if there is none yet or the file is corrupted.
#[must_use]
pub fn read_push_state(source_id: &str) -> Option<PushState> {
    read_push_state_in(&state_dir()?, source_id)
}

fn read_push_state_in(dir: &Path, source_id: &str) -> Option<PushState> {
    let path = state_path(dir, source_id)?;
    let content = fs::read_to_string(&path).ok()?;
    match serde_json::from_str::<PushState>(&content) {
        Ok(state) if state.source_id == source_id => Some(state),
        Ok(_) => None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring corrupted push state");
            None
        }
    }
}

/// Write the push state for a source.
///
/// # Errors
///
/// Returns an error if the state directory or file cannot be written.
pub fn write_push_state(state: &PushState) -> std::io::Result<()> {
    let dir = state_dir().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::NotFound, "no home directory")
    })?;
    write_push_state_in(&dir, state)
}

fn write_push_state_in(dir: &Path, state: &PushState) -> std::io::Result<()> {
    let path = state_path(dir, &state.source_id).ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty source id")
    })?;
    fs::create_dir_all(dir)?;

    let json = serde_json::to_string_pretty(state)?;
    let temp_path = path.with_extension("json.tmp");
    {
        let mut opts = fs::OpenOptions::new();
        opts.write(true).create(true).truncate(true);
        #[cfg(unix)]
        opts.mode(0o600);
        let mut file = opts.open(&temp_path)?;
        file.write_all(json.as_bytes())?;
        file.flush()?;
    }
    fs::rename(&temp_path, &path)
}

/// Forget the push state for a source. Missing state is not an error.
pub fn clear_push_state(source_id: &str) -> bool {
    let Some(path) = state_dir().and_then(|dir| state_path(&dir, source_id)) else {
        return false;
    };
    match fs::remove_file(&path) {
        Ok(()) => true,
        Err(e) => e.kind() == std::io::ErrorKind::NotFound,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(root: &str, paths: &[&str]) -> PushState {
        PushState {
            source_id: "src_abc".into(),
            root: root.into(),
            paths: paths.iter().map(ToString::to_string).collect(),
            pushed_at: 1,
        }
    }

    #[test]
    fn test_sanitize_key() {
        assert_eq!(sanitize_key("src_1a2b"), Some("src_1a2b".to_string()));
        assert_eq!(sanitize_key("../etc/passwd"), Some("___etc_passwd".to_string()));
        assert_eq!(sanitize_key("   "), None);
    }

    #[test]
    fn test_deleted_paths() {
        let previous = state("/notes", &["a.md", "b.md", "c/d.md"]);
        assert_eq!(
            previous.deleted_paths("/notes", ["a.md", "new.md"]),
            vec!["b.md", "c/d.md"]
        );
        assert!(previous.deleted_paths("/elsewhere", ["a.md"]).is_empty());
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let written = state("/notes", &["a.md"]);
        write_push_state_in(dir.path(), &written).unwrap();

        assert_eq!(read_push_state_in(dir.path(), "src_abc"), Some(written));
        assert_eq!(read_push_state_in(dir.path(), "src_other"), None);
        assert!(!dir.path().join("src_abc.json.tmp").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_state_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        write_push_state_in(dir.path(), &state("/n", &[])).unwrap();
        let mode = fs::metadata(dir.path().join("src_abc.json"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_corrupted_state_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("src_abc.json"), "not json").unwrap();
        assert_eq!(read_push_state_in(dir.path(), "src_abc"), None);
    }
}
