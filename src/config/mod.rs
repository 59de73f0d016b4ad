//! Configuration management.
//!
//! Everything the hub keeps outside the database lives under one directory,
//! `~/.hub/` by default (`HUB_HOME` overrides it):
//!
//! - `config.json`: server URL, API key, GitHub settings
//! - `hub.db`: the default database for `hub serve` and `hub init`
//! - `state/<source_id>.json`: paths last pushed per local source
//!
//! Every resolver follows the same priority: explicit flag (clap also folds
//! the matching environment variable into the flag) → config file → default.

mod push_state;

pub use push_state::{PushState, clear_push_state, read_push_state, write_push_state};

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::sync::{GithubSyncOptions, atomic_write};

/// Default address of `hub serve`.
pub const DEFAULT_BIND: &str = "127.0.0.1:8787";

/// Default server URL the CLI talks to.
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8787";

const CONFIG_FILE: &str = "config.json";
const DB_FILE: &str = "hub.db";

/// Get the hub directory.
///
/// `HUB_HOME` wins when set; otherwise `~/.hub/`.
#[must_use]
pub fn hub_dir() -> Option<PathBuf> {
    if let Ok(home) = std::env::var("HUB_HOME") {
        if !home.trim().is_empty() {
            return Some(PathBuf::from(home));
        }
    }
    directories::BaseDirs::new().map(|b| b.home_dir().join(".hub"))
}

/// GitHub sync settings in the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    pub max_file_size: Option<u64>,
    pub request_delay_ms: Option<u64>,
    pub extensions: Option<Vec<String>>,
}

/// Contents of `config.json`. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    pub server_url: Option<String>,
    pub api_key: Option<String>,
    pub github_token: Option<String>,
    pub bind: Option<String>,
    pub db_path: Option<PathBuf>,
    pub github: GithubConfig,
}

impl HubConfig {
    /// Path of the config file, if a hub directory can be determined.
    #[must_use]
    pub fn path() -> Option<PathBuf> {
        hub_dir().map(|dir| dir.join(CONFIG_FILE))
    }

    /// Load the config file. A missing file is an empty config.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but is unreadable or malformed.
    pub fn load() -> Result<Self> {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load from an explicit path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but is unreadable or malformed.
    pub fn load_from(path: &Path) -> Result<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&text)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    /// Write the config file atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        atomic_write(path, &json)?;
        debug!(path = %path.display(), "config saved");
        Ok(())
    }

    /// Write to the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no home directory or the write fails.
    pub fn save(&self) -> Result<()> {
        let path = Self::path()
            .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;
        self.save_to(&path)
    }

    /// GitHub sync options with configured overrides applied.
    #[must_use]
    pub fn github_options(&self) -> GithubSyncOptions {
        let mut options = GithubSyncOptions::default();
        if let Some(size) = self.github.max_file_size {
            options.max_file_size = size;
        }
        if let Some(ms) = self.github.request_delay_ms {
            options.request_delay = Duration::from_millis(ms);
        }
        if let Some(exts) = &self.github.extensions {
            options.extensions = exts
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect();
        }
        options
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}

/// Resolve the hub server URL for remote commands.
#[must_use]
pub fn resolve_server_url(explicit: Option<&str>, config: &HubConfig) -> String {
    non_empty(explicit)
        .or_else(|| non_empty(config.server_url.as_deref()))
        .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string())
        .trim_end_matches('/')
        .to_string()
}

/// Resolve the API key for remote commands.
///
/// # Errors
///
/// Returns a configuration error when no key is set anywhere.
pub fn resolve_api_key(explicit: Option<&str>, config: &HubConfig) -> Result<String> {
    non_empty(explicit)
        .or_else(|| non_empty(config.api_key.as_deref()))
        .ok_or_else(|| Error::Config("No API key configured".to_string()))
}

/// Resolve the database path.
///
/// Priority:
/// 1. `--db` flag or `HUB_DB`
/// 2. `db_path` in the config file
/// 3. `<hub dir>/hub.db`
#[must_use]
pub fn resolve_db_path(explicit: Option<&Path>, config: &HubConfig) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(path) = &config.db_path {
        return Some(path.clone());
    }
    hub_dir().map(|dir| dir.join(DB_FILE))
}

/// Resolve the address `hub serve` binds to.
#[must_use]
pub fn resolve_bind(explicit: Option<&str>, config: &HubConfig) -> String {
    non_empty(explicit)
        .or_else(|| non_empty(config.bind.as_deref()))
        .unwrap_or_else(|| DEFAULT_BIND.to_string())
}

/// Resolve the GitHub token used by the server.
#[must_use]
pub fn resolve_github_token(explicit: Option<&str>, config: &HubConfig) -> Option<String> {
    non_empty(explicit).or_else(|| non_empty(config.github_token.as_deref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_db_path_priority() {
        let explicit = PathBuf::from("/custom/hub.db");
        let config = HubConfig {
            db_path: Some(PathBuf::from("/from/config.db")),
            ..HubConfig::default()
        };

        assert_eq!(resolve_db_path(Some(&explicit), &config), Some(explicit));
        assert_eq!(
            resolve_db_path(None, &config),
            Some(PathBuf::from("/from/config.db"))
        );

        let default = resolve_db_path(None, &HubConfig::default()).unwrap();
        assert!(default.ends_with("hub.db"));
    }

    #[test]
    fn test_resolve_server_url_and_key() {
        let config = HubConfig {
            server_url: Some("https://hub.example.com/".into()),
            api_key: Some("hub_from_config".into()),
            ..HubConfig::default()
        };

        assert_eq!(resolve_server_url(None, &config), "https://hub.example.com");
        assert_eq!(
            resolve_server_url(Some("http://localhost:9000"), &config),
            "http://localhost:9000"
        );
        assert_eq!(
            resolve_server_url(None, &HubConfig::default()),
            DEFAULT_SERVER_URL
        );

        assert_eq!(resolve_api_key(Some(" hub_flag "), &config).unwrap(), "hub_flag");
        assert_eq!(resolve_api_key(None, &config).unwrap(), "hub_from_config");

        let err = resolve_api_key(Some(""), &HubConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.hint().is_some());
    }

    #[test]
    fn test_config_round_trip_and_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        assert_eq!(HubConfig::load_from(&path).unwrap(), HubConfig::default());

        let config = HubConfig {
            server_url: Some("http://127.0.0.1:9999".into()),
            github: GithubConfig {
                max_file_size: Some(1024),
                request_delay_ms: Some(0),
                extensions: Some(vec![".MD".into(), "rs".into()]),
            },
            ..HubConfig::default()
        };
        config.save_to(&path).unwrap();
        let loaded = HubConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);

        let options = loaded.github_options();
        assert_eq!(options.max_file_size, 1024);
        assert_eq!(options.request_delay, Duration::ZERO);
        assert_eq!(options.extensions, vec!["md", "rs"]);
    }

    #[test]
    fn test_malformed_config_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(HubConfig::load_from(&path), Err(Error::Config(_))));
    }
}
