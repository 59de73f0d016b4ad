//! Error types for the Hub CLI and server.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (2=store, 3=not_found, 4=validation, etc.)
//! - Context-aware recovery hints
//! - Structured JSON output for piped / non-TTY consumers

use std::path::PathBuf;
use thiserror::Error;

use crate::github::GithubError;
use crate::storage::StoreError;
use crate::sync::SyncError;

/// Result type alias for Hub operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Store (exit 2)
    NotInitialized,
    StoreError,
    Conflict,

    // Not Found (exit 3)
    SourceNotFound,
    NotFound,

    // Validation (exit 4)
    InvalidArgument,
    WrongSourceMode,

    // Upstream / remote (exit 6)
    UpstreamError,
    SyncFailed,

    // Config (exit 7)
    ConfigError,
    Unauthorized,

    // I/O (exit 8)
    IoError,
    JsonError,

    // Internal (exit 1)
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::StoreError => "STORE_ERROR",
            Self::Conflict => "CONFLICT",
            Self::SourceNotFound => "SOURCE_NOT_FOUND",
            Self::NotFound => "NOT_FOUND",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::WrongSourceMode => "WRONG_SOURCE_MODE",
            Self::UpstreamError => "UPSTREAM_ERROR",
            Self::SyncFailed => "SYNC_FAILED",
            Self::ConfigError => "CONFIG_ERROR",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Category-based exit code (1-8).
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InternalError => 1,
            Self::NotInitialized | Self::StoreError | Self::Conflict => 2,
            Self::SourceNotFound | Self::NotFound => 3,
            Self::InvalidArgument | Self::WrongSourceMode => 4,
            Self::UpstreamError | Self::SyncFailed => 6,
            Self::ConfigError | Self::Unauthorized => 7,
            Self::IoError | Self::JsonError => 8,
        }
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in Hub operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Not initialized: run `hub init` first")]
    NotInitialized,

    #[error("Already initialized at {path}")]
    AlreadyInitialized { path: PathBuf },

    #[error("Source not found: {id}")]
    SourceNotFound { id: String },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error("GitHub error: {0}")]
    Github(#[from] GithubError),

    #[error("Sync failed: none of {failed} changes could be applied")]
    SyncFailed { failed: usize },

    #[error("Hub server error ({status}): {message}")]
    Remote {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Hub server unreachable: {0}")]
    Unreachable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::NotInitialized | Self::AlreadyInitialized { .. } => ErrorCode::NotInitialized,
            Self::SourceNotFound { .. } => ErrorCode::SourceNotFound,
            Self::Store(StoreError::NotFound(_)) => ErrorCode::NotFound,
            Self::Store(StoreError::Conflict(_)) => ErrorCode::Conflict,
            Self::Store(StoreError::Network(_)) => ErrorCode::ConfigError,
            Self::Store(StoreError::Unknown(_)) => ErrorCode::StoreError,
            Self::Sync(e) => sync_error_code(e),
            Self::Github(_) => ErrorCode::UpstreamError,
            Self::SyncFailed { .. } => ErrorCode::SyncFailed,
            Self::Remote { status, code, .. } => remote_error_code(*status, code),
            Self::Unreachable(_) | Self::Config(_) => ErrorCode::ConfigError,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Context-aware recovery hint for humans.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::NotInitialized => Some("Run `hub init --owner <you>` to create the database".to_string()),

            Self::AlreadyInitialized { path } => Some(format!(
                "Database already exists at {}. Use `hub key create` to issue another API key.",
                path.display()
            )),

            Self::SourceNotFound { id } => Some(format!(
                "No source with ID '{id}'. Use `hub source list` to see your sources."
            )),

            Self::Unreachable(_) => Some(
                "Check that `hub serve` is running and that HUB_URL points at it.".to_string(),
            ),

            Self::Config(msg) if msg.contains("API key") => Some(
                "Set HUB_API_KEY, pass --api-key, or add \"api_key\" to ~/.hub/config.json"
                    .to_string(),
            ),

            Self::SyncFailed { .. } => Some(
                "Run `hub logs <source-id>` to see the recorded errors, or rerun with -v".to_string(),
            ),

            Self::Remote { status: 401, .. } => {
                Some("The API key was rejected. Create a new one with `hub key create`.".to_string())
            }

            Self::Sync(SyncError::WrongMode { expected, .. }) => Some(format!(
                "This operation only works on `{expected}` sources. Check `hub source show <id>`."
            )),

            Self::Github(GithubError::Status { status: 403 | 429, .. }) => Some(
                "GitHub rate limit reached. Set GITHUB_TOKEN on the server to raise the limit."
                    .to_string(),
            ),

            Self::InvalidArgument(msg) if msg.contains("mode") => {
                Some("Valid modes: github, link, local_sync".to_string())
            }
            Self::InvalidArgument(msg) if msg.contains("status") => Some(
                "Valid statuses: inbox, active, archive. Synonyms: todo→inbox, doing→active, done→archive"
                    .to_string(),
            ),

            _ => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}

fn sync_error_code(err: &SyncError) -> ErrorCode {
    match err {
        SyncError::SourceNotFound(_) => ErrorCode::SourceNotFound,
        SyncError::WrongMode { .. } => ErrorCode::WrongSourceMode,
        SyncError::InvalidRequest(_) => ErrorCode::InvalidArgument,
        SyncError::Upstream(_) => ErrorCode::UpstreamError,
        SyncError::Store(StoreError::Network(_)) => ErrorCode::ConfigError,
        SyncError::Store(_) => ErrorCode::SyncFailed,
    }
}

fn remote_error_code(status: u16, code: &str) -> ErrorCode {
    match (status, code) {
        (401, _) => ErrorCode::Unauthorized,
        (404, "source_not_found") => ErrorCode::SourceNotFound,
        (404, _) => ErrorCode::NotFound,
        (409, _) => ErrorCode::Conflict,
        (400, "wrong_source_mode") => ErrorCode::WrongSourceMode,
        (400 | 422, _) => ErrorCode::InvalidArgument,
        (502, _) => ErrorCode::UpstreamError,
        _ => ErrorCode::SyncFailed,
    }
}
