//! Sync log model.
//!
//! One append-only audit row per reconciliation run. Written with status
//! `syncing` when the run starts and finalized exactly once.

use serde::{Deserialize, Serialize};

use super::{new_id, now_millis};

/// Errors kept in the persisted message; the API result keeps them all.
pub const MAX_LOGGED_ERRORS: usize = 10;

/// Which reconciliation flow produced the log row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncFlow {
    Github,
    LocalSync,
    Ideas,
}

impl SyncFlow {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Github => "github",
            Self::LocalSync => "local_sync",
            Self::Ideas => "ideas",
        }
    }
}

impl std::str::FromStr for SyncFlow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "github" => Ok(Self::Github),
            "local_sync" => Ok(Self::LocalSync),
            "ideas" => Ok(Self::Ideas),
            _ => Err(format!("Unknown sync flow: {s}")),
        }
    }
}

/// Lifecycle status of a sync run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncLogStatus {
    #[default]
    Syncing,
    Success,
    Partial,
    Error,
}

impl SyncLogStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Syncing => "syncing",
            Self::Success => "success",
            Self::Partial => "partial",
            Self::Error => "error",
        }
    }

    /// Final status of a run that reached the apply phase.
    ///
    /// No failures is `success`; failures alongside at least one applied
    /// mutation is `partial`; failures with nothing applied is `error`.
    #[must_use]
    pub const fn from_outcome(applied: usize, failed: usize) -> Self {
        match (applied, failed) {
            (_, 0) => Self::Success,
            (0, _) => Self::Error,
            _ => Self::Partial,
        }
    }
}

impl std::str::FromStr for SyncLogStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "syncing" => Ok(Self::Syncing),
            "success" => Ok(Self::Success),
            "partial" => Ok(Self::Partial),
            "error" => Ok(Self::Error),
            _ => Err(format!("Unknown sync status: {s}")),
        }
    }
}

/// An audit row for one sync run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncLog {
    pub id: String,
    pub owner_id: String,

    /// Parent source; `None` for the ideas flow
    pub source_id: Option<String>,

    pub flow: SyncFlow,
    pub status: SyncLogStatus,
    pub files_added: i64,
    pub files_updated: i64,
    pub files_deleted: i64,

    /// Capped error summary (see [`MAX_LOGGED_ERRORS`])
    pub error_message: Option<String>,

    /// API key that triggered the run, if any
    pub api_key_id: Option<String>,

    pub started_at: i64,
    pub completed_at: Option<i64>,
}

impl SyncLog {
    /// A fresh `syncing` entry.
    #[must_use]
    pub fn start(
        owner_id: &str,
        source_id: Option<&str>,
        flow: SyncFlow,
        api_key_id: Option<&str>,
    ) -> Self {
        Self {
            id: new_id("log"),
            owner_id: owner_id.to_string(),
            source_id: source_id.map(ToString::to_string),
            flow,
            status: SyncLogStatus::Syncing,
            files_added: 0,
            files_updated: 0,
            files_deleted: 0,
            error_message: None,
            api_key_id: api_key_id.map(ToString::to_string),
            started_at: now_millis(),
            completed_at: None,
        }
    }
}

/// Final values written when a run is finalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncLogUpdate {
    pub status: SyncLogStatus,
    pub files_added: i64,
    pub files_updated: i64,
    pub files_deleted: i64,
    pub error_message: Option<String>,
    pub completed_at: i64,
}

/// Join errors into the persisted message, keeping at most
/// [`MAX_LOGGED_ERRORS`] entries.
#[must_use]
pub fn summarize_errors(errors: &[String]) -> Option<String> {
    if errors.is_empty() {
        return None;
    }
    let mut message = errors
        .iter()
        .take(MAX_LOGGED_ERRORS)
        .cloned()
        .collect::<Vec<_>>()
        .join("; ");
    if errors.len() > MAX_LOGGED_ERRORS {
        message.push_str(&format!(" (and {} more)", errors.len() - MAX_LOGGED_ERRORS));
    }
    Some(message)
}
