//! Command implementations.
//!
//! Local commands (`init`, `key`, `serve`) open the database directly.
//! Everything else talks to a running hub server through [`HubClient`].

pub mod completions;
pub mod github;
pub mod ideas;
pub mod init;
pub mod logs;
pub mod push;
pub mod serve;
pub mod source;
pub mod version;

use std::future::Future;
use std::path::Path;

use colored::Colorize;
use serde::Serialize;

use crate::cli::Cli;
use crate::client::HubClient;
use crate::config::{HubConfig, resolve_api_key, resolve_db_path, resolve_server_url};
use crate::error::{Error, Result};
use crate::model::SyncLogStatus;
use crate::storage::SqliteStorage;
use crate::sync::SyncSummary;

/// Run an async operation to completion on a fresh runtime.
pub(crate) fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| Error::Other(format!("Failed to start async runtime: {e}")))?;
    Ok(rt.block_on(future))
}

/// Build a client from flags, environment and config.
pub(crate) fn remote(cli: &Cli, config: &HubConfig) -> Result<HubClient> {
    let url = resolve_server_url(cli.url.as_deref(), config);
    let key = resolve_api_key(cli.api_key.as_deref(), config)?;
    Ok(HubClient::new(&url, &key))
}

/// Open an existing database.
pub(crate) fn open_store(db: Option<&Path>, config: &HubConfig) -> Result<SqliteStorage> {
    let path = resolve_db_path(db, config)
        .ok_or_else(|| Error::Config("Could not determine database path".to_string()))?;
    if !path.exists() {
        return Err(Error::NotInitialized);
    }
    Ok(SqliteStorage::open(&path)?)
}

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

/// Print per-item errors and warnings to stderr.
pub(crate) fn print_problems(errors: &[String], warnings: &[String]) {
    for warning in warnings {
        eprintln!("{} {warning}", "warning:".yellow().bold());
    }
    for error in errors {
        eprintln!("{} {error}", "failed:".red().bold());
    }
}

pub(crate) fn status_label(status: SyncLogStatus) -> String {
    match status {
        SyncLogStatus::Success => status.as_str().green().to_string(),
        SyncLogStatus::Partial => status.as_str().yellow().to_string(),
        SyncLogStatus::Error => status.as_str().red().to_string(),
        SyncLogStatus::Syncing => status.as_str().cyan().to_string(),
    }
}

/// Print a file sync result and decide the exit.
///
/// Per-item failures are warnings as long as something was applied; a run
/// where every change failed is an error.
pub(crate) fn report_sync(summary: &SyncSummary, json: bool) -> Result<()> {
    if json {
        print_json(summary)?;
    } else {
        let verb = if summary.dry_run { "Would sync" } else { "Synced" };
        println!(
            "{verb}: {} added, {} updated, {} deleted, {} unchanged [{}]",
            summary.files_added,
            summary.files_updated,
            summary.files_deleted,
            summary.files_unchanged,
            status_label(summary.status),
        );
        print_problems(&summary.errors, &summary.warnings);
    }

    if summary.status == SyncLogStatus::Error && !summary.errors.is_empty() {
        return Err(Error::SyncFailed {
            failed: summary.errors.len(),
        });
    }
    Ok(())
}
