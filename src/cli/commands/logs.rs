//! `hub logs`.

use serde::Serialize;

use super::source::format_millis;
use super::{block_on, print_json, remote, status_label};
use crate::cli::Cli;
use crate::config::HubConfig;
use crate::error::Result;
use crate::model::SyncLog;

#[derive(Serialize)]
struct LogsOutput<'a> {
    source_id: &'a str,
    logs: &'a [SyncLog],
    count: usize,
}

/// Execute the logs command.
///
/// # Errors
///
/// Returns an error if the server is unreachable or the source is missing.
pub fn execute(source_id: &str, limit: usize, cli: &Cli, json: bool) -> Result<()> {
    let config = HubConfig::load()?;
    let client = remote(cli, &config)?;
    let logs = block_on(client.list_logs(source_id, limit))??;

    if json {
        return print_json(&LogsOutput {
            source_id,
            count: logs.len(),
            logs: &logs,
        });
    }

    if logs.is_empty() {
        println!("No sync runs for {source_id}");
        return Ok(());
    }

    for log in &logs {
        println!(
            "{}  {:<10} {:<8} +{} ~{} -{}",
            format_millis(Some(log.started_at)),
            log.flow.as_str(),
            status_label(log.status),
            log.files_added,
            log.files_updated,
            log.files_deleted,
        );
        if let Some(message) = &log.error_message {
            println!("    {message}");
        }
    }
    Ok(())
}
