//! `hub github sync`.

use super::{block_on, remote, report_sync};
use crate::cli::{Cli, GithubCommands};
use crate::config::HubConfig;
use crate::error::Result;

/// Execute github subcommands.
///
/// # Errors
///
/// Returns an error if the server is unreachable, the source is missing or
/// not a github source, or the upstream fetch failed.
pub fn execute(command: &GithubCommands, cli: &Cli, json: bool) -> Result<()> {
    match command {
        GithubCommands::Sync { source_id } => {
            let config = HubConfig::load()?;
            let client = remote(cli, &config)?;
            let summary = block_on(client.github_sync(source_id))??;
            report_sync(&summary, json)
        }
    }
}
