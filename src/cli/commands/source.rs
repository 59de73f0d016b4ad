//! Source commands.

use chrono::DateTime;
use colored::Colorize;
use serde::Serialize;

use super::{block_on, print_json, remote};
use crate::cli::{Cli, SourceCommands};
use crate::config::{HubConfig, clear_push_state};
use crate::error::{Error, Result};
use crate::model::{NewSource, Source, SourceMode};
use crate::validate::validate_source_path;

#[derive(Serialize)]
struct SourceListOutput<'a> {
    sources: &'a [Source],
    count: usize,
}

#[derive(Serialize)]
struct SourceShowOutput<'a> {
    #[serde(flatten)]
    source: &'a Source,
    file_count: usize,
}

/// Execute source commands.
///
/// # Errors
///
/// Returns an error if the server rejects the request or is unreachable.
pub fn execute(command: &SourceCommands, cli: &Cli, json: bool) -> Result<()> {
    let config = HubConfig::load()?;
    let client = remote(cli, &config)?;

    match command {
        SourceCommands::List => {
            let sources = block_on(client.list_sources())??;
            if json {
                return print_json(&SourceListOutput {
                    count: sources.len(),
                    sources: &sources,
                });
            }
            if sources.is_empty() {
                println!("No sources. Create one with `hub source add`.");
                return Ok(());
            }
            for source in &sources {
                println!(
                    "{}  {:<10} {}  {}",
                    source.id.dimmed(),
                    source.mode.as_str(),
                    source.name.bold(),
                    source.path.dimmed()
                );
            }
            Ok(())
        }

        SourceCommands::Add {
            name,
            mode,
            path,
            branch,
            description,
        } => {
            let mode: SourceMode = mode.parse().map_err(Error::InvalidArgument)?;
            validate_source_path(mode, path).map_err(Error::InvalidArgument)?;

            let request = NewSource {
                name: name.clone(),
                mode,
                path: path.clone(),
                branch: branch.clone(),
                description: description.clone(),
            };
            let source = block_on(client.create_source(&request))??;
            if json {
                return print_json(&source);
            }
            println!("Created source {} ({})", source.id.bold(), source.mode);
            Ok(())
        }

        SourceCommands::Show { id } => {
            let (source, files) = block_on(async {
                let source = client.get_source(id).await?;
                let files = client.list_files(id).await?;
                Ok::<_, Error>((source, files))
            })??;

            if json {
                return print_json(&SourceShowOutput {
                    source: &source,
                    file_count: files.len(),
                });
            }

            println!("{} {}", source.name.bold(), source.id.dimmed());
            println!("  Mode:    {}", source.mode);
            println!("  Path:    {}", source.path);
            if let Some(branch) = &source.branch {
                println!("  Branch:  {branch}");
            }
            if let Some(description) = &source.description {
                println!("  About:   {description}");
            }
            println!("  Files:   {}", files.len());
            println!("  Synced:  {}", format_millis(source.synced_at));
            Ok(())
        }

        SourceCommands::Rm { id } => {
            let deleted = block_on(client.delete_source(id))??;
            clear_push_state(id);
            if json {
                return print_json(&deleted);
            }
            println!(
                "Deleted source {} and {} files",
                deleted.id, deleted.files_deleted
            );
            Ok(())
        }
    }
}

/// Render optional Unix milliseconds for humans.
pub(crate) fn format_millis(ms: Option<i64>) -> String {
    ms.and_then(DateTime::from_timestamp_millis)
        .map_or_else(|| "never".to_string(), |d| d.format("%Y-%m-%d %H:%M:%S UTC").to_string())
}
