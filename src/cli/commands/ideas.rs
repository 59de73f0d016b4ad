//! Ideas commands: push, pull, and an offline show.

use std::path::Path;

use colored::Colorize;
use serde::Serialize;

use super::{block_on, print_json, print_problems, remote, status_label};
use crate::cli::{Cli, IdeasCommands};
use crate::config::HubConfig;
use crate::error::{Error, Result};
use crate::ideas::{IdeasDocument, parse, read_document};
use crate::model::{IdeaStatus, SyncLogStatus};
use crate::server::IdeasPushRequest;
use crate::sync::{atomic_write, pull_ideas};

#[derive(Serialize)]
struct PullOutput<'a> {
    file: &'a Path,
    remote_count: usize,
    kept_local: usize,
    merged: bool,
}

#[derive(Serialize)]
struct ShowOutput<'a> {
    file: &'a Path,
    total: usize,
    #[serde(flatten)]
    document: &'a IdeasDocument,
}

/// Execute ideas commands.
///
/// # Errors
///
/// Returns an error if the file cannot be read or written, or the server
/// call fails.
pub fn execute(command: &IdeasCommands, cli: &Cli, json: bool) -> Result<()> {
    match command {
        IdeasCommands::Push {
            file,
            delete_remote,
        } => push(file, *delete_remote, cli, json),
        IdeasCommands::Pull { file, merge } => pull(file, *merge, cli, json),
        IdeasCommands::Show { file } => show(file, json),
    }
}

fn push(file: &Path, delete_remote: bool, cli: &Cli, json: bool) -> Result<()> {
    // A missing file reads as an empty document; never push one
    if !file.exists() {
        return Err(Error::InvalidArgument(format!(
            "ideas file not found: {}",
            file.display()
        )));
    }
    let document = read_document(file)?;

    let config = HubConfig::load()?;
    let client = remote(cli, &config)?;
    let request = IdeasPushRequest {
        ideas: document.drafts(),
        delete_remote,
    };
    let summary = block_on(client.push_ideas(&request))??;

    if json {
        print_json(&summary)?;
    } else {
        println!(
            "Pushed ideas: {} added, {} updated, {} deleted, {} unchanged [{}]",
            summary.ideas_added,
            summary.ideas_updated,
            summary.ideas_deleted,
            summary.ideas_unchanged,
            status_label(summary.status),
        );
        if summary.ideas_kept > 0 {
            println!(
                "{}",
                format!(
                    "{} ideas exist only on the hub; pull to fetch them or push with --delete-remote",
                    summary.ideas_kept
                )
                .dimmed()
            );
        }
        print_problems(&summary.errors, &[]);
    }

    if summary.status == SyncLogStatus::Error && !summary.errors.is_empty() {
        return Err(Error::SyncFailed {
            failed: summary.errors.len(),
        });
    }
    Ok(())
}

fn pull(file: &Path, merge: bool, cli: &Cli, json: bool) -> Result<()> {
    let config = HubConfig::load()?;
    let client = remote(cli, &config)?;
    let remote_ideas = block_on(client.list_ideas())??;

    let local = if merge { Some(read_document(file)?) } else { None };
    let outcome = pull_ideas(&remote_ideas, local.as_ref(), merge);
    atomic_write(file, &outcome.text)?;

    if json {
        return print_json(&PullOutput {
            file,
            remote_count: outcome.remote_count,
            kept_local: outcome.kept_local,
            merged: merge,
        });
    }

    print!("Wrote {} ideas to {}", outcome.remote_count, file.display());
    if merge {
        print!(" ({} local-only kept)", outcome.kept_local);
    }
    println!();
    Ok(())
}

fn show(file: &Path, json: bool) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .map_err(|e| Error::InvalidArgument(format!("{}: {e}", file.display())))?;
    let document = parse(&text);

    if json {
        return print_json(&ShowOutput {
            file,
            total: document.len(),
            document: &document,
        });
    }

    println!("{} ({} ideas)", file.display(), document.len());
    for (status, ideas) in [
        (IdeaStatus::Inbox, &document.inbox),
        (IdeaStatus::Active, &document.active),
        (IdeaStatus::Archive, &document.archive),
    ] {
        println!();
        println!("{} {}", status.heading().bold(), format!("({})", ideas.len()).dimmed());
        for idea in ideas {
            let mark = if idea.done { "✓".green() } else { "·".normal() };
            println!("  {mark} {}", idea.content);
        }
    }
    Ok(())
}
