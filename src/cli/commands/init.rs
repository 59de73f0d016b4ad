//! Database initialization and API key issuing.
//!
//! `hub init` creates the database (schema is applied on open) and issues
//! the first API key for an owner. The raw key is printed once; only its
//! hash is stored. `hub key create` issues more keys against an existing
//! database.

use std::fs;
use std::path::{Path, PathBuf};

use colored::Colorize;
use serde::Serialize;
use tracing::info;

use super::{open_store, print_json};
use crate::cli::KeyCommands;
use crate::config::{HubConfig, resolve_db_path};
use crate::error::{Error, Result};
use crate::model::ApiKey;
use crate::storage::{SqliteStorage, Store};

#[derive(Serialize)]
struct KeyOutput<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    database: Option<&'a Path>,
    key_id: &'a str,
    owner_id: &'a str,
    name: &'a str,
    api_key: &'a str,
    saved_to_config: bool,
}

/// Execute the init command.
///
/// # Errors
///
/// Returns an error if the database exists (without `--force`) or cannot
/// be created.
pub fn execute(
    db: Option<&PathBuf>,
    owner: &str,
    name: &str,
    save: bool,
    force: bool,
    json: bool,
) -> Result<()> {
    let owner = owner.trim();
    if owner.is_empty() {
        return Err(Error::InvalidArgument("owner must not be empty".to_string()));
    }

    let mut config = HubConfig::load()?;
    let db_path = resolve_db_path(db.map(PathBuf::as_path), &config)
        .ok_or_else(|| Error::Config("Could not determine database path".to_string()))?;

    if db_path.exists() {
        if !force {
            return Err(Error::AlreadyInitialized { path: db_path });
        }
        fs::remove_file(&db_path)?;
    }
    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let store = SqliteStorage::open(&db_path)?;
    let (key, raw) = ApiKey::generate(owner, name);
    store.insert_api_key(&key)?;
    info!(path = %db_path.display(), owner, "database initialized");

    if save {
        config.api_key = Some(raw.clone());
        config.save()?;
    }

    let output = KeyOutput {
        database: Some(&db_path),
        key_id: &key.id,
        owner_id: &key.owner_id,
        name: &key.name,
        api_key: &raw,
        saved_to_config: save,
    };
    if json {
        return print_json(&output);
    }

    println!("Initialized hub database at {}", db_path.display());
    print_key(&output);
    Ok(())
}

/// Execute key subcommands.
///
/// # Errors
///
/// Returns an error if the database is missing or the key cannot be stored.
pub fn execute_key(command: &KeyCommands, db: Option<&PathBuf>, json: bool) -> Result<()> {
    match command {
        KeyCommands::Create { owner, name } => {
            let config = HubConfig::load()?;
            let store = open_store(db.map(PathBuf::as_path), &config)?;
            let (key, raw) = ApiKey::generate(owner.trim(), name);
            store.insert_api_key(&key)?;

            let output = KeyOutput {
                database: None,
                key_id: &key.id,
                owner_id: &key.owner_id,
                name: &key.name,
                api_key: &raw,
                saved_to_config: false,
            };
            if json {
                return print_json(&output);
            }
            print_key(&output);
            Ok(())
        }
    }
}

fn print_key(output: &KeyOutput<'_>) {
    println!("Created API key {} for {}", output.key_id, output.owner_id);
    println!();
    println!("  {}", output.api_key.bold());
    println!();
    if output.saved_to_config {
        println!("Saved to the hub config file.");
    } else {
        println!("{}", "Store this key now; it cannot be shown again.".yellow());
        println!("  export HUB_API_KEY={}", output.api_key);
    }
}
