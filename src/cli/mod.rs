//! CLI definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

/// Hub - personal sources, files and ideas
#[derive(Parser, Debug)]
#[command(name = "hub", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database path (default: ~/.hub/hub.db)
    #[arg(long, global = true, env = "HUB_DB")]
    pub db: Option<PathBuf>,

    /// Hub server URL (default: http://127.0.0.1:8787)
    #[arg(long, global = true, env = "HUB_URL")]
    pub url: Option<String>,

    /// API key for the hub server
    #[arg(long, global = true, env = "HUB_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the database and a first API key
    Init {
        /// Owner identity the key acts as
        #[arg(long)]
        owner: String,

        /// Label for the key
        #[arg(long, default_value = "default")]
        name: String,

        /// Store the key in ~/.hub/config.json
        #[arg(long)]
        save: bool,

        /// Recreate the database if it exists
        #[arg(long)]
        force: bool,
    },

    /// API key management (local database)
    Key {
        #[command(subcommand)]
        command: KeyCommands,
    },

    /// Run the HTTP service
    Serve {
        /// Address to bind (default: 127.0.0.1:8787)
        #[arg(long, env = "HUB_BIND")]
        bind: Option<String>,

        /// Token for GitHub API calls
        #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
        github_token: Option<String>,
    },

    /// Source management
    Source {
        #[command(subcommand)]
        command: SourceCommands,
    },

    /// Push a local directory into a local_sync source
    Push(PushArgs),

    /// GitHub sources
    Github {
        #[command(subcommand)]
        command: GithubCommands,
    },

    /// Ideas file push/pull
    Ideas {
        #[command(subcommand)]
        command: IdeasCommands,
    },

    /// Show recent sync runs for a source
    Logs {
        /// Source ID
        source_id: String,

        /// Maximum entries
        #[arg(short = 'n', long, default_value_t = 10)]
        limit: usize,
    },

    /// Print version information
    Version,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum KeyCommands {
    /// Issue a new API key
    Create {
        /// Owner identity the key acts as
        #[arg(long)]
        owner: String,

        /// Label for the key
        #[arg(long, default_value = "cli")]
        name: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum SourceCommands {
    /// List sources
    List,

    /// Create a source
    Add {
        /// Display name
        name: String,

        /// github, link, or local_sync
        #[arg(long)]
        mode: String,

        /// owner/repo, URL, or local root
        #[arg(long)]
        path: String,

        /// Branch to sync (github only)
        #[arg(long)]
        branch: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },

    /// Show a source and its file count
    Show {
        /// Source ID
        id: String,
    },

    /// Delete a source and its files
    #[command(alias = "delete")]
    Rm {
        /// Source ID
        id: String,
    },
}

#[derive(Args, Debug)]
pub struct PushArgs {
    /// Directory to push (default: current directory)
    #[arg(default_value = ".")]
    pub dir: PathBuf,

    /// Target source ID (must be a local_sync source)
    #[arg(long, short = 's')]
    pub source: String,

    /// Report what would change without writing
    #[arg(long)]
    pub dry_run: bool,

    /// Delete stored files that are not present locally
    #[arg(long)]
    pub delete_missing: bool,

    /// Only push paths matching these globs
    #[arg(long = "include", value_name = "GLOB")]
    pub include: Vec<String>,

    /// Skip paths matching these globs
    #[arg(long = "exclude", value_name = "GLOB")]
    pub exclude: Vec<String>,

    /// Skip files larger than this many bytes
    #[arg(long)]
    pub max_size: Option<u64>,
}

#[derive(Subcommand, Debug)]
pub enum GithubCommands {
    /// Sync a github source from its repository tree
    Sync {
        /// Source ID
        source_id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum IdeasCommands {
    /// Push the ideas file to the hub
    Push {
        /// Ideas file
        #[arg(default_value = "IDEAS.md")]
        file: PathBuf,

        /// Delete stored ideas that are not in the file
        #[arg(long)]
        delete_remote: bool,
    },

    /// Regenerate the ideas file from the hub
    Pull {
        /// Ideas file
        #[arg(default_value = "IDEAS.md")]
        file: PathBuf,

        /// Keep local ideas the hub does not have
        #[arg(long)]
        merge: bool,
    },

    /// Parse the ideas file and summarize it (offline)
    Show {
        /// Ideas file
        #[arg(default_value = "IDEAS.md")]
        file: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_push_args() {
        let cli = Cli::parse_from([
            "hub", "push", "notes", "--source", "src_1", "--dry-run", "--exclude", "*.log",
        ]);
        let Commands::Push(args) = cli.command else {
            panic!("expected push");
        };
        assert_eq!(args.dir, PathBuf::from("notes"));
        assert_eq!(args.source, "src_1");
        assert!(args.dry_run);
        assert!(!args.delete_missing);
        assert_eq!(args.exclude, vec!["*.log"]);
    }
}
