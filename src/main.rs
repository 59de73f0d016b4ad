//! Hub CLI entry point.

use clap::Parser;
use hub::cli::commands;
use hub::cli::{Cli, Commands};
use hub::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    init_tracing(cli.verbose, cli.quiet);

    // JSON when asked for, or when stdout is not a terminal
    let json = cli.json || !std::io::IsTerminal::is_terminal(&std::io::stdout());

    match run(&cli, json) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if json {
                eprintln!("{}", e.to_structured_json());
            } else if !cli.quiet {
                if let Some(hint) = e.hint() {
                    eprintln!("Error: {e}\n  Hint: {hint}");
                } else {
                    eprintln!("Error: {e}");
                }
            }
            ExitCode::from(e.exit_code())
        }
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    if quiet {
        return;
    }

    // RUST_LOG wins over -v
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug,rusqlite=info,hyper=info,reqwest=info"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn run(cli: &Cli, json: bool) -> Result<(), Error> {
    match &cli.command {
        Commands::Init {
            owner,
            name,
            save,
            force,
        } => commands::init::execute(cli.db.as_ref(), owner, name, *save, *force, json),
        Commands::Key { command } => commands::init::execute_key(command, cli.db.as_ref(), json),
        Commands::Serve { bind, github_token } => {
            commands::serve::execute(cli.db.as_ref(), bind.as_deref(), github_token.as_deref())
        }

        // Remote commands talk to a running server
        Commands::Source { command } => commands::source::execute(command, cli, json),
        Commands::Push(args) => commands::push::execute(args, cli, json),
        Commands::Github { command } => commands::github::execute(command, cli, json),
        Commands::Ideas { command } => commands::ideas::execute(command, cli, json),
        Commands::Logs { source_id, limit } => {
            commands::logs::execute(source_id, *limit, cli, json)
        }

        Commands::Version => commands::version::execute(json),
        Commands::Completions { shell } => commands::completions::execute(shell),
    }
}
