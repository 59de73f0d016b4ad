//! `hub serve`.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{HubConfig, resolve_bind, resolve_github_token};
use crate::error::Result;
use crate::github::GithubClient;
use crate::server::{AppContext, serve};

use super::{block_on, open_store};

/// Run the HTTP service until the process is terminated.
///
/// # Errors
///
/// Returns an error if the database is missing or the address cannot be
/// bound.
pub fn execute(db: Option<&PathBuf>, bind: Option<&str>, github_token: Option<&str>) -> Result<()> {
    let config = HubConfig::load()?;
    let store = open_store(db.map(PathBuf::as_path), &config)?;
    let bind = resolve_bind(bind, &config);

    let ctx = Arc::new(AppContext {
        store: Arc::new(store),
        github: GithubClient::new(resolve_github_token(github_token, &config)),
        github_options: config.github_options(),
    });

    block_on(serve(ctx, &bind))?
}
