//! Command implementations and dispatch

mod configure;
mod search;
mod status;
mod sync;

use std::path::PathBuf;

use crate::cli::{Cli, Commands};
use zotcli_core::config::Config;
use zotcli_core::db::SearchIndex;
use zotcli_core::error::Result;

pub fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Configure {
            api_key,
            library_id,
            library_type,
            note_format,
        } => configure::execute(
            cli,
            api_key,
            library_id,
            library_type,
            note_format.as_deref(),
        ),
        Commands::Sync => sync::execute(cli),
        Commands::Search { query, limit } => search::execute(cli, query, *limit),
        Commands::Status => status::execute(cli),
    }
}

/// Resolve the configuration file path (flag, env, or platform default).
pub(crate) fn config_path(cli: &Cli) -> Result<PathBuf> {
    match &cli.config {
        Some(path) => Ok(path.clone()),
        None => Config::default_path(),
    }
}

pub(crate) fn load_config(cli: &Cli) -> Result<Config> {
    Config::load_or_default(&config_path(cli)?)
}

pub(crate) fn open_index(cli: &Cli, config: &Config) -> Result<SearchIndex> {
    let path = match &cli.index {
        Some(path) => path.clone(),
        None => config.resolve_index_path()?,
    };
    SearchIndex::open(&path)
}
