//! CLI argument parsing for zotcli

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

/// zotcli - command-line Zotero client
#[derive(Parser, Debug)]
#[command(name = "zotcli")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(long, global = true, env = "ZOTCLI_CONFIG")]
    pub config: Option<PathBuf>,

    /// Path to the local index database (overrides the configuration)
    #[arg(long, global = true)]
    pub index: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "human")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Verbose logging
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Store API credentials and defaults in the configuration file
    Configure {
        /// Zotero Web API key
        #[arg(long)]
        api_key: String,

        /// Library ID the API key is valid for
        #[arg(long)]
        library_id: String,

        /// Library type (user or group)
        #[arg(long, default_value = "user")]
        library_type: String,

        /// Markup format notes are edited in
        #[arg(long)]
        note_format: Option<String>,
    },

    /// Synchronize the local index with the remote library
    Sync,

    /// Search the local index
    Search {
        /// FTS5 match expression (creator, title, abstract, date, citekey)
        query: String,

        /// Maximum number of results
        #[arg(long, short)]
        limit: Option<usize>,
    },

    /// Show sync bookkeeping for the local index
    Status,
}
