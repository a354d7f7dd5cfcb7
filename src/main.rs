//! zotcli - command-line Zotero client
//!
//! Keeps a local full-text-searchable mirror of a Zotero library in sync
//! and round-trips note edits through the user's markup format.

mod cli;
mod commands;

use std::process::ExitCode;

use clap::Parser;

use cli::{Cli, OutputFormat};
use zotcli_core::error::ExitCode as ZotExitCode;
use zotcli_core::logging;

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => err.exit(),
    };

    if let Err(e) = logging::init_tracing(cli.verbose, cli.log_level.as_deref(), cli.log_json) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    match commands::run(&cli) {
        Ok(()) => ExitCode::from(ZotExitCode::Success as u8),
        Err(e) => {
            if cli.format == OutputFormat::Json {
                eprintln!("{}", e.to_json());
            } else if !cli.quiet {
                eprintln!("error: {}", e);
            }
            ExitCode::from(e.exit_code() as u8)
        }
    }
}
