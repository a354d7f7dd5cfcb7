//! Execute the sync command

use tracing::debug;

use crate::cli::{Cli, OutputFormat};
use zotcli_core::backend::Backend;
use zotcli_core::error::Result;

pub fn execute(cli: &Cli) -> Result<()> {
    let config = super::load_config(cli)?;
    let backend = Backend::from_config(&config, cli.index.as_deref())?;

    debug!(since = backend.index().library_version()?, "starting sync");
    let count = backend.synchronize()?;

    match cli.format {
        OutputFormat::Json => {
            let state = backend.index().sync_state()?;
            println!(
                "{}",
                serde_json::json!({
                    "synced": count,
                    "library_version": state.library_version,
                    "last_sync_epoch": state.last_sync_epoch,
                })
            );
        }
        OutputFormat::Human => {
            if !cli.quiet {
                println!("Synchronized {} item(s).", count);
            }
        }
    }
    Ok(())
}
