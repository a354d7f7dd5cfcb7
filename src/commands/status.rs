//! Execute the status command

use chrono::DateTime;

use crate::cli::{Cli, OutputFormat};
use zotcli_core::error::Result;

pub fn execute(cli: &Cli) -> Result<()> {
    let config = super::load_config(cli)?;
    let index = super::open_index(cli, &config)?;

    let state = index.sync_state()?;
    let items = index.item_count()?;

    match cli.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "library_version": state.library_version,
                    "last_sync_epoch": state.last_sync_epoch,
                    "items": items,
                })
            );
        }
        OutputFormat::Human => {
            let last_sync = if state.last_sync_epoch == 0 {
                "never".to_string()
            } else {
                DateTime::from_timestamp(state.last_sync_epoch, 0)
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| state.last_sync_epoch.to_string())
            };
            println!("Library version: {}", state.library_version);
            println!("Last sync: {}", last_sync);
            println!("Indexed items: {}", items);
        }
    }
    Ok(())
}
