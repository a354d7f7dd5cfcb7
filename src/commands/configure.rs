//! Execute the configure command

use crate::cli::Cli;
use zotcli_core::config::LibraryType;
use zotcli_core::error::Result;

pub fn execute(
    cli: &Cli,
    api_key: &str,
    library_id: &str,
    library_type: &str,
    note_format: Option<&str>,
) -> Result<()> {
    let path = super::config_path(cli)?;
    let mut config = super::load_config(cli)?;

    config.api_key = Some(api_key.to_string());
    config.library_id = Some(library_id.to_string());
    config.library_type = LibraryType::parse(library_type)?;
    if let Some(format) = note_format {
        config.note_format = format.to_string();
    }

    config.save(&path)?;

    if !cli.quiet {
        println!("Configuration written to {}", path.display());
    }
    Ok(())
}
