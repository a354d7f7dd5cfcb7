//! Execute the search command

use crate::cli::{Cli, OutputFormat};
use zotcli_core::error::Result;
use zotcli_core::records::Item;

pub fn execute(cli: &Cli, query: &str, limit: Option<usize>) -> Result<()> {
    let config = super::load_config(cli)?;
    let index = super::open_index(cli, &config)?;

    let results = index.search(query, limit)?;

    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string(&results)?),
        OutputFormat::Human => {
            for item in &results {
                println!("{}", format_item(item));
            }
        }
    }
    Ok(())
}

fn format_item(item: &Item) -> String {
    let handle = item.citekey.as_deref().unwrap_or(&item.key);
    let mut line = format!("[{}] ", handle);
    if let Some(creator) = &item.creator {
        line.push_str(creator);
        line.push_str(": ");
    }
    line.push_str(&item.title);
    if let Some(date) = &item.date {
        line.push_str(&format!(" ({})", date));
    }
    line
}
