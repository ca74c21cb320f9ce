//! Cursor inspection and reset.

use anyhow::{Context, Result};
use clap::Subcommand;
use ledgertap_db::LedgerDb;
use std::path::Path;

use crate::cli::config::Config;
use crate::cli::output;

#[derive(Subcommand, Debug)]
pub enum CursorCommand {
    /// Show every stored cursor
    List,
    /// Drop a cursor so the next run rereads the source from byte 0
    Reset {
        /// Source key
        source: String,
    },
}

pub async fn run(config_path: &Path, command: CursorCommand) -> Result<()> {
    let config = Config::load(config_path)?;
    let db = LedgerDb::open(config.db_path())
        .await
        .context("Failed to open database")?;

    match command {
        CursorCommand::List => {
            let cursors = db.cursor_list().await?;
            if cursors.is_empty() {
                println!("No cursors stored yet.");
                return Ok(());
            }
            let rows = cursors
                .iter()
                .map(|c| {
                    vec![
                        c.source_key.clone(),
                        c.byte_offset.to_string(),
                        c.last_updated.format("%Y-%m-%d %H:%M:%S").to_string(),
                    ]
                })
                .collect();
            output::print_table(&["Source", "Byte offset", "Updated (UTC)"], rows);
        }
        CursorCommand::Reset { source } => {
            if db.cursor_reset(&source).await? {
                println!("Cursor reset: {source} (next run rereads from the start)");
            } else {
                println!("No cursor stored for: {source}");
            }
        }
    }

    Ok(())
}
