//! The human confirmation queue.
//!
//! Unmatched senders and zero-amount payments wait here. Accepting an item
//! is the explicit human confirmation the stricter flows require; only then
//! is a missing customer created and the event written.

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use ledgertap_db::{LedgerDb, ReviewStatus};
use ledgertap_pipeline::Pipeline;
use std::path::Path;

use crate::cli::config::Config;
use crate::cli::output;

#[derive(Subcommand, Debug)]
pub enum ReviewCommand {
    /// Show pending review items
    List,
    /// Accept an item: create the customer if needed and write the event
    Accept {
        /// Review item id
        id: i64,
    },
    /// Discard an item without writing anything
    Discard {
        /// Review item id
        id: i64,
    },
}

pub async fn run(config_path: &Path, command: ReviewCommand) -> Result<()> {
    let config = Config::load(config_path)?;
    let db = LedgerDb::open(config.db_path())
        .await
        .context("Failed to open database")?;

    match command {
        ReviewCommand::List => {
            let pending = db.review_pending().await?;
            if pending.is_empty() {
                println!("Review queue is empty.");
                return Ok(());
            }
            let rows = pending
                .iter()
                .map(|item| {
                    vec![
                        item.id.to_string(),
                        item.source_key.clone(),
                        item.sender.clone(),
                        item.intent.as_str().to_string(),
                        item.value.to_string(),
                        item.reason.as_str().to_string(),
                        item.note.clone().unwrap_or_default(),
                        output::preview(&item.content, 40),
                    ]
                })
                .collect();
            output::print_table(
                &[
                    "ID", "Source", "Sender", "Intent", "Value", "Reason", "Hint", "Content",
                ],
                rows,
            );
        }
        ReviewCommand::Accept { id } => {
            let item = db
                .review_get(id)
                .await?
                .with_context(|| format!("No review item {id}"))?;
            if item.status != ReviewStatus::Pending {
                bail!("Review item {id} was already resolved");
            }

            let pipeline = Pipeline::new(db.clone());
            let applied = pipeline.apply_review_item(&item).await?;
            db.review_resolve(id, ReviewStatus::Accepted).await?;

            if applied {
                println!("Accepted #{id}: {} event written for {}", item.intent, item.sender);
            } else {
                println!("Accepted #{id}: nothing to write (no open interaction to complete)");
            }
        }
        ReviewCommand::Discard { id } => {
            if db.review_resolve(id, ReviewStatus::Discarded).await? {
                println!("Discarded #{id}");
            } else {
                bail!("Review item {id} is not pending");
            }
        }
    }

    Ok(())
}
