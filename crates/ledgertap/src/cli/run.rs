//! One-shot batch run: process the new-content delta for each source.

use anyhow::{bail, Context, Result};
use ledgertap_db::LedgerDb;
use ledgertap_pipeline::Pipeline;
use std::path::Path;

use crate::cli::config::Config;
use crate::cli::output;

pub async fn run(config_path: &Path, only_source: Option<&str>) -> Result<()> {
    let config = Config::load(config_path)?;
    if config.sources.is_empty() {
        bail!("No sources configured in {}", config_path.display());
    }

    if let Some(key) = only_source {
        if !config.sources.iter().any(|s| s.key == key) {
            bail!("Unknown source key: {key}");
        }
    }

    let db = LedgerDb::open(config.db_path())
        .await
        .context("Failed to open database")?;
    let pipeline = Pipeline::new(db);

    let today = chrono::Local::now().date_naive();
    let mut reports = Vec::new();
    for source in &config.sources {
        if only_source.is_some_and(|key| key != source.key) {
            continue;
        }
        let spec = source.to_spec(today);
        // A cursor-store failure aborts the whole run: offset tracking is
        // foundational and continuing would risk double-applying sources.
        let report = pipeline.run_source(&spec).await?;
        reports.push(report);
    }

    output::print_reports(&reports);
    Ok(())
}
