//! Watch mode: a long-lived poller running the batch pipeline per source.
//!
//! Each source gets its own task on its own interval, so sources never block
//! each other and a single source can never have two overlapping cycles
//! racing on its cursor. Shutdown (ctrl-c, or a fatal cursor-store failure
//! in any task) is honored between cycles, never mid-source.

use anyhow::{bail, Context, Result};
use ledgertap_db::LedgerDb;
use ledgertap_pipeline::Pipeline;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{error, info};

use crate::cli::config::{Config, SourceConfig};

pub async fn run(config_path: &Path) -> Result<()> {
    let config = Config::load(config_path)?;
    if config.sources.is_empty() {
        bail!("No sources configured in {}", config_path.display());
    }

    let db = LedgerDb::open(config.db_path())
        .await
        .context("Failed to open database")?;
    let pipeline = Arc::new(Pipeline::new(db));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut tasks = JoinSet::new();

    for source in config.sources {
        let pipeline = Arc::clone(&pipeline);
        let shutdown_tx = shutdown_tx.clone();
        let shutdown_rx = shutdown_rx.clone();
        tasks.spawn(watch_source(source, pipeline, shutdown_tx, shutdown_rx));
    }

    info!("Watching sources (ctrl-c to stop)");
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown requested");
        }
        _ = wait_for_shutdown(shutdown_rx.clone()) => {}
    }
    let _ = shutdown_tx.send(true);

    while tasks.join_next().await.is_some() {}
    info!("All watchers stopped");
    Ok(())
}

async fn wait_for_shutdown(mut rx: watch::Receiver<bool>) {
    while !*rx.borrow() {
        if rx.changed().await.is_err() {
            return;
        }
    }
}

async fn watch_source(
    source: SourceConfig,
    pipeline: Arc<Pipeline>,
    shutdown_tx: watch::Sender<bool>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let interval = Duration::from_secs(source.poll_interval_secs.max(1));

    loop {
        // The spec is rebuilt every cycle so a {date} path rolls over at
        // midnight to the new day's file.
        let spec = source.to_spec(chrono::Local::now().date_naive());
        match pipeline.run_source(&spec).await {
            Ok(report) => {
                if !report.is_empty() {
                    info!(
                        source = %report.source_key,
                        new_messages = report.new_messages,
                        applied = report.applied,
                        queued_review = report.queued_review,
                        errors = report.errors,
                        "Watch cycle"
                    );
                }
            }
            Err(err) => {
                // Cursor store gone: stop every watcher, not just this one.
                error!(source = %source.key, err = %format!("{err:#}"), "Fatal watch error");
                let _ = shutdown_tx.send(true);
                return;
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            result = shutdown_rx.changed() => {
                if result.is_err() || *shutdown_rx.borrow() {
                    return;
                }
            }
        }
    }
}
