//! `oss-watch queue refresh`

use anyhow::Result;
use clap::{Args, Subcommand};
use oss_watch_pipelines::QueueManager;

use crate::app::App;
use crate::output::print_success;

#[derive(Args)]
pub struct QueueArgs {
    #[command(subcommand)]
    command: QueueCommand,
}

#[derive(Subcommand)]
enum QueueCommand {
    /// Re-derive priorities and reconcile the queue.
    Refresh,
}

pub async fn run(args: QueueArgs) -> Result<()> {
    match args.command {
        QueueCommand::Refresh => run_refresh().await,
    }
}

async fn run_refresh() -> Result<()> {
    let app = App::from_env().await?;
    let queue_manager = QueueManager::new(app.store);
    let stats = queue_manager.refresh_queue(chrono::Utc::now()).await?;

    print_success(&format!(
        "queue refreshed: {} added, {} reprioritized, {} cleared",
        stats.added_to_queue, stats.updated_priorities, stats.cleared_processed
    ));
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}
