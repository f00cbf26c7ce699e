//! `oss-watch discovery run`

use anyhow::Result;
use clap::{Args, Subcommand};
use oss_watch_pipelines::Discovery;

use crate::app::App;
use crate::output::print_success;

#[derive(Args)]
pub struct DiscoveryArgs {
    #[command(subcommand)]
    command: DiscoveryCommand,
}

#[derive(Subcommand)]
enum DiscoveryCommand {
    /// Run a single discovery pass.
    Run,
}

pub async fn run(args: DiscoveryArgs) -> Result<()> {
    match args.command {
        DiscoveryCommand::Run => run_discovery().await,
    }
}

async fn run_discovery() -> Result<()> {
    let app = App::from_env().await?;
    let discovery = Discovery::new(app.store, app.client, app.config);
    let stats = discovery.run(chrono::Utc::now()).await?;

    print_success(&format!(
        "discovery complete: {} found, {} eligible, {} new, {} updated ({} requests)",
        stats.found, stats.eligible, stats.new, stats.updated, stats.requests_made
    ));
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}
