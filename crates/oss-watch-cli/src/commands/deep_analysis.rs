//! `oss-watch deep-analysis run --max-repos N`

use anyhow::Result;
use clap::{Args, Subcommand};
use oss_watch_pipelines::DeepAnalysis;
use tokio_util::sync::CancellationToken;

use crate::app::App;
use crate::output::print_success;

#[derive(Args)]
pub struct DeepAnalysisArgs {
    #[command(subcommand)]
    command: DeepAnalysisCommand,
}

#[derive(Subcommand)]
enum DeepAnalysisCommand {
    /// Drain the priority queue under the configured request budget.
    Run {
        /// Maximum number of repos to analyze this run, in [1, 100].
        #[arg(long, default_value_t = 25)]
        max_repos: u32,
    },
}

pub async fn run(args: DeepAnalysisArgs) -> Result<()> {
    match args.command {
        DeepAnalysisCommand::Run { max_repos } => run_deep_analysis(max_repos).await,
    }
}

async fn run_deep_analysis(max_repos: u32) -> Result<()> {
    let app = App::from_env().await?;
    let deep_analysis = DeepAnalysis::new(app.store, app.client, app.config);
    let stats = deep_analysis
        .run(max_repos, chrono::Utc::now(), CancellationToken::new())
        .await?;

    print_success(&format!(
        "deep analysis complete: {} processed, {} skipped, stopped because {:?}",
        stats.repos_processed,
        stats.repos_skipped.len(),
        stats.stop_reason
    ));
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}
