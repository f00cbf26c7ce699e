//! Command-line interface for the OSS Watch pipelines — runs Discovery,
//! QueueManager, DeepAnalysis, and WatchlistGenerator without the HTTP
//! server.

use anyhow::Result;
use clap::{Parser, Subcommand};

mod app;
mod commands;
mod output;

use commands::{deep_analysis, discovery, queue, status, watchlist};

/// OSS Watch CLI.
#[derive(Parser)]
#[command(name = "oss-watch")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Run OSS Watch pipelines from the command line", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Discovery pipeline.
    Discovery(discovery::DiscoveryArgs),
    /// QueueManager.
    Queue(queue::QueueArgs),
    /// DeepAnalysis pipeline.
    #[command(name = "deep-analysis")]
    DeepAnalysis(deep_analysis::DeepAnalysisArgs),
    /// WatchlistGenerator.
    Watchlist(watchlist::WatchlistArgs),
    /// Configuration and last-run status for each pipeline.
    Status(status::StatusArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Discovery(args) => discovery::run(args).await,
        Commands::Queue(args) => queue::run(args).await,
        Commands::DeepAnalysis(args) => deep_analysis::run(args).await,
        Commands::Watchlist(args) => watchlist::run(args).await,
        Commands::Status(args) => status::run(args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clap_parses_known_subcommands() {
        let cli = Cli::try_parse_from(["oss-watch", "status"]).expect("parse status");
        assert!(matches!(cli.command, Commands::Status(_)));

        let cli = Cli::try_parse_from(["oss-watch", "deep-analysis", "run", "--max-repos", "10"])
            .expect("parse deep-analysis run");
        assert!(matches!(cli.command, Commands::DeepAnalysis(_)));
    }

    #[test]
    fn clap_enforces_required_subcommand() {
        assert!(Cli::try_parse_from(["oss-watch", "discovery"]).is_err());
        assert!(Cli::try_parse_from(["oss-watch", "watchlist"]).is_err());
    }
}
