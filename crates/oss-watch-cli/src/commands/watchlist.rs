//! `oss-watch watchlist generate` / `oss-watch watchlist show`

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use oss_watch_pipelines::WatchlistGenerator;
use oss_watch_store::Store;

use crate::app::App;
use crate::output::{create_table, print_error, print_success};

#[derive(Args)]
pub struct WatchlistArgs {
    #[command(subcommand)]
    command: WatchlistCommand,
}

#[derive(Subcommand)]
enum WatchlistCommand {
    /// Generate a new watchlist from the latest snapshots.
    Generate,
    /// Show the most recent watchlist, sorted by momentum.
    Show,
}

pub async fn run(args: WatchlistArgs) -> Result<()> {
    match args.command {
        WatchlistCommand::Generate => generate().await,
        WatchlistCommand::Show => show().await,
    }
}

async fn generate() -> Result<()> {
    let app = App::from_env().await?;
    let generator = WatchlistGenerator::new(app.store);
    let stats = generator.run(chrono::Utc::now()).await?;

    print_success(&format!(
        "watchlist generated: {} of {} candidates admitted",
        stats.admitted, stats.candidates_considered
    ));
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

async fn show() -> Result<()> {
    let app = App::from_env().await?;

    let Some(date) = app.store.latest_watchlist_date().await? else {
        print_error("no watchlist has been generated yet");
        return Ok(());
    };

    let mut entries = app.store.watchlist_entries_for_date(date).await?;
    entries.sort_by(|a, b| {
        b.momentum_score
            .partial_cmp(&a.momentum_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut table = create_table();
    table.set_header(vec!["Repo", "Momentum", "Durability", "Adoption", "Rationale"]);

    for entry in &entries {
        let repo = app
            .store
            .get_repo(entry.repo_id)
            .await?
            .context("watchlist entry references a missing repo")?;

        table.add_row(vec![
            repo.full_name,
            format!("{:.1}", entry.momentum_score),
            format!("{:.1}", entry.durability_score),
            format!("{:.1}", entry.adoption_score),
            entry.rationale.clone(),
        ]);
    }

    println!("Watchlist for {}", date.format("%Y-%m-%d"));
    println!("{table}");
    Ok(())
}
