//! `oss-watch status`

use anyhow::Result;
use clap::Args;
use oss_watch_store::Store;

use crate::app::App;
use crate::output::create_table;

#[derive(Args)]
pub struct StatusArgs {}

pub async fn run(_args: StatusArgs) -> Result<()> {
    let app = App::from_env().await?;

    println!("{:#?}", app.config);
    println!();

    let runs = app.store.latest_job_runs().await?;
    let mut table = create_table();
    table.set_header(vec!["Job", "Started", "Status", "Error"]);

    for run in &runs {
        table.add_row(vec![
            format!("{:?}", run.job_type),
            run.started_at.to_rfc3339(),
            format!("{:?}", run.status),
            run.error_message.clone().unwrap_or_default(),
        ]);
    }

    println!("{table}");
    Ok(())
}
