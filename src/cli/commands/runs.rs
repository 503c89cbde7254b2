//! Audit run listing.

use console::style;

use crate::config::Settings;
use crate::models::RunStatus;

pub async fn cmd_runs(settings: &Settings, limit: i64) -> anyhow::Result<()> {
    let ctx = super::db_context(settings);
    let runs = ctx.runs().recent(limit).await?;

    if runs.is_empty() {
        println!("No runs recorded yet.");
        return Ok(());
    }

    for run in runs {
        let status = match run.status {
            RunStatus::Running => style("running  ").cyan(),
            RunStatus::Completed => style("completed").green(),
            RunStatus::Failed => style("failed   ").red(),
        };
        println!(
            "{}  {}  {:<15}  {}/{} processed, {} fixed, {} errors",
            run.started_at.format("%Y-%m-%d %H:%M"),
            status,
            run.run_type.as_str(),
            run.processed_pages,
            run.total_pages,
            run.fixed_pages,
            run.error_count
        );
        if !run.errors.is_empty() {
            for error in run.errors.iter().take(3) {
                println!("    {} {}", style("!").red(), error);
            }
        }
    }
    Ok(())
}
