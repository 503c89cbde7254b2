//! Rollback command.

use console::style;

use crate::config::Settings;
use crate::services::generate::RollbackTarget;
use crate::services::Rollbacker;

pub async fn cmd_rollback(
    settings: &Settings,
    batch: Option<String>,
    slug: Option<String>,
) -> anyhow::Result<()> {
    let target = match (batch, slug) {
        (Some(batch), _) => RollbackTarget::Batch(batch),
        (None, Some(slug)) => RollbackTarget::Page(slug),
        (None, None) => anyhow::bail!("pass --batch <id> or --slug <slug>"),
    };

    let ctx = super::db_context(settings);
    let report = Rollbacker::new(ctx).rollback(target).await?;

    for slug in &report.restored {
        println!("  {} {}", style("restored").green(), slug);
    }
    for missing in &report.missing {
        println!("  {} {}", style("no snapshot for").yellow(), missing);
    }

    if report.restored.is_empty() {
        println!("{} Nothing restored", style("!").yellow());
    } else {
        println!(
            "\n{} Restored {} pages",
            style("✓").green(),
            report.restored.len()
        );
    }
    Ok(())
}
