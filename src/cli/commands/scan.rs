//! Inventory scan command.

use console::style;

use crate::config::Settings;
use crate::models::{ContentStatus, PageType};
use crate::services::InventoryScanner;

pub async fn cmd_scan(
    settings: &Settings,
    page_type: Option<PageType>,
    apply: bool,
) -> anyhow::Result<()> {
    let ctx = super::db_context(settings);
    let scanner = InventoryScanner::new(ctx, settings.active_states.clone());

    println!("{} Scanning page inventory...", style("→").cyan());
    let report = scanner.scan(page_type, apply).await?;

    println!(
        "\n  {} pages total, {} audited ({} outside active locations)",
        report.total_pages, report.audited_pages, report.skipped_inactive
    );
    println!(
        "  {} good   {} thin   {} missing",
        style(report.good).green(),
        style(report.thin).yellow(),
        style(report.missing).red()
    );

    if !report.by_type.is_empty() {
        println!("\n  By page type:");
        for (page_type, counts) in &report.by_type {
            println!(
                "    {:<18} {:>5} good  {:>5} thin  {:>5} missing",
                page_type, counts.good, counts.thin, counts.missing
            );
        }
    }

    if !report.problem_pages.is_empty() {
        println!("\n  Pages needing work:");
        for page in report.problem_pages.iter().take(50) {
            let marker = match page.status {
                ContentStatus::Missing => style("missing").red(),
                _ => style("thin").yellow(),
            };
            println!(
                "    {:<50} {} ({}/{} words)",
                page.slug, marker, page.word_count, page.threshold
            );
        }
        if report.problem_pages.len() > 50 {
            println!("    ... and {} more", report.problem_pages.len() - 50);
        }
    }

    if apply {
        println!("\n{} Flags written back to the database", style("✓").green());
    } else {
        println!(
            "\n  Run with {} to persist word counts and thin flags",
            style("--apply").cyan()
        );
    }
    Ok(())
}
