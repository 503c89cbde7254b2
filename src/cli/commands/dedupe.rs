//! Duplicate detection command.

use console::style;

use crate::config::Settings;
use crate::models::PageType;
use crate::services::DuplicateDetector;

pub async fn cmd_dedupe(settings: &Settings, page_type: Option<PageType>) -> anyhow::Result<()> {
    let ctx = super::db_context(settings);
    let detector = DuplicateDetector::new(ctx, settings.active_states.clone());

    println!("{} Checking for duplicate pages...", style("→").cyan());
    let report = detector.detect(page_type).await?;

    println!(
        "\n  {} pages checked, {} flagged",
        report.pages_checked,
        style(report.flagged).yellow()
    );

    if !report.exact_groups.is_empty() {
        println!("\n  Exact metadata duplicates:");
        for group in &report.exact_groups {
            println!("    {} (canonical)", style(&group.canonical).green());
            for dup in &group.duplicates {
                println!("      └ {}", dup);
            }
        }
    }

    if !report.near_pairs.is_empty() {
        println!("\n  Near duplicates:");
        for pair in &report.near_pairs {
            println!(
                "    {} ~ {} (content {:.0}%, title {:.0}%)",
                pair.slug,
                pair.duplicate_of,
                pair.content_similarity * 100.0,
                pair.title_similarity * 100.0
            );
        }
    }

    for error in &report.errors {
        println!("  {} {}", style("!").red(), error);
    }

    if report.flagged == 0 {
        println!("\n{} No duplicates found", style("✓").green());
    }
    Ok(())
}
