//! Metadata seeding command.

use console::style;

use crate::config::Settings;
use crate::models::PageType;
use crate::services::MetadataSeeder;

pub async fn cmd_metadata(
    settings: &Settings,
    page_type: Option<PageType>,
    force: bool,
) -> anyhow::Result<()> {
    let ctx = super::db_context(settings);
    let seeder = MetadataSeeder::new(ctx);

    println!("{} Seeding template metadata...", style("→").cyan());
    let report = seeder.seed(page_type, force).await?;

    println!(
        "\n  {} pages seeded, {} skipped",
        style(report.seeded.len()).green(),
        report.skipped
    );

    if !report.duplicate_titles.is_empty() {
        println!(
            "\n  {} titles are shared by multiple pages:",
            style(report.duplicate_titles.len()).yellow()
        );
        for (title, slugs) in &report.duplicate_titles {
            println!("    \"{}\"", title);
            for slug in slugs {
                println!("      └ {}", slug);
            }
        }
    }

    if !report.seeded.is_empty() {
        println!(
            "\n  Roll this batch back with: pagewarden rollback --batch {}",
            report.batch_id
        );
    }
    Ok(())
}
