//! Content fix command.

use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::Settings;
use crate::llm::LlmClient;
use crate::models::{PageOutcome, PageType};
use crate::services::generate::FixRequest;
use crate::services::ContentFixer;

pub async fn cmd_fix(
    settings: &Settings,
    slugs: Vec<String>,
    page_type: Option<PageType>,
    limit: Option<usize>,
    prompt: Option<String>,
) -> anyhow::Result<()> {
    let ctx = super::db_context(settings);
    let llm = LlmClient::new(settings.llm.clone(), settings.api_key())?;
    let fixer = ContentFixer::new(ctx, llm, settings.llm.pacing_delay_secs);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .expect("valid progress template"),
    );
    spinner.set_message("Generating content...");
    spinner.enable_steady_tick(Duration::from_millis(120));

    let report = fixer
        .fix_pages(FixRequest {
            slugs,
            page_type,
            limit,
            custom_instructions: prompt,
            triggered_by: Some("cli".to_string()),
        })
        .await;
    spinner.finish_and_clear();
    let report = report?;

    println!(
        "{} Run {} finished: {} written, {} skipped, {} failed",
        style("✓").green(),
        report.run_id,
        style(report.written).green(),
        report.skipped,
        style(report.failed).red()
    );

    for page in &report.pages {
        let marker = match page.outcome {
            PageOutcome::Written => style("written").green(),
            PageOutcome::Skipped => style("skipped").dim(),
            PageOutcome::Failed => style("failed ").red(),
        };
        match &page.detail {
            Some(detail) => println!("  {} {:<50} {}", marker, page.slug, detail),
            None => println!("  {} {}", marker, page.slug),
        }
    }

    if report.written > 0 {
        println!(
            "\n  Roll this batch back with: pagewarden rollback --batch {}",
            report.batch_id
        );
    }
    Ok(())
}
