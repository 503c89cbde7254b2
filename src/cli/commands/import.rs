//! Inventory import command.

use std::path::Path;

use anyhow::Context;
use console::style;

use crate::config::Settings;
use crate::services::{ImportPage, InventoryImporter};

pub async fn cmd_import(settings: &Settings, file: &Path) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let pages: Vec<ImportPage> = serde_json::from_str(&raw)
        .with_context(|| format!("invalid inventory file {}", file.display()))?;

    settings.ensure_data_dir()?;
    let ctx = super::db_context(settings);
    ctx.init_schema().await?;

    let report = InventoryImporter::new(ctx).import(&pages).await?;

    println!(
        "{} Imported {} pages from {}",
        style("✓").green(),
        report.imported,
        file.display()
    );
    Ok(())
}
