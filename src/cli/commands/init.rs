//! Initialize the data directory and database.

use console::style;

use crate::config::Settings;

pub async fn cmd_init(settings: &Settings) -> anyhow::Result<()> {
    settings.ensure_data_dir()?;

    let db_path = settings.database_path();
    let ctx = super::db_context(settings);
    ctx.init_schema().await?;

    println!(
        "{} Initialized database at {}",
        style("✓").green(),
        db_path.display()
    );
    Ok(())
}
