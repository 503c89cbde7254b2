//! Runtime settings management.

use console::style;

use crate::config::Settings;

pub async fn cmd_list(settings: &Settings) -> anyhow::Result<()> {
    let ctx = super::db_context(settings);
    let all = ctx.settings().get_all().await?;

    if all.is_empty() {
        println!("No settings stored.");
        return Ok(());
    }
    for (key, value) in all {
        println!("{} = {}", style(key).cyan(), value);
    }
    Ok(())
}

pub async fn cmd_get(settings: &Settings, key: &str) -> anyhow::Result<()> {
    let ctx = super::db_context(settings);
    match ctx.settings().get(key).await? {
        Some(value) => println!("{}", value),
        None => println!("{} not set", style(key).yellow()),
    }
    Ok(())
}

pub async fn cmd_set(settings: &Settings, key: &str, value: &str) -> anyhow::Result<()> {
    // Values are JSON; bare words become strings for convenience.
    let parsed: serde_json::Value = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));

    let ctx = super::db_context(settings);
    ctx.settings().set(key, &parsed).await?;
    println!("{} {} = {}", style("✓").green(), key, parsed);
    Ok(())
}
