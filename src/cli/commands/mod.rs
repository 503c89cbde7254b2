//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod dedupe;
mod fix;
mod import;
mod init;
mod metadata;
mod rollback;
mod runs;
mod scan;
mod settings_cmd;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Settings;
use crate::models::PageType;
use crate::repository::DbContext;

/// Database context honoring the configured fetch chunk size.
fn db_context(settings: &Settings) -> DbContext {
    DbContext::new(&settings.database_path()).with_fetch_page_size(settings.page_size)
}

#[derive(Parser)]
#[command(name = "pagewarden")]
#[command(about = "SEO page health, deduplication, and AI content repair")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory and database
    Init,

    /// Import a page inventory from a JSON export
    Import {
        /// JSON file holding an array of pages
        file: PathBuf,
    },

    /// Scan the page inventory for thin and missing content
    Scan {
        /// Restrict to one page type
        #[arg(short = 't', long, value_parser = parse_page_type)]
        page_type: Option<PageType>,
        /// Persist recomputed word counts and thin flags
        #[arg(long)]
        apply: bool,
    },

    /// Detect exact and near-duplicate pages
    Dedupe {
        /// Restrict to one page type
        #[arg(short = 't', long, value_parser = parse_page_type)]
        page_type: Option<PageType>,
    },

    /// Regenerate content for thin pages via the chat-completion API
    Fix {
        /// Specific page slugs to fix (defaults to all unhealthy pages)
        slugs: Vec<String>,
        /// Restrict thin-page selection to one page type
        #[arg(short = 't', long, value_parser = parse_page_type)]
        page_type: Option<PageType>,
        /// Maximum pages to process
        #[arg(short, long)]
        limit: Option<usize>,
        /// Extra instructions appended to every prompt
        #[arg(long)]
        prompt: Option<String>,
    },

    /// Seed template metadata for pages missing it
    Metadata {
        /// Restrict to one page type
        #[arg(short = 't', long, value_parser = parse_page_type)]
        page_type: Option<PageType>,
        /// Overwrite existing metadata too
        #[arg(long)]
        force: bool,
    },

    /// Roll metadata back to history snapshots
    Rollback {
        /// Batch id to roll back
        #[arg(long, conflicts_with = "slug")]
        batch: Option<String>,
        /// Single page slug to roll back
        #[arg(long)]
        slug: Option<String>,
    },

    /// List recent audit runs
    Runs {
        /// Number of runs to show
        #[arg(short, long, default_value = "20")]
        limit: i64,
    },

    /// Inspect or change runtime bot settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },

    /// Start the admin API server
    Serve {
        /// Bind host
        #[arg(long)]
        host: Option<String>,
        /// Bind port
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[derive(Subcommand)]
enum SettingsCommands {
    /// Show all settings
    List,
    /// Get one setting
    Get { key: String },
    /// Set one setting to a JSON value
    Set { key: String, value: String },
}

fn parse_page_type(s: &str) -> Result<PageType, String> {
    PageType::parse(s).ok_or_else(|| {
        format!("unknown page type '{s}' (expected state, city, service, service_location, clinic, dentist, blog, or static)")
    })
}

/// Parse arguments and run the selected command.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };

    match cli.command {
        Commands::Init => init::cmd_init(&settings).await,
        Commands::Import { file } => import::cmd_import(&settings, &file).await,
        Commands::Scan { page_type, apply } => scan::cmd_scan(&settings, page_type, apply).await,
        Commands::Dedupe { page_type } => dedupe::cmd_dedupe(&settings, page_type).await,
        Commands::Fix {
            slugs,
            page_type,
            limit,
            prompt,
        } => fix::cmd_fix(&settings, slugs, page_type, limit, prompt).await,
        Commands::Metadata { page_type, force } => {
            metadata::cmd_metadata(&settings, page_type, force).await
        }
        Commands::Rollback { batch, slug } => rollback::cmd_rollback(&settings, batch, slug).await,
        Commands::Runs { limit } => runs::cmd_runs(&settings, limit).await,
        Commands::Settings { command } => match command {
            SettingsCommands::List => settings_cmd::cmd_list(&settings).await,
            SettingsCommands::Get { key } => settings_cmd::cmd_get(&settings, &key).await,
            SettingsCommands::Set { key, value } => {
                settings_cmd::cmd_set(&settings, &key, &value).await
            }
        },
        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| settings.server.host.clone());
            let port = port.unwrap_or(settings.server.port);
            crate::server::serve(settings, &host, port).await
        }
    }
}
