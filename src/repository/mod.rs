//! Repository layer for database persistence.
//!
//! All database access uses Diesel ORM with compile-time query checking
//! over an async SQLite connection.

pub mod context;
pub mod history;
pub mod models;
pub mod pages;
pub mod pool;
pub mod runs;
pub mod settings;
pub mod util;

pub use context::DbContext;
pub use history::HistoryRepository;
pub use pages::PageRepository;
pub use pool::{DbError, SqlitePool};
pub use runs::AuditRunRepository;
pub use settings::SettingsRepository;

pub use models::{
    AuditRunRecord, HistoryRecord, NewAuditRun, NewHistoryEntry, NewSeoPage, SeoPageRecord,
    SettingRecord,
};

use chrono::{DateTime, Utc};

/// Parse a datetime string from the database, defaulting to Unix epoch on error.
pub fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(DateTime::UNIX_EPOCH)
}

/// Parse an optional datetime string from the database.
pub fn parse_datetime_opt(s: Option<String>) -> Option<DateTime<Utc>> {
    s.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    })
}
