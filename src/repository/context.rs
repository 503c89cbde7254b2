//! Database context for managing connections and repository access.
//!
//! The DbContext is the primary entry point for all database operations.
//! It holds the connection pool and provides access to all repositories.

use std::path::Path;

use diesel_async::SimpleAsyncConnection;

use super::history::HistoryRepository;
use super::pages::PageRepository;
use super::pool::{DbError, SqlitePool};
use super::runs::AuditRunRepository;
use super::settings::SettingsRepository;

/// Database context that manages the connection pool and provides repository access.
///
/// # Example
/// ```ignore
/// let ctx = DbContext::new(&settings.database_path());
/// ctx.init_schema().await?;
/// let pages = ctx.pages().fetch_all(None).await?;
/// ```
#[derive(Clone)]
pub struct DbContext {
    pool: SqlitePool,
    fetch_page_size: i64,
}

impl DbContext {
    /// Create a context from a database file path.
    pub fn new(db_path: &Path) -> Self {
        Self {
            pool: SqlitePool::from_path(db_path),
            fetch_page_size: super::pages::FETCH_PAGE_SIZE,
        }
    }

    /// Override the inventory fetch chunk size (the `page_size` setting).
    pub fn with_fetch_page_size(mut self, rows: i64) -> Self {
        self.fetch_page_size = rows.max(1);
        self
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Get a page repository.
    pub fn pages(&self) -> PageRepository {
        PageRepository::new(self.pool.clone()).with_page_size(self.fetch_page_size)
    }

    /// Get a metadata history repository.
    pub fn history(&self) -> HistoryRepository {
        HistoryRepository::new(self.pool.clone())
    }

    /// Get an audit run repository.
    pub fn runs(&self) -> AuditRunRepository {
        AuditRunRepository::new(self.pool.clone())
    }

    /// Get a settings repository.
    pub fn settings(&self) -> SettingsRepository {
        SettingsRepository::new(self.pool.clone())
    }

    /// Initialize database schema (idempotent).
    pub async fn init_schema(&self) -> Result<(), DbError> {
        let mut conn = self.pool.get().await?;
        conn.batch_execute(include_str!("schema_sqlite.sql")).await
    }
}
