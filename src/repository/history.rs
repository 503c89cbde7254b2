//! Metadata history repository.
//!
//! Every metadata write is preceded by a snapshot row here, so any batch
//! or individual page can be rolled back later.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::schema::metadata_history;

use super::models::{HistoryRecord, NewHistoryEntry};
use super::pool::{DbError, SqlitePool};

#[derive(Clone)]
pub struct HistoryRepository {
    pool: SqlitePool,
}

impl HistoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Record a snapshot.
    pub async fn insert(&self, entry: &NewHistoryEntry<'_>) -> Result<(), DbError> {
        let mut conn = self.pool.get().await?;
        diesel::insert_into(metadata_history::table)
            .values(entry)
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    /// Most recent snapshot for a slug, if any.
    ///
    /// Newest wins: ordered by created_at then id so same-second writes
    /// still resolve deterministically.
    pub async fn latest_for_slug(&self, slug: &str) -> Result<Option<HistoryRecord>, DbError> {
        let mut conn = self.pool.get().await?;
        metadata_history::table
            .filter(metadata_history::slug.eq(slug))
            .order((
                metadata_history::created_at.desc(),
                metadata_history::id.desc(),
            ))
            .first(&mut conn)
            .await
            .optional()
    }

    /// All snapshots written under one batch id.
    pub async fn for_batch(&self, batch_id: &str) -> Result<Vec<HistoryRecord>, DbError> {
        let mut conn = self.pool.get().await?;
        metadata_history::table
            .filter(metadata_history::batch_id.eq(batch_id))
            .order(metadata_history::id.asc())
            .load(&mut conn)
            .await
    }

    /// Recent snapshots for inspection, newest first.
    pub async fn recent(&self, limit: i64) -> Result<Vec<HistoryRecord>, DbError> {
        let mut conn = self.pool.get().await?;
        metadata_history::table
            .order((
                metadata_history::created_at.desc(),
                metadata_history::id.desc(),
            ))
            .limit(limit)
            .load(&mut conn)
            .await
    }
}
