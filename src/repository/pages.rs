//! SEO page repository.

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::models::{PageType, SeoPage};
use crate::schema::seo_pages;

use super::models::{NewSeoPage, SeoPageRecord};
use super::pool::{DbError, SqlitePool};

/// Default rows fetched per round trip when walking the full table.
pub const FETCH_PAGE_SIZE: i64 = 1000;

#[derive(Clone)]
pub struct PageRepository {
    pool: SqlitePool,
    fetch_page_size: i64,
}

impl PageRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            fetch_page_size: FETCH_PAGE_SIZE,
        }
    }

    /// Override the fetch chunk size (configured via `page_size`).
    pub fn with_page_size(mut self, rows: i64) -> Self {
        self.fetch_page_size = rows.max(1);
        self
    }

    /// Fetch every page, optionally filtered by type, in slug order.
    ///
    /// Reads in chunks so a large inventory never needs a single
    /// unbounded result set.
    pub async fn fetch_all(&self, page_type: Option<PageType>) -> Result<Vec<SeoPage>, DbError> {
        let mut conn = self.pool.get().await?;
        let mut all = Vec::new();
        let mut offset = 0i64;

        loop {
            let mut query = seo_pages::table
                .order(seo_pages::slug.asc())
                .limit(self.fetch_page_size)
                .offset(offset)
                .into_boxed();
            if let Some(pt) = page_type {
                query = query.filter(seo_pages::page_type.eq(pt.as_str()));
            }

            let batch: Vec<SeoPageRecord> = query.load(&mut conn).await?;
            let fetched = batch.len() as i64;
            all.extend(batch.into_iter().map(SeoPage::from));

            if fetched < self.fetch_page_size {
                break;
            }
            offset += self.fetch_page_size;
        }

        Ok(all)
    }

    /// Get a page by its slug.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<SeoPage>, DbError> {
        let mut conn = self.pool.get().await?;
        let record: Option<SeoPageRecord> = seo_pages::table
            .filter(seo_pages::slug.eq(slug))
            .first(&mut conn)
            .await
            .optional()?;
        Ok(record.map(SeoPage::from))
    }

    /// Total row count.
    pub async fn count(&self) -> Result<i64, DbError> {
        use diesel::dsl::count_star;
        let mut conn = self.pool.get().await?;
        seo_pages::table.select(count_star()).first(&mut conn).await
    }

    /// Insert a page, or merge into the existing row with the same slug.
    ///
    /// The merge preserves generated content and audit flags; only the
    /// descriptive columns carried by `page` are overwritten.
    pub async fn upsert(&self, page: &NewSeoPage<'_>) -> Result<(), DbError> {
        let mut conn = self.pool.get().await?;
        diesel::insert_into(seo_pages::table)
            .values(page)
            .on_conflict(seo_pages::slug)
            .do_update()
            .set((
                seo_pages::page_type.eq(page.page_type),
                seo_pages::title.eq(page.title),
                seo_pages::is_indexed.eq(page.is_indexed),
                seo_pages::updated_at.eq(page.updated_at),
            ))
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    /// Persist scan results for one page: word count and the thin flag.
    pub async fn update_health_flags(
        &self,
        slug: &str,
        word_count: i32,
        is_thin: bool,
    ) -> Result<(), DbError> {
        let mut conn = self.pool.get().await?;
        diesel::update(seo_pages::table.filter(seo_pages::slug.eq(slug)))
            .set((
                seo_pages::word_count.eq(word_count),
                seo_pages::is_thin_content.eq(is_thin),
                seo_pages::updated_at.eq(Utc::now().to_rfc3339()),
            ))
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    /// Reset duplicate flags on every row before a fresh detection pass.
    pub async fn clear_duplicate_flags(&self) -> Result<usize, DbError> {
        let mut conn = self.pool.get().await?;
        diesel::update(seo_pages::table)
            .set((
                seo_pages::is_duplicate.eq(false),
                seo_pages::similarity_score.eq(None::<f64>),
                seo_pages::duplicate_of.eq(None::<String>),
            ))
            .execute(&mut conn)
            .await
    }

    /// Flag a page as a duplicate of a canonical slug.
    pub async fn mark_duplicate(
        &self,
        slug: &str,
        duplicate_of: &str,
        similarity_score: f64,
    ) -> Result<(), DbError> {
        let mut conn = self.pool.get().await?;
        diesel::update(seo_pages::table.filter(seo_pages::slug.eq(slug)))
            .set((
                seo_pages::is_duplicate.eq(true),
                seo_pages::duplicate_of.eq(duplicate_of),
                seo_pages::similarity_score.eq(similarity_score),
                seo_pages::updated_at.eq(Utc::now().to_rfc3339()),
            ))
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    /// Store recomputed content fingerprints.
    pub async fn update_hashes(
        &self,
        slug: &str,
        metadata_hash: &str,
        content_hash: Option<&str>,
    ) -> Result<(), DbError> {
        let mut conn = self.pool.get().await?;
        diesel::update(seo_pages::table.filter(seo_pages::slug.eq(slug)))
            .set((
                seo_pages::metadata_hash.eq(metadata_hash),
                seo_pages::content_hash.eq(content_hash),
            ))
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    /// Write freshly generated content and metadata, bumping the
    /// generation version and clearing the thin flag when the new body
    /// clears its threshold.
    #[allow(clippy::too_many_arguments)]
    pub async fn write_generated(
        &self,
        slug: &str,
        content: &str,
        content_hash: &str,
        word_count: i32,
        is_thin: bool,
        meta_title: Option<&str>,
        meta_description: Option<&str>,
        h1: Option<&str>,
    ) -> Result<(), DbError> {
        let now = Utc::now().to_rfc3339();
        let mut conn = self.pool.get().await?;
        diesel::update(seo_pages::table.filter(seo_pages::slug.eq(slug)))
            .set((
                seo_pages::content.eq(content),
                seo_pages::content_hash.eq(content_hash),
                seo_pages::word_count.eq(word_count),
                seo_pages::is_thin_content.eq(is_thin),
                seo_pages::meta_title.eq(meta_title),
                seo_pages::meta_description.eq(meta_description),
                seo_pages::h1.eq(h1),
                seo_pages::last_generated_at.eq(&now),
                seo_pages::generation_version.eq(seo_pages::generation_version + 1),
                seo_pages::updated_at.eq(&now),
            ))
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    /// Restore metadata columns only (rollback path).
    pub async fn restore_metadata(
        &self,
        slug: &str,
        meta_title: Option<&str>,
        meta_description: Option<&str>,
        h1: Option<&str>,
    ) -> Result<bool, DbError> {
        let mut conn = self.pool.get().await?;
        let rows = diesel::update(seo_pages::table.filter(seo_pages::slug.eq(slug)))
            .set((
                seo_pages::meta_title.eq(meta_title),
                seo_pages::meta_description.eq(meta_description),
                seo_pages::h1.eq(h1),
                seo_pages::updated_at.eq(Utc::now().to_rfc3339()),
            ))
            .execute(&mut conn)
            .await?;
        Ok(rows > 0)
    }
}
