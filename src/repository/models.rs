//! Diesel ORM models for database tables.
//!
//! Records mirror table rows exactly (timestamps as RFC3339 text, flags
//! as booleans); conversion to domain types happens in the repositories.

use diesel::prelude::*;

use crate::models::{AuditRun, PageType, RunStatus, RunType, SeoPage};
use crate::schema;

use super::{parse_datetime, parse_datetime_opt};

/// SEO page record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::seo_pages)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SeoPageRecord {
    pub id: String,
    pub slug: String,
    pub page_type: String,
    pub title: String,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub h1: Option<String>,
    pub content: Option<String>,
    pub word_count: i32,
    pub is_thin_content: bool,
    pub is_duplicate: bool,
    pub is_indexed: bool,
    pub similarity_score: Option<f64>,
    pub duplicate_of: Option<String>,
    pub metadata_hash: Option<String>,
    pub content_hash: Option<String>,
    pub last_generated_at: Option<String>,
    pub generation_version: i32,
    pub created_at: String,
    pub updated_at: String,
}

impl From<SeoPageRecord> for SeoPage {
    fn from(record: SeoPageRecord) -> Self {
        SeoPage {
            id: record.id,
            slug: record.slug,
            // Unknown types fall back to static so a bad row can't poison a scan.
            page_type: PageType::parse(&record.page_type).unwrap_or(PageType::Static),
            title: record.title,
            meta_title: record.meta_title,
            meta_description: record.meta_description,
            h1: record.h1,
            content: record.content,
            word_count: record.word_count,
            is_thin_content: record.is_thin_content,
            is_duplicate: record.is_duplicate,
            is_indexed: record.is_indexed,
            similarity_score: record.similarity_score,
            duplicate_of: record.duplicate_of,
            metadata_hash: record.metadata_hash,
            content_hash: record.content_hash,
            last_generated_at: parse_datetime_opt(record.last_generated_at),
            generation_version: record.generation_version,
            created_at: parse_datetime(&record.created_at),
            updated_at: parse_datetime(&record.updated_at),
        }
    }
}

/// New SEO page for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::seo_pages)]
pub struct NewSeoPage<'a> {
    pub id: &'a str,
    pub slug: &'a str,
    pub page_type: &'a str,
    pub title: &'a str,
    pub meta_title: Option<&'a str>,
    pub meta_description: Option<&'a str>,
    pub h1: Option<&'a str>,
    pub content: Option<&'a str>,
    pub word_count: i32,
    pub is_indexed: bool,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

/// Metadata history record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::metadata_history)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct HistoryRecord {
    pub id: i32,
    pub slug: String,
    pub previous_title: Option<String>,
    pub previous_description: Option<String>,
    pub previous_h1: Option<String>,
    pub new_title: Option<String>,
    pub new_description: Option<String>,
    pub new_h1: Option<String>,
    pub change_reason: String,
    pub batch_id: String,
    pub created_at: String,
}

/// New history entry for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::metadata_history)]
pub struct NewHistoryEntry<'a> {
    pub slug: &'a str,
    pub previous_title: Option<&'a str>,
    pub previous_description: Option<&'a str>,
    pub previous_h1: Option<&'a str>,
    pub new_title: Option<&'a str>,
    pub new_description: Option<&'a str>,
    pub new_h1: Option<&'a str>,
    pub change_reason: &'a str,
    pub batch_id: &'a str,
    pub created_at: &'a str,
}

/// Audit run record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::audit_runs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AuditRunRecord {
    pub id: String,
    pub run_type: String,
    pub status: String,
    pub total_pages: i32,
    pub processed_pages: i32,
    pub fixed_pages: i32,
    pub skipped_pages: i32,
    pub error_count: i32,
    pub errors: String,
    pub summary: Option<String>,
    pub triggered_by: Option<String>,
    pub started_at: String,
    pub completed_at: Option<String>,
}

impl From<AuditRunRecord> for AuditRun {
    fn from(record: AuditRunRecord) -> Self {
        AuditRun {
            id: record.id,
            run_type: RunType::parse(&record.run_type).unwrap_or(RunType::Scan),
            status: RunStatus::parse(&record.status).unwrap_or(RunStatus::Failed),
            total_pages: record.total_pages,
            processed_pages: record.processed_pages,
            fixed_pages: record.fixed_pages,
            skipped_pages: record.skipped_pages,
            error_count: record.error_count,
            errors: serde_json::from_str(&record.errors).unwrap_or_default(),
            summary: record
                .summary
                .and_then(|s| serde_json::from_str(&s).ok()),
            triggered_by: record.triggered_by,
            started_at: parse_datetime(&record.started_at),
            completed_at: parse_datetime_opt(record.completed_at),
        }
    }
}

/// New audit run for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::audit_runs)]
pub struct NewAuditRun<'a> {
    pub id: &'a str,
    pub run_type: &'a str,
    pub status: &'a str,
    pub total_pages: i32,
    pub errors: &'a str,
    pub triggered_by: Option<&'a str>,
    pub started_at: &'a str,
}

/// Settings record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::bot_settings)]
#[diesel(primary_key(setting_key))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SettingRecord {
    pub setting_key: String,
    pub setting_value: String,
    pub updated_at: String,
}
