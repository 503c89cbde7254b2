//! Page inventory import.
//!
//! Provisions page rows from an exported inventory (a JSON array of
//! pages). Writes are upserts keyed on slug, so re-importing the same
//! inventory merges descriptive columns and never clobbers generated
//! content or audit flags.

use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use crate::models::page::word_count;
use crate::models::PageType;
use crate::repository::models::NewSeoPage;
use crate::repository::DbContext;

/// One page in an inventory export.
#[derive(Debug, Clone, Deserialize)]
pub struct ImportPage {
    pub slug: String,
    pub page_type: PageType,
    pub title: String,
    #[serde(default)]
    pub meta_title: Option<String>,
    #[serde(default)]
    pub meta_description: Option<String>,
    #[serde(default)]
    pub h1: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default = "default_indexed")]
    pub is_indexed: bool,
}

fn default_indexed() -> bool {
    true
}

#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    pub imported: usize,
}

pub struct InventoryImporter {
    db: DbContext,
}

impl InventoryImporter {
    pub fn new(db: DbContext) -> Self {
        Self { db }
    }

    /// Upsert every page in the export, keyed on slug.
    pub async fn import(&self, pages: &[ImportPage]) -> anyhow::Result<ImportReport> {
        let mut report = ImportReport::default();

        for page in pages {
            let now = Utc::now().to_rfc3339();
            let id = uuid::Uuid::new_v4().to_string();
            let record = NewSeoPage {
                id: &id,
                slug: &page.slug,
                page_type: page.page_type.as_str(),
                title: &page.title,
                meta_title: page.meta_title.as_deref(),
                meta_description: page.meta_description.as_deref(),
                h1: page.h1.as_deref(),
                content: page.content.as_deref(),
                word_count: page.content.as_deref().map(word_count).unwrap_or(0) as i32,
                is_indexed: page.is_indexed,
                created_at: &now,
                updated_at: &now,
            };
            self.db.pages().upsert(&record).await?;
            report.imported += 1;
        }

        info!("imported {} pages", report.imported);
        Ok(report)
    }
}
