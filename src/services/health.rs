//! Page inventory scanner.
//!
//! Walks the full page table, classifies each page's content health
//! against its type's word-count threshold, and optionally persists the
//! recomputed flags.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::info;

use crate::models::page::word_count;
use crate::models::{ContentStatus, PageType, SeoPage};
use crate::repository::DbContext;

/// Slug prefixes audited regardless of location whitelisting.
const EXEMPT_PREFIXES: &[&str] = &["clinic/", "dentist/", "services", "blog"];

/// One unhealthy page in a scan report.
#[derive(Debug, Clone, Serialize)]
pub struct ProblemPage {
    pub slug: String,
    pub page_type: PageType,
    pub word_count: usize,
    pub threshold: usize,
    pub status: ContentStatus,
}

/// Aggregate result of an inventory scan.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanReport {
    pub total_pages: usize,
    pub audited_pages: usize,
    pub skipped_inactive: usize,
    pub good: usize,
    pub thin: usize,
    pub missing: usize,
    /// Per page type: (good, thin, missing).
    pub by_type: BTreeMap<String, TypeCounts>,
    pub problem_pages: Vec<ProblemPage>,
    pub flags_applied: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TypeCounts {
    pub good: usize,
    pub thin: usize,
    pub missing: usize,
}

/// Scans the page inventory for content health.
pub struct InventoryScanner {
    db: DbContext,
    active_states: Vec<String>,
}

impl InventoryScanner {
    pub fn new(db: DbContext, active_states: Vec<String>) -> Self {
        Self { db, active_states }
    }

    /// Run a scan. When `apply` is set, word counts and thin flags are
    /// written back to each audited row.
    pub async fn scan(
        &self,
        page_type: Option<PageType>,
        apply: bool,
    ) -> anyhow::Result<ScanReport> {
        let pages = self.db.pages().fetch_all(page_type).await?;
        let mut report = ScanReport {
            total_pages: pages.len(),
            flags_applied: apply,
            ..Default::default()
        };

        for page in &pages {
            if !self.is_audited(page) {
                report.skipped_inactive += 1;
                continue;
            }
            report.audited_pages += 1;

            let words = page
                .content
                .as_deref()
                .map(word_count)
                .unwrap_or(0);
            let status = ContentStatus::classify(words, page.page_type);

            let counts = report
                .by_type
                .entry(page.page_type.as_str().to_string())
                .or_default();
            match status {
                ContentStatus::Good => {
                    report.good += 1;
                    counts.good += 1;
                }
                ContentStatus::Thin => {
                    report.thin += 1;
                    counts.thin += 1;
                }
                ContentStatus::Missing => {
                    report.missing += 1;
                    counts.missing += 1;
                }
            }

            if status != ContentStatus::Good {
                report.problem_pages.push(ProblemPage {
                    slug: page.slug.clone(),
                    page_type: page.page_type,
                    word_count: words,
                    threshold: page.page_type.word_threshold(),
                    status,
                });
            }

            if apply {
                self.db
                    .pages()
                    .update_health_flags(
                        &page.slug,
                        words as i32,
                        status != ContentStatus::Good,
                    )
                    .await?;
            }
        }

        info!(
            "scan complete: {} audited, {} good, {} thin, {} missing ({} inactive skipped)",
            report.audited_pages, report.good, report.thin, report.missing, report.skipped_inactive
        );
        Ok(report)
    }

    /// A page is audited when it belongs to an exempt section or its
    /// leading slug segment names an active state.
    fn is_audited(&self, page: &SeoPage) -> bool {
        is_audited_page(page, &self.active_states)
    }
}

/// Whitelist check shared with the duplicate detector. Location-bound
/// pages (state, city, service+location) are gated on the active-state
/// whitelist; every other page type is always audited.
pub fn is_audited_page(page: &SeoPage, active_states: &[String]) -> bool {
    match page.page_type {
        PageType::State | PageType::City | PageType::ServiceLocation => {
            is_audited_slug(&page.slug, active_states)
        }
        _ => true,
    }
}

/// Slug-level whitelist check: exempt section prefixes, then the
/// leading path segment against active states.
pub fn is_audited_slug(slug: &str, active_states: &[String]) -> bool {
    let slug = slug.trim_start_matches('/');
    if EXEMPT_PREFIXES
        .iter()
        .any(|p| slug == p.trim_end_matches('/') || slug.starts_with(p))
    {
        return true;
    }
    let first_segment = slug.split('/').next().unwrap_or("");
    active_states.iter().any(|s| s == first_segment)
}
