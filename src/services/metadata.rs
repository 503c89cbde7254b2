//! Template-based metadata seeding.
//!
//! Fills in missing meta titles, descriptions, and h1s from page-type
//! templates so no page ships with empty metadata while it waits for
//! generated content. Titles are capped at 60 characters and
//! descriptions at 155, truncated on word boundaries.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::models::{PageType, RunStatus, RunType, SeoPage};
use crate::repository::models::NewHistoryEntry;
use crate::repository::DbContext;

/// Change reason recorded on seeding snapshots.
pub const REASON_METADATA_SEED: &str = "metadata_seed";

/// Character cap for meta titles.
pub const TITLE_MAX_CHARS: usize = 60;

/// Character cap for meta descriptions.
pub const DESCRIPTION_MAX_CHARS: usize = 155;

#[derive(Debug, Clone, Default, Serialize)]
pub struct SeedReport {
    pub seeded: Vec<String>,
    pub skipped: usize,
    /// Titles shared by more than one page after seeding.
    pub duplicate_titles: BTreeMap<String, Vec<String>>,
    pub batch_id: String,
}

pub struct MetadataSeeder {
    db: DbContext,
}

impl MetadataSeeder {
    pub fn new(db: DbContext) -> Self {
        Self { db }
    }

    /// Seed metadata for pages missing it. With `force`, existing
    /// metadata is overwritten too (snapshots make this reversible).
    ///
    /// The audit run id doubles as the history batch id, matching the
    /// content fixer's convention.
    pub async fn seed(&self, page_type: Option<PageType>, force: bool) -> anyhow::Result<SeedReport> {
        let pages = self.db.pages().fetch_all(page_type).await?;
        let batch_id = self
            .db
            .runs()
            .start(RunType::MetadataSeed, pages.len() as i32, None)
            .await?;
        let mut report = SeedReport {
            batch_id: batch_id.clone(),
            ..Default::default()
        };

        let mut titles_seen: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for page in &pages {
            let needs_seed = force
                || page.meta_title.as_deref().unwrap_or("").is_empty()
                || page.meta_description.as_deref().unwrap_or("").is_empty();

            if !needs_seed {
                if let Some(title) = page.meta_title.as_deref() {
                    titles_seen
                        .entry(title.to_string())
                        .or_default()
                        .push(page.slug.clone());
                }
                report.skipped += 1;
                continue;
            }

            let (meta_title, meta_description, h1) = build_metadata(page);

            let created_at = Utc::now().to_rfc3339();
            let entry = NewHistoryEntry {
                slug: &page.slug,
                previous_title: page.meta_title.as_deref(),
                previous_description: page.meta_description.as_deref(),
                previous_h1: page.h1.as_deref(),
                new_title: Some(&meta_title),
                new_description: Some(&meta_description),
                new_h1: Some(&h1),
                change_reason: REASON_METADATA_SEED,
                batch_id: &batch_id,
                created_at: &created_at,
            };
            self.db.history().insert(&entry).await?;

            self.db
                .pages()
                .restore_metadata(
                    &page.slug,
                    Some(&meta_title),
                    Some(&meta_description),
                    Some(&h1),
                )
                .await?;

            titles_seen
                .entry(meta_title.clone())
                .or_default()
                .push(page.slug.clone());
            report.seeded.push(page.slug.clone());
        }

        report.duplicate_titles = titles_seen
            .into_iter()
            .filter(|(_, slugs)| slugs.len() > 1)
            .collect();

        if let Some(mut run) = self.db.runs().get(&batch_id).await? {
            run.status = RunStatus::Completed;
            run.processed_pages = pages.len() as i32;
            run.fixed_pages = report.seeded.len() as i32;
            run.skipped_pages = report.skipped as i32;
            run.summary = Some(serde_json::json!({
                "seeded": report.seeded.len(),
                "skipped": report.skipped,
                "duplicate_titles": report.duplicate_titles.len(),
            }));
            self.db.runs().finish(&run).await?;
        }

        info!(
            "metadata seed: {} seeded, {} skipped, {} duplicate titles",
            report.seeded.len(),
            report.skipped,
            report.duplicate_titles.len()
        );
        Ok(report)
    }
}

/// Build template metadata for a page.
fn build_metadata(page: &SeoPage) -> (String, String, String) {
    let subject = &page.title;
    let (title, description) = match page.page_type {
        PageType::State | PageType::City => (
            format!("{subject} | Find Trusted Local Dentists"),
            format!("Compare dental clinics in {subject}. Browse verified providers, services offered, and patient information to find the right dentist near you."),
        ),
        PageType::Service | PageType::ServiceLocation => (
            format!("{subject} | Costs, Options & Providers"),
            format!("Learn about {subject}: what to expect, typical costs, and how to choose a qualified provider in your area."),
        ),
        PageType::Clinic => (
            format!("{subject} | Clinic Profile & Services"),
            format!("View the profile for {subject}: services offered, location details, and how to book an appointment."),
        ),
        PageType::Dentist => (
            format!("{subject} | Dentist Profile"),
            format!("Professional profile for {subject}: credentials, services, and practice locations."),
        ),
        PageType::Blog | PageType::Static => (
            subject.to_string(),
            format!("{subject} - guides and resources for dental patients."),
        ),
    };

    (
        truncate_on_word(&title, TITLE_MAX_CHARS),
        truncate_on_word(&description, DESCRIPTION_MAX_CHARS),
        subject.to_string(),
    )
}

/// Truncate to `max` characters without splitting a word.
pub fn truncate_on_word(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    match cut.rfind(' ') {
        Some(pos) if pos > 0 => cut[..pos].trim_end().to_string(),
        _ => cut,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(truncate_on_word("Dentists in Salem", 60), "Dentists in Salem");
    }

    #[test]
    fn truncation_lands_on_a_word_boundary() {
        let text = "Compare dental clinics and find trusted providers near you today";
        let out = truncate_on_word(text, 30);
        assert!(out.chars().count() <= 30);
        assert!(!out.ends_with(' '));
        // Never cuts mid-word.
        assert!(text.starts_with(&out));
        assert!(text.as_bytes().get(out.len()) == Some(&b' '));
    }

    #[test]
    fn seeded_titles_respect_the_cap() {
        let page = sample_page(
            "ma/extremely-long-city-name-with-many-words-in-it",
            "An Extremely Long City Name With Many Words In It, Massachusetts",
        );
        let (title, description, h1) = build_metadata(&page);
        assert!(title.chars().count() <= TITLE_MAX_CHARS);
        assert!(description.chars().count() <= DESCRIPTION_MAX_CHARS);
        assert_eq!(h1, page.title);
    }

    fn sample_page(slug: &str, title: &str) -> SeoPage {
        SeoPage {
            id: slug.to_string(),
            slug: slug.to_string(),
            page_type: PageType::City,
            title: title.to_string(),
            meta_title: None,
            meta_description: None,
            h1: None,
            content: None,
            word_count: 0,
            is_thin_content: false,
            is_duplicate: false,
            is_indexed: true,
            similarity_score: None,
            duplicate_of: None,
            metadata_hash: None,
            content_hash: None,
            last_generated_at: None,
            generation_version: 0,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }
}
