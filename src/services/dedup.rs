//! Duplicate and near-duplicate detection.
//!
//! Exact duplicates are found by hashing the metadata triple; near
//! duplicates by Jaccard similarity over word sets, compared only
//! within a page type. Each pass clears stale flags first so the
//! operation stays idempotent.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use tracing::{info, warn};

use crate::models::page::{content_hash, metadata_hash};
use crate::models::{PageType, SeoPage};
use crate::repository::DbContext;

use super::health::is_audited_page;

/// Similarity at or above which two titles count as duplicated.
pub const DEFAULT_TITLE_THRESHOLD: f64 = 0.85;

/// Similarity at or above which two descriptions count as duplicated.
pub const DEFAULT_DESCRIPTION_THRESHOLD: f64 = 0.85;

/// Similarity at or above which two content bodies count as duplicated.
pub const DEFAULT_CONTENT_THRESHOLD: f64 = 0.70;

/// Detection thresholds, overridable through stored bot settings.
#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    pub title: f64,
    pub description: f64,
    pub content: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE_THRESHOLD,
            description: DEFAULT_DESCRIPTION_THRESHOLD,
            content: DEFAULT_CONTENT_THRESHOLD,
        }
    }
}

impl Thresholds {
    /// Load from stored settings, falling back to compiled defaults
    /// for missing or malformed keys.
    pub async fn load(db: &DbContext) -> Self {
        let mut thresholds = Self::default();
        let repo = db.settings();
        if let Ok(Some(v)) = repo.get("title_similarity_threshold").await {
            if let Some(f) = v.as_f64() {
                thresholds.title = f;
            }
        }
        if let Ok(Some(v)) = repo.get("description_similarity_threshold").await {
            if let Some(f) = v.as_f64() {
                thresholds.description = f;
            }
        }
        if let Ok(Some(v)) = repo.get("content_similarity_threshold").await {
            if let Some(f) = v.as_f64() {
                thresholds.content = f;
            }
        }
        thresholds
    }
}

/// Words shorter than this carry no signal and are dropped.
const MIN_WORD_LEN: usize = 4;

/// A group of pages sharing identical metadata.
#[derive(Debug, Clone, Serialize)]
pub struct ExactGroup {
    /// First slug in order; the others are flagged against it.
    pub canonical: String,
    pub duplicates: Vec<String>,
}

/// A near-duplicate pair found by similarity comparison.
#[derive(Debug, Clone, Serialize)]
pub struct NearPair {
    pub slug: String,
    pub duplicate_of: String,
    pub page_type: PageType,
    pub title_similarity: f64,
    pub description_similarity: f64,
    pub content_similarity: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DedupReport {
    pub pages_checked: usize,
    pub exact_groups: Vec<ExactGroup>,
    pub near_pairs: Vec<NearPair>,
    pub flagged: usize,
    /// Pages lacking body content, compared on metadata only.
    pub skipped_missing_content: usize,
    pub errors: Vec<String>,
}

pub struct DuplicateDetector {
    db: DbContext,
    active_states: Vec<String>,
}

impl DuplicateDetector {
    pub fn new(db: DbContext, active_states: Vec<String>) -> Self {
        Self { db, active_states }
    }

    /// Run a full detection pass and persist the resulting flags.
    pub async fn detect(&self, page_type: Option<PageType>) -> anyhow::Result<DedupReport> {
        let thresholds = Thresholds::load(&self.db).await;
        let pages = self.db.pages().fetch_all(page_type).await?;
        let audited: Vec<&SeoPage> = pages
            .iter()
            .filter(|p| is_audited_page(p, &self.active_states))
            .collect();

        let mut report = DedupReport {
            pages_checked: audited.len(),
            ..Default::default()
        };

        // Stale flags from earlier passes would otherwise accumulate.
        self.db.pages().clear_duplicate_flags().await?;

        // Refresh fingerprints while we have the rows in hand.
        let mut by_hash: BTreeMap<String, Vec<&SeoPage>> = BTreeMap::new();
        for &page in &audited {
            let meta_hash = metadata_hash(
                page.meta_title.as_deref().unwrap_or(&page.title),
                page.meta_description.as_deref().unwrap_or(""),
                page.h1.as_deref().unwrap_or(""),
            );
            let body_hash = page.content.as_deref().map(content_hash);
            if let Err(e) = self
                .db
                .pages()
                .update_hashes(&page.slug, &meta_hash, body_hash.as_deref())
                .await
            {
                warn!("failed to store hashes for {}: {}", page.slug, e);
                report.errors.push(format!("{}: {}", page.slug, e));
            }
            by_hash.entry(meta_hash).or_default().push(page);
        }

        // Exact groups: identical metadata triples. A failed flag write
        // is tallied and the pass moves on.
        for group in by_hash.values().filter(|g| g.len() > 1) {
            let canonical = &group[0].slug;
            let mut duplicates = Vec::new();
            for page in &group[1..] {
                if let Err(e) = self
                    .db
                    .pages()
                    .mark_duplicate(&page.slug, canonical, 1.0)
                    .await
                {
                    warn!("failed to flag {}: {}", page.slug, e);
                    report.errors.push(format!("{}: {}", page.slug, e));
                    continue;
                }
                duplicates.push(page.slug.clone());
                report.flagged += 1;
            }
            if !duplicates.is_empty() {
                report.exact_groups.push(ExactGroup {
                    canonical: canonical.clone(),
                    duplicates,
                });
            }
        }

        // Near duplicates: pairwise within a page type, skipping pages
        // already flagged as exact duplicates.
        let exact_flagged: HashSet<&str> = report
            .exact_groups
            .iter()
            .flat_map(|g| g.duplicates.iter().map(String::as_str))
            .collect();

        let mut by_type: BTreeMap<PageType, Vec<&SeoPage>> = BTreeMap::new();
        for &page in &audited {
            if !exact_flagged.contains(page.slug.as_str()) {
                if page.content.is_none() {
                    report.skipped_missing_content += 1;
                }
                by_type.entry(page.page_type).or_default().push(page);
            }
        }

        for group in by_type.values() {
            for (i, a) in group.iter().enumerate() {
                for b in &group[i + 1..] {
                    if let Some(pair) = compare_pages(a, b, thresholds) {
                        if let Err(e) = self
                            .db
                            .pages()
                            .mark_duplicate(
                                &pair.slug,
                                &pair.duplicate_of,
                                pair.content_similarity
                                    .max(pair.title_similarity)
                                    .max(pair.description_similarity),
                            )
                            .await
                        {
                            warn!("failed to flag {}: {}", pair.slug, e);
                            report.errors.push(format!("{}: {}", pair.slug, e));
                            continue;
                        }
                        report.flagged += 1;
                        report.near_pairs.push(pair);
                    }
                }
            }
        }

        info!(
            "duplicate check: {} pages, {} exact groups, {} near pairs, {} flagged",
            report.pages_checked,
            report.exact_groups.len(),
            report.near_pairs.len(),
            report.flagged
        );
        Ok(report)
    }
}

/// Compare two pages; the later slug is flagged against the earlier one.
fn compare_pages(a: &SeoPage, b: &SeoPage, thresholds: Thresholds) -> Option<NearPair> {
    let title_sim = jaccard_similarity(
        a.meta_title.as_deref().unwrap_or(&a.title),
        b.meta_title.as_deref().unwrap_or(&b.title),
    );
    let desc_sim = jaccard_similarity(
        a.meta_description.as_deref().unwrap_or(""),
        b.meta_description.as_deref().unwrap_or(""),
    );
    let content_sim = match (a.content.as_deref(), b.content.as_deref()) {
        (Some(ca), Some(cb)) => jaccard_similarity(ca, cb),
        _ => 0.0,
    };

    let duplicated = content_sim >= thresholds.content
        || (title_sim >= thresholds.title && desc_sim >= thresholds.description);
    if !duplicated {
        return None;
    }

    Some(NearPair {
        slug: b.slug.clone(),
        duplicate_of: a.slug.clone(),
        page_type: b.page_type,
        title_similarity: title_sim,
        description_similarity: desc_sim,
        content_similarity: content_sim,
    })
}

/// Jaccard similarity over significant-word sets.
pub fn jaccard_similarity(a: &str, b: &str) -> f64 {
    let set_a = word_set(a);
    let set_b = word_set(b);
    if set_a.is_empty() && set_b.is_empty() {
        return 0.0;
    }
    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.union(&set_b).count();
    if union == 0 {
        return 0.0;
    }
    intersection as f64 / union as f64
}

/// Lowercased words with punctuation stripped, short words dropped.
fn word_set(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(|w| {
            w.chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
        })
        .filter(|w| w.len() >= MIN_WORD_LEN)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_text_scores_one() {
        let text = "affordable dental implants with experienced specialists";
        assert_eq!(jaccard_similarity(text, text), 1.0);
    }

    #[test]
    fn disjoint_text_scores_zero() {
        assert_eq!(
            jaccard_similarity("orthodontic braces alignment", "wisdom tooth extraction"),
            0.0
        );
    }

    #[test]
    fn punctuation_and_case_are_ignored() {
        assert_eq!(
            jaccard_similarity("Dental Implants, Boston!", "dental implants boston"),
            1.0
        );
    }

    #[test]
    fn short_words_carry_no_signal() {
        // "in", "the", "a" are all dropped before comparison.
        assert_eq!(
            jaccard_similarity("implants in the city", "implants a city"),
            1.0
        );
    }

    #[test]
    fn empty_inputs_score_zero() {
        assert_eq!(jaccard_similarity("", ""), 0.0);
        assert_eq!(jaccard_similarity("implants", ""), 0.0);
    }

    #[test]
    fn near_pair_requires_threshold() {
        let a = page("ma/salem", "Dentists in Salem Massachusetts area guide");
        let b = page("ma/beverly", "Dentists in Beverly Massachusetts area guide");
        // High title overlap alone is not enough without description overlap.
        assert!(compare_pages(&a, &b, Thresholds::default()).is_none());
    }

    fn page(slug: &str, title: &str) -> SeoPage {
        SeoPage {
            id: slug.to_string(),
            slug: slug.to_string(),
            page_type: crate::models::PageType::City,
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
