//! SEO page model: typing, word-count health, and content hashing.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Word-count floor for service and service+location pages.
pub const SERVICE_WORD_THRESHOLD: usize = 800;

/// Word-count floor for every other page type.
pub const DEFAULT_WORD_THRESHOLD: usize = 300;

/// The kind of directory page a row represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageType {
    State,
    City,
    Service,
    ServiceLocation,
    Clinic,
    Dentist,
    Blog,
    Static,
}

impl PageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageType::State => "state",
            PageType::City => "city",
            PageType::Service => "service",
            PageType::ServiceLocation => "service_location",
            PageType::Clinic => "clinic",
            PageType::Dentist => "dentist",
            PageType::Blog => "blog",
            PageType::Static => "static",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "state" => Some(PageType::State),
            "city" => Some(PageType::City),
            "service" => Some(PageType::Service),
            "service_location" => Some(PageType::ServiceLocation),
            "clinic" => Some(PageType::Clinic),
            "dentist" => Some(PageType::Dentist),
            "blog" => Some(PageType::Blog),
            "static" => Some(PageType::Static),
            _ => None,
        }
    }

    /// Minimum word count below which a page counts as thin.
    pub fn word_threshold(&self) -> usize {
        match self {
            PageType::Service | PageType::ServiceLocation => SERVICE_WORD_THRESHOLD,
            _ => DEFAULT_WORD_THRESHOLD,
        }
    }
}

impl std::fmt::Display for PageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Health classification of a page's body content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentStatus {
    Good,
    Thin,
    Missing,
}

impl ContentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentStatus::Good => "good",
            ContentStatus::Thin => "thin",
            ContentStatus::Missing => "missing",
        }
    }

    /// Classify a word count against a page type's threshold.
    ///
    /// A count of zero is always `Missing`, regardless of threshold.
    pub fn classify(word_count: usize, page_type: PageType) -> Self {
        if word_count == 0 {
            ContentStatus::Missing
        } else if word_count < page_type.word_threshold() {
            ContentStatus::Thin
        } else {
            ContentStatus::Good
        }
    }
}

/// A fully-loaded page row, as read from the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeoPage {
    pub id: String,
    pub slug: String,
    pub page_type: PageType,
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
    pub last_generated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub generation_version: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl SeoPage {
    /// Classify this page's content health.
    pub fn content_status(&self) -> ContentStatus {
        ContentStatus::classify(self.word_count.max(0) as usize, self.page_type)
    }

    /// Fingerprint of the page's visible metadata (title, description, h1).
    pub fn compute_metadata_hash(&self) -> String {
        metadata_hash(
            self.meta_title.as_deref().unwrap_or(&self.title),
            self.meta_description.as_deref().unwrap_or(""),
            self.h1.as_deref().unwrap_or(""),
        )
    }

    /// Fingerprint of the page's body content.
    pub fn compute_content_hash(&self) -> Option<String> {
        self.content.as_deref().map(content_hash)
    }
}

/// Count whitespace-separated words in a body of text.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// SHA-256 over the normalized `title|description|h1` triple.
pub fn metadata_hash(title: &str, description: &str, h1: &str) -> String {
    let joined = format!(
        "{}|{}|{}",
        title.trim().to_lowercase(),
        description.trim().to_lowercase(),
        h1.trim().to_lowercase()
    );
    sha256_hex(&joined)
}

/// SHA-256 over trimmed, lowercased body content.
pub fn content_hash(content: &str) -> String {
    sha256_hex(&content.trim().to_lowercase())
}

fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_by_type() {
        assert_eq!(PageType::Service.word_threshold(), 800);
        assert_eq!(PageType::ServiceLocation.word_threshold(), 800);
        assert_eq!(PageType::City.word_threshold(), 300);
        assert_eq!(PageType::Blog.word_threshold(), 300);
    }

    #[test]
    fn classification_boundaries() {
        assert_eq!(
            ContentStatus::classify(0, PageType::Service),
            ContentStatus::Missing
        );
        assert_eq!(
            ContentStatus::classify(799, PageType::Service),
            ContentStatus::Thin
        );
        assert_eq!(
            ContentStatus::classify(800, PageType::Service),
            ContentStatus::Good
        );
        assert_eq!(
            ContentStatus::classify(299, PageType::City),
            ContentStatus::Thin
        );
        assert_eq!(
            ContentStatus::classify(300, PageType::City),
            ContentStatus::Good
        );
        // One word of content is thin, never missing.
        assert_eq!(
            ContentStatus::classify(1, PageType::Blog),
            ContentStatus::Thin
        );
    }

    #[test]
    fn page_type_round_trips() {
        for pt in [
            PageType::State,
            PageType::City,
            PageType::Service,
            PageType::ServiceLocation,
            PageType::Clinic,
            PageType::Dentist,
            PageType::Blog,
            PageType::Static,
        ] {
            assert_eq!(PageType::parse(pt.as_str()), Some(pt));
        }
        assert_eq!(PageType::parse("bogus"), None);
    }

    #[test]
    fn metadata_hash_normalizes_case_and_whitespace() {
        let a = metadata_hash("Dentist in Boston", "Find a dentist.", "Boston Dentists");
        let b = metadata_hash("  dentist in boston ", "FIND A DENTIST.", " boston dentists");
        assert_eq!(a, b);
        let c = metadata_hash("Dentist in Salem", "Find a dentist.", "Boston Dentists");
        assert_ne!(a, c);
    }

    #[test]
    fn word_count_splits_on_whitespace() {
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("   \n\t "), 0);
        assert_eq!(word_count("one two\nthree\tfour"), 4);
    }
}
