//! Prompt construction for page content generation.

use crate::models::{PageType, SeoPage};

/// System prompt shared by every generation request.
pub const SYSTEM_PROMPT: &str = r#"You are an expert SEO content writer for a dental clinic directory website. You write accurate, helpful, locally-relevant content for patients searching for dental care.

Rules:
- Write original content. Never reuse phrasing across pages.
- No invented statistics, prices, clinic names, or medical claims.
- Plain, patient-friendly language. No filler, no keyword stuffing.
- Respond with ONLY a JSON object, no markdown fences, no commentary.

The JSON object must have this shape:
{
  "meta_title": "50-60 character title",
  "meta_description": "140-155 character description",
  "h1": "page heading",
  "intro_paragraph": "opening paragraph",
  "h2_sections": [{"heading": "...", "content": "...", "h3_subsections": [{"heading": "...", "content": "..."}]}],
  "faq": [{"question": "...", "answer": "..."}],
  "keywords": ["..."],
  "seo_score": 0.0
}"#;

/// Writing angles rotated per page so sibling pages don't converge on
/// the same structure.
const WRITING_ANGLES: &[&str] = &[
    "Lead with what a first-time visitor needs to know.",
    "Lead with cost and insurance considerations.",
    "Lead with the local context: neighborhoods, accessibility, availability.",
    "Lead with treatment outcomes and what to expect at an appointment.",
    "Lead with how to choose between providers.",
];

/// Build the user prompt for regenerating one page.
///
/// `sibling_titles` are titles of same-type pages already on the site;
/// the model is told to avoid duplicating them.
pub fn build_page_prompt(
    page: &SeoPage,
    sibling_titles: &[String],
    custom_instructions: Option<&str>,
) -> String {
    let target_words = page.page_type.word_threshold();
    let angle = WRITING_ANGLES[angle_index(&page.slug)];

    let mut prompt = format!(
        "Write the full content for this directory page.\n\n\
         Page title: {}\n\
         Page slug: {}\n\
         Page type: {}\n\
         Target length: at least {} words of body content.\n\
         Writing angle: {}\n",
        page.title,
        page.slug,
        page.page_type,
        target_words,
        angle,
    );

    if let Some(existing) = page.content.as_deref().filter(|c| !c.trim().is_empty()) {
        prompt.push_str("\nThe current content is too thin. Improve and expand it rather than contradicting it:\n");
        prompt.push_str(truncate_chars(existing, 2000));
        prompt.push('\n');
    }

    if !sibling_titles.is_empty() {
        prompt.push_str("\nThese related pages already exist. Your content and metadata must not duplicate their angle or phrasing:\n");
        for title in sibling_titles.iter().take(10) {
            prompt.push_str("- ");
            prompt.push_str(title);
            prompt.push('\n');
        }
    }

    if let Some(extra) = custom_instructions.filter(|s| !s.trim().is_empty()) {
        prompt.push_str("\nAdditional instructions: ");
        prompt.push_str(extra);
        prompt.push('\n');
    }

    prompt
}

/// Pick a stable writing angle from the slug.
fn angle_index(slug: &str) -> usize {
    let hash: u32 = slug
        .bytes()
        .fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u32));
    (hash as usize) % WRITING_ANGLES.len()
}

/// Truncate at a UTF-8 boundary.
fn truncate_chars(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PageType;

    fn sample_page(slug: &str, page_type: PageType) -> SeoPage {
        SeoPage {
            id: "p1".to_string(),
            slug: slug.to_string(),
            page_type,
            title: "Dentists in Salem, MA".to_string(),
            meta_title: None,
            meta_description: None,
            h1: None,
            content: None,
            word_count: 0,
            is_thin_content: true,
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

    #[test]
    fn angle_is_stable_per_slug() {
        assert_eq!(angle_index("ma/salem"), angle_index("ma/salem"));
    }

    #[test]
    fn prompt_carries_word_target_and_siblings() {
        let page = sample_page("services/implants", PageType::Service);
        let siblings = vec!["Dental Implants in Boston".to_string()];
        let prompt = build_page_prompt(&page, &siblings, None);
        assert!(prompt.contains("at least 800 words"));
        assert!(prompt.contains("Dental Implants in Boston"));
    }

    #[test]
    fn custom_instructions_are_appended() {
        let page = sample_page("ma/salem", PageType::City);
        let prompt = build_page_prompt(&page, &[], Some("Mention weekend availability."));
        assert!(prompt.contains("at least 300 words"));
        assert!(prompt.contains("Mention weekend availability."));
    }
}
