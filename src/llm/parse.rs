//! Tolerant JSON extraction from model output.
//!
//! Models wrap JSON in markdown fences, leave trailing commas, emit
//! control characters, and truncate mid-array when they hit token
//! limits. The repair pipeline here tries progressively more invasive
//! fixes and only fails when nothing parseable remains.

use serde::{Deserialize, Serialize};

use super::client::LlmError;

/// Structured content as requested from the model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratedContent {
    pub meta_title: String,
    pub meta_description: String,
    pub h1: String,
    pub intro_paragraph: String,
    pub h2_sections: Vec<Section>,
    pub faq: Vec<FaqItem>,
    pub keywords: Vec<String>,
    pub seo_score: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Section {
    pub heading: String,
    pub content: String,
    pub h3_subsections: Vec<Subsection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Subsection {
    pub heading: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FaqItem {
    pub question: String,
    pub answer: String,
}

impl GeneratedContent {
    /// Parse a raw completion into structured content.
    pub fn from_response(raw: &str) -> Result<Self, LlmError> {
        let value = normalize_payload(extract_json_payload(raw)?);
        let content: GeneratedContent = serde_json::from_value(value)
            .map_err(|e| LlmError::Parse(format!("unexpected content shape: {e}")))?;
        if content.meta_title.is_empty()
            && content.intro_paragraph.is_empty()
            && content.h2_sections.is_empty()
            && content.faq.is_empty()
        {
            return Err(LlmError::Parse(
                "response parsed but carried no usable content".to_string(),
            ));
        }
        Ok(content)
    }

    /// Render the structured content as a markdown page body.
    pub fn render_markdown(&self) -> String {
        let mut out = String::new();

        if !self.intro_paragraph.is_empty() {
            out.push_str(&self.intro_paragraph);
            out.push_str("\n\n");
        }

        for section in &self.h2_sections {
            out.push_str("## ");
            out.push_str(&section.heading);
            out.push_str("\n\n");
            if !section.content.is_empty() {
                out.push_str(&section.content);
                out.push_str("\n\n");
            }
            for sub in &section.h3_subsections {
                out.push_str("### ");
                out.push_str(&sub.heading);
                out.push_str("\n\n");
                out.push_str(&sub.content);
                out.push_str("\n\n");
            }
        }

        if !self.faq.is_empty() {
            out.push_str("## Frequently Asked Questions\n\n");
            for item in &self.faq {
                out.push_str("### ");
                out.push_str(&item.question);
                out.push_str("\n\n");
                out.push_str(&item.answer);
                out.push_str("\n\n");
            }
        }

        out.trim_end().to_string()
    }
}

/// Extract a JSON value from sloppy model output.
///
/// Repair order: strip markdown fences, slice to the outermost bracket
/// pair, scrub trailing commas and control characters, and finally walk
/// back from the end looking for a prefix that parses (truncated
/// responses).
pub fn extract_json_payload(raw: &str) -> Result<serde_json::Value, LlmError> {
    let stripped = strip_code_fences(raw);

    if let Ok(value) = serde_json::from_str(stripped.trim()) {
        return Ok(value);
    }

    let sliced = slice_to_brackets(&stripped).unwrap_or_else(|| stripped.trim().to_string());
    if let Ok(value) = serde_json::from_str(&sliced) {
        return Ok(value);
    }

    let scrubbed = scrub(&sliced);
    if let Ok(value) = serde_json::from_str(&scrubbed) {
        return Ok(value);
    }

    if let Some(value) = repair_truncated(&scrubbed) {
        return Ok(value);
    }

    Err(LlmError::Parse(format!(
        "no JSON found in response ({} chars)",
        raw.len()
    )))
}

/// Normalize the payload shapes models actually return into the object
/// `GeneratedContent` deserializes from:
///
/// - a bare array is treated as a list of FAQ items
/// - a `faqs` key is renamed to `faq`
/// - a single wrapper key (`content`, `result`, `data`, `page`) is
///   unwrapped and the inner value normalized again
/// - a JSON string is re-parsed (double-encoded responses)
fn normalize_payload(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Array(items) => serde_json::json!({ "faq": items }),
        serde_json::Value::String(text) => match serde_json::from_str(&text) {
            Ok(inner) => normalize_payload(inner),
            Err(_) => serde_json::Value::String(text),
        },
        serde_json::Value::Object(mut map) => {
            if map.len() == 1 {
                let wrapper = map
                    .keys()
                    .next()
                    .filter(|k| matches!(k.as_str(), "content" | "result" | "data" | "page"))
                    .cloned();
                if let Some(key) = wrapper {
                    if let Some(inner) = map.remove(&key) {
                        return normalize_payload(inner);
                    }
                }
            }
            if !map.contains_key("faq") {
                if let Some(faqs) = map.remove("faqs") {
                    map.insert("faq".to_string(), faqs);
                }
            }
            serde_json::Value::Object(map)
        }
        other => other,
    }
}

/// Remove markdown code fences, with or without a language tag.
fn strip_code_fences(raw: &str) -> String {
    let trimmed = raw.trim();
    if !trimmed.contains("```") {
        return trimmed.to_string();
    }
    // Keep only what sits between the first pair of fences.
    let after_open = match trimmed.find("```") {
        Some(pos) => &trimmed[pos + 3..],
        None => trimmed,
    };
    // Drop a language tag like "json" on the fence line.
    let after_tag = match after_open.find('\n') {
        Some(nl) if after_open[..nl].trim().chars().all(|c| c.is_ascii_alphanumeric()) => {
            &after_open[nl + 1..]
        }
        _ => after_open,
    };
    let body = match after_tag.rfind("```") {
        Some(pos) => &after_tag[..pos],
        None => after_tag,
    };
    body.trim().to_string()
}

/// Slice to the outermost `{...}` or `[...]`, whichever opens first.
fn slice_to_brackets(text: &str) -> Option<String> {
    let obj_start = text.find('{');
    let arr_start = text.find('[');
    let (start, close) = match (obj_start, arr_start) {
        (Some(o), Some(a)) if a < o => (a, ']'),
        (Some(o), _) => (o, '}'),
        (None, Some(a)) => (a, ']'),
        (None, None) => return None,
    };
    let end = text.rfind(close)?;
    if end <= start {
        return None;
    }
    Some(text[start..=end].to_string())
}

/// Remove trailing commas before closing brackets and strip control
/// characters that break strict JSON parsers.
fn scrub(text: &str) -> String {
    static TRAILING_COMMA: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
    let re = TRAILING_COMMA
        .get_or_init(|| regex::Regex::new(r",\s*([}\]])").expect("valid regex literal"));

    let no_ctl: String = text
        .chars()
        .filter(|c| !matches!(c, '\u{00}'..='\u{08}' | '\u{0b}' | '\u{0c}' | '\u{0e}'..='\u{1f}' | '\u{7f}'))
        .collect();
    re.replace_all(&no_ctl, "$1").into_owned()
}

/// Recover a truncated response by retrying progressively shorter
/// prefixes, closing any brackets left open.
fn repair_truncated(text: &str) -> Option<serde_json::Value> {
    const MAX_TRIES: usize = 24;

    let mut cut = text.len();
    for _ in 0..MAX_TRIES {
        let boundary = text[..cut].rfind('}')?;
        let prefix = &text[..=boundary];
        let candidate = close_open_brackets(prefix);
        if let Ok(value) = serde_json::from_str(&scrub(&candidate)) {
            return Some(value);
        }
        if boundary == 0 {
            return None;
        }
        cut = boundary;
    }
    None
}

/// Append closers for brackets opened but never closed (string-aware).
fn close_open_brackets(text: &str) -> String {
    let mut stack = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for c in text.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => stack.push('}'),
            '[' if !in_string => stack.push(']'),
            '}' | ']' if !in_string => {
                stack.pop();
            }
            _ => {}
        }
    }

    let mut out = text.to_string();
    if in_string {
        out.push('"');
    }
    while let Some(closer) = stack.pop() {
        out.push(closer);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_clean_json() {
        let raw = r#"{"meta_title": "Dentists in Salem", "intro_paragraph": "Salem has..."}"#;
        let content = GeneratedContent::from_response(raw).unwrap();
        assert_eq!(content.meta_title, "Dentists in Salem");
    }

    #[test]
    fn strips_markdown_fences() {
        let raw = "```json\n{\"meta_title\": \"T\", \"intro_paragraph\": \"p\"}\n```";
        let content = GeneratedContent::from_response(raw).unwrap();
        assert_eq!(content.meta_title, "T");
    }

    #[test]
    fn ignores_prose_around_the_payload() {
        let raw = "Here is the content you asked for:\n{\"meta_title\": \"T\", \"intro_paragraph\": \"p\"}\nLet me know if you need edits.";
        let content = GeneratedContent::from_response(raw).unwrap();
        assert_eq!(content.meta_title, "T");
    }

    #[test]
    fn removes_trailing_commas() {
        let raw = r#"{"meta_title": "T", "keywords": ["a", "b",], "intro_paragraph": "p",}"#;
        let content = GeneratedContent::from_response(raw).unwrap();
        assert_eq!(content.keywords, vec!["a", "b"]);
    }

    #[test]
    fn repairs_truncated_section_array() {
        // Cut off mid-way through the second section.
        let raw = r#"{"meta_title": "T", "intro_paragraph": "p", "h2_sections": [{"heading": "One", "content": "done"}, {"heading": "Two", "conte"#;
        let content = GeneratedContent::from_response(raw).unwrap();
        assert_eq!(content.meta_title, "T");
        assert_eq!(content.h2_sections.len(), 1);
        assert_eq!(content.h2_sections[0].heading, "One");
    }

    #[test]
    fn unwraps_single_wrapper_keys() {
        let raw = r#"{"content": {"meta_title": "T", "intro_paragraph": "p"}}"#;
        let content = GeneratedContent::from_response(raw).unwrap();
        assert_eq!(content.meta_title, "T");
    }

    #[test]
    fn accepts_a_faqs_wrapper_object() {
        let raw = "```json\n{\"faqs\":[{\"question\":\"Q\",\"answer\":\"A\"}]}\n```";
        let content = GeneratedContent::from_response(raw).unwrap();
        assert_eq!(content.faq.len(), 1);
        assert_eq!(content.faq[0].question, "Q");
        assert_eq!(content.faq[0].answer, "A");
    }

    #[test]
    fn accepts_a_bare_faq_array() {
        let raw = r#"[{"question": "Q1", "answer": "A1"}, {"question": "Q2", "answer": "A2"}]"#;
        let content = GeneratedContent::from_response(raw).unwrap();
        assert_eq!(content.faq.len(), 2);
        assert_eq!(content.faq[1].question, "Q2");
    }

    #[test]
    fn repairs_a_truncated_bare_array() {
        // Cut off mid-way through the second item; only the first survives.
        let raw = r#"[{"question":"Q1","answer":"A1"},{"question":"Q2","ans"#;
        let content = GeneratedContent::from_response(raw).unwrap();
        assert_eq!(content.faq.len(), 1);
        assert_eq!(content.faq[0].question, "Q1");
    }

    #[test]
    fn reparses_double_encoded_responses() {
        let raw = r#""{\"meta_title\": \"T\", \"intro_paragraph\": \"p\"}""#;
        let content = GeneratedContent::from_response(raw).unwrap();
        assert_eq!(content.meta_title, "T");
    }

    #[test]
    fn rejects_responses_with_no_json() {
        let raw = "I'm sorry, I can't generate that content.";
        assert!(GeneratedContent::from_response(raw).is_err());
    }

    #[test]
    fn rejects_empty_object() {
        assert!(GeneratedContent::from_response("{}").is_err());
    }

    #[test]
    fn markdown_rendering_orders_sections() {
        let content = GeneratedContent {
            meta_title: "T".to_string(),
            intro_paragraph: "Intro.".to_string(),
            h2_sections: vec![Section {
                heading: "Services".to_string(),
                content: "Body.".to_string(),
                h3_subsections: vec![Subsection {
                    heading: "Cleanings".to_string(),
                    content: "Sub.".to_string(),
                }],
            }],
            faq: vec![FaqItem {
                question: "Q?".to_string(),
                answer: "A.".to_string(),
            }],
            ..Default::default()
        };
        let md = content.render_markdown();
        assert!(md.starts_with("Intro."));
        assert!(md.contains("## Services"));
        assert!(md.contains("### Cleanings"));
        assert!(md.contains("## Frequently Asked Questions"));
        let faq_pos = md.find("Frequently Asked").unwrap();
        let services_pos = md.find("## Services").unwrap();
        assert!(services_pos < faq_pos);
    }
}
