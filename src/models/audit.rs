//! Audit run tracking: long-running jobs record their lifecycle so the
//! HTTP API and CLI can report progress and history.

use serde::{Deserialize, Serialize};

/// Maximum individual error messages kept on a run. Further errors only
/// bump the counter.
pub const MAX_RECORDED_ERRORS: usize = 20;

/// What kind of job a run represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunType {
    Scan,
    DuplicateCheck,
    ContentFix,
    MetadataSeed,
    Rollback,
}

impl RunType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunType::Scan => "scan",
            RunType::DuplicateCheck => "duplicate_check",
            RunType::ContentFix => "content_fix",
            RunType::MetadataSeed => "metadata_seed",
            RunType::Rollback => "rollback",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "scan" => Some(RunType::Scan),
            "duplicate_check" => Some(RunType::DuplicateCheck),
            "content_fix" => Some(RunType::ContentFix),
            "metadata_seed" => Some(RunType::MetadataSeed),
            "rollback" => Some(RunType::Rollback),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "running" => Some(RunStatus::Running),
            "completed" => Some(RunStatus::Completed),
            "failed" => Some(RunStatus::Failed),
            _ => None,
        }
    }
}

/// How a single page fared inside a content-fix run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageOutcome {
    /// New content and metadata were written.
    Written,
    /// Page did not need work (already healthy, or excluded).
    Skipped,
    /// Generation or persistence failed; the page is untouched.
    Failed,
}

/// A job's full lifecycle record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRun {
    pub id: String,
    pub run_type: RunType,
    pub status: RunStatus,
    pub total_pages: i32,
    pub processed_pages: i32,
    pub fixed_pages: i32,
    pub skipped_pages: i32,
    pub error_count: i32,
    pub errors: Vec<String>,
    pub summary: Option<serde_json::Value>,
    pub triggered_by: Option<String>,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl AuditRun {
    /// Record an error, keeping only the first `MAX_RECORDED_ERRORS` messages.
    pub fn push_error(&mut self, message: impl Into<String>) {
        self.error_count += 1;
        if self.errors.len() < MAX_RECORDED_ERRORS {
            self.errors.push(message.into());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank_run() -> AuditRun {
        AuditRun {
            id: "run-1".to_string(),
            run_type: RunType::ContentFix,
            status: RunStatus::Running,
            total_pages: 0,
            processed_pages: 0,
            fixed_pages: 0,
            skipped_pages: 0,
            error_count: 0,
            errors: Vec::new(),
            summary: None,
            triggered_by: None,
            started_at: chrono::Utc::now(),
            completed_at: None,
        }
    }

    #[test]
    fn errors_cap_at_limit_but_count_keeps_growing() {
        let mut run = blank_run();
        for i in 0..30 {
            run.push_error(format!("error {i}"));
        }
        assert_eq!(run.error_count, 30);
        assert_eq!(run.errors.len(), MAX_RECORDED_ERRORS);
        assert_eq!(run.errors[0], "error 0");
    }

    #[test]
    fn run_type_round_trips() {
        for rt in [
            RunType::Scan,
            RunType::DuplicateCheck,
            RunType::ContentFix,
            RunType::MetadataSeed,
            RunType::Rollback,
        ] {
            assert_eq!(RunType::parse(rt.as_str()), Some(rt));
        }
    }
}
