//! Content repair: regenerates thin pages through the chat-completion
//! API, snapshotting metadata before every write so any batch can be
//! rolled back.

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::llm::prompts::{build_page_prompt, SYSTEM_PROMPT};
use crate::llm::{GeneratedContent, LlmClient};
use crate::models::page::word_count;
use crate::models::{AuditRun, ContentStatus, PageOutcome, PageType, RunStatus, RunType, SeoPage};
use crate::repository::models::NewHistoryEntry;
use crate::repository::DbContext;

/// Change reason recorded on snapshots written by the fixer.
pub const REASON_CONTENT_FIX: &str = "ai_content_fix";

/// Change reason recorded on snapshots written by a rollback.
pub const REASON_ROLLBACK: &str = "rollback";

/// What to fix in one run.
#[derive(Debug, Clone, Default)]
pub struct FixRequest {
    /// Explicit slugs to fix; overrides thin-page selection when set.
    pub slugs: Vec<String>,
    /// Restrict thin-page selection to one type.
    pub page_type: Option<PageType>,
    /// Cap on pages processed in this run.
    pub limit: Option<usize>,
    /// Extra instructions appended to every prompt.
    pub custom_instructions: Option<String>,
    /// Recorded on the audit run for provenance.
    pub triggered_by: Option<String>,
}

/// Result for one page inside a fix run.
#[derive(Debug, Clone, Serialize)]
pub struct PageResult {
    pub slug: String,
    pub outcome: PageOutcome,
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FixReport {
    pub run_id: String,
    pub batch_id: String,
    pub total: usize,
    pub written: usize,
    pub skipped: usize,
    pub failed: usize,
    pub pages: Vec<PageResult>,
}

/// What to roll back.
#[derive(Debug, Clone)]
pub enum RollbackTarget {
    /// Every page touched by one batch.
    Batch(String),
    /// One page, restored to its most recent snapshot.
    Page(String),
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RollbackReport {
    pub restored: Vec<String>,
    pub missing: Vec<String>,
}

pub struct ContentFixer {
    db: DbContext,
    llm: LlmClient,
    pacing_delay_secs: u64,
}

impl ContentFixer {
    pub fn new(db: DbContext, llm: LlmClient, pacing_delay_secs: u64) -> Self {
        Self {
            db,
            llm,
            pacing_delay_secs,
        }
    }

    /// Run a content-fix batch. The audit run id doubles as the history
    /// batch id so a whole run can be rolled back in one call.
    pub async fn fix_pages(&self, request: FixRequest) -> anyhow::Result<FixReport> {
        let targets = self.select_targets(&request).await?;
        let run_id = self
            .db
            .runs()
            .start(
                RunType::ContentFix,
                targets.len() as i32,
                request.triggered_by.as_deref(),
            )
            .await?;

        let mut run = self
            .db
            .runs()
            .get(&run_id)
            .await?
            .unwrap_or_else(|| placeholder_run(&run_id, targets.len() as i32));

        let mut report = FixReport {
            run_id: run_id.clone(),
            batch_id: run_id.clone(),
            total: targets.len(),
            written: 0,
            skipped: 0,
            failed: 0,
            pages: Vec::new(),
        };

        let sibling_titles = self.sibling_titles(&targets).await?;

        for (index, page) in targets.iter().enumerate() {
            let (result, error) = self
                .fix_one(page, &sibling_titles, &request, &run_id)
                .await;

            if let Some(message) = error {
                run.push_error(format!("{}: {}", result.slug, message));
            }
            match &result.outcome {
                PageOutcome::Written => {
                    report.written += 1;
                    run.fixed_pages += 1;
                }
                PageOutcome::Skipped => {
                    report.skipped += 1;
                    run.skipped_pages += 1;
                }
                PageOutcome::Failed => {
                    report.failed += 1;
                }
            }
            run.processed_pages += 1;
            report.pages.push(result);

            self.db
                .runs()
                .update_progress(
                    &run_id,
                    run.processed_pages,
                    run.fixed_pages,
                    run.skipped_pages,
                )
                .await?;

            // Pace the API between pages, not after the last one.
            if index + 1 < targets.len() && self.pacing_delay_secs > 0 {
                tokio::time::sleep(std::time::Duration::from_secs(self.pacing_delay_secs)).await;
            }
        }

        run.status = if report.failed == report.total && report.total > 0 {
            RunStatus::Failed
        } else {
            RunStatus::Completed
        };
        run.total_pages = report.total as i32;
        run.summary = Some(serde_json::json!({
            "written": report.written,
            "skipped": report.skipped,
            "failed": report.failed,
        }));
        self.db.runs().finish(&run).await?;

        info!(
            "content fix run {} finished: {} written, {} skipped, {} failed",
            run_id, report.written, report.skipped, report.failed
        );
        Ok(report)
    }

    async fn select_targets(&self, request: &FixRequest) -> anyhow::Result<Vec<SeoPage>> {
        let mut targets = Vec::new();

        if !request.slugs.is_empty() {
            for slug in &request.slugs {
                match self.db.pages().get_by_slug(slug).await? {
                    Some(page) => targets.push(page),
                    None => warn!("requested slug not found: {}", slug),
                }
            }
        } else {
            let all = self.db.pages().fetch_all(request.page_type).await?;
            targets = all
                .into_iter()
                .filter(|p| p.content_status() != ContentStatus::Good)
                .collect();
        }

        // Explicit limit wins; otherwise the stored batch_size setting
        // caps a derived batch.
        let limit = match request.limit {
            Some(limit) => Some(limit),
            None if request.slugs.is_empty() => self
                .db
                .settings()
                .get("batch_size")
                .await?
                .and_then(|v| v.as_u64())
                .map(|v| v as usize),
            None => None,
        };
        if let Some(limit) = limit {
            targets.truncate(limit);
        }
        Ok(targets)
    }

    /// Titles of same-type pages, used as anti-duplication context.
    async fn sibling_titles(
        &self,
        targets: &[SeoPage],
    ) -> anyhow::Result<std::collections::HashMap<PageType, Vec<String>>> {
        let mut map = std::collections::HashMap::new();
        let types: std::collections::HashSet<PageType> =
            targets.iter().map(|p| p.page_type).collect();
        for page_type in types {
            let siblings = self.db.pages().fetch_all(Some(page_type)).await?;
            map.insert(
                page_type,
                siblings.into_iter().map(|p| p.title).collect(),
            );
        }
        Ok(map)
    }

    async fn fix_one(
        &self,
        page: &SeoPage,
        sibling_titles: &std::collections::HashMap<PageType, Vec<String>>,
        request: &FixRequest,
        batch_id: &str,
    ) -> (PageResult, Option<String>) {
        // Explicitly requested pages are regenerated even when healthy.
        if request.slugs.is_empty() && page.content_status() == ContentStatus::Good {
            return (
                PageResult {
                    slug: page.slug.clone(),
                    outcome: PageOutcome::Skipped,
                    detail: Some("already healthy".to_string()),
                },
                None,
            );
        }

        let siblings = sibling_titles
            .get(&page.page_type)
            .map(|titles| {
                titles
                    .iter()
                    .filter(|t| **t != page.title)
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        let prompt = build_page_prompt(page, &siblings, request.custom_instructions.as_deref());

        let raw = match self.llm.complete(SYSTEM_PROMPT, &prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                let message = format!("generation failed: {e}");
                return (
                    PageResult {
                        slug: page.slug.clone(),
                        outcome: PageOutcome::Failed,
                        detail: Some(message.clone()),
                    },
                    Some(message),
                );
            }
        };

        // An unparseable response skips the page rather than failing
        // it; nothing was written and a later run can retry.
        let content = match GeneratedContent::from_response(&raw) {
            Ok(content) => content,
            Err(e) => {
                let message = format!("unusable response: {e}");
                return (
                    PageResult {
                        slug: page.slug.clone(),
                        outcome: PageOutcome::Skipped,
                        detail: Some(message.clone()),
                    },
                    Some(message),
                );
            }
        };

        if let Err(e) = self.persist(page, &content, batch_id).await {
            let message = format!("persist failed: {e}");
            return (
                PageResult {
                    slug: page.slug.clone(),
                    outcome: PageOutcome::Failed,
                    detail: Some(message.clone()),
                },
                Some(message),
            );
        }

        (
            PageResult {
                slug: page.slug.clone(),
                outcome: PageOutcome::Written,
                detail: None,
            },
            None,
        )
    }

    /// Snapshot first, then write. A failed write after a snapshot
    /// leaves a spurious history row, which rollback tolerates.
    async fn persist(
        &self,
        page: &SeoPage,
        content: &GeneratedContent,
        batch_id: &str,
    ) -> anyhow::Result<()> {
        let created_at = Utc::now().to_rfc3339();
        let entry = NewHistoryEntry {
            slug: &page.slug,
            previous_title: page.meta_title.as_deref(),
            previous_description: page.meta_description.as_deref(),
            previous_h1: page.h1.as_deref(),
            new_title: Some(&content.meta_title),
            new_description: Some(&content.meta_description),
            new_h1: Some(&content.h1),
            change_reason: REASON_CONTENT_FIX,
            batch_id,
            created_at: &created_at,
        };
        self.db.history().insert(&entry).await?;

        let body = content.render_markdown();
        let words = word_count(&body);
        let is_thin = ContentStatus::classify(words, page.page_type) != ContentStatus::Good;
        let body_hash = crate::models::page::content_hash(&body);

        self.db
            .pages()
            .write_generated(
                &page.slug,
                &body,
                &body_hash,
                words as i32,
                is_thin,
                Some(&content.meta_title),
                Some(&content.meta_description),
                Some(&content.h1),
            )
            .await?;
        Ok(())
    }

}

/// Restores metadata from history snapshots.
pub struct Rollbacker {
    db: DbContext,
}

impl Rollbacker {
    pub fn new(db: DbContext) -> Self {
        Self { db }
    }

    /// Restore metadata from history snapshots.
    ///
    /// For a batch, every snapshot in the batch is restored. For a
    /// single page, the most recent snapshot wins.
    pub async fn rollback(&self, target: RollbackTarget) -> anyhow::Result<RollbackReport> {
        let mut report = RollbackReport::default();

        let snapshots = match &target {
            RollbackTarget::Batch(batch_id) => self.db.history().for_batch(batch_id).await?,
            RollbackTarget::Page(slug) => self
                .db
                .history()
                .latest_for_slug(slug)
                .await?
                .into_iter()
                .collect(),
        };

        if snapshots.is_empty() {
            match target {
                RollbackTarget::Batch(batch_id) => report.missing.push(batch_id),
                RollbackTarget::Page(slug) => report.missing.push(slug),
            }
            return Ok(report);
        }

        let rollback_batch = uuid::Uuid::new_v4().to_string();
        for snapshot in snapshots {
            let restored = self
                .db
                .pages()
                .restore_metadata(
                    &snapshot.slug,
                    snapshot.previous_title.as_deref(),
                    snapshot.previous_description.as_deref(),
                    snapshot.previous_h1.as_deref(),
                )
                .await?;
            if !restored {
                report.missing.push(snapshot.slug.clone());
                continue;
            }

            // The rollback itself is recorded so it can be undone too.
            let created_at = Utc::now().to_rfc3339();
            let entry = NewHistoryEntry {
                slug: &snapshot.slug,
                previous_title: snapshot.new_title.as_deref(),
                previous_description: snapshot.new_description.as_deref(),
                previous_h1: snapshot.new_h1.as_deref(),
                new_title: snapshot.previous_title.as_deref(),
                new_description: snapshot.previous_description.as_deref(),
                new_h1: snapshot.previous_h1.as_deref(),
                change_reason: REASON_ROLLBACK,
                batch_id: &rollback_batch,
                created_at: &created_at,
            };
            self.db.history().insert(&entry).await?;
            report.restored.push(snapshot.slug);
        }

        info!(
            "rollback restored {} pages ({} missing)",
            report.restored.len(),
            report.missing.len()
        );
        Ok(report)
    }
}

fn placeholder_run(id: &str, total: i32) -> AuditRun {
    AuditRun {
        id: id.to_string(),
        run_type: RunType::ContentFix,
        status: RunStatus::Running,
        total_pages: total,
        processed_pages: 0,
        fixed_pages: 0,
        skipped_pages: 0,
        error_count: 0,
        errors: Vec::new(),
        summary: None,
        triggered_by: None,
        started_at: Utc::now(),
        completed_at: None,
    }
}
