//! End-to-end pipeline tests against a temporary SQLite database:
//! schema init, inventory scanning, duplicate detection, metadata
//! seeding, and rollback.

use chrono::Utc;
use diesel_async::SimpleAsyncConnection;
use tempfile::TempDir;

use pagewarden::models::{ContentStatus, PageType, RunStatus, RunType};
use pagewarden::repository::models::NewSeoPage;
use pagewarden::repository::DbContext;
use pagewarden::services::generate::RollbackTarget;
use pagewarden::services::{
    DuplicateDetector, ImportPage, InventoryImporter, InventoryScanner, MetadataSeeder, Rollbacker,
};

fn active_states() -> Vec<String> {
    vec!["ca".into(), "ct".into(), "ma".into(), "nj".into()]
}

async fn test_db() -> (TempDir, DbContext) {
    let dir = TempDir::new().expect("temp dir");
    let ctx = DbContext::new(&dir.path().join("test.db"));
    ctx.init_schema().await.expect("schema init");
    (dir, ctx)
}

fn words(n: usize) -> String {
    (0..n)
        .map(|i| format!("word{i}"))
        .collect::<Vec<_>>()
        .join(" ")
}

async fn insert_page(
    ctx: &DbContext,
    slug: &str,
    page_type: PageType,
    title: &str,
    content: Option<&str>,
) {
    let now = Utc::now().to_rfc3339();
    let page = NewSeoPage {
        id: slug,
        slug,
        page_type: page_type.as_str(),
        title,
        meta_title: None,
        meta_description: None,
        h1: None,
        content,
        word_count: 0,
        is_indexed: true,
        created_at: &now,
        updated_at: &now,
    };
    ctx.pages().upsert(&page).await.expect("upsert");
}

#[tokio::test]
async fn schema_init_is_idempotent() {
    let (_dir, ctx) = test_db().await;
    ctx.init_schema().await.expect("second init");
    assert_eq!(ctx.pages().count().await.unwrap(), 0);
}

#[tokio::test]
async fn upsert_merges_on_slug() {
    let (_dir, ctx) = test_db().await;
    insert_page(&ctx, "ma/salem", PageType::City, "Old Title", None).await;
    insert_page(&ctx, "ma/salem", PageType::City, "New Title", None).await;

    assert_eq!(ctx.pages().count().await.unwrap(), 1);
    let page = ctx.pages().get_by_slug("ma/salem").await.unwrap().unwrap();
    assert_eq!(page.title, "New Title");
}

#[tokio::test]
async fn import_provisions_and_merges_inventory() {
    let (_dir, ctx) = test_db().await;
    let body = words(320);

    let importer = InventoryImporter::new(ctx.clone());
    let first = vec![
        ImportPage {
            slug: "ma/salem".to_string(),
            page_type: PageType::City,
            title: "Salem, MA".to_string(),
            meta_title: None,
            meta_description: None,
            h1: None,
            content: Some(body.clone()),
            is_indexed: true,
        },
        ImportPage {
            slug: "services/implants".to_string(),
            page_type: PageType::Service,
            title: "Dental Implants".to_string(),
            meta_title: None,
            meta_description: None,
            h1: None,
            content: None,
            is_indexed: true,
        },
    ];
    let report = importer.import(&first).await.unwrap();
    assert_eq!(report.imported, 2);
    assert_eq!(ctx.pages().count().await.unwrap(), 2);

    let salem = ctx.pages().get_by_slug("ma/salem").await.unwrap().unwrap();
    assert_eq!(salem.word_count, 320);

    // Re-importing merges on slug: the title updates, the stored body
    // and its word count survive even though the export omits them.
    let second = vec![ImportPage {
        slug: "ma/salem".to_string(),
        page_type: PageType::City,
        title: "Salem, Massachusetts".to_string(),
        meta_title: None,
        meta_description: None,
        h1: None,
        content: None,
        is_indexed: true,
    }];
    importer.import(&second).await.unwrap();

    assert_eq!(ctx.pages().count().await.unwrap(), 2);
    let merged = ctx.pages().get_by_slug("ma/salem").await.unwrap().unwrap();
    assert_eq!(merged.title, "Salem, Massachusetts");
    assert_eq!(merged.content.as_deref(), Some(body.as_str()));
    assert_eq!(merged.word_count, 320);
}

#[tokio::test]
async fn fetch_walks_the_inventory_in_configured_chunks() {
    let dir = TempDir::new().expect("temp dir");
    let ctx = DbContext::new(&dir.path().join("test.db")).with_fetch_page_size(2);
    ctx.init_schema().await.expect("schema init");

    for slug in ["ma/a", "ma/b", "ma/c", "ma/d", "ma/e"] {
        insert_page(&ctx, slug, PageType::City, slug, None).await;
    }

    let all = ctx.pages().fetch_all(None).await.unwrap();
    assert_eq!(all.len(), 5);
    let slugs: Vec<&str> = all.iter().map(|p| p.slug.as_str()).collect();
    assert_eq!(slugs, vec!["ma/a", "ma/b", "ma/c", "ma/d", "ma/e"]);
}

#[tokio::test]
async fn scan_classifies_and_persists_flags() {
    let (_dir, ctx) = test_db().await;
    let healthy = words(350);
    let thin = words(100);
    insert_page(&ctx, "ma/salem", PageType::City, "Salem", Some(&healthy)).await;
    insert_page(&ctx, "services/implants", PageType::Service, "Implants", Some(&thin)).await;
    insert_page(&ctx, "ma/beverly", PageType::City, "Beverly", None).await;
    // Outside the active-state whitelist; never audited.
    insert_page(&ctx, "tx/austin", PageType::City, "Austin", None).await;
    // Clinic pages are exempt from the whitelist.
    insert_page(&ctx, "clinic/bright-smiles", PageType::Clinic, "Bright Smiles", Some(&healthy)).await;

    let scanner = InventoryScanner::new(ctx.clone(), active_states());
    let report = scanner.scan(None, true).await.unwrap();

    assert_eq!(report.total_pages, 5);
    assert_eq!(report.audited_pages, 4);
    assert_eq!(report.skipped_inactive, 1);
    assert_eq!(report.good, 2);
    assert_eq!(report.thin, 1);
    assert_eq!(report.missing, 1);

    // Flags were written back.
    let implants = ctx
        .pages()
        .get_by_slug("services/implants")
        .await
        .unwrap()
        .unwrap();
    assert!(implants.is_thin_content);
    assert_eq!(implants.word_count, 100);
    assert_eq!(implants.content_status(), ContentStatus::Thin);

    let salem = ctx.pages().get_by_slug("ma/salem").await.unwrap().unwrap();
    assert!(!salem.is_thin_content);
    assert_eq!(salem.word_count, 350);
}

#[tokio::test]
async fn scan_without_apply_leaves_rows_untouched() {
    let (_dir, ctx) = test_db().await;
    let thin = words(10);
    insert_page(&ctx, "ma/salem", PageType::City, "Salem", Some(&thin)).await;

    let scanner = InventoryScanner::new(ctx.clone(), active_states());
    let report = scanner.scan(None, false).await.unwrap();
    assert_eq!(report.thin, 1);

    let page = ctx.pages().get_by_slug("ma/salem").await.unwrap().unwrap();
    assert!(!page.is_thin_content);
    assert_eq!(page.word_count, 0);
}

#[tokio::test]
async fn duplicate_detection_flags_and_stays_idempotent() {
    let (_dir, ctx) = test_db().await;
    let body = words(400);
    // Same title and empty metadata: identical metadata fingerprints.
    insert_page(&ctx, "ma/salem", PageType::City, "Dentists Near You", Some(&body)).await;
    insert_page(&ctx, "ma/beverly", PageType::City, "Dentists Near You", Some(&body)).await;
    insert_page(&ctx, "ma/lynn", PageType::City, "Dentists in Lynn Massachusetts", None).await;

    let detector = DuplicateDetector::new(ctx.clone(), active_states());
    let first = detector.detect(None).await.unwrap();

    assert_eq!(first.exact_groups.len(), 1);
    assert_eq!(first.exact_groups[0].canonical, "ma/beverly");
    assert_eq!(first.exact_groups[0].duplicates, vec!["ma/salem".to_string()]);
    assert_eq!(first.flagged, 1);

    let flagged = ctx.pages().get_by_slug("ma/salem").await.unwrap().unwrap();
    assert!(flagged.is_duplicate);
    assert_eq!(flagged.duplicate_of.as_deref(), Some("ma/beverly"));
    assert_eq!(flagged.similarity_score, Some(1.0));

    // A second pass clears and re-derives the same flags.
    let second = detector.detect(None).await.unwrap();
    assert_eq!(second.flagged, 1);
    assert_eq!(second.exact_groups.len(), 1);

    let unflagged = ctx.pages().get_by_slug("ma/lynn").await.unwrap().unwrap();
    assert!(!unflagged.is_duplicate);
}

#[tokio::test]
async fn dedup_flag_write_failures_are_tallied_not_fatal() {
    let (_dir, ctx) = test_db().await;
    let body = words(400);
    insert_page(&ctx, "ma/salem", PageType::City, "Dentists Near You", Some(&body)).await;
    insert_page(&ctx, "ma/beverly", PageType::City, "Dentists Near You", Some(&body)).await;

    // Block duplicate-flag writes at the database level.
    let mut conn = ctx.pool().get().await.unwrap();
    conn.batch_execute(
        "CREATE TRIGGER block_duplicate_flags \
         BEFORE UPDATE OF is_duplicate ON seo_pages \
         WHEN NEW.is_duplicate = 1 \
         BEGIN SELECT RAISE(ABORT, 'flag writes blocked'); END;",
    )
    .await
    .unwrap();
    drop(conn);

    let detector = DuplicateDetector::new(ctx.clone(), active_states());
    let report = detector.detect(None).await.unwrap();

    assert_eq!(report.flagged, 0);
    assert!(!report.errors.is_empty());
    let unflagged = ctx.pages().get_by_slug("ma/salem").await.unwrap().unwrap();
    assert!(!unflagged.is_duplicate);
}

#[tokio::test]
async fn metadata_seed_then_batch_rollback() {
    let (_dir, ctx) = test_db().await;
    insert_page(&ctx, "ma/salem", PageType::City, "Salem, MA", None).await;
    insert_page(&ctx, "ma/beverly", PageType::City, "Beverly, MA", None).await;

    let seeder = MetadataSeeder::new(ctx.clone());
    let report = seeder.seed(None, false).await.unwrap();
    assert_eq!(report.seeded.len(), 2);
    assert_eq!(report.skipped, 0);

    let seeded = ctx.pages().get_by_slug("ma/salem").await.unwrap().unwrap();
    let title = seeded.meta_title.clone().expect("title seeded");
    assert!(title.contains("Salem, MA"));
    assert!(title.chars().count() <= 60);
    assert!(seeded.meta_description.is_some());
    assert_eq!(seeded.h1.as_deref(), Some("Salem, MA"));

    // A second seed pass skips everything.
    let second = seeder.seed(None, false).await.unwrap();
    assert!(second.seeded.is_empty());
    assert_eq!(second.skipped, 2);

    // Rolling the batch back restores the empty metadata.
    let rollback = Rollbacker::new(ctx.clone())
        .rollback(RollbackTarget::Batch(report.batch_id))
        .await
        .unwrap();
    assert_eq!(rollback.restored.len(), 2);

    let restored = ctx.pages().get_by_slug("ma/salem").await.unwrap().unwrap();
    assert!(restored.meta_title.is_none());
    assert!(restored.meta_description.is_none());
}

#[tokio::test]
async fn page_rollback_uses_latest_snapshot() {
    let (_dir, ctx) = test_db().await;
    insert_page(&ctx, "ma/salem", PageType::City, "Salem, MA", None).await;

    let seeder = MetadataSeeder::new(ctx.clone());
    seeder.seed(None, false).await.unwrap();
    // Force a second write so two snapshots exist.
    seeder.seed(None, true).await.unwrap();

    let before = ctx.pages().get_by_slug("ma/salem").await.unwrap().unwrap();
    assert!(before.meta_title.is_some());

    let rollback = Rollbacker::new(ctx.clone())
        .rollback(RollbackTarget::Page("ma/salem".to_string()))
        .await
        .unwrap();
    assert_eq!(rollback.restored, vec!["ma/salem".to_string()]);

    // The latest snapshot's previous values came from the first seed,
    // so metadata is still present, not cleared.
    let after = ctx.pages().get_by_slug("ma/salem").await.unwrap().unwrap();
    assert!(after.meta_title.is_some());
}

#[tokio::test]
async fn rollback_of_unknown_batch_reports_missing() {
    let (_dir, ctx) = test_db().await;
    let report = Rollbacker::new(ctx.clone())
        .rollback(RollbackTarget::Batch("no-such-batch".to_string()))
        .await
        .unwrap();
    assert!(report.restored.is_empty());
    assert_eq!(report.missing, vec!["no-such-batch".to_string()]);
}

#[tokio::test]
async fn audit_run_lifecycle() {
    let (_dir, ctx) = test_db().await;
    let runs = ctx.runs();

    let id = runs
        .start(RunType::ContentFix, 3, Some("test"))
        .await
        .unwrap();

    let open = runs.current().await.unwrap().expect("run is open");
    assert_eq!(open.id, id);
    assert_eq!(open.status, RunStatus::Running);
    assert_eq!(open.total_pages, 3);
    assert_eq!(open.triggered_by.as_deref(), Some("test"));

    runs.update_progress(&id, 2, 1, 1).await.unwrap();

    let mut run = runs.get(&id).await.unwrap().unwrap();
    assert_eq!(run.processed_pages, 2);
    run.status = RunStatus::Completed;
    run.push_error("ma/salem: generation failed");
    run.summary = Some(serde_json::json!({"written": 1}));
    runs.finish(&run).await.unwrap();

    let closed = runs.get(&id).await.unwrap().unwrap();
    assert_eq!(closed.status, RunStatus::Completed);
    assert_eq!(closed.error_count, 1);
    assert_eq!(closed.errors, vec!["ma/salem: generation failed".to_string()]);
    assert!(closed.completed_at.is_some());
    assert!(runs.current().await.unwrap().is_none());
}

#[tokio::test]
async fn settings_round_trip() {
    let (_dir, ctx) = test_db().await;
    let settings = ctx.settings();

    settings
        .set("auto_fix_enabled", &serde_json::json!(true))
        .await
        .unwrap();
    settings
        .set("batch_size", &serde_json::json!(25))
        .await
        .unwrap();
    // Overwrite keeps a single row.
    settings
        .set("batch_size", &serde_json::json!(50))
        .await
        .unwrap();

    let all = settings.get_all().await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all["auto_fix_enabled"], serde_json::json!(true));
    assert_eq!(all["batch_size"], serde_json::json!(50));
    assert!(settings.get("missing").await.unwrap().is_none());
}
