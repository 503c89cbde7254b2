//! Request handlers for the admin API.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::models::PageType;
use crate::services::generate::{FixRequest, RollbackTarget};
use crate::services::{
    ContentFixer, DuplicateDetector, InventoryScanner, MetadataSeeder, Rollbacker,
};

use super::AppState;

/// Action-dispatch request body. The `action` field selects the
/// operation; remaining fields are action-specific.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum BotRequest {
    GetSettings,
    UpdateSettings {
        settings: std::collections::BTreeMap<String, serde_json::Value>,
    },
    Scan {
        #[serde(default)]
        page_type: Option<String>,
    },
    ApplyFlags {
        #[serde(default)]
        page_type: Option<String>,
    },
    CheckDuplicates {
        #[serde(default)]
        page_type: Option<String>,
    },
    GenerateMetadata {
        #[serde(default)]
        page_type: Option<String>,
        #[serde(default)]
        force: bool,
    },
    FixPages {
        #[serde(default)]
        slugs: Vec<String>,
        #[serde(default)]
        page_type: Option<String>,
        #[serde(default)]
        limit: Option<usize>,
        #[serde(default)]
        custom_prompt: Option<String>,
    },
    Rollback {
        #[serde(default)]
        batch_id: Option<String>,
        #[serde(default)]
        page_slug: Option<String>,
    },
    GetRuns {
        #[serde(default)]
        limit: Option<i64>,
    },
    GetProgress,
}

/// Health probe: confirms the process is up and the database reachable.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    match state.db.pages().count().await {
        Ok(pages) => (
            StatusCode::OK,
            Json(json!({"status": "ok", "pages": pages})),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"status": "degraded", "error": e.to_string()})),
        ),
    }
}

/// Single dispatch endpoint for every bot action.
pub async fn bot_action(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(request): Json<BotRequest>,
) -> impl IntoResponse {
    if let Err(resp) = authorize(&state, &headers) {
        return resp;
    }

    if !state.limiter.check(&addr.ip().to_string()) {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({"success": false, "error": "rate limit exceeded"})),
        );
    }

    match dispatch(&state, request).await {
        Ok(value) => (StatusCode::OK, Json(value)),
        Err(e) => {
            error!("bot action failed: {:#}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"success": false, "error": e.to_string()})),
            )
        }
    }
}

fn authorize(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<(), (StatusCode, Json<serde_json::Value>)> {
    let Some(expected) = &state.admin_token else {
        return Ok(());
    };

    let provided = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match provided {
        None => Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({"success": false, "error": "missing bearer token"})),
        )),
        Some(token) if token != expected.as_str() => Err((
            StatusCode::FORBIDDEN,
            Json(json!({"success": false, "error": "invalid token"})),
        )),
        Some(_) => Ok(()),
    }
}

async fn dispatch(state: &AppState, request: BotRequest) -> anyhow::Result<serde_json::Value> {
    match request {
        BotRequest::GetSettings => {
            let settings = state.db.settings().get_all().await?;
            Ok(json!({"success": true, "settings": settings}))
        }

        BotRequest::UpdateSettings { settings } => {
            let repo = state.db.settings();
            let mut updated = Vec::new();
            for (key, value) in &settings {
                repo.set(key, value).await?;
                updated.push(key.clone());
            }
            Ok(json!({"success": true, "updated": updated}))
        }

        BotRequest::Scan { page_type } => {
            let scanner = scanner(state);
            let report = scanner.scan(parse_page_type(page_type.as_deref())?, false).await?;
            Ok(json!({"success": true, "report": report}))
        }

        BotRequest::ApplyFlags { page_type } => {
            let scanner = scanner(state);
            let report = scanner.scan(parse_page_type(page_type.as_deref())?, true).await?;
            Ok(json!({"success": true, "report": report}))
        }

        BotRequest::CheckDuplicates { page_type } => {
            let detector =
                DuplicateDetector::new(state.db.clone(), state.settings.active_states.clone());
            let report = detector.detect(parse_page_type(page_type.as_deref())?).await?;
            Ok(json!({"success": true, "report": report}))
        }

        BotRequest::GenerateMetadata { page_type, force } => {
            let seeder = MetadataSeeder::new(state.db.clone());
            let report = seeder.seed(parse_page_type(page_type.as_deref())?, force).await?;
            Ok(json!({"success": true, "report": report}))
        }

        BotRequest::FixPages {
            slugs,
            page_type,
            limit,
            custom_prompt,
        } => {
            let llm = state.llm_client()?;
            let fixer = ContentFixer::new(
                state.db.clone(),
                llm,
                state.settings.llm.pacing_delay_secs,
            );
            let report = fixer
                .fix_pages(FixRequest {
                    slugs,
                    page_type: parse_page_type(page_type.as_deref())?,
                    limit,
                    custom_instructions: custom_prompt,
                    triggered_by: Some("api".to_string()),
                })
                .await?;
            Ok(json!({"success": true, "report": report}))
        }

        BotRequest::Rollback {
            batch_id,
            page_slug,
        } => {
            let target = match (batch_id, page_slug) {
                (Some(batch), _) => RollbackTarget::Batch(batch),
                (None, Some(slug)) => RollbackTarget::Page(slug),
                (None, None) => {
                    anyhow::bail!("rollback requires batch_id or page_slug")
                }
            };
            let report = Rollbacker::new(state.db.clone()).rollback(target).await?;
            Ok(json!({"success": true, "report": report}))
        }

        BotRequest::GetRuns { limit } => {
            let runs = state.db.runs().recent(limit.unwrap_or(20)).await?;
            Ok(json!({"success": true, "runs": runs}))
        }

        BotRequest::GetProgress => {
            let current = state.db.runs().current().await?;
            Ok(json!({"success": true, "current": current}))
        }
    }
}

fn scanner(state: &AppState) -> InventoryScanner {
    InventoryScanner::new(state.db.clone(), state.settings.active_states.clone())
}

fn parse_page_type(raw: Option<&str>) -> anyhow::Result<Option<PageType>> {
    match raw {
        None => Ok(None),
        Some(s) => PageType::parse(s)
            .map(Some)
            .ok_or_else(|| anyhow::anyhow!("unknown page type: {s}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_tag_selects_the_variant() {
        let raw = json!({"action": "scan", "page_type": "city"});
        let parsed: BotRequest = serde_json::from_value(raw).unwrap();
        assert!(matches!(
            parsed,
            BotRequest::Scan {
                page_type: Some(ref t)
            } if t == "city"
        ));
    }

    #[test]
    fn fix_pages_defaults_are_empty() {
        let raw = json!({"action": "fix_pages"});
        let parsed: BotRequest = serde_json::from_value(raw).unwrap();
        match parsed {
            BotRequest::FixPages {
                slugs,
                page_type,
                limit,
                custom_prompt,
            } => {
                assert!(slugs.is_empty());
                assert!(page_type.is_none());
                assert!(limit.is_none());
                assert!(custom_prompt.is_none());
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn unknown_action_is_rejected() {
        let raw = json!({"action": "drop_tables"});
        assert!(serde_json::from_value::<BotRequest>(raw).is_err());
    }

    #[test]
    fn page_type_validation() {
        assert!(parse_page_type(Some("service_location")).unwrap().is_some());
        assert!(parse_page_type(None).unwrap().is_none());
        assert!(parse_page_type(Some("nonsense")).is_err());
    }
}
