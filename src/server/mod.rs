//! Admin HTTP API.
//!
//! A single action-dispatch endpoint (`POST /api/bot`) plus a health
//! probe. Protected by a bearer token and an advisory in-memory rate
//! limit.

mod handlers;
mod routes;

pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::Settings;
use crate::llm::LlmClient;
use crate::rate_limit::MemoryRateLimiter;
use crate::repository::DbContext;

/// Shared state for the admin API.
#[derive(Clone)]
pub struct AppState {
    pub db: DbContext,
    pub settings: Arc<Settings>,
    pub limiter: Arc<MemoryRateLimiter>,
    /// None disables auth (local development).
    pub admin_token: Option<Arc<String>>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        let db =
            DbContext::new(&settings.database_path()).with_fetch_page_size(settings.page_size);
        let limiter = MemoryRateLimiter::new(
            settings.server.rate_limit_requests,
            std::time::Duration::from_secs(settings.server.rate_limit_window_secs),
        );
        let admin_token = settings.admin_token().map(Arc::new);
        Self {
            db,
            settings: Arc::new(settings),
            limiter: Arc::new(limiter),
            admin_token,
        }
    }

    /// Build an LLM client from current settings.
    pub fn llm_client(&self) -> Result<LlmClient, crate::llm::LlmError> {
        LlmClient::new(self.settings.llm.clone(), self.settings.api_key())
    }
}

/// Start the admin API server.
pub async fn serve(settings: Settings, host: &str, port: u16) -> anyhow::Result<()> {
    let state = AppState::new(settings);
    state.db.init_schema().await?;

    if state.admin_token.is_none() {
        tracing::warn!("no admin token configured; API is unauthenticated");
    }

    let app = create_router(state);
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("Starting admin API at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
