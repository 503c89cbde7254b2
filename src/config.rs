//! Application configuration.
//!
//! Settings are layered: built-in defaults, then an optional
//! `pagewarden.toml` next to the data directory, then environment
//! variables. Environment always wins so deployments can override a
//! checked-in config file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable carrying the admin bearer token for the HTTP API.
pub const ADMIN_TOKEN_ENV: &str = "PAGEWARDEN_ADMIN_TOKEN";

/// Environment variable carrying the chat-completion API key.
pub const API_KEY_ENV: &str = "PAGEWARDEN_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory holding the SQLite database and any working files.
    pub data_dir: PathBuf,

    /// Database file name inside `data_dir`.
    pub database_filename: String,

    /// Location slugs (state codes) whose pages participate in audits.
    pub active_states: Vec<String>,

    /// Rows fetched per page when walking the full inventory.
    pub page_size: i64,

    /// HTTP server bind settings.
    pub server: ServerSettings,

    /// Chat-completion API settings.
    pub llm: LlmSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Requests allowed per client per window.
    pub rate_limit_requests: u32,
    /// Rate limit window in seconds.
    pub rate_limit_window_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Base URL of an OpenAI-compatible chat-completions endpoint.
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Seconds to wait between consecutive generation calls.
    pub pacing_delay_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pagewarden");
        Self {
            data_dir,
            database_filename: "pagewarden.db".to_string(),
            active_states: vec![
                "ca".to_string(),
                "ct".to_string(),
                "ma".to_string(),
                "nj".to_string(),
            ],
            page_size: 1000,
            server: ServerSettings::default(),
            llm: LlmSettings::default(),
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8780,
            rate_limit_requests: 30,
            rate_limit_window_secs: 60,
        }
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            max_tokens: 4000,
            temperature: 0.7,
            pacing_delay_secs: 1,
        }
    }
}

impl Settings {
    /// Load settings from the default config file location, if present.
    pub fn load() -> Result<Self> {
        let mut settings = match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path)?,
            _ => Self::default(),
        };
        settings.apply_env();
        Ok(settings)
    }

    /// Load settings from a specific TOML file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let settings: Settings = toml::from_str(&raw)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        Ok(settings)
    }

    fn config_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("PAGEWARDEN_CONFIG") {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|d| d.join("pagewarden").join("pagewarden.toml"))
    }

    fn apply_env(&mut self) {
        if let Ok(dir) = std::env::var("PAGEWARDEN_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Ok(url) = std::env::var("PAGEWARDEN_LLM_BASE_URL") {
            self.llm.base_url = url;
        }
        if let Ok(model) = std::env::var("PAGEWARDEN_LLM_MODEL") {
            self.llm.model = model;
        }
    }

    /// Absolute path of the SQLite database file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_filename)
    }

    /// Admin bearer token, if configured. Auth is disabled when unset.
    pub fn admin_token(&self) -> Option<String> {
        std::env::var(ADMIN_TOKEN_ENV).ok().filter(|t| !t.is_empty())
    }

    /// Chat-completion API key from the environment.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty())
    }

    /// Ensure the data directory exists.
    pub fn ensure_data_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir).with_context(|| {
            format!("failed to create data directory {}", self.data_dir.display())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let settings = Settings::default();
        assert_eq!(settings.page_size, 1000);
        assert_eq!(settings.active_states, vec!["ca", "ct", "ma", "nj"]);
        assert_eq!(settings.server.rate_limit_requests, 30);
    }

    #[test]
    fn toml_round_trips_partial_config() {
        let raw = r#"
            page_size = 500

            [server]
            port = 9000
        "#;
        let settings: Settings = toml::from_str(raw).unwrap();
        assert_eq!(settings.page_size, 500);
        assert_eq!(settings.server.port, 9000);
        // Unspecified sections keep defaults.
        assert_eq!(settings.server.rate_limit_requests, 30);
        assert_eq!(settings.llm.max_tokens, 4000);
    }
}
