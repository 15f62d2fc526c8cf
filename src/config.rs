//! Marketplace configuration — listing endpoint, generative tasks, store.
//!
//! Each subsystem is independently configurable: the scraped listing source,
//! the two enrichment tasks (title synthesis, slot-count inference) and the
//! chat simulation. Loaded from `config.toml` in the data directory; any
//! missing section falls back to its default.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::{
    CHAT_MAX_TOKENS, CHAT_TEMPERATURE, COMPLETION_TIMEOUT_SECS, ENRICHMENT_QUEUE_CAPACITY,
    ENRICHMENT_WORKERS, LISTING_TIMEOUT_SECS, TITLE_MAX_TOKENS, TITLE_TEMPERATURE,
    TOTAL_MAX_TOKENS, TOTAL_TEMPERATURE,
};

/// Upstream listing table reached through a CORS proxy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    pub endpoint: String,
    /// Anti-CSRF token the table endpoint expects with every request.
    pub nonce: String,
    pub timeout_secs: u64,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://cors-anywhere.herokuapp.com/https://scrimpr.co.uk/wp-admin/admin-ajax.php?action=get_wdtable&table_id=71".to_string(),
            nonce: "a91733fc0d".to_string(),
            timeout_secs: LISTING_TIMEOUT_SECS,
        }
    }
}

/// Remote chat-completions API shared by enrichment and chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionsConfig {
    pub endpoint: String,
    pub model: String,
    /// Environment variable holding the API key. Never stored in the file.
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for CompletionsConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: COMPLETION_TIMEOUT_SECS,
        }
    }
}

/// Configuration for a single generative task.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskConfig {
    /// false = skip the API call and go straight to the fallback.
    pub enabled: bool,
    pub max_tokens: u32,
    pub temperature: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    pub workers: usize,
    pub queue_capacity: usize,
    pub title: TaskConfig,
    pub total: TaskConfig,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_tokens: TITLE_MAX_TOKENS,
            temperature: TITLE_TEMPERATURE,
        }
    }
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            workers: ENRICHMENT_WORKERS,
            queue_capacity: ENRICHMENT_QUEUE_CAPACITY,
            title: TaskConfig {
                enabled: true,
                max_tokens: TITLE_MAX_TOKENS,
                temperature: TITLE_TEMPERATURE,
            },
            total: TaskConfig {
                enabled: true,
                max_tokens: TOTAL_MAX_TOKENS,
                temperature: TOTAL_TEMPERATURE,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub enabled: bool,
    pub max_tokens: u32,
    pub temperature: f64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_tokens: CHAT_MAX_TOKENS,
            temperature: CHAT_TEMPERATURE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MarketConfig {
    pub listing: ListingConfig,
    pub completions: CompletionsConfig,
    pub enrichment: EnrichmentConfig,
    pub chat: ChatConfig,
    /// Override for the cookie-store directory. Defaults under the data dir.
    pub store_dir: Option<PathBuf>,
}

impl MarketConfig {
    /// Load from a TOML file, or defaults if absent/corrupted.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Invalid config file, using defaults");
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// Load `config.toml` from the data directory.
    pub fn load_default() -> Self {
        Self::load(&Self::config_path())
    }

    pub fn config_path() -> PathBuf {
        Self::data_dir().join("config.toml")
    }

    /// Per-user data directory (logs, cookie documents, config).
    pub fn data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("referlut-market")
    }

    /// Resolve the completions API key from the configured env var.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.completions.api_key_env)
            .ok()
            .filter(|k| !k.is_empty())
    }

    /// Directory holding the cookie documents.
    pub fn store_dir(&self) -> PathBuf {
        self.store_dir
            .clone()
            .unwrap_or_else(|| Self::data_dir().join("cookies"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MarketConfig::default();
        assert_eq!(config.enrichment.title.max_tokens, 60);
        assert_eq!(config.enrichment.total.max_tokens, 10);
        assert!(config.enrichment.total.temperature < config.enrichment.title.temperature);
        assert!(config.listing.endpoint.contains("get_wdtable"));
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[enrichment]\nworkers = 2\n").unwrap();

        let config = MarketConfig::load(&path);
        assert_eq!(config.enrichment.workers, 2);
        // Untouched sections keep their defaults
        assert_eq!(config.completions.model, "gpt-3.5-turbo");
    }

    #[test]
    fn test_load_corrupt_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "not { valid toml").unwrap();

        let config = MarketConfig::load(&path);
        assert_eq!(config.enrichment.workers, ENRICHMENT_WORKERS);
    }
}
