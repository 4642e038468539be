//! Configuration types for the planning assistant.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable holding the model API key.
pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";

/// Environment variable overriding the model name.
pub const MODEL_NAME_ENV: &str = "MODEL_NAME";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChronoConfig {
    /// Language model settings.
    pub llm: LlmConfig,
    /// Response cache settings.
    pub cache: CacheConfig,
    /// Plan scheduler defaults.
    pub planner: PlannerConfig,
    /// Task store settings.
    pub store: StoreConfig,
}

/// Language model configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of the generative language REST API.
    pub api_url: String,
    /// Model identifier (with or without a `models/` prefix).
    pub model: String,
    /// API key. Empty means "read from the environment".
    pub api_key: String,
    /// Transport timeout for a single model call, in seconds.
    pub timeout_secs: u64,
    /// Character budget for the conversation history sent with each prompt.
    pub history_char_budget: usize,
    /// Sampling temperature.
    pub temperature: f64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: "https://generativelanguage.googleapis.com".to_owned(),
            model: "gemini-2.5-pro".to_owned(),
            api_key: String::new(),
            timeout_secs: 60,
            history_char_budget: 4000,
            temperature: 0.4,
        }
    }
}

impl LlmConfig {
    /// Returns `true` when an API key is available.
    #[must_use]
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

/// Response cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// How long a composed reply stays cached, in seconds.
    pub response_ttl_secs: u64,
    /// Capacity of the recency cache used by the streaming path.
    pub recency_capacity: usize,
    /// Number of trailing history turns folded into the cache key.
    pub key_history_turns: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            response_ttl_secs: 300,
            recency_capacity: 256,
            key_history_turns: 6,
        }
    }
}

/// Defaults applied when the model omits plan parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Hours of capacity per day.
    pub default_daily_hours: f64,
    /// Planning horizon in days.
    pub default_num_days: u32,
    /// Chunk size (in characters) for streamed replies.
    pub stream_chunk_chars: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            default_daily_hours: 3.0,
            default_num_days: 7,
            stream_chunk_chars: 80,
        }
    }
}

/// Task store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path of the JSON task file.
    pub tasks_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            tasks_path: default_tasks_path(),
        }
    }
}

fn default_tasks_path() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("chronoken").join("tasks.json"))
        .unwrap_or_else(|| PathBuf::from("tasks.json"))
}

impl ChronoConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::error::ChronoError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &std::path::Path) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::ChronoError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `~/.config/chronoken/config.toml`.
    pub fn default_config_path() -> PathBuf {
        if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(config).join("chronoken").join("config.toml")
        } else if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("chronoken")
                .join("config.toml")
        } else {
            PathBuf::from("/tmp/chronoken-config/config.toml")
        }
    }

    /// Apply `GOOGLE_API_KEY` / `MODEL_NAME` from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(
            std::env::var(API_KEY_ENV).ok(),
            std::env::var(MODEL_NAME_ENV).ok(),
        );
    }

    /// An API key in the file wins over the environment; the model name
    /// from the environment wins over the file.
    fn apply_overrides(&mut self, api_key: Option<String>, model: Option<String>) {
        if !self.llm.has_api_key()
            && let Some(key) = api_key.filter(|k| !k.trim().is_empty())
        {
            self.llm.api_key = key;
        }
        if let Some(model) = model.filter(|m| !m.trim().is_empty()) {
            self.llm.model = model;
        }
    }
}
