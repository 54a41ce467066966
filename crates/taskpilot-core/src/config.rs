//! Configuration management for Taskpilot
//!
//! Handles loading, saving, and managing application configuration
//! including the completion provider, storage and event settings.
//! Values from the environment take precedence over the file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Completion provider settings
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Conversation loop settings
    #[serde(default)]
    pub agent: AgentSettings,
    /// Record store settings
    #[serde(default)]
    pub storage: StorageConfig,
    /// REST server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Task event publishing settings
    #[serde(default)]
    pub events: EventsConfig,
}

impl Config {
    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("TASKPILOT_API_KEY") {
            self.provider.api_key = Some(key);
        }
        if let Some(model) = get("TASKPILOT_MODEL") {
            self.provider.model = model;
        }
        if let Some(url) = get("DATABASE_URL") {
            self.storage.database_url = Some(url);
        }
        if let Some(port) = get("DAPR_HTTP_PORT") {
            self.events.dapr_http_port = parse_port("DAPR_HTTP_PORT", &port)?;
            // A sidecar port in the environment means a sidecar is running.
            self.events.enabled = true;
        }
        if let Some(port) = get("TASKPILOT_PORT") {
            self.server.port = parse_port("TASKPILOT_PORT", &port)?;
        }
        Ok(())
    }

    /// Copy with secrets masked, for display
    pub fn redacted(&self) -> Self {
        let mut shown = self.clone();
        if shown.provider.api_key.is_some() {
            shown.provider.api_key = Some("********".to_string());
        }
        shown
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))
    }
}

fn parse_port(key: &str, value: &str) -> Result<u16> {
    value
        .trim()
        .parse()
        .map_err(|e| Error::Config(format!("Invalid {} '{}': {}", key, value, e)))
}

/// Completion provider configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProviderConfig {
    /// Provider type: "openrouter", "openai", "anthropic", "gemini", "scripted", etc.
    pub provider_type: String,
    /// Model to use
    pub model: String,
    /// API key (can be loaded from env)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Environment variable name for API key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
    /// Base URL for OpenAI-compatible endpoints
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Ask the model to reason before answering (OpenRouter extension)
    pub reasoning: bool,
    /// Per-request HTTP timeout (seconds)
    pub request_timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self::openrouter()
    }
}

impl ProviderConfig {
    /// OpenRouter through its OpenAI-compatible API
    pub fn openrouter() -> Self {
        Self {
            provider_type: "openrouter".to_string(),
            model: "xiaomi/mimo-v2-flash:free".to_string(),
            api_key: None,
            api_key_env: Some("OPENROUTER_API_KEY".to_string()),
            base_url: None,
            reasoning: false,
            request_timeout_secs: 120,
        }
    }

    /// Deterministic scripted provider, no network access
    pub fn scripted() -> Self {
        Self {
            provider_type: "scripted".to_string(),
            model: "scripted".to_string(),
            api_key: None,
            api_key_env: None,
            base_url: None,
            reasoning: false,
            request_timeout_secs: 120,
        }
    }

    /// Get the API key, checking environment variable if not set directly
    pub fn get_api_key(&self) -> Option<String> {
        if let Some(key) = &self.api_key {
            if !key.is_empty() {
                return Some(key.clone());
            }
        }

        if let Some(env_name) = &self.api_key_env {
            if let Ok(key) = std::env::var(env_name) {
                if !key.is_empty() {
                    return Some(key);
                }
            }
        }

        let fallback = match self.provider_type.as_str() {
            "openrouter" => "OPENROUTER_API_KEY",
            "openai" => "OPENAI_API_KEY",
            "anthropic" => "ANTHROPIC_API_KEY",
            "gemini" | "google" => "GEMINI_API_KEY",
            "groq" => "GROQ_API_KEY",
            "deepseek" => "DEEPSEEK_API_KEY",
            "xai" | "grok" => "XAI_API_KEY",
            _ => return None,
        };
        std::env::var(fallback).ok().filter(|k| !k.is_empty())
    }
}

/// Conversation loop configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AgentSettings {
    /// Maximum completion requests per run
    pub max_iterations: usize,
    /// Wall-clock bound on a whole run (seconds)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    /// Replaces the built-in system prompt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            timeout_secs: Some(120),
            system_prompt: None,
        }
    }
}

/// Record store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// sqlx database URL; tasks are kept in memory when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
}

/// REST server configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins; empty allows any origin
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            cors_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Task event publishing configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EventsConfig {
    /// Publish to the Dapr sidecar; events are only logged otherwise
    pub enabled: bool,
    pub dapr_http_port: u16,
    pub pubsub_name: String,
    pub topic: String,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dapr_http_port: 3500,
            pubsub_name: "kafka-pubsub".to_string(),
            topic: "task-events".to_string(),
        }
    }
}

/// Configuration manager for loading and saving config
pub struct ConfigManager {
    config_path: PathBuf,
    config: Config,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        Self::with_path(config_path)
    }

    /// Create a config manager with a specific path
    pub fn with_path(config_path: PathBuf) -> Result<Self> {
        let config = if config_path.exists() {
            Self::load_from_path(&config_path)?
        } else {
            Config::default()
        };

        Ok(Self { config_path, config })
    }

    /// Get the default config path
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("Could not find config directory".to_string()))?;

        Ok(config_dir.join("taskpilot").join("config.toml"))
    }

    /// Load configuration from a file
    fn load_from_path(path: &Path) -> Result<Config> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Get the current configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get mutable access to configuration
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Configuration with environment overrides applied, leaving the stored copy untouched
    pub fn effective(&self) -> Result<Config> {
        let mut config = self.config.clone();
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Save the current configuration to disk
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create config dir: {}", e)))?;
        }

        let content = self.config.to_toml()?;
        std::fs::write(&self.config_path, content)
            .map_err(|e| Error::Config(format!("Failed to write config: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.provider.provider_type, "openrouter");
        assert_eq!(config.provider.model, "xiaomi/mimo-v2-flash:free");
        assert_eq!(config.agent.max_iterations, 10);
        assert!(config.storage.database_url.is_none());
        assert!(!config.events.enabled);
        assert_eq!(config.events.dapr_http_port, 3500);
        assert_eq!(config.server.bind_address(), "127.0.0.1:8000");
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[provider]"));
        assert!(toml_str.contains("[events]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let parsed: Config = toml::from_str("[agent]\nmax_iterations = 3\n").unwrap();
        assert_eq!(parsed.agent.max_iterations, 3);
        assert_eq!(parsed.provider, ProviderConfig::openrouter());
        assert_eq!(parsed.events.topic, "task-events");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_overrides_from(lookup(&[
                ("TASKPILOT_API_KEY", "sk-test"),
                ("DATABASE_URL", "sqlite://tasks.db"),
                ("DAPR_HTTP_PORT", "3600"),
                ("TASKPILOT_PORT", "9000"),
            ]))
            .unwrap();

        assert_eq!(config.provider.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.storage.database_url.as_deref(), Some("sqlite://tasks.db"));
        assert_eq!(config.events.dapr_http_port, 3600);
        assert!(config.events.enabled);
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_invalid_port_override() {
        let mut config = Config::default();
        let err = config
            .apply_overrides_from(lookup(&[("TASKPILOT_PORT", "eighty")]))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_blank_override_ignored() {
        let mut config = Config::default();
        config
            .apply_overrides_from(lookup(&[("DATABASE_URL", "  ")]))
            .unwrap();
        assert!(config.storage.database_url.is_none());
    }

    #[test]
    fn test_direct_api_key_wins() {
        let mut provider = ProviderConfig::scripted();
        assert_eq!(provider.get_api_key(), None);
        provider.api_key = Some("inline".to_string());
        assert_eq!(provider.get_api_key().as_deref(), Some("inline"));
    }

    #[test]
    fn test_redacted_toml_hides_api_key() {
        let mut config = Config::default();
        config.provider.api_key = Some("sk-secret".to_string());

        let rendered = config.redacted().to_toml().unwrap();
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("********"));
        assert_eq!(config.provider.api_key.as_deref(), Some("sk-secret"));

        let reparsed: Config = toml::from_str(&Config::default().to_toml().unwrap()).unwrap();
        assert_eq!(reparsed, Config::default());
    }
}
