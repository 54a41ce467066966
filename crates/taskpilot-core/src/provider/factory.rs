//! Provider Factory Module
//!
//! Creates the configured completion provider for both CLI and server.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use super::genai_provider::{GenAIProvider, ProviderType};
use super::openai_compat::{OpenAiCompatProvider, OPENROUTER_BASE_URL};
use super::scripted::ScriptedProvider;
use super::{CompletionProvider, CompletionResult};
use crate::config::ProviderConfig;
use crate::error::{Error, Result};

/// Reply of the offline `scripted` provider
const OFFLINE_REPLY: &str = "No language model is configured; running in offline mode.";

/// Create a provider from configuration
///
/// - `openrouter` and `openai-compatible` speak the OpenAI wire format over reqwest
/// - `scripted` answers locally without any network access
/// - anything else is resolved as a genai provider type
pub fn create_provider(config: &ProviderConfig) -> Result<Arc<dyn CompletionProvider>> {
    let provider_type = config.provider_type.to_lowercase();
    info!(provider = %provider_type, model = %config.model, "Creating completion provider");

    match provider_type.as_str() {
        "openrouter" | "openai-compatible" => {
            let api_key = require_api_key(config)?;
            let base_url = config.base_url.as_deref().unwrap_or(OPENROUTER_BASE_URL);
            let client = reqwest::Client::builder()
                .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
                .connect_timeout(Duration::from_secs(30))
                .build()
                .map_err(|e| Error::Provider(format!("Failed to build HTTP client: {}", e)))?;

            let provider = OpenAiCompatProvider::new(&provider_type, base_url, api_key, &config.model)?
                .with_client(client)
                .with_reasoning(config.reasoning);
            Ok(Arc::new(provider))
        }
        "scripted" => Ok(Arc::new(
            ScriptedProvider::new().with_fallback(CompletionResult::text(OFFLINE_REPLY)),
        )),
        other => {
            let genai_type: ProviderType = other.parse().map_err(Error::Config)?;
            let model = (!config.model.is_empty()).then_some(config.model.as_str());
            let provider = match config.get_api_key() {
                Some(key) => GenAIProvider::with_api_key(genai_type, &key, model),
                None if genai_type == ProviderType::Ollama => GenAIProvider::new(genai_type, model),
                None => return Err(missing_key(config)),
            };
            Ok(Arc::new(provider))
        }
    }
}

fn require_api_key(config: &ProviderConfig) -> Result<String> {
    config.get_api_key().ok_or_else(|| missing_key(config))
}

fn missing_key(config: &ProviderConfig) -> Error {
    Error::Config(format!(
        "No API key configured for {}. Set it in config or via {}",
        config.provider_type,
        config
            .api_key_env
            .as_deref()
            .unwrap_or("TASKPILOT_API_KEY")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(provider_type: &str, api_key: Option<&str>) -> ProviderConfig {
        ProviderConfig {
            provider_type: provider_type.to_string(),
            model: "some-model".to_string(),
            api_key: api_key.map(str::to_string),
            api_key_env: None,
            ..ProviderConfig::openrouter()
        }
    }

    #[test]
    fn test_openrouter_provider() {
        let provider = create_provider(&config("openrouter", Some("sk-test"))).unwrap();
        assert_eq!(provider.name(), "openrouter");
        assert_eq!(provider.model(), "some-model");
    }

    #[test]
    fn test_genai_provider() {
        let provider = create_provider(&config("Anthropic", Some("sk-test"))).unwrap();
        assert_eq!(provider.name(), "anthropic");
    }

    #[test]
    fn test_scripted_provider_needs_no_key() {
        let provider = create_provider(&config("scripted", None)).unwrap();
        assert_eq!(provider.name(), "scripted");
    }

    #[test]
    fn test_unknown_provider() {
        let err = create_provider(&config("carrier-pigeon", Some("k")))
            .err()
            .unwrap();
        assert!(matches!(err, Error::Config(_)));
    }
}
