use crate::config::Config;
use crate::error::ProviderError;
use crate::providers::{AnthropicProvider, OpenAIProvider};
use crate::traits::Provider;
use std::sync::Arc;

pub fn create_provider(config: &Config) -> Result<Arc<dyn Provider>, ProviderError> {
    let provider_name = config.provider.as_deref().unwrap_or("anthropic");

    match provider_name.to_lowercase().as_str() {
        "anthropic" | "claude" => {
            let api_key = resolve_api_key_with_fallback(
                &["ANTHROPIC_API_KEY", "PAL_ANTHROPIC_API_KEY"],
                &config.api_key,
            )?;
            let mut provider = AnthropicProvider::new(api_key)
                .with_model(config.model.clone())
                .with_max_tokens(config.max_tokens);
            if let Some(temperature) = config.temperature {
                provider = provider.with_temperature(temperature);
            }
            if let Some(base_url) = &config.base_url {
                provider = provider.with_base_url(base_url.clone());
            }
            Ok(Arc::new(provider))
        }
        "openai" => {
            let api_key = resolve_api_key_with_fallback(
                &["OPENAI_API_KEY", "PAL_OPENAI_API_KEY"],
                &config.api_key,
            )?;
            let mut provider = OpenAIProvider::new(api_key)
                .with_model(config.model.clone())
                .with_max_tokens(config.max_tokens);
            if let Some(temperature) = config.temperature {
                provider = provider.with_temperature(temperature);
            }
            if let Some(base_url) = &config.base_url {
                provider = provider.with_base_url(base_url.clone());
            }
            Ok(Arc::new(provider))
        }
        _ => Err(ProviderError::Configuration(format!(
            "Unknown provider: {}. Available: anthropic, openai",
            provider_name
        ))),
    }
}

fn resolve_api_key_with_fallback(env_vars: &[&str], config_key: &str) -> Result<String, ProviderError> {
    for var_name in env_vars {
        if let Ok(key) = std::env::var(var_name)
            && !key.trim().is_empty()
        {
            return Ok(key);
        }
    }
    if !config_key.is_empty() {
        Ok(config_key.to_string())
    } else {
        Err(ProviderError::Configuration(format!(
            "No API key found. Set {} or run 'pal onboard'.",
            env_vars.first().copied().unwrap_or("an API key")
        )))
    }
}
