//! Provider construction from configuration.

use std::sync::Arc;
use std::time::Duration;

use helpline_config::AppConfig;
use helpline_core::error::ProviderError;
use helpline_core::provider::Provider;

use crate::openai_compat::{OpenAiCompatProvider, Timeouts};
use crate::retry::RetryProvider;

/// Build the configured completion provider.
///
/// Fails with `NotConfigured` when no API key is available. The provider is
/// wrapped in a [`RetryProvider`] when `http.max_retries > 0`.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    let api_key = config
        .api_key
        .clone()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| {
            ProviderError::NotConfigured(
                "No API key. Set HELPLINE_API_KEY or OPENAI_API_KEY, or add api_key to config.toml"
                    .into(),
            )
        })?;

    let timeouts = Timeouts {
        connect: Duration::from_secs(config.http.connect_timeout_secs),
        request: Duration::from_secs(config.http.request_timeout_secs),
    };

    let provider: Arc<dyn Provider> = Arc::new(OpenAiCompatProvider::with_timeouts(
        provider_name(&config.api_url),
        &config.api_url,
        api_key,
        timeouts,
    )?);

    if config.http.max_retries > 0 {
        return Ok(Arc::new(RetryProvider::new(provider, config.http.max_retries)));
    }
    Ok(provider)
}

/// Short display name derived from the endpoint host.
fn provider_name(api_url: &str) -> &'static str {
    if api_url.contains("api.openai.com") {
        "openai"
    } else if api_url.contains("openrouter.ai") {
        "openrouter"
    } else if api_url.contains("localhost:11434") {
        "ollama"
    } else {
        "openai-compatible"
    }
}
