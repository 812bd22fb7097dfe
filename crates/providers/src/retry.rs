//! Bounded retry around a single provider.
//!
//! Transient failures (timeouts, network errors, rate limits, 5xx) are
//! retried up to `max_retries` extra times with a linear backoff. Anything
//! else is returned on the first attempt.

use async_trait::async_trait;
use helpline_core::error::ProviderError;
use helpline_core::provider::*;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// A provider that retries transient failures of the wrapped provider.
pub struct RetryProvider {
    name: String,
    inner: Arc<dyn helpline_core::Provider>,
    max_retries: u32,
    backoff: Duration,
}

impl RetryProvider {
    pub fn new(inner: Arc<dyn helpline_core::Provider>, max_retries: u32) -> Self {
        Self {
            name: inner.name().to_string(),
            inner,
            max_retries,
            backoff: Duration::from_millis(500),
        }
    }

    /// Base delay; attempt `n` waits `n * backoff`.
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }
}

#[async_trait]
impl helpline_core::Provider for RetryProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let mut attempt = 0;
        loop {
            match self.inner.complete(request.clone()).await {
                Ok(response) => {
                    if attempt > 0 {
                        info!(provider = %self.name, attempt = attempt + 1, "Retry succeeded");
                    }
                    return Ok(response);
                }
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(
                        provider = %self.name,
                        error = %e,
                        attempt,
                        max_retries = self.max_retries,
                        "Transient provider failure, retrying"
                    );
                    tokio::time::sleep(self.backoff * attempt).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        self.inner.health_check().await
    }
}
