//! Best-effort HTTP client for the description providers. Strictly
//! read-only and non-authoritative: a timeout, an error, or a rate limit
//! all degrade to the deterministic fallback, never to a kernel error.

use crate::cache::DescriptionCache;
use crate::config::{AiConfig, Provider};
use async_trait::async_trait;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

#[async_trait]
pub trait TextProvider: Send + Sync {
    async fn complete(&self, model: &str, prompt: &str) -> anyhow::Result<String>;
}

pub struct HttpTextProvider {
    client: reqwest::Client,
    provider: Provider,
    base_url: String,
}

impl HttpTextProvider {
    pub fn new(config: &AiConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self {
            client,
            provider: config.provider,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl TextProvider for HttpTextProvider {
    async fn complete(&self, model: &str, prompt: &str) -> anyhow::Result<String> {
        match self.provider {
            Provider::Ollama => {
                let body = serde_json::json!({
                    "model": model,
                    "prompt": prompt,
                    "stream": false,
                });
                let resp: serde_json::Value = self
                    .client
                    .post(format!("{}/api/generate", self.base_url))
                    .json(&body)
                    .send()
                    .await?
                    .error_for_status()?
                    .json()
                    .await?;
                resp.get("response")
                    .and_then(|v| v.as_str())
                    .map(|s| s.trim().to_string())
                    .ok_or_else(|| anyhow::anyhow!("missing 'response' field"))
            }
            Provider::LlamaCpp => {
                let body = serde_json::json!({
                    "prompt": prompt,
                    "n_predict": 160,
                });
                let resp: serde_json::Value = self
                    .client
                    .post(format!("{}/completion", self.base_url))
                    .json(&body)
                    .send()
                    .await?
                    .error_for_status()?
                    .json()
                    .await?;
                resp.get("content")
                    .and_then(|v| v.as_str())
                    .map(|s| s.trim().to_string())
                    .ok_or_else(|| anyhow::anyhow!("missing 'content' field"))
            }
        }
    }
}

/// Caching facade over a provider. `describe` always returns something: the
/// cached text, a fresh completion, or the caller's deterministic fallback.
pub struct DescriptionService {
    config: AiConfig,
    provider: Option<Box<dyn TextProvider>>,
    cache: Mutex<DescriptionCache>,
    last_request: Mutex<Option<Instant>>,
}

impl DescriptionService {
    #[must_use]
    pub fn new(config: AiConfig, provider: Option<Box<dyn TextProvider>>) -> Self {
        let cache = DescriptionCache::new(
            Duration::from_millis(config.cache_ttl_ms),
            config.cache_max_entries,
        );
        Self {
            config,
            provider,
            cache: Mutex::new(cache),
            last_request: Mutex::new(None),
        }
    }

    /// Connect the configured HTTP provider, or run fallback-only when the
    /// client cannot even be constructed.
    #[must_use]
    pub fn from_config(config: AiConfig) -> Self {
        let provider: Option<Box<dyn TextProvider>> = match HttpTextProvider::new(&config) {
            Ok(p) => Some(Box::new(p)),
            Err(e) => {
                tracing::warn!(error = %e, "text provider unavailable, fallbacks only");
                None
            }
        };
        Self::new(config, provider)
    }

    pub async fn describe(&self, scope: &str, key: &str, prompt: &str, fallback: String) -> String {
        if let Some(hit) = self.cache.lock().await.get(key) {
            return hit;
        }
        let Some(provider) = &self.provider else {
            return fallback;
        };

        // Honor the minimum spacing between provider calls.
        {
            let last = self.last_request.lock().await;
            if let Some(at) = *last {
                let spacing = Duration::from_millis(self.config.min_interval_ms);
                if at.elapsed() < spacing {
                    return fallback;
                }
            }
        }
        *self.last_request.lock().await = Some(Instant::now());

        let model = self.config.model_for(scope).to_string();
        match provider.complete(&model, prompt).await {
            Ok(text) if !text.is_empty() => {
                self.cache.lock().await.put(key.to_string(), text.clone());
                text
            }
            Ok(_) => fallback,
            Err(e) => {
                tracing::debug!(key, error = %e, "description request failed, using fallback");
                fallback
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProvider(&'static str);

    #[async_trait]
    impl TextProvider for FixedProvider {
        async fn complete(&self, _model: &str, _prompt: &str) -> anyhow::Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl TextProvider for FailingProvider {
        async fn complete(&self, _model: &str, _prompt: &str) -> anyhow::Result<String> {
            anyhow::bail!("connection refused")
        }
    }

    #[tokio::test]
    async fn success_is_cached() {
        let mut config = AiConfig::default();
        config.min_interval_ms = 0;
        let svc = DescriptionService::new(config, Some(Box::new(FixedProvider("a quiet beast"))));
        let first = svc
            .describe("creature", "creature:1", "describe", "fb".into())
            .await;
        assert_eq!(first, "a quiet beast");
        // Second call hits the cache even if the provider changes behavior.
        let second = svc
            .describe("creature", "creature:1", "describe", "fb".into())
            .await;
        assert_eq!(second, "a quiet beast");
    }

    #[tokio::test]
    async fn failure_degrades_to_fallback() {
        let mut config = AiConfig::default();
        config.min_interval_ms = 0;
        let svc = DescriptionService::new(config, Some(Box::new(FailingProvider)));
        let text = svc
            .describe("civ", "civ:1", "describe", "a patient tribe".into())
            .await;
        assert_eq!(text, "a patient tribe");
    }

    #[tokio::test]
    async fn no_provider_means_fallback_only() {
        let svc = DescriptionService::new(AiConfig::default(), None);
        let text = svc
            .describe("species", "species:x", "describe", "fb".into())
            .await;
        assert_eq!(text, "fb");
    }
}
