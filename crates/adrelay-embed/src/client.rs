//! HTTP client for an OpenAI-style embeddings provider.
//!
//! Wraps `reqwest` with provider-specific error handling, batch chunking,
//! deterministic input truncation, and the degraded-mode fallback path.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use adrelay_core::AppConfig;

use crate::error::EmbedError;
use crate::fallback::fallback_vector;
use crate::retry::retry_with_backoff;

/// Maximum number of texts per provider call.
const BATCH_SIZE: usize = 64;

/// Pause between consecutive batch requests, to stay under provider rate limits.
const INTER_BATCH_DELAY_MS: u64 = 100;

/// Token budget per input text, approximated at 4 characters per token.
const MAX_INPUT_TOKENS: usize = 8_000;
const CHARS_PER_TOKEN: usize = 4;

/// Gateway configuration, usually derived from [`AppConfig`].
#[derive(Clone)]
pub struct EmbeddingConfig {
    /// `None` puts the gateway in degraded (fallback vector) mode.
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub dimension: usize,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
}

impl EmbeddingConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            api_key: config.embedding_api_key.clone(),
            base_url: config.embedding_base_url.clone(),
            model: config.embedding_model.clone(),
            dimension: config.embedding_dimension,
            timeout_secs: config.embedding_timeout_secs,
            max_retries: config.embedding_max_retries,
            retry_backoff_base_ms: config.embedding_retry_backoff_base_ms,
        }
    }
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    embedding: Vec<f32>,
}

/// Client for the embeddings provider.
///
/// Construct once and share by reference; it is a stateless façade over the
/// provider. Use a wiremock base URL in tests.
pub struct EmbeddingClient {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
    model: String,
    dimension: usize,
    max_retries: u32,
    retry_backoff_base_ms: u64,
}

impl EmbeddingClient {
    /// Creates a new client.
    ///
    /// Without an API key the client runs degraded: every embed call
    /// returns a deterministic fallback vector and no HTTP request is made.
    ///
    /// # Errors
    ///
    /// Returns [`EmbedError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(config: EmbeddingConfig) -> Result<Self, EmbedError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("adrelay/0.1 (ad-matching)")
            .build()?;

        if config.api_key.is_none() {
            tracing::warn!(
                dimension = config.dimension,
                "no embedding API key configured; gateway running in degraded fallback mode"
            );
        }

        Ok(Self {
            client,
            url: format!("{}/embeddings", config.base_url.trim_end_matches('/')),
            api_key: config.api_key,
            model: config.model,
            dimension: config.dimension,
            max_retries: config.max_retries,
            retry_backoff_base_ms: config.retry_backoff_base_ms,
        })
    }

    /// Fixed output dimension for the lifetime of the deployment.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// `true` when no provider is configured and fallback vectors are served.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.api_key.is_none()
    }

    /// Embed one text.
    ///
    /// # Errors
    ///
    /// Returns [`EmbedError`] if the provider call fails past its retries.
    /// Never fails in degraded mode.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let mut vectors = self.embed_batch(std::slice::from_ref(&text.to_string())).await?;
        vectors
            .pop()
            .ok_or_else(|| EmbedError::Api("provider returned no embedding".to_string()))
    }

    /// Embed many texts, preserving input order.
    ///
    /// Inputs are truncated to the token budget, then sent in chunks of
    /// [`BATCH_SIZE`] with a short delay between chunks. A failed chunk
    /// fails the whole call; there is no partial-success merging.
    ///
    /// # Errors
    ///
    /// Returns [`EmbedError`] if any chunk fails past its retries.
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let truncated: Vec<String> = texts.iter().map(|t| truncate_to_budget(t)).collect();

        if self.is_degraded() {
            tracing::debug!(
                count = truncated.len(),
                "embedding in degraded mode; returning fallback vectors"
            );
            return Ok(truncated
                .iter()
                .map(|t| fallback_vector(t, self.dimension))
                .collect());
        }

        let mut all_vectors = Vec::with_capacity(truncated.len());
        for (i, chunk) in truncated.chunks(BATCH_SIZE).enumerate() {
            if i > 0 {
                tokio::time::sleep(Duration::from_millis(INTER_BATCH_DELAY_MS)).await;
            }
            let vectors = retry_with_backoff(self.max_retries, self.retry_backoff_base_ms, || {
                self.request_embeddings(chunk)
            })
            .await?;
            all_vectors.extend(vectors);
        }
        Ok(all_vectors)
    }

    /// Embed one text, degrading to a fallback vector on provider failure.
    ///
    /// Serve paths use this so a provider outage slows ad serving down but
    /// never blocks it. The returned flag is `true` when the vector is a
    /// fallback (degraded mode or post-retry failure).
    pub async fn embed_or_fallback(&self, text: &str) -> (Vec<f32>, bool) {
        if self.is_degraded() {
            return (fallback_vector(&truncate_to_budget(text), self.dimension), true);
        }
        match self.embed(text).await {
            Ok(vector) => (vector, false),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "embedding provider failed; degrading to fallback vector"
                );
                (fallback_vector(&truncate_to_budget(text), self.dimension), true)
            }
        }
    }

    async fn request_embeddings(&self, chunk: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        let request = EmbeddingsRequest {
            model: &self.model,
            input: chunk,
        };
        let api_key = self.api_key.as_deref().unwrap_or_default();

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if let Err(e) = response.error_for_status_ref() {
            // Surface 5xx through reqwest's error type so the retry layer
            // can classify it as transient; 4xx is a hard provider error.
            if status.is_server_error() {
                return Err(EmbedError::Http(e));
            }
            return Err(EmbedError::Api(format!(
                "provider returned status {status}"
            )));
        }

        let raw = response.text().await?;
        let parsed: EmbeddingsResponse =
            serde_json::from_str(&raw).map_err(|e| EmbedError::Deserialize {
                context: format!("embeddings batch of {}", chunk.len()),
                source: e,
            })?;

        if parsed.data.len() != chunk.len() {
            return Err(EmbedError::Api(format!(
                "provider returned {} embeddings for {} inputs",
                parsed.data.len(),
                chunk.len()
            )));
        }

        let mut vectors = Vec::with_capacity(parsed.data.len());
        for item in parsed.data {
            if item.embedding.len() != self.dimension {
                return Err(EmbedError::Api(format!(
                    "provider returned dimension {} but {} is configured",
                    item.embedding.len(),
                    self.dimension
                )));
            }
            vectors.push(item.embedding);
        }
        Ok(vectors)
    }
}

/// Truncate `text` to the token budget, deterministically, on a char boundary.
fn truncate_to_budget(text: &str) -> String {
    let max_chars = MAX_INPUT_TOKENS * CHARS_PER_TOKEN;
    if text.len() <= max_chars {
        return text.to_string();
    }
    let mut end = max_chars;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_unchanged() {
        assert_eq!(truncate_to_budget("hello"), "hello");
    }

    #[test]
    fn long_text_is_cut_to_budget() {
        let long = "a".repeat(MAX_INPUT_TOKENS * CHARS_PER_TOKEN + 500);
        let cut = truncate_to_budget(&long);
        assert_eq!(cut.len(), MAX_INPUT_TOKENS * CHARS_PER_TOKEN);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        // Multi-byte char straddling the cut point must not split.
        let budget = MAX_INPUT_TOKENS * CHARS_PER_TOKEN;
        let mut long = "a".repeat(budget - 1);
        long.push_str("日本語のテキスト");
        let cut = truncate_to_budget(&long);
        assert!(cut.len() <= budget);
        assert!(cut.is_char_boundary(cut.len()));
    }

    #[test]
    fn truncation_is_deterministic() {
        let long = "xyz".repeat(20_000);
        assert_eq!(truncate_to_budget(&long), truncate_to_budget(&long));
    }
}
