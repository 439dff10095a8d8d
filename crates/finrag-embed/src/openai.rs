//! Remote embedding provider speaking the OpenAI-compatible embeddings API.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use finrag_core::config::Settings;
use finrag_core::error::{Error, Result};
use finrag_core::traits::Embedder;

/// Provider-side request cap; inputs are partitioned into batches of this
/// many strings and sent sequentially to respect rate limits.
pub const EMBED_BATCH_SIZE: usize = 100;

pub struct OpenAiEmbedder {
    client: Client,
    api_key: String,
    api_base: String,
    model: String,
    dim: usize,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorBody,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: String,
}

impl OpenAiEmbedder {
    /// Fails with `Error::Configuration` when no API key is set. This check
    /// runs before any network interaction so misconfiguration never turns
    /// into a connection attempt.
    pub fn new(settings: &Settings) -> Result<Self> {
        if !settings.has_api_key() {
            return Err(Error::Configuration(
                "embedding API key not configured; set FINRAG_API_KEY or `api_key` in finrag.toml"
                    .to_string(),
            ));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Provider(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_key: settings.api_key.trim().to_string(),
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            model: settings.embedding_model.clone(),
            dim: settings.embedding_dimension,
        })
    }

    fn embed_one_batch(&self, batch: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/embeddings", self.api_base);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest { model: &self.model, input: batch })
            .send()
            .map_err(|e| classify_provider_error(&e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(classify_provider_error(&format!("{status}: {message}")));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .map_err(|e| Error::Provider(format!("malformed embeddings response: {e}")))?;
        // The API documents response order as input order; sort by index so a
        // reordered payload cannot silently misalign vectors and texts.
        let mut items = parsed.data;
        items.sort_by_key(|item| item.index);
        Ok(items.into_iter().map(|item| item.embedding).collect())
    }
}

impl Embedder for OpenAiEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(EMBED_BATCH_SIZE) {
            debug!(batch_len = batch.len(), model = %self.model, "requesting embeddings");
            out.extend(self.embed_one_batch(batch)?);
        }
        Ok(out)
    }
}

/// Map a provider failure message onto the error taxonomy. Quota and billing
/// exhaustion is detected by substring so it can be surfaced as retryable
/// later; everything else stays a generic provider error.
pub fn classify_provider_error(message: &str) -> Error {
    let lowered = message.to_lowercase();
    let quota = ["quota", "insufficient_quota", "exceeded"]
        .iter()
        .any(|token| lowered.contains(token));
    if quota {
        Error::QuotaExceeded(format!(
            "{message}. Check your provider billing dashboard before retrying."
        ))
    } else {
        Error::Provider(message.to_string())
    }
}
