//! Embedder backed by an OpenAI-compatible `/embeddings` endpoint.

use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{l2_normalize, Embedder};
use crate::error::RagError;

/// Connection and batching settings for [`OpenAiEmbedder`].
#[derive(Debug, Clone)]
pub struct OpenAiEmbedderConfig {
    /// Bearer token.
    pub api_key: String,
    /// Base URL, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    /// Embedding model name.
    pub model: String,
    /// Expected vector width; sent as the `dimensions` request field.
    pub dimensions: usize,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Attempts per batch before giving up.
    pub max_retries: usize,
    /// Inputs per HTTP request.
    pub batch_size: usize,
}

/// Blocking embeddings client for OpenAI-compatible endpoints.
#[derive(Clone)]
pub struct OpenAiEmbedder {
    client: Client,
    endpoint: String,
    model: String,
    dimensions: usize,
    max_retries: usize,
    batch_size: usize,
}

impl OpenAiEmbedder {
    /// Builds a client; fails when the key or model is blank.
    pub fn new(config: OpenAiEmbedderConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(RagError::MissingCredential("OpenAI embeddings API key".into()).into());
        }
        anyhow::ensure!(!config.model.trim().is_empty(), "missing embedding model name");
        anyhow::ensure!(config.dimensions > 0, "embedding dimensions must be positive");
        let mut headers = reqwest::header::HeaderMap::new();
        let auth = format!("Bearer {}", config.api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth).context("invalid OpenAI API key")?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .context("failed to build embeddings HTTP client")?;
        let endpoint = embeddings_endpoint(&config.base_url);
        Ok(Self {
            client,
            endpoint,
            model: config.model,
            dimensions: config.dimensions,
            max_retries: config.max_retries.max(1),
            batch_size: config.batch_size.max(1),
        })
    }

    /// Maximum inputs sent per request.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn embed_batch(&self, inputs: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut attempt = 0usize;
        loop {
            let request = EmbeddingRequest {
                model: &self.model,
                input: inputs,
                dimensions: Some(self.dimensions),
            };
            let response = self.client.post(&self.endpoint).json(&request).send();
            match response {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        let parsed: EmbeddingResponse = resp
                            .json()
                            .context("failed to parse embedding response")?;
                        return self.collect_vectors(parsed, inputs.len());
                    }

                    let body = resp
                        .text()
                        .unwrap_or_else(|_| "<body unavailable>".to_string());
                    if should_retry(status) && attempt + 1 < self.max_retries {
                        attempt += 1;
                        warn!(%status, attempt, "retrying embeddings request");
                        thread::sleep(retry_backoff(attempt));
                        continue;
                    }
                    anyhow::bail!("embeddings request failed ({}): {}", status, body);
                }
                Err(err) => {
                    if is_retryable_error(&err) && attempt + 1 < self.max_retries {
                        attempt += 1;
                        warn!(error = %err, attempt, "retrying embeddings request");
                        thread::sleep(retry_backoff(attempt));
                        continue;
                    }
                    return Err(err).with_context(|| format!("POST {} failed", self.endpoint));
                }
            }
        }
    }

    fn collect_vectors(
        &self,
        mut parsed: EmbeddingResponse,
        expected: usize,
    ) -> Result<Vec<Vec<f32>>> {
        parsed.data.sort_by_key(|entry| entry.index);
        anyhow::ensure!(
            parsed.data.len() == expected,
            "endpoint returned {} embeddings for {} inputs",
            parsed.data.len(),
            expected
        );
        parsed
            .data
            .into_iter()
            .map(|entry| {
                let mut vector = entry.embedding;
                if vector.len() != self.dimensions {
                    return Err(RagError::DimensionMismatch {
                        expected: self.dimensions,
                        actual: vector.len(),
                    }
                    .into());
                }
                l2_normalize(&mut vector);
                Ok(vector)
            })
            .collect()
    }
}

impl Embedder for OpenAiEmbedder {
    fn id(&self) -> String {
        format!("openai:{}/{}", self.model, self.dimensions)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            debug!(inputs = batch.len(), "embedding batch");
            out.extend(self.embed_batch(batch)?);
        }
        Ok(out)
    }
}

fn embeddings_endpoint(base_url: &str) -> String {
    format!("{}/embeddings", base_url.trim_end_matches('/'))
}

fn should_retry(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_body() || err.is_request() || err.is_decode()
}

/// Exponential backoff starting at one second, capped at 16 seconds.
pub(crate) fn retry_backoff(attempt: usize) -> Duration {
    let capped = attempt.min(5) as u32;
    Duration::from_millis(500 * (1 << capped))
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    #[serde(borrow)]
    input: &'a [&'a str],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}
