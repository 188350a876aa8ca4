//! Local Ollama provider.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use super::{response_error, LlmProvider, ProviderRequest};

/// Settings for a local Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    /// Server root, e.g. `http://localhost:11434`.
    pub base_url: String,
    /// Model tag, e.g. `llama3.1`.
    pub model: String,
    /// Request timeout; local generation can be slow.
    pub timeout: Duration,
}

/// Provider calling Ollama's non-streaming `/api/generate`.
pub struct OllamaProvider {
    endpoint: String,
    model: String,
    client: Client,
}

impl OllamaProvider {
    /// Builds the provider. No credential is needed.
    pub fn new(config: OllamaConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("failed to build Ollama HTTP client")?;
        Ok(Self {
            endpoint: format!("{}/api/generate", config.base_url.trim_end_matches('/')),
            model: config.model,
            client,
        })
    }
}

impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    fn answer(&self, request: &ProviderRequest) -> Result<String> {
        let body = GenerateRequest::new(&self.model, request);
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .with_context(|| format!("failed to call Ollama at {}", self.endpoint))?;
        if !resp.status().is_success() {
            return Err(response_error("Ollama", resp));
        }
        let parsed: GenerateResponse = resp.json().context("failed to parse Ollama response")?;
        Ok(parsed.response)
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    system: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

impl<'a> GenerateRequest<'a> {
    fn new(model: &'a str, request: &ProviderRequest<'a>) -> Self {
        Self {
            model,
            system: request.system,
            prompt: request.prompt,
            stream: false,
            options: GenerateOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        }
    }
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: usize,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_non_streaming_generate_request() {
        let request = ProviderRequest {
            system: "Eres un asistente",
            prompt: "PREGUNTA: ...",
            temperature: 0.2,
            max_tokens: 256,
        };
        let json = serde_json::to_value(GenerateRequest::new("llama3.1", &request)).unwrap();
        assert_eq!(json["model"], "llama3.1");
        assert_eq!(json["stream"], false);
        assert_eq!(json["system"], "Eres un asistente");
        assert_eq!(json["options"]["num_predict"], 256);
    }

    #[test]
    fn endpoint_targets_generate() {
        let provider = OllamaProvider::new(OllamaConfig {
            base_url: "http://localhost:11434/".into(),
            model: "llama3.1".into(),
            timeout: Duration::from_secs(1),
        })
        .unwrap();
        assert_eq!(provider.endpoint, "http://localhost:11434/api/generate");
        assert_eq!(provider.name(), "ollama");
    }
}
