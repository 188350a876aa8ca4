//! Language-model collaborators that turn a composed prompt into an answer.

use anyhow::Result;

pub mod ollama;
pub mod openai;

pub use ollama::{OllamaConfig, OllamaProvider};
pub use openai::{OpenAiChatConfig, OpenAiProvider};

/// A text-completion backend.
///
/// Failures propagate to the caller unchanged; providers do not retry.
pub trait LlmProvider: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Returns the model's completion for `request`.
    fn answer(&self, request: &ProviderRequest) -> Result<String>;
}

/// Request envelope shared by the providers.
#[derive(Debug, Clone, Copy)]
pub struct ProviderRequest<'a> {
    /// System instruction framing the assistant's role.
    pub system: &'a str,
    /// User prompt with context and question.
    pub prompt: &'a str,
    /// Sampling temperature.
    pub temperature: f32,
    /// Completion token ceiling.
    pub max_tokens: usize,
}

/// Reads a non-success response into an error carrying status and body.
pub(crate) fn response_error(provider: &str, resp: reqwest::blocking::Response) -> anyhow::Error {
    let status = resp.status();
    let text = resp
        .text()
        .unwrap_or_else(|_| "<body unavailable>".to_string());
    anyhow::anyhow!("{provider} returned {status}: {text}")
}
