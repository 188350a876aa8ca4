//! OpenAI-compatible chat completions provider.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use super::{response_error, LlmProvider, ProviderRequest};
use crate::error::RagError;

/// Settings for any OpenAI-compatible chat completions endpoint (OpenAI, Groq, ...).
#[derive(Debug, Clone)]
pub struct OpenAiChatConfig {
    /// Bearer token.
    pub api_key: String,
    /// Base URL without the `/chat/completions` suffix.
    pub base_url: String,
    /// Chat model name.
    pub model: String,
    /// Request timeout.
    pub timeout: Duration,
}

/// Chat-completions provider.
pub struct OpenAiProvider {
    endpoint: String,
    model: String,
    client: Client,
}

impl OpenAiProvider {
    /// Builds the provider; a blank key is a [`RagError::MissingCredential`].
    pub fn new(config: OpenAiChatConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(RagError::MissingCredential(
                "LLM API key (set LEXRAG_LLM_API_KEY, GROQ_API_KEY or OPENAI_API_KEY)".into(),
            )
            .into());
        }
        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", config.api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth).context("invalid LLM API key")?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .context("failed to build chat completions HTTP client")?;
        Ok(Self {
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model,
            client,
        })
    }
}

impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn answer(&self, request: &ProviderRequest) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: request.system,
                },
                ChatMessage {
                    role: "user",
                    content: request.prompt,
                },
            ],
        };
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .with_context(|| format!("failed to call {}", self.endpoint))?;
        if !resp.status().is_success() {
            return Err(response_error("chat completions endpoint", resp));
        }
        let parsed: ChatResponse = resp
            .json()
            .context("failed to parse chat completions response")?;
        first_message(parsed)
    }
}

fn first_message(parsed: ChatResponse) -> Result<String> {
    match parsed
        .choices
        .into_iter()
        .find_map(|choice| choice.message.content)
    {
        Some(answer) => Ok(answer),
        None => bail!("chat completions response has no message content"),
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    max_tokens: usize,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(key: &str) -> OpenAiChatConfig {
        OpenAiChatConfig {
            api_key: key.into(),
            base_url: "https://api.groq.com/openai/v1/".into(),
            model: "llama-3.1-8b-instant".into(),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn missing_key_fails_at_construction() {
        let err = OpenAiProvider::new(config("")).err().expect("error");
        assert!(matches!(
            err.downcast_ref::<RagError>(),
            Some(RagError::MissingCredential(_))
        ));
    }

    #[test]
    fn endpoint_joins_base_url() {
        let provider = OpenAiProvider::new(config("gsk-test")).expect("provider");
        assert_eq!(
            provider.endpoint,
            "https://api.groq.com/openai/v1/chat/completions"
        );
    }

    #[test]
    fn answer_text_is_returned_verbatim() {
        let parsed: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"  Según el ARTÍCULO 2...\n"}}]}"#,
        )
        .unwrap();
        assert_eq!(first_message(parsed).unwrap(), "  Según el ARTÍCULO 2...\n");

        let empty: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(first_message(empty).is_err());
    }

    #[test]
    fn request_carries_system_and_user_messages() {
        let body = ChatRequest {
            model: "m",
            temperature: 0.2,
            max_tokens: 1024,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: "sys",
                },
                ChatMessage {
                    role: "user",
                    content: "hola",
                },
            ],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hola");
        assert_eq!(json["max_tokens"], 1024);
    }
}
