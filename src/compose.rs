//! Context rendering, prompt construction, and delegation to the language model.

use anyhow::Result;
use tracing::info;

use crate::llm::{LlmProvider, ProviderRequest};
use crate::retriever::Retrieved;

/// System instruction sent with every question.
pub const SYSTEM_INSTRUCTION: &str = "Eres un asistente experto en normativa de tránsito en Colombia. \
Responde únicamente con la información del contexto entregado, cita los artículos o secciones que uses \
y explica en lenguaje claro. No inventes normas ni referencias.";

/// Renders one labeled block per result, in ranked order, separated by blank lines.
pub fn compose_context(results: &[Retrieved<'_>]) -> String {
    let mut out = String::new();
    for (rank, result) in results.iter().enumerate() {
        if rank > 0 {
            out.push_str("\n\n");
        }
        let chunk = result.chunk;
        let label = chunk.label().unwrap_or_else(|| "FRAGMENTO".to_string());
        out.push_str(&format!(
            "[{}] {}\nFuente: {} | Puntaje: {:.4}\n",
            rank + 1,
            label,
            chunk.source_id(),
            result.score
        ));
        out.push_str(chunk.body().trim());
    }
    out
}

/// Builds the user prompt: question, context, and answering rules.
pub fn compose_prompt(query: &str, context: &str) -> String {
    let context = if context.trim().is_empty() {
        "(sin resultados)"
    } else {
        context
    };
    format!(
        "PREGUNTA:\n{query}\n\n\
         CONTEXTO (EXTRACTOS DE NORMATIVA):\n{context}\n\n\
         Instrucciones:\n\
         - Responde solo con base en el contexto anterior.\n\
         - Indica explícitamente qué fragmentos usas, por número de artículo o por [n].\n\
         - Si el contexto no basta para responder, dilo con claridad.\n"
    )
}

/// Generation settings passed through to the provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationSettings {
    /// Sampling temperature.
    pub temperature: f32,
    /// Completion token ceiling.
    pub max_tokens: usize,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            max_tokens: 1024,
        }
    }
}

/// Composed prompt plus the model's untouched reply.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    /// Context block shown to the model.
    pub context: String,
    /// Model output.
    pub text: String,
}

/// Turns retrieval results into an answer through an [`LlmProvider`].
pub struct AnswerComposer<'p> {
    provider: &'p dyn LlmProvider,
    settings: GenerationSettings,
}

impl<'p> AnswerComposer<'p> {
    /// Composer delegating to `provider`.
    pub fn new(provider: &'p dyn LlmProvider, settings: GenerationSettings) -> Self {
        Self { provider, settings }
    }

    /// Composes the prompt and asks the provider; errors propagate unchanged.
    pub fn answer(&self, query: &str, results: &[Retrieved<'_>]) -> Result<Answer> {
        let context = compose_context(results);
        let prompt = compose_prompt(query, &context);
        info!(
            provider = self.provider.name(),
            chunks = results.len(),
            "requesting answer"
        );
        let text = self.provider.answer(&ProviderRequest {
            system: SYSTEM_INSTRUCTION,
            prompt: &prompt,
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        })?;
        Ok(Answer { context, text })
    }
}
