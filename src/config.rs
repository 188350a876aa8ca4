//! Artifact locations and provider settings shared by the binaries.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use clap::{Args, ValueEnum};

use crate::embedder::{Embedder, HashEmbedder, OpenAiEmbedder, OpenAiEmbedderConfig};
use crate::error::RagError;
use crate::llm::{LlmProvider, OllamaConfig, OllamaProvider, OpenAiChatConfig, OpenAiProvider};
use crate::segmenter::{SegmentationMode, WindowConfig};

/// On-disk locations of every build artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    /// Directory holding source documents.
    pub raw_dir: PathBuf,
    /// Corpus store CSV.
    pub corpus: PathBuf,
    /// Embedding matrix.
    pub embeddings: PathBuf,
    /// Serialized vector index.
    pub index: PathBuf,
    /// Build manifest JSON.
    pub manifest: PathBuf,
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self::under(Path::new("data"))
    }
}

impl ArtifactPaths {
    /// Standard layout rooted at `data_dir` (`raw/`, `processed/`, `processed/models/`).
    pub fn under(data_dir: &Path) -> Self {
        let processed = data_dir.join("processed");
        let models = processed.join("models");
        Self {
            raw_dir: data_dir.join("raw"),
            corpus: processed.join("articulos_total.csv"),
            embeddings: models.join("embeddings_total.bin"),
            index: models.join("index_total.bin"),
            manifest: models.join("index_manifest.json"),
        }
    }
}

/// Artifact path flags.
#[derive(Args, Debug, Clone)]
pub struct ArtifactArgs {
    /// Directory of source PDFs and text files
    #[arg(long, env = "LEXRAG_RAW_DIR", default_value = "data/raw")]
    pub raw_dir: PathBuf,

    /// Corpus store CSV
    #[arg(
        long,
        env = "LEXRAG_CORPUS",
        default_value = "data/processed/articulos_total.csv"
    )]
    pub corpus: PathBuf,

    /// Embedding matrix file
    #[arg(
        long,
        env = "LEXRAG_EMBEDDINGS",
        default_value = "data/processed/models/embeddings_total.bin"
    )]
    pub embeddings: PathBuf,

    /// Vector index file
    #[arg(
        long,
        env = "LEXRAG_INDEX",
        default_value = "data/processed/models/index_total.bin"
    )]
    pub index: PathBuf,

    /// Build manifest file
    #[arg(
        long,
        env = "LEXRAG_MANIFEST",
        default_value = "data/processed/models/index_manifest.json"
    )]
    pub manifest: PathBuf,
}

impl ArtifactArgs {
    /// Converts the parsed flags into [`ArtifactPaths`].
    pub fn paths(&self) -> ArtifactPaths {
        ArtifactPaths {
            raw_dir: self.raw_dir.clone(),
            corpus: self.corpus.clone(),
            embeddings: self.embeddings.clone(),
            index: self.index.clone(),
            manifest: self.manifest.clone(),
        }
    }
}

/// Sliding-window segmentation flags.
#[derive(Args, Debug, Clone)]
pub struct SegmentArgs {
    /// Segment every document with sliding windows instead of articles/sections
    #[arg(long, env = "LEXRAG_WINDOW", default_value_t = false)]
    pub window: bool,

    /// Words per window
    #[arg(long, env = "LEXRAG_CHUNK_SIZE", default_value_t = 400)]
    pub chunk_size: usize,

    /// Fraction of each window shared with the next, in [0, 1)
    #[arg(long, env = "LEXRAG_OVERLAP", default_value_t = 0.2)]
    pub overlap: f64,

    /// Windows with at most this many characters are discarded
    #[arg(long, env = "LEXRAG_MIN_CHARS", default_value_t = 200)]
    pub min_chars: usize,
}

impl SegmentArgs {
    /// Resolves the corpus-wide segmentation mode.
    pub fn mode(&self) -> Result<SegmentationMode, RagError> {
        if !self.window {
            return Ok(SegmentationMode::Structured);
        }
        WindowConfig::new(self.chunk_size, self.overlap, self.min_chars).map(SegmentationMode::Window)
    }
}

/// Embedding backends selectable from the command line.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum EmbedderKind {
    /// Local feature-hashing embedder; deterministic and offline.
    Hash,
    /// OpenAI-compatible `/embeddings` endpoint.
    Openai,
}

/// Embedder selection flags.
#[derive(Args, Debug, Clone)]
pub struct EmbedderArgs {
    /// Embedding backend
    #[arg(long, env = "LEXRAG_EMBEDDER", value_enum, default_value = "hash")]
    pub embedder: EmbedderKind,

    /// Vector width
    #[arg(long, env = "LEXRAG_EMBEDDING_DIMENSIONS", default_value_t = 384)]
    pub embedding_dimensions: usize,

    /// Remote embedding model
    #[arg(
        long,
        env = "LEXRAG_EMBEDDING_MODEL",
        default_value = "text-embedding-3-small"
    )]
    pub embedding_model: String,

    /// Base URL for the OpenAI-compatible embeddings endpoint
    #[arg(
        long,
        env = "LEXRAG_EMBEDDING_BASE_URL",
        default_value = "https://api.openai.com/v1"
    )]
    pub embedding_base_url: String,

    /// API key for remote embeddings
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// Max inputs per embedding request
    #[arg(long, env = "LEXRAG_EMBEDDING_BATCH", default_value_t = 32)]
    pub embedding_batch: usize,

    /// Seconds before embedding requests time out
    #[arg(long, env = "LEXRAG_EMBEDDING_TIMEOUT_SECS", default_value_t = 30)]
    pub embedding_timeout_secs: u64,

    /// Attempts per embedding batch on transient errors
    #[arg(long, env = "LEXRAG_EMBEDDING_MAX_RETRIES", default_value_t = 5)]
    pub embedding_max_retries: usize,
}

impl EmbedderArgs {
    /// Instantiates the selected embedder.
    pub fn build(&self) -> Result<Box<dyn Embedder>> {
        match self.embedder {
            EmbedderKind::Hash => Ok(Box::new(HashEmbedder::new(self.embedding_dimensions))),
            EmbedderKind::Openai => {
                let embedder = OpenAiEmbedder::new(OpenAiEmbedderConfig {
                    api_key: self.openai_api_key.clone().unwrap_or_default(),
                    base_url: self.embedding_base_url.clone(),
                    model: self.embedding_model.clone(),
                    dimensions: self.embedding_dimensions,
                    timeout: Duration::from_secs(self.embedding_timeout_secs.max(1)),
                    max_retries: self.embedding_max_retries,
                    batch_size: self.embedding_batch,
                })?;
                Ok(Box::new(embedder))
            }
        }
    }
}

/// Answer-generation backends.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum LlmKind {
    /// OpenAI-compatible chat completions (OpenAI, Groq, ...).
    Openai,
    /// Local Ollama server.
    Ollama,
}

/// Language-model selection flags.
#[derive(Args, Debug, Clone)]
pub struct LlmArgs {
    /// Answer-generation backend
    #[arg(long, env = "LEXRAG_LLM", value_enum, default_value = "openai")]
    pub llm: LlmKind,

    /// Chat model; defaults to gpt-4o-mini (openai) or llama3.1 (ollama)
    #[arg(long, env = "LEXRAG_LLM_MODEL")]
    pub llm_model: Option<String>,

    /// Endpoint base URL; defaults to the provider's public/local address
    #[arg(long, env = "LEXRAG_LLM_BASE_URL")]
    pub llm_base_url: Option<String>,

    /// API key for the chat endpoint; falls back to GROQ_API_KEY, then OPENAI_API_KEY
    #[arg(long, env = "LEXRAG_LLM_API_KEY", hide_env_values = true)]
    pub llm_api_key: Option<String>,

    /// Groq API key, used with `--llm-base-url https://api.groq.com/openai/v1`
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    pub groq_api_key: Option<String>,

    /// Sampling temperature
    #[arg(long, env = "LEXRAG_TEMPERATURE", default_value_t = 0.2)]
    pub temperature: f32,

    /// Maximum completion tokens
    #[arg(long, env = "LEXRAG_MAX_COMPLETION_TOKENS", default_value_t = 1024)]
    pub max_completion_tokens: usize,

    /// Seconds before the LLM request times out
    #[arg(long, env = "LEXRAG_LLM_TIMEOUT_SECS", default_value_t = 120)]
    pub llm_timeout_secs: u64,
}

impl LlmArgs {
    /// Instantiates the selected provider.
    ///
    /// `fallback_key` is used when no LLM-specific key was given. A provider
    /// that needs a key and has none fails here, before any retrieval.
    pub fn build(&self, fallback_key: Option<&str>) -> Result<Box<dyn LlmProvider>> {
        let timeout = Duration::from_secs(self.llm_timeout_secs.max(1));
        match self.llm {
            LlmKind::Openai => {
                let api_key = self.api_key(fallback_key).unwrap_or_default().to_string();
                let provider = OpenAiProvider::new(OpenAiChatConfig {
                    api_key,
                    base_url: self
                        .llm_base_url
                        .clone()
                        .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
                    model: self
                        .llm_model
                        .clone()
                        .unwrap_or_else(|| "gpt-4o-mini".to_string()),
                    timeout,
                })?;
                Ok(Box::new(provider))
            }
            LlmKind::Ollama => {
                let provider = OllamaProvider::new(OllamaConfig {
                    base_url: self
                        .llm_base_url
                        .clone()
                        .unwrap_or_else(|| "http://localhost:11434".to_string()),
                    model: self
                        .llm_model
                        .clone()
                        .unwrap_or_else(|| "llama3.1".to_string()),
                    timeout,
                })?;
                Ok(Box::new(provider))
            }
        }
    }

    /// First non-blank key among `--llm-api-key`, `--groq-api-key` and `fallback_key`.
    pub fn api_key<'a>(&'a self, fallback_key: Option<&'a str>) -> Option<&'a str> {
        [
            self.llm_api_key.as_deref(),
            self.groq_api_key.as_deref(),
            fallback_key,
        ]
        .into_iter()
        .flatten()
        .find(|key| !key.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(flatten)]
        artifacts: ArtifactArgs,
        #[command(flatten)]
        segment: SegmentArgs,
        #[command(flatten)]
        embedder: EmbedderArgs,
        #[command(flatten)]
        llm: LlmArgs,
    }

    #[test]
    fn default_layout_matches_data_dir() {
        let paths = ArtifactPaths::default();
        assert_eq!(paths.raw_dir, PathBuf::from("data/raw"));
        assert_eq!(
            paths.corpus,
            PathBuf::from("data/processed/articulos_total.csv")
        );
        assert_eq!(
            paths.manifest,
            PathBuf::from("data/processed/models/index_manifest.json")
        );
    }

    #[test]
    fn flags_override_paths_and_window() {
        let cli = TestCli::try_parse_from([
            "test",
            "--corpus",
            "/tmp/c.csv",
            "--window",
            "--chunk-size",
            "100",
            "--overlap",
            "0.5",
        ])
        .unwrap();
        assert_eq!(cli.artifacts.paths().corpus, PathBuf::from("/tmp/c.csv"));
        let SegmentationMode::Window(config) = cli.segment.mode().unwrap() else {
            panic!("expected window mode");
        };
        assert_eq!(config.step(), 50);
    }

    #[test]
    fn invalid_window_flags_are_rejected() {
        let cli = TestCli::try_parse_from(["test", "--window", "--overlap", "1.5"]).unwrap();
        assert!(matches!(
            cli.segment.mode(),
            Err(RagError::InvalidWindow(_))
        ));
    }

    #[test]
    fn builds_hash_embedder_by_default() {
        let cli = TestCli::try_parse_from(["test", "--embedder", "hash", "--embedding-dimensions", "32"])
            .unwrap();
        let embedder = cli.embedder.build().unwrap();
        assert_eq!(embedder.id(), "hash-v1/32");
    }

    #[test]
    fn openai_llm_without_any_key_fails() {
        let cli = TestCli::try_parse_from(["test", "--llm", "openai"]).unwrap();
        let err = cli.llm.build(None).err().expect("error");
        assert!(matches!(
            err.downcast_ref::<RagError>(),
            Some(RagError::MissingCredential(_))
        ));
        assert!(cli.llm.build(Some("sk-fallback")).is_ok());
    }

    #[test]
    fn groq_key_sits_between_llm_key_and_fallback() {
        let cli = TestCli::try_parse_from(["test", "--groq-api-key", "gsk-groq"]).unwrap();
        assert_eq!(cli.llm.api_key(Some("sk-openai")), Some("gsk-groq"));
        assert!(cli.llm.build(None).is_ok());

        let cli = TestCli::try_parse_from([
            "test",
            "--llm-api-key",
            "sk-llm",
            "--groq-api-key",
            "gsk-groq",
        ])
        .unwrap();
        assert_eq!(cli.llm.api_key(Some("sk-openai")), Some("sk-llm"));

        let cli = TestCli::try_parse_from(["test", "--groq-api-key", "  "]).unwrap();
        assert_eq!(cli.llm.api_key(Some("sk-openai")), Some("sk-openai"));
    }

    #[test]
    fn ollama_needs_no_key() {
        let cli = TestCli::try_parse_from(["test", "--llm", "ollama"]).unwrap();
        assert_eq!(cli.llm.build(None).unwrap().name(), "ollama");
    }
}
