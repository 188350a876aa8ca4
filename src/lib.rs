#![warn(missing_docs)]
//! Core library for lexrag: segmentation, indexing and retrieval over
//! Colombian traffic law, plus the answer composer that feeds a language model.

pub mod chunk;
pub mod compose;
pub mod config;
pub mod corpus;
pub mod embedder;
pub mod embeddings;
pub mod error;
pub mod extract;
pub mod index;
pub mod llm;
pub mod manifest;
pub mod normalizer;
pub mod pipeline;
pub mod retriever;
pub mod segmenter;
pub mod telemetry;

pub use chunk::{Chunk, ChunkType};
pub use compose::{compose_context, compose_prompt, Answer, AnswerComposer, GenerationSettings};
pub use config::{ArtifactArgs, ArtifactPaths, EmbedderArgs, LlmArgs, SegmentArgs};
pub use corpus::CorpusStore;
pub use embedder::{Embedder, HashEmbedder, OpenAiEmbedder};
pub use embeddings::EmbeddingMatrix;
pub use error::RagError;
pub use extract::{PdfExtractor, PlainTextExtractor, TextExtractor};
pub use index::{FlatIndex, Hit};
pub use llm::{LlmProvider, ProviderRequest};
pub use manifest::IndexManifest;
pub use normalizer::normalize;
pub use retriever::{Retrieved, Retriever};
pub use segmenter::{
    BoundaryDetector, SegmentationMode, Segmenter, Strategy, WindowConfig,
};
