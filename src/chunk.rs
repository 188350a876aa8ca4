//! The retrievable unit of corpus text.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RagError;

/// Tags which segmentation strategy produced a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkType {
    /// Legal article delimited by an `ARTÍCULO N` marker.
    Article,
    /// Manual section delimited by a chapter or numbered heading.
    ManualSection,
    /// Fixed-size sliding window over words.
    Window,
}

impl ChunkType {
    /// Stable tag written to the corpus store.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Article => "article",
            Self::ManualSection => "manual_section",
            Self::Window => "window",
        }
    }
}

impl fmt::Display for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChunkType {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "article" => Ok(Self::Article),
            "manual_section" => Ok(Self::ManualSection),
            "window" => Ok(Self::Window),
            other => Err(RagError::CorruptArtifact(format!(
                "unknown chunk type '{other}'"
            ))),
        }
    }
}

/// One immutable unit of corpus text plus the metadata recovered from its
/// boundary marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chunk {
    source_id: String,
    sequence_id: Option<u32>,
    title: String,
    body: String,
    chunk_type: ChunkType,
}

impl Chunk {
    /// Builds a chunk, rejecting bodies that are empty after trimming.
    pub fn new(
        source_id: impl Into<String>,
        sequence_id: Option<u32>,
        title: impl Into<String>,
        body: impl Into<String>,
        chunk_type: ChunkType,
    ) -> Result<Self, RagError> {
        let source_id = source_id.into();
        let body = body.into();
        if body.trim().is_empty() {
            return Err(RagError::EmptyBody { source_id });
        }
        Ok(Self {
            source_id,
            sequence_id,
            title: title.into().trim().to_string(),
            body,
            chunk_type,
        })
    }

    /// Originating document identifier (file name).
    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    /// Article number, when the chunk is an article.
    pub fn sequence_id(&self) -> Option<u32> {
        self.sequence_id
    }

    /// Heading text; empty when the strategy produces none.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Normalized chunk text.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Strategy tag.
    pub fn chunk_type(&self) -> ChunkType {
        self.chunk_type
    }

    /// Text submitted to the embedder for this chunk.
    pub fn embedding_text(&self) -> &str {
        &self.body
    }

    /// Human-readable label built from the article number and title.
    ///
    /// Returns `None` for chunks with neither, e.g. sliding windows.
    pub fn label(&self) -> Option<String> {
        match (self.sequence_id, self.title.is_empty()) {
            (Some(id), false) => Some(format!("ARTÍCULO {id} - {}", self.title)),
            (Some(id), true) => Some(format!("ARTÍCULO {id}")),
            (None, false) => Some(self.title.clone()),
            (None, true) => None,
        }
    }
}
