//! Exact inner-product vector index.
//!
//! Vectors are stored in corpus order so a hit's position is also its corpus
//! row. Every search is a full scan; corpora here are a few thousand chunks.

use std::cmp::Ordering;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::embedder::dot;
use crate::embeddings::{decode_artifact, EmbeddingMatrix};
use crate::error::RagError;

const INDEX_MAGIC: &str = "lexrag-flat-ip";
const INDEX_VERSION: u32 = 1;

/// One search result: corpus position plus inner-product score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    /// Row in the corpus store.
    pub position: usize,
    /// Inner product with the query (cosine for unit vectors).
    pub score: f32,
}

/// Brute-force inner-product index.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatIndex {
    vectors: EmbeddingMatrix,
}

#[derive(Serialize, Deserialize)]
struct IndexFile {
    magic: String,
    version: u32,
    vectors: EmbeddingMatrix,
}

impl FlatIndex {
    /// Builds an index over `vectors`, one per corpus row in store order.
    pub fn build(vectors: EmbeddingMatrix) -> Self {
        Self { vectors }
    }

    /// Number of indexed vectors.
    pub fn len(&self) -> usize {
        self.vectors.rows()
    }

    /// True when nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Vector width.
    pub fn dimensions(&self) -> usize {
        self.vectors.dimensions()
    }

    /// Top-`k` positions by descending score; ties go to the lower position.
    ///
    /// `k` is clamped to the index size.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Hit>, RagError> {
        if query.len() != self.dimensions() {
            return Err(RagError::DimensionMismatch {
                expected: self.dimensions(),
                actual: query.len(),
            });
        }
        let mut hits: Vec<Hit> = self
            .vectors
            .iter_rows()
            .enumerate()
            .map(|(position, row)| Hit {
                position,
                score: dot(query, row),
            })
            .collect();
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then(a.position.cmp(&b.position))
        });
        hits.truncate(k.min(self.len()));
        Ok(hits)
    }

    /// Serializes the index with bincode.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {:?}", parent))?;
        }
        let file = File::create(path).with_context(|| format!("failed to create {:?}", path))?;
        let record = IndexFile {
            magic: INDEX_MAGIC.to_string(),
            version: INDEX_VERSION,
            vectors: self.vectors.clone(),
        };
        bincode::serialize_into(BufWriter::new(file), &record)
            .with_context(|| format!("failed to write index to {:?}", path))
    }

    /// Loads an index written by [`FlatIndex::save`].
    pub fn load(path: &Path) -> Result<Self> {
        let record: IndexFile = decode_artifact(path, "flat index")?;
        if record.magic != INDEX_MAGIC || record.version != INDEX_VERSION {
            return Err(RagError::CorruptArtifact(format!(
                "{:?} is not a v{} flat index",
                path, INDEX_VERSION
            ))
            .into());
        }
        if record.vectors.dimensions() == 0 {
            return Err(
                RagError::CorruptArtifact(format!("{:?} has zero-width vectors", path)).into(),
            );
        }
        Ok(Self {
            vectors: record.vectors,
        })
    }
}
