//! Build manifest tying an index to the corpus store and embedder that produced it.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::corpus::CorpusStore;
use crate::error::RagError;

/// Chunk count contributed by one source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCount {
    /// Source file name.
    pub source: String,
    /// Rows in the corpus store from that source.
    pub chunks: usize,
}

/// Provenance record written next to the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexManifest {
    /// `Embedder::id()` of the model used for the build.
    pub embedder: String,
    /// Vector width.
    pub dimensions: usize,
    /// Indexed rows; equals the corpus store length.
    pub rows: usize,
    /// CRC32 of the corpus CSV the index was built from.
    pub corpus_checksum: u32,
    /// Per-source chunk counts in corpus order.
    pub sources: Vec<SourceCount>,
}

impl IndexManifest {
    /// Describes a build of `store` with the given embedder.
    pub fn describe(
        store: &CorpusStore,
        embedder: impl Into<String>,
        dimensions: usize,
        corpus_checksum: u32,
    ) -> Self {
        Self {
            embedder: embedder.into(),
            dimensions,
            rows: store.len(),
            corpus_checksum,
            sources: source_counts(store),
        }
    }

    /// Fails with [`RagError::ManifestMismatch`] on the first field that
    /// disagrees with what was actually loaded.
    pub fn verify(
        &self,
        embedder: &str,
        dimensions: usize,
        rows: usize,
        corpus_checksum: u32,
    ) -> Result<(), RagError> {
        if self.embedder != embedder {
            return Err(RagError::ManifestMismatch(format!(
                "index built with embedder '{}', opened with '{}'",
                self.embedder, embedder
            )));
        }
        if self.dimensions != dimensions {
            return Err(RagError::ManifestMismatch(format!(
                "index built with {} dimensions, embedder produces {}",
                self.dimensions, dimensions
            )));
        }
        if self.rows != rows {
            return Err(RagError::ManifestMismatch(format!(
                "manifest records {} rows, found {}",
                self.rows, rows
            )));
        }
        if self.corpus_checksum != corpus_checksum {
            return Err(RagError::ManifestMismatch(format!(
                "corpus checksum {:08x} differs from build-time {:08x}; rebuild the index",
                corpus_checksum, self.corpus_checksum
            )));
        }
        Ok(())
    }

    /// Writes pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {:?}", parent))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("failed to write manifest {:?}", path))
    }

    /// Reads a manifest written by [`IndexManifest::save`].
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest {:?}", path))?;
        serde_json::from_str(&raw).with_context(|| format!("invalid manifest {:?}", path))
    }
}

/// Counts store rows per source, in first-seen order.
pub fn source_counts(store: &CorpusStore) -> Vec<SourceCount> {
    let mut order: Vec<String> = Vec::new();
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for chunk in store {
        let entry = counts.entry(chunk.source_id()).or_insert(0);
        if *entry == 0 {
            order.push(chunk.source_id().to_string());
        }
        *entry += 1;
    }
    order
        .into_iter()
        .map(|source| SourceCount {
            chunks: counts.get(source.as_str()).copied().unwrap_or(0),
            source,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::{Chunk, ChunkType};
    use pretty_assertions::assert_eq;

    fn store() -> CorpusStore {
        let chunk = |source: &str, body: &str| {
            Chunk::new(source, None, "", body, ChunkType::Article).unwrap()
        };
        CorpusStore::from_chunks(vec![
            chunk("ley.pdf", "a"),
            chunk("ley.pdf", "b"),
            chunk("decreto.pdf", "c"),
        ])
    }

    #[test]
    fn counts_sources_in_corpus_order() {
        let manifest = IndexManifest::describe(&store(), "hash-v1/8", 8, 42);
        assert_eq!(manifest.rows, 3);
        assert_eq!(
            manifest.sources,
            vec![
                SourceCount {
                    source: "ley.pdf".into(),
                    chunks: 2
                },
                SourceCount {
                    source: "decreto.pdf".into(),
                    chunks: 1
                },
            ]
        );
    }

    #[test]
    fn verify_reports_first_disagreement() {
        let manifest = IndexManifest::describe(&store(), "hash-v1/8", 8, 42);
        assert!(manifest.verify("hash-v1/8", 8, 3, 42).is_ok());

        let err = manifest.verify("openai:x/8", 8, 3, 42).unwrap_err();
        assert!(matches!(err, RagError::ManifestMismatch(ref msg) if msg.contains("openai:x/8")));
        assert!(manifest.verify("hash-v1/8", 16, 3, 42).is_err());
        assert!(manifest.verify("hash-v1/8", 8, 4, 42).is_err());
        assert!(manifest.verify("hash-v1/8", 8, 3, 7).is_err());
    }

    #[test]
    fn json_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("models/index_manifest.json");
        let manifest = IndexManifest::describe(&store(), "hash-v1/8", 8, 42);
        manifest.save(&path).unwrap();
        assert_eq!(IndexManifest::load(&path).unwrap(), manifest);
        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"corpus_checksum\": 42"));
    }
}
