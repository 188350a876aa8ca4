//! Query-time retrieval over a loaded corpus store and vector index.

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::chunk::Chunk;
use crate::config::ArtifactPaths;
use crate::corpus::{file_checksum, CorpusStore};
use crate::embedder::Embedder;
use crate::error::RagError;
use crate::index::FlatIndex;
use crate::manifest::IndexManifest;

/// A chunk returned for a query, with its similarity score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Retrieved<'a> {
    /// The matching chunk.
    pub chunk: &'a Chunk,
    /// Inner-product score; higher is more similar.
    pub score: f32,
    /// Row in the corpus store.
    pub position: usize,
}

/// Embedder, index and corpus store loaded together and checked for agreement.
pub struct Retriever {
    store: CorpusStore,
    index: FlatIndex,
    embedder: Box<dyn Embedder>,
}

impl std::fmt::Debug for Retriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retriever")
            .field("rows", &self.store.len())
            .field("dimensions", &self.index.dimensions())
            .field("embedder", &self.embedder.id())
            .finish()
    }
}

impl Retriever {
    /// Assembles a retriever, rejecting a store/index row mismatch or an
    /// embedder whose width differs from the index.
    pub fn new(
        store: CorpusStore,
        index: FlatIndex,
        embedder: Box<dyn Embedder>,
    ) -> Result<Self, RagError> {
        if index.len() != store.len() {
            return Err(RagError::IndexSizeMismatch {
                index_rows: index.len(),
                store_rows: store.len(),
            });
        }
        if index.dimensions() != embedder.dimensions() {
            return Err(RagError::DimensionMismatch {
                expected: index.dimensions(),
                actual: embedder.dimensions(),
            });
        }
        Ok(Self {
            store,
            index,
            embedder,
        })
    }

    /// Loads the corpus store, index and manifest from `paths` and verifies
    /// them against each other and against `embedder`.
    pub fn open(paths: &ArtifactPaths, embedder: Box<dyn Embedder>) -> Result<Self> {
        let store = CorpusStore::read_csv(&paths.corpus)?;
        let index = FlatIndex::load(&paths.index)?;
        let manifest = IndexManifest::load(&paths.manifest)?;
        let checksum = file_checksum(&paths.corpus)?;
        manifest
            .verify(&embedder.id(), index.dimensions(), index.len(), checksum)
            .with_context(|| format!("artifacts under {:?} are inconsistent", paths.manifest))?;
        let retriever = Self::new(store, index, embedder)
            .with_context(|| format!("cannot pair {:?} with {:?}", paths.index, paths.corpus))?;
        info!(
            rows = retriever.len(),
            embedder = %retriever.embedder.id(),
            "retriever ready"
        );
        Ok(retriever)
    }

    /// Rows available for retrieval.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// True when the corpus is empty.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// The loaded corpus store.
    pub fn store(&self) -> &CorpusStore {
        &self.store
    }

    /// The embedder used for queries.
    pub fn embedder(&self) -> &dyn Embedder {
        self.embedder.as_ref()
    }

    /// Top-`k` chunks for `query`, best first.
    ///
    /// `k == 0` is an error; an empty corpus yields no results without
    /// calling the embedder.
    pub fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Retrieved<'_>>> {
        if k == 0 {
            return Err(RagError::InvalidTopK.into());
        }
        if self.is_empty() {
            return Ok(Vec::new());
        }
        let embedding = self.embed_query(query)?;
        Ok(self.search_embedding(&embedding, k)?)
    }

    /// Embeds a query with the retriever's embedder.
    pub fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
        self.embedder
            .embed_query(query)
            .context("failed to embed query")
    }

    /// Ranks chunks against an already computed query embedding.
    pub fn search_embedding(
        &self,
        embedding: &[f32],
        k: usize,
    ) -> Result<Vec<Retrieved<'_>>, RagError> {
        if k == 0 {
            return Err(RagError::InvalidTopK);
        }
        let hits = self.index.search(embedding, k)?;
        let mut results = Vec::with_capacity(hits.len());
        for hit in hits {
            let chunk = self.store.get(hit.position).ok_or_else(|| {
                RagError::CorruptArtifact(format!("index position {} has no corpus row", hit.position))
            })?;
            results.push(Retrieved {
                chunk,
                score: hit.score,
                position: hit.position,
            });
        }
        debug!(k, returned = results.len(), "search complete");
        Ok(results)
    }
}
