//! Offline build steps: documents to corpus store, corpus store to index.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::ArtifactPaths;
use crate::corpus::{file_checksum, CorpusStore};
use crate::embedder::Embedder;
use crate::embeddings::EmbeddingMatrix;
use crate::error::RagError;
use crate::extract::{list_sources, SourceDocument};
use crate::index::FlatIndex;
use crate::manifest::IndexManifest;
use crate::normalizer::{normalize, word_count};
use crate::segmenter::{SegmentationMode, Segmenter, Strategy};

/// What segmentation produced for one source document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentReport {
    /// Source file name.
    pub source_id: String,
    /// Strategy applied.
    pub strategy: Strategy,
    /// Chunks contributed to the corpus.
    pub chunks: usize,
}

/// Corpus build output.
#[derive(Debug, Clone, PartialEq)]
pub struct CorpusBuild {
    /// All chunks, source order then chunk order.
    pub store: CorpusStore,
    /// One entry per processed document.
    pub documents: Vec<DocumentReport>,
}

/// Extracts, normalizes and segments every document in `raw_dir`.
///
/// Any extraction failure aborts the build. Documents that yield no chunks
/// are logged and contribute nothing.
pub fn build_corpus(raw_dir: &Path, mode: &SegmentationMode) -> Result<CorpusBuild> {
    let sources = list_sources(raw_dir)?;
    if sources.is_empty() {
        warn!(dir = %raw_dir.display(), "no source documents found");
    }
    let segmenter = Segmenter::new();
    let mut store = CorpusStore::new();
    let mut documents = Vec::with_capacity(sources.len());
    for source in &sources {
        let report = segment_document(&segmenter, source, mode, &mut store)?;
        documents.push(report);
    }
    info!(
        documents = documents.len(),
        chunks = store.len(),
        "corpus built"
    );
    Ok(CorpusBuild { store, documents })
}

fn segment_document(
    segmenter: &Segmenter,
    source: &SourceDocument,
    mode: &SegmentationMode,
    store: &mut CorpusStore,
) -> Result<DocumentReport> {
    let raw = source
        .extract()
        .with_context(|| format!("extraction failed for {}", source.source_id))?;
    let text = normalize(&raw);
    let strategy = mode.strategy_for(&source.source_id);
    let chunks = segmenter.segment(&strategy, &text, &source.source_id);
    if chunks.is_empty() {
        warn!(source = %source.source_id, strategy = ?strategy, "document produced no chunks");
    } else {
        info!(
            source = %source.source_id,
            words = word_count(&text),
            chunks = chunks.len(),
            strategy = ?strategy,
            "segmented"
        );
    }
    let report = DocumentReport {
        source_id: source.source_id.clone(),
        strategy,
        chunks: chunks.len(),
    };
    store.append(chunks);
    Ok(report)
}

/// Runs [`build_corpus`] and writes the store to `paths.corpus`.
pub fn preprocess(paths: &ArtifactPaths, mode: &SegmentationMode) -> Result<CorpusBuild> {
    let build = build_corpus(&paths.raw_dir, mode)?;
    build.store.write_csv(&paths.corpus)?;
    info!(path = %paths.corpus.display(), rows = build.store.len(), "corpus written");
    Ok(build)
}

/// Embeds every corpus row, then writes the embeddings, index and manifest.
///
/// Texts are sent to the embedder `batch_size` at a time, in store order.
pub fn build_index(
    paths: &ArtifactPaths,
    embedder: &dyn Embedder,
    batch_size: usize,
) -> Result<IndexManifest> {
    let store = CorpusStore::read_csv(&paths.corpus)?;
    let checksum = file_checksum(&paths.corpus)?;
    let matrix = embed_store(&store, embedder, batch_size)?;
    matrix.save(&paths.embeddings)?;

    let index = FlatIndex::build(matrix);
    if index.len() != store.len() {
        return Err(RagError::IndexSizeMismatch {
            index_rows: index.len(),
            store_rows: store.len(),
        }
        .into());
    }
    index.save(&paths.index)?;

    let manifest = IndexManifest::describe(&store, embedder.id(), index.dimensions(), checksum);
    manifest.save(&paths.manifest)?;
    info!(
        rows = manifest.rows,
        dimensions = manifest.dimensions,
        embedder = %manifest.embedder,
        "index built"
    );
    Ok(manifest)
}

/// Embeds each row's text in batches, keeping row order.
pub fn embed_store(
    store: &CorpusStore,
    embedder: &dyn Embedder,
    batch_size: usize,
) -> Result<EmbeddingMatrix> {
    let texts: Vec<&str> = store.iter().map(|chunk| chunk.embedding_text()).collect();
    let mut matrix = EmbeddingMatrix::new(embedder.dimensions());
    for (batch_no, batch) in texts.chunks(batch_size.max(1)).enumerate() {
        let vectors = embedder
            .embed(batch)
            .with_context(|| format!("embedding batch {} failed", batch_no))?;
        anyhow::ensure!(
            vectors.len() == batch.len(),
            "embedder returned {} vectors for {} texts",
            vectors.len(),
            batch.len()
        );
        for vector in &vectors {
            matrix.push(vector)?;
        }
    }
    Ok(matrix)
}
