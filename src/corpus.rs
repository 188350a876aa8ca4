//! CSV-backed corpus store: one row per chunk, order-significant.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::chunk::{Chunk, ChunkType};
use crate::error::RagError;

/// All chunks of the corpus in build order; row `i` aligns with index vector `i`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorpusStore {
    chunks: Vec<Chunk>,
}

impl CorpusStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an already ordered chunk list.
    pub fn from_chunks(chunks: Vec<Chunk>) -> Self {
        Self { chunks }
    }

    /// Appends one document's chunks after everything already stored.
    pub fn append(&mut self, chunks: Vec<Chunk>) {
        self.chunks.extend(chunks);
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// True when no rows are stored.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Row at `position`.
    pub fn get(&self, position: usize) -> Option<&Chunk> {
        self.chunks.get(position)
    }

    /// Rows in stored order.
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Iterator over rows in stored order.
    pub fn iter(&self) -> std::slice::Iter<'_, Chunk> {
        self.chunks.iter()
    }

    /// Writes the whole store to `path`, replacing any previous file.
    ///
    /// Rows go to a sibling temp file first and are renamed into place.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {:?}", parent))?;
        }
        let tmp = path.with_extension("csv.tmp");
        {
            let file = File::create(&tmp).with_context(|| format!("failed to create {:?}", tmp))?;
            let mut writer = csv::Writer::from_writer(BufWriter::new(file));
            for chunk in &self.chunks {
                writer.serialize(CorpusRow::from(chunk))?;
            }
            writer
                .flush()
                .with_context(|| format!("failed to flush {:?}", tmp))?;
        }
        fs::rename(&tmp, path).with_context(|| format!("failed to replace {:?}", path))?;
        Ok(())
    }

    /// Loads every row from `path`, validating each into a [`Chunk`].
    ///
    /// Rows with blank text are skipped with a warning, as older corpus files
    /// contain them. Malformed rows still fail the whole load.
    pub fn read_csv(path: &Path) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)
            .with_context(|| format!("failed to open corpus {:?}", path))?;
        let mut chunks = Vec::new();
        for (row_no, row) in reader.deserialize::<CorpusRow>().enumerate() {
            let row = row.with_context(|| format!("invalid corpus row {}", row_no + 1))?;
            if row.body.trim().is_empty() {
                warn!(
                    row = row_no + 1,
                    source = %row.source,
                    sequence_id = ?row.sequence_id,
                    "skipping corpus row with empty text"
                );
                continue;
            }
            let chunk = row
                .into_chunk()
                .with_context(|| format!("invalid corpus row {}", row_no + 1))?;
            chunks.push(chunk);
        }
        Ok(Self { chunks })
    }
}

impl<'a> IntoIterator for &'a CorpusStore {
    type Item = &'a Chunk;
    type IntoIter = std::slice::Iter<'a, Chunk>;

    fn into_iter(self) -> Self::IntoIter {
        self.chunks.iter()
    }
}

/// CRC32 of a file's bytes, recorded in the build manifest.
pub fn file_checksum(path: &Path) -> Result<u32> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {:?}", path))?;
    Ok(crc32fast::hash(&bytes))
}

/// On-disk row layout.
#[derive(Debug, Serialize, Deserialize)]
struct CorpusRow {
    #[serde(rename = "fuente")]
    source: String,
    #[serde(
        rename = "id_articulo",
        deserialize_with = "deserialize_sequence_id",
        default
    )]
    sequence_id: Option<u32>,
    #[serde(rename = "titulo", default)]
    title: String,
    #[serde(rename = "texto", alias = "texto_articulo")]
    body: String,
    #[serde(rename = "tipo", default = "default_chunk_type")]
    chunk_type: ChunkType,
}

impl From<&Chunk> for CorpusRow {
    fn from(chunk: &Chunk) -> Self {
        Self {
            source: chunk.source_id().to_string(),
            sequence_id: chunk.sequence_id(),
            title: chunk.title().to_string(),
            body: chunk.body().to_string(),
            chunk_type: chunk.chunk_type(),
        }
    }
}

impl CorpusRow {
    fn into_chunk(self) -> Result<Chunk, RagError> {
        Chunk::new(
            self.source,
            self.sequence_id,
            self.title,
            self.body,
            self.chunk_type,
        )
    }
}

fn default_chunk_type() -> ChunkType {
    ChunkType::Article
}

/// Accepts `12`, `12.0` (as written by dataframe tools) or an empty cell.
fn deserialize_sequence_id<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let Some(raw) = raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    if let Ok(value) = raw.parse::<u32>() {
        return Ok(Some(value));
    }
    match raw.parse::<f64>() {
        Ok(value) if value.fract() == 0.0 && value >= 0.0 && value <= u32::MAX as f64 => {
            Ok(Some(value as u32))
        }
        Ok(value) if value.is_nan() => Ok(None),
        _ => Err(serde::de::Error::custom(format!(
            "id_articulo '{raw}' is not an integer"
        ))),
    }
}
