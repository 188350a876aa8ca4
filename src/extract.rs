//! Source document discovery and per-page text extraction.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

/// Pulls page-ordered text out of a source document.
pub trait TextExtractor {
    /// Returns the document's text with pages joined by `\n`.
    ///
    /// Pages without extractable text contribute an empty string so page
    /// alignment is preserved. Unreadable documents are an error.
    fn extract(&self, path: &Path) -> Result<String>;
}

/// PDF extractor backed by `pdf-extract`, one text block per page.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    fn extract(&self, path: &Path) -> Result<String> {
        let bytes = fs::read(path).with_context(|| format!("failed to read {:?}", path))?;
        let pages = pdf_extract::extract_text_from_mem_by_pages(&bytes)
            .map_err(|err| anyhow::anyhow!("failed to extract text from {:?}: {}", path, err))?;
        Ok(join_pages(pages))
    }
}

/// Extractor for UTF-8 text files, treated as a single page.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).with_context(|| format!("failed to read {:?}", path))
    }
}

/// Joins page texts in order; blank pages stay as empty entries.
pub fn join_pages<I, S>(pages: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    pages
        .into_iter()
        .map(|page| page.as_ref().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Supported document formats, keyed by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Portable Document Format.
    Pdf,
    /// Plain UTF-8 text.
    Text,
}

impl SourceFormat {
    /// Detects the format from the path's extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "txt" => Some(Self::Text),
            _ => None,
        }
    }

    /// Extractor able to read this format.
    pub fn extractor(&self) -> Box<dyn TextExtractor> {
        match self {
            Self::Pdf => Box::new(PdfExtractor),
            Self::Text => Box::new(PlainTextExtractor),
        }
    }
}

/// Document queued for corpus building.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    /// Full path on disk.
    pub path: PathBuf,
    /// File name used as the chunk `source_id`.
    pub source_id: String,
    /// Detected format.
    pub format: SourceFormat,
}

impl SourceDocument {
    /// Extracts this document's raw text.
    pub fn extract(&self) -> Result<String> {
        self.format.extractor().extract(&self.path)
    }
}

/// Lists supported documents in `dir`, sorted by file name.
///
/// Sorting keeps corpus row order stable across rebuilds.
pub fn list_sources(dir: &Path) -> Result<Vec<SourceDocument>> {
    if !dir.is_dir() {
        bail!("source directory {:?} does not exist", dir);
    }
    let mut sources = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("failed to list {:?}", dir))? {
        let entry = entry.with_context(|| format!("failed to read entry in {:?}", dir))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(format) = SourceFormat::from_path(&path) else {
            continue;
        };
        let Some(source_id) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        sources.push(SourceDocument {
            source_id: source_id.to_string(),
            path: path.clone(),
            format,
        });
    }
    sources.sort_by(|a, b| a.source_id.cmp(&b.source_id));
    Ok(sources)
}
