//! Splits normalized documents into chunks.
//!
//! Three interchangeable strategies share one contract (normalized text plus
//! source id in, ordered chunks out):
//!
//! - [`Strategy::Article`]: one chunk per `ARTÍCULO N` marker, header line removed.
//! - [`Strategy::Section`]: one chunk per chapter/numbered heading, header kept.
//! - [`Strategy::Window`]: overlapping fixed-size word windows.

mod boundary;
mod window;

use std::ops::Range;

use tracing::debug;

use crate::chunk::{Chunk, ChunkType};

pub use boundary::{Boundary, BoundaryDetector, BoundaryRule};
pub use window::WindowConfig;

/// Segmentation strategy applied to one document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Strategy {
    /// Legal-article boundaries.
    Article,
    /// Manual chapter and numbered-heading boundaries.
    Section,
    /// Fixed-size sliding windows.
    Window(WindowConfig),
}

impl Strategy {
    /// Tag stamped on chunks produced by this strategy.
    pub fn chunk_type(&self) -> ChunkType {
        match self {
            Self::Article => ChunkType::Article,
            Self::Section => ChunkType::ManualSection,
            Self::Window(_) => ChunkType::Window,
        }
    }
}

/// Corpus-wide choice between structure-aware and window segmentation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SegmentationMode {
    /// Article or section per document, decided by [`classify_source`].
    Structured,
    /// Sliding windows for every document.
    Window(WindowConfig),
}

impl SegmentationMode {
    /// Strategy used for the document named `source_id`.
    pub fn strategy_for(&self, source_id: &str) -> Strategy {
        match self {
            Self::Structured => classify_source(source_id),
            Self::Window(config) => Strategy::Window(*config),
        }
    }
}

const SECTION_NAME_HINTS: &[&str] = &["manual", "guia", "guía", "cartilla"];

/// File-name heuristic: manuals and guides are segmented by section,
/// everything else by article.
pub fn classify_source(source_id: &str) -> Strategy {
    let name = source_id.to_lowercase();
    if SECTION_NAME_HINTS.iter().any(|hint| name.contains(hint)) {
        Strategy::Section
    } else {
        Strategy::Article
    }
}

/// Span of text owned by one boundary, from its marker to the next one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extent {
    /// Byte range within the normalized text.
    pub range: Range<usize>,
    /// The boundary that opened this extent.
    pub boundary: Boundary,
}

/// Boundary-aware segmenter holding the compiled grammars.
#[derive(Debug, Clone)]
pub struct Segmenter {
    articles: BoundaryDetector,
    sections: BoundaryDetector,
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new()
    }
}

impl Segmenter {
    /// Compiles the article and section grammars.
    pub fn new() -> Self {
        Self {
            articles: BoundaryDetector::articles(),
            sections: BoundaryDetector::sections(),
        }
    }

    /// Marker-to-marker extents for a boundary strategy.
    ///
    /// Text before the first marker belongs to no extent. Window strategies
    /// have no boundaries and return an empty list.
    pub fn extents(&self, strategy: &Strategy, text: &str) -> Vec<Extent> {
        let detector = match strategy {
            Strategy::Article => &self.articles,
            Strategy::Section => &self.sections,
            Strategy::Window(_) => return Vec::new(),
        };
        let boundaries = detector.detect(text);
        let ends: Vec<usize> = boundaries
            .iter()
            .skip(1)
            .map(|b| b.offset)
            .chain(std::iter::once(text.len()))
            .collect();
        boundaries
            .into_iter()
            .zip(ends)
            .map(|(boundary, end)| Extent {
                range: boundary.offset..end,
                boundary,
            })
            .collect()
    }

    /// Splits `text` into chunks in document order.
    pub fn segment(&self, strategy: &Strategy, text: &str, source_id: &str) -> Vec<Chunk> {
        match strategy {
            Strategy::Article => self
                .extents(strategy, text)
                .iter()
                .filter_map(|extent| article_chunk(text, extent, source_id))
                .collect(),
            Strategy::Section => self
                .extents(strategy, text)
                .iter()
                .filter_map(|extent| section_chunk(text, extent, source_id))
                .collect(),
            Strategy::Window(config) => config
                .windows(text)
                .into_iter()
                .filter_map(|body| Chunk::new(source_id, None, "", body, ChunkType::Window).ok())
                .collect(),
        }
    }
}

/// Number and title parsed from an article marker line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleHeader {
    /// First digit run after the keyword.
    pub number: Option<u32>,
    /// Text after the numeral and its optional period.
    pub title: String,
}

/// Parses `ARTÍCULO 12. Título` into its number and title.
pub fn parse_article_header(header: &str) -> ArticleHeader {
    let after_keyword = header
        .char_indices()
        .find(|(_, ch)| ch.is_ascii_digit())
        .map(|(idx, _)| &header[idx..])
        .unwrap_or("");
    let digits_end = after_keyword
        .find(|ch: char| !ch.is_ascii_digit())
        .unwrap_or(after_keyword.len());
    let number = after_keyword[..digits_end].parse::<u32>().ok();
    let rest = &after_keyword[digits_end..];
    let rest = rest.strip_prefix('.').unwrap_or(rest);
    ArticleHeader {
        number,
        title: rest.trim().to_string(),
    }
}

fn article_chunk(text: &str, extent: &Extent, source_id: &str) -> Option<Chunk> {
    let header = parse_article_header(&extent.boundary.header);
    let span = &text[extent.range.clone()];
    let body = span
        .split_once('\n')
        .map(|(_, rest)| rest.trim())
        .unwrap_or("");
    match Chunk::new(source_id, header.number, header.title, body, ChunkType::Article) {
        Ok(chunk) => Some(chunk),
        Err(err) => {
            debug!(source = source_id, header = %extent.boundary.header, "dropping article: {err}");
            None
        }
    }
}

fn section_chunk(text: &str, extent: &Extent, source_id: &str) -> Option<Chunk> {
    let body = text[extent.range.clone()].trim();
    match Chunk::new(
        source_id,
        None,
        extent.boundary.header.trim(),
        body,
        ChunkType::ManualSection,
    ) {
        Ok(chunk) => Some(chunk),
        Err(err) => {
            debug!(source = source_id, header = %extent.boundary.header, "dropping section: {err}");
            None
        }
    }
}
