//! Structural boundary detection for legal texts and manuals.

use regex::Regex;

/// Start of a structural unit: where it begins and the header text found there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Boundary {
    /// Byte offset of the marker within the normalized text.
    pub offset: usize,
    /// Byte offset where the header line ends (exclusive, before `\n`).
    pub header_end: usize,
    /// Marker text through the end of its line.
    pub header: String,
    /// Name of the rule that produced the boundary.
    pub rule: &'static str,
}

/// A single named marker pattern.
#[derive(Debug, Clone)]
pub struct BoundaryRule {
    name: &'static str,
    pattern: Regex,
}

impl BoundaryRule {
    fn new(name: &'static str, pattern: &str) -> Self {
        Self {
            name,
            pattern: Regex::new(pattern).expect("boundary pattern"),
        }
    }

    /// `ARTÍCULO 12.` style markers, case- and í/i-insensitive, anywhere on a line.
    pub fn article_marker() -> Self {
        Self::new("article", r"(?i)\bART[ÍI]CULO[ \t]+\d+")
    }

    /// `CAPÍTULO 3` style markers, anywhere on a line.
    pub fn chapter_marker() -> Self {
        Self::new("chapter", r"(?i)\bCAP[ÍI]TULO[ \t]+\d+")
    }

    /// `N. Text` headings at the start of a line.
    pub fn numbered_heading() -> Self {
        Self::new("numbered_heading", r"(?m)^\d+\.[ \t]+\S")
    }

    /// `N.M` sub-headings at the start of a line.
    pub fn numbered_subheading() -> Self {
        Self::new("numbered_subheading", r"(?m)^\d+\.\d+")
    }

    /// Rule name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Offsets of every marker this rule finds, in document order.
    pub fn find_offsets(&self, text: &str) -> Vec<usize> {
        self.pattern.find_iter(text).map(|m| m.start()).collect()
    }
}

/// Merges the boundaries found by a set of rules into one ordered sequence.
#[derive(Debug, Clone)]
pub struct BoundaryDetector {
    rules: Vec<BoundaryRule>,
}

impl BoundaryDetector {
    /// Detector built from arbitrary rules.
    pub fn new(rules: Vec<BoundaryRule>) -> Self {
        Self { rules }
    }

    /// Grammar for statutes: one boundary per article marker.
    pub fn articles() -> Self {
        Self::new(vec![BoundaryRule::article_marker()])
    }

    /// Grammar for manuals: chapters and numbered headings.
    pub fn sections() -> Self {
        Self::new(vec![
            BoundaryRule::chapter_marker(),
            BoundaryRule::numbered_heading(),
            BoundaryRule::numbered_subheading(),
        ])
    }

    /// Rules in evaluation order.
    pub fn rules(&self) -> &[BoundaryRule] {
        &self.rules
    }

    /// Returns boundaries sorted by offset.
    ///
    /// A marker that starts inside the header line of an earlier boundary is
    /// part of that header and does not open a new unit.
    pub fn detect(&self, text: &str) -> Vec<Boundary> {
        let mut found: Vec<(usize, &'static str)> = self
            .rules
            .iter()
            .flat_map(|rule| {
                rule.find_offsets(text)
                    .into_iter()
                    .map(move |offset| (offset, rule.name()))
            })
            .collect();
        found.sort_by_key(|(offset, _)| *offset);

        let mut boundaries: Vec<Boundary> = Vec::with_capacity(found.len());
        for (offset, rule) in found {
            if let Some(last) = boundaries.last() {
                if offset == last.offset || offset < last.header_end {
                    continue;
                }
            }
            let header_end = line_end(text, offset);
            boundaries.push(Boundary {
                offset,
                header_end,
                header: text[offset..header_end].trim_end().to_string(),
                rule,
            });
        }
        boundaries
    }
}

fn line_end(text: &str, offset: usize) -> usize {
    text[offset..]
        .find('\n')
        .map(|pos| offset + pos)
        .unwrap_or(text.len())
}
