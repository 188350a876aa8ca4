//! Dense embedding matrix persisted between the index build and later rebuilds.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};
use bincode::Options;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::RagError;

/// Row-major `(rows, dimensions)` f32 matrix; row `i` belongs to corpus row `i`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingMatrix {
    dimensions: usize,
    data: Vec<f32>,
}

impl EmbeddingMatrix {
    /// Empty matrix of the given width.
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            data: Vec::new(),
        }
    }

    /// Builds a matrix from rows that must all be `dimensions` wide.
    pub fn from_rows(dimensions: usize, rows: Vec<Vec<f32>>) -> Result<Self, RagError> {
        let mut matrix = Self::new(dimensions);
        matrix.data.reserve(rows.len() * dimensions);
        for row in rows {
            matrix.push(&row)?;
        }
        Ok(matrix)
    }

    /// Appends one row.
    pub fn push(&mut self, row: &[f32]) -> Result<(), RagError> {
        if row.len() != self.dimensions {
            return Err(RagError::DimensionMismatch {
                expected: self.dimensions,
                actual: row.len(),
            });
        }
        self.data.extend_from_slice(row);
        Ok(())
    }

    /// Row width.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        if self.dimensions == 0 {
            0
        } else {
            self.data.len() / self.dimensions
        }
    }

    /// True when the matrix has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows() == 0
    }

    /// Row at `position`.
    pub fn row(&self, position: usize) -> Option<&[f32]> {
        let start = position.checked_mul(self.dimensions)?;
        self.data.get(start..start + self.dimensions)
    }

    /// Rows in order.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[f32]> {
        // `chunks_exact` panics on zero, and a zero-width matrix has no rows anyway
        self.data.chunks_exact(self.dimensions.max(1))
    }

    /// Writes the matrix with bincode.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {:?}", parent))?;
        }
        let file = File::create(path).with_context(|| format!("failed to create {:?}", path))?;
        bincode::serialize_into(BufWriter::new(file), self)
            .with_context(|| format!("failed to write embeddings to {:?}", path))
    }

    /// Reads a matrix written by [`EmbeddingMatrix::save`].
    pub fn load(path: &Path) -> Result<Self> {
        let matrix: Self = decode_artifact(path, "embeddings file")?;
        if matrix.dimensions == 0 || matrix.data.len() % matrix.dimensions != 0 {
            return Err(RagError::CorruptArtifact(format!(
                "{} values do not form rows of width {}",
                matrix.data.len(),
                matrix.dimensions
            ))
            .into());
        }
        Ok(matrix)
    }
}

/// Decodes a bincode artifact, rejecting any length prefix that claims more
/// bytes than the file holds.
pub(crate) fn decode_artifact<T: DeserializeOwned>(path: &Path, kind: &str) -> Result<T> {
    let bytes = fs::read(path).with_context(|| format!("failed to open {kind} {:?}", path))?;
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_limit(bytes.len() as u64)
        .deserialize(&bytes)
        .map_err(|err| {
            anyhow::Error::from(RagError::CorruptArtifact(format!(
                "{:?} is not a valid {kind}: {err}",
                path
            )))
        })
}
