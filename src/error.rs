//! Domain errors raised when a pipeline invariant is violated.

use thiserror::Error;

/// Invariant violations surfaced by the segmentation and retrieval core.
///
/// I/O and transport failures travel as `anyhow::Error` with context; this
/// enum covers the conditions callers may want to match on.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RagError {
    /// A chunk was constructed with an empty or whitespace-only body.
    #[error("chunk body from {source_id} is empty")]
    EmptyBody {
        /// Document the chunk came from.
        source_id: String,
    },

    /// Sliding-window parameters are out of range.
    #[error("invalid window configuration: {0}")]
    InvalidWindow(String),

    /// Retrieval was requested with `k == 0`.
    #[error("top_k must be at least 1")]
    InvalidTopK,

    /// A vector does not have the dimensionality the index or embedder expects.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension the receiver was built with.
        expected: usize,
        /// Dimension that was supplied.
        actual: usize,
    },

    /// The vector index and the corpus store disagree on row count.
    #[error("index holds {index_rows} vectors but the corpus store holds {store_rows} chunks")]
    IndexSizeMismatch {
        /// Number of vectors in the index.
        index_rows: usize,
        /// Number of rows in the corpus store.
        store_rows: usize,
    },

    /// Build artifacts were produced by a different build than the one loaded.
    #[error("build manifest mismatch: {0}")]
    ManifestMismatch(String),

    /// A provider needs a credential that was not configured.
    #[error("missing credential: {0}")]
    MissingCredential(String),

    /// A persisted artifact failed structural validation.
    #[error("corrupt artifact: {0}")]
    CorruptArtifact(String),
}
