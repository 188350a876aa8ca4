//! Text-to-vector embedders shared by the build and query paths.

pub mod hash;
pub mod openai;

use anyhow::{anyhow, Result};

pub use hash::HashEmbedder;
pub use openai::{OpenAiEmbedder, OpenAiEmbedderConfig};

/// Maps text to fixed-dimension, unit-length vectors.
///
/// Implementations must be deterministic for a fixed model and return one
/// vector per input, in input order.
pub trait Embedder: Send + Sync {
    /// Stable identifier recorded in the build manifest.
    fn id(&self) -> String;

    /// Dimension of every returned vector.
    fn dimensions(&self) -> usize;

    /// Embeds a batch; empty input yields empty output.
    fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// Embeds a single query string.
    fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.embed(&[text])?
            .pop()
            .ok_or_else(|| anyhow!("embedder {} returned no vector", self.id()))
    }
}

impl<E: Embedder + ?Sized> Embedder for Box<E> {
    fn id(&self) -> String {
        (**self).id()
    }

    fn dimensions(&self) -> usize {
        (**self).dimensions()
    }

    fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        (**self).embed(texts)
    }
}

/// Scales `vector` to unit length in place; zero vectors are left untouched.
pub fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|x| *x /= norm);
    }
}

/// Inner product of two equal-length vectors.
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_to_unit_length() {
        let mut v = vec![3.0, 4.0];
        l2_normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
        assert!((dot(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn zero_vector_stays_zero() {
        let mut v = vec![0.0; 4];
        l2_normalize(&mut v);
        assert_eq!(v, vec![0.0; 4]);
    }

    #[test]
    fn boxed_embedders_delegate() {
        let boxed: Box<dyn Embedder> = Box::new(HashEmbedder::new(16));
        assert_eq!(boxed.dimensions(), 16);
        assert_eq!(boxed.embed_query("multa").unwrap().len(), 16);
    }
}
