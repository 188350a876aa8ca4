//! Deterministic feature-hashing embedder that needs no model download.

use anyhow::Result;

use super::{l2_normalize, Embedder};

/// Default output dimension, matching common small sentence-embedding models.
pub const DEFAULT_HASH_DIMENSIONS: usize = 384;

const WORD_WEIGHT: f32 = 1.0;
const TRIGRAM_WEIGHT: f32 = 0.5;

/// Hashes lowercased words and their character trigrams into signed buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashEmbedder {
    dimensions: usize,
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_HASH_DIMENSIONS)
    }
}

impl HashEmbedder {
    /// Embedder producing `dimensions`-wide vectors (at least 1).
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        let mut touched = false;
        for word in tokenize(text) {
            self.accumulate(&mut vector, word.as_bytes(), WORD_WEIGHT);
            let padded: Vec<char> = format!(" {word} ").chars().collect();
            for gram in padded.windows(3) {
                let gram: String = gram.iter().collect();
                self.accumulate(&mut vector, gram.as_bytes(), TRIGRAM_WEIGHT);
            }
            touched = true;
        }
        if !touched {
            vector[0] = 1.0;
            return vector;
        }
        l2_normalize(&mut vector);
        if vector.iter().all(|x| *x == 0.0) {
            // every feature cancelled out
            vector[0] = 1.0;
        }
        vector
    }

    fn accumulate(&self, vector: &mut [f32], feature: &[u8], weight: f32) {
        let hash = crc32fast::hash(feature);
        let bucket = hash as usize % self.dimensions;
        let sign = if hash & 0x8000_0000 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign * weight;
    }
}

impl Embedder for HashEmbedder {
    fn id(&self) -> String {
        format!("hash-v1/{}", self.dimensions)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_one(text)).collect())
    }
}

/// Lowercased, accent-folded alphanumeric words.
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|ch: char| !ch.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(|word| word.chars().flat_map(char::to_lowercase).map(fold_accent).collect())
}

fn fold_accent(ch: char) -> char {
    match ch {
        'á' | 'à' | 'ä' | 'â' => 'a',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' => 'o',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        'ñ' => 'n',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::dot;

    #[test]
    fn vectors_are_unit_length_and_fixed_width() {
        let embedder = HashEmbedder::default();
        let vectors = embedder
            .embed(&["Multas por exceso de velocidad", "", "  ¿? "])
            .unwrap();
        assert_eq!(vectors.len(), 3);
        for v in &vectors {
            assert_eq!(v.len(), DEFAULT_HASH_DIMENSIONS);
            assert!((dot(v, v) - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn empty_batch_is_empty() {
        assert!(HashEmbedder::default().embed(&[]).unwrap().is_empty());
    }

    #[test]
    fn deterministic_and_accent_insensitive() {
        let embedder = HashEmbedder::new(64);
        let a = embedder.embed_query("Artículo sobre señales").unwrap();
        let b = embedder.embed_query("ARTICULO sobre senales").unwrap();
        assert_eq!(a, embedder.embed_query("Artículo sobre señales").unwrap());
        assert!((dot(&a, &b) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn shared_words_score_higher() {
        let embedder = HashEmbedder::default();
        let query = embedder.embed_query("licencia de conducción").unwrap();
        let related = embedder
            .embed_query("La licencia de conducción se renueva cada diez años.")
            .unwrap();
        let unrelated = embedder
            .embed_query("Los peatones cruzan por la cebra.")
            .unwrap();
        assert!(dot(&query, &related) > dot(&query, &unrelated));
    }

    #[test]
    fn id_encodes_dimension() {
        assert_eq!(HashEmbedder::new(128).id(), "hash-v1/128");
        assert_eq!(HashEmbedder::new(0).dimensions(), 1);
    }
}
