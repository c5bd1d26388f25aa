//! Feature-hashing embedding provider.

use crate::embeddings::pooling::{l2_normalize, mean_pooling};
use crate::embeddings::provider::EmbeddingProvider;
use assist_core::AppResult;
use tract_onnx::prelude::tract_ndarray::{Array2, Array3};

/// Deterministic provider for development and tests.
///
/// Every word becomes a token vector built from hashed character trigrams and
/// the whole word, and token vectors go through the same masked mean pooling
/// as the encoder output. Not semantically accurate, but stable and
/// content-dependent.
#[derive(Debug)]
pub struct HashingProvider {
    dimensions: usize,
    max_length: usize,
    normalize: bool,
}

impl HashingProvider {
    /// Create a new hashing provider.
    pub fn new(dimensions: usize, max_length: usize, normalize: bool) -> Self {
        Self {
            dimensions: dimensions.max(1),
            max_length: max_length.max(1),
            normalize,
        }
    }

    /// Lowercased word tokens, truncated to `max_length`.
    fn tokenize(&self, text: &str) -> Vec<String> {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(|w| w.to_lowercase())
            .take(self.max_length)
            .collect()
    }

    fn hash(bytes: &[u8], seed: u64) -> u64 {
        bytes
            .iter()
            .fold(seed, |acc, b| acc.wrapping_mul(37).wrapping_add(*b as u64))
    }

    /// Write the vector of one token into `out`.
    fn token_vector(&self, token: &str, out: &mut [f32]) {
        let chars: Vec<char> = token.chars().collect();

        for window in chars.windows(3) {
            let trigram: String = window.iter().collect();
            let h = Self::hash(trigram.as_bytes(), 17);
            let sign = if h & 1 == 0 { 1.0 } else { -1.0 };
            out[(h >> 1) as usize % self.dimensions] += sign * 0.5;
        }

        let h = Self::hash(token.as_bytes(), 31);
        out[h as usize % self.dimensions] += 1.0;
    }

    fn embed_texts(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let tokenized: Vec<Vec<String>> = texts.iter().map(|t| self.tokenize(t)).collect();
        let seq_len = tokenized.iter().map(Vec::len).max().unwrap_or(0);

        let mut tokens = Array3::<f32>::zeros((texts.len(), seq_len, self.dimensions));
        let mut mask = Array2::<i64>::zeros((texts.len(), seq_len));

        for (i, words) in tokenized.iter().enumerate() {
            for (j, word) in words.iter().enumerate() {
                let mut lane = vec![0.0f32; self.dimensions];
                self.token_vector(word, &mut lane);
                for (k, v) in lane.into_iter().enumerate() {
                    tokens[[i, j, k]] = v;
                }
                mask[[i, j]] = 1;
            }
        }

        let pooled = mean_pooling(tokens.view(), mask.view())?;

        Ok(pooled
            .outer_iter()
            .map(|row| {
                let mut v = row.to_vec();
                if self.normalize {
                    l2_normalize(&mut v);
                }
                v
            })
            .collect())
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for HashingProvider {
    fn provider_name(&self) -> &str {
        "hashing"
    }

    fn model_name(&self) -> &str {
        "hashing-v1"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        self.embed_texts(texts)
    }
}
