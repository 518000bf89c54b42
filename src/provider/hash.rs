//! Hashing embedder for tests and model-free operation
//!
//! Embeds text as a signed bag of character trigrams (per lower-cased token,
//! with word-boundary markers) hashed into a fixed number of dimensions, then
//! L2-normalized. Identical strings embed identically; strings sharing no
//! trigrams are orthogonal up to hash collisions.

use crate::error::Result;
use crate::provider::Embedder;
use async_trait::async_trait;

/// Default dimensionality of `HashEmbedder`
pub const DEFAULT_DIMENSION: usize = 256;

/// Deterministic trigram-hashing embedder
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    /// Embed synchronously
    pub fn vector(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimension];
        for token in text.to_lowercase().split_whitespace() {
            let marked: Vec<char> = std::iter::once('#')
                .chain(token.chars())
                .chain(std::iter::once('#'))
                .collect();
            for gram in marked.windows(3) {
                let h = fnv1a(gram);
                let idx = (h % self.dimension as u64) as usize;
                let sign = if h >> 63 == 0 { 1.0 } else { -1.0 };
                embedding[idx] += sign;
            }
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut embedding {
                *v /= norm;
            }
        }
        embedding
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.vector(text))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

fn fnv1a(chars: &[char]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for c in chars {
        let mut buf = [0u8; 4];
        for b in c.encode_utf8(&mut buf).bytes() {
            hash ^= b as u64;
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
    }
    hash
}
