//! # folio core
//!
//! Pure logic for the folio portfolio assistant: data models, chunking, the
//! in-memory retrieval index, the portfolio tool set and the conversation
//! loop that drives a reasoning model through those tools.
//!
//! Nothing in this crate performs network or filesystem I/O. Embedding
//! backends and reasoning models are supplied by the caller through the
//! [`embedding::EmbeddingProvider`] and [`router::ReasoningModel`] traits.

pub mod chunk;
pub mod context;
pub mod embedding;
pub mod facts;
pub mod index;
pub mod models;
pub mod router;
pub mod tools;

/// Deterministic test doubles, also used by the `folio` integration tests.
#[cfg(any(test, feature = "test-support"))]
pub mod test_support {
    use anyhow::Result;
    use async_trait::async_trait;

    use crate::embedding::EmbeddingProvider;

    const BUCKETS: usize = 256;

    /// Bag-of-words embedder: each lowercase alphanumeric word is hashed
    /// into a bucket. Text without words embeds to the zero vector.
    pub struct WordHashEmbedder;

    pub fn word_vector(text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; BUCKETS];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let mut h: u64 = 0xcbf29ce484222325;
            for b in word.to_lowercase().bytes() {
                h ^= b as u64;
                h = h.wrapping_mul(0x100000001b3);
            }
            v[(h % BUCKETS as u64) as usize] += 1.0;
        }
        v
    }

    #[async_trait]
    impl EmbeddingProvider for WordHashEmbedder {
        fn model_name(&self) -> &str {
            "word-hash"
        }

        fn dims(&self) -> usize {
            BUCKETS
        }

        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|t| word_vector(t)).collect())
        }
    }
}
