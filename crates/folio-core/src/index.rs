//! In-memory retrieval index over document fragments.
//!
//! Built once from the corpus at startup and never mutated. Every document is
//! split with [`chunk_text`], every fragment is embedded, and queries rank
//! fragments by brute-force cosine similarity against the query embedding.
//!
//! Ranking ties keep insertion order, which is corpus order then fragment
//! order.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::chunk::chunk_text;
use crate::embedding::{cosine_similarity, embed_one, EmbeddingProvider};
use crate::models::Document;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("cannot build a retrieval index from an empty corpus")]
    EmptyCorpus,
    #[error("embedding provider returned {got} vectors for {expected} fragments")]
    VectorCountMismatch { expected: usize, got: usize },
    #[error("k must be at least 1")]
    ZeroK,
    #[error("embedding failed: {0}")]
    Embedding(#[from] anyhow::Error),
}

/// Tuning for index construction.
#[derive(Debug, Clone)]
pub struct IndexOptions {
    /// Maximum fragment size in tokens.
    pub max_tokens: usize,
    /// Number of fragments sent to the embedding provider per call.
    pub batch_size: usize,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            max_tokens: 700,
            batch_size: 64,
        }
    }
}

struct IndexedFragment {
    document: String,
    source: String,
    chunk_index: i64,
    text: String,
    vector: Vec<f32>,
}

/// A fragment returned from [`RetrievalIndex::query`].
#[derive(Debug, Clone, Serialize)]
pub struct RetrievedFragment {
    /// Name of the document the fragment belongs to.
    pub document: String,
    pub source: String,
    pub chunk_index: i64,
    pub text: String,
    /// Cosine similarity to the query.
    pub score: f32,
}

pub struct RetrievalIndex {
    fragments: Vec<IndexedFragment>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl RetrievalIndex {
    /// Chunk and embed `documents`.
    ///
    /// Fails with [`IndexError::EmptyCorpus`] when there is nothing to index.
    pub async fn build(
        documents: &[Document],
        embedder: Arc<dyn EmbeddingProvider>,
        options: &IndexOptions,
    ) -> Result<Self, IndexError> {
        if documents.is_empty() {
            return Err(IndexError::EmptyCorpus);
        }

        let mut pending: Vec<(&Document, i64, String)> = Vec::new();
        for doc in documents {
            for chunk in chunk_text(&doc.name, &doc.content, options.max_tokens) {
                pending.push((doc, chunk.chunk_index, chunk.text));
            }
        }

        let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(pending.len());
        for batch in pending.chunks(options.batch_size.max(1)) {
            let texts: Vec<String> = batch.iter().map(|(_, _, t)| t.clone()).collect();
            let embedded = embedder.embed(&texts).await?;
            if embedded.len() != texts.len() {
                return Err(IndexError::VectorCountMismatch {
                    expected: texts.len(),
                    got: embedded.len(),
                });
            }
            vectors.extend(embedded);
        }

        let fragments: Vec<IndexedFragment> = pending
            .into_iter()
            .zip(vectors)
            .map(|((doc, chunk_index, text), vector)| IndexedFragment {
                document: doc.name.clone(),
                source: doc.source.clone(),
                chunk_index,
                text,
                vector,
            })
            .collect();

        debug!(
            documents = documents.len(),
            fragments = fragments.len(),
            model = embedder.model_name(),
            "retrieval index built"
        );

        Ok(Self {
            fragments,
            embedder,
        })
    }

    /// Number of indexed fragments.
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn model_name(&self) -> &str {
        self.embedder.model_name()
    }

    /// Return up to `k` fragments most similar to `text`, best first.
    pub async fn query(&self, text: &str, k: usize) -> Result<Vec<RetrievedFragment>, IndexError> {
        if k == 0 {
            return Err(IndexError::ZeroK);
        }

        let query_vec = embed_one(self.embedder.as_ref(), text).await?;

        let mut scored: Vec<(usize, f32)> = self
            .fragments
            .iter()
            .enumerate()
            .map(|(i, f)| (i, cosine_similarity(&query_vec, &f.vector)))
            .collect();
        // Stable sort: equal scores keep corpus order.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(i, score)| {
                let f = &self.fragments[i];
                RetrievedFragment {
                    document: f.document.clone(),
                    source: f.source.clone(),
                    chunk_index: f.chunk_index,
                    text: f.text.clone(),
                    score,
                }
            })
            .collect())
    }
}
