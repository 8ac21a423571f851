//! Embedding retrieval with a relevance gate.
//!
//! The gate compares the single best neighbour score against `min_score`.
//! A question below the gate is out of scope: no chunks are returned and the
//! caller must not invoke generation.
use anyhow::Result;
use tracing::debug;

use tutor_core::config::RetrievalSettings;
use tutor_core::traits::{Embedder, VectorIndex};
use tutor_core::types::{Chunk, SearchHit};

use crate::corpus::{CorpusStore, CONTEXT_SEPARATOR};

#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalResult {
    pub in_scope: bool,
    /// Raw neighbours, descending by score, kept even when out of scope.
    pub hits: Vec<SearchHit>,
    /// Chunks behind `hits` in the same order; empty when out of scope.
    pub chunks: Vec<Chunk>,
}

impl RetrievalResult {
    pub fn best_score(&self) -> Option<f32> {
        self.hits.first().map(|h| h.score)
    }

    /// Chunk texts joined by blank lines, in descending-score order.
    pub fn context(&self) -> String {
        self.chunks.iter().map(|c| c.content.as_str()).collect::<Vec<_>>().join(CONTEXT_SEPARATOR)
    }
}

/// True when `best` clears the gate. No hits or a NaN score never pass.
pub fn passes_gate(best: Option<f32>, min_score: f32) -> bool {
    best.is_some_and(|score| score >= min_score)
}

pub struct Retriever<'a> {
    embedder: &'a dyn Embedder,
    index: &'a dyn VectorIndex,
    corpus: &'a CorpusStore,
    settings: RetrievalSettings,
}

impl<'a> Retriever<'a> {
    pub fn new(
        embedder: &'a dyn Embedder,
        index: &'a dyn VectorIndex,
        corpus: &'a CorpusStore,
        settings: RetrievalSettings,
    ) -> Self {
        Self { embedder, index, corpus, settings }
    }

    pub fn retrieve(&self, question: &str) -> Result<RetrievalResult> {
        let query = self.embedder.embed(question)?;
        let hits = self.index.search(&query, self.settings.top_k)?;
        let best = hits.first().map(|h| h.score);
        if !passes_gate(best, self.settings.min_score) {
            debug!(best_score = ?best, min_score = self.settings.min_score, "question out of scope");
            return Ok(RetrievalResult { in_scope: false, hits, chunks: Vec::new() });
        }
        let chunks = hits
            .iter()
            .map(|h| {
                self.corpus
                    .get(h.id)
                    .cloned()
                    .ok_or_else(|| tutor_core::Error::InvalidArtifact(format!("index returned unknown chunk {}", h.id)))
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        debug!(best_score = ?best, chunks = chunks.len(), "question in scope");
        Ok(RetrievalResult { in_scope: true, hits, chunks })
    }
}
