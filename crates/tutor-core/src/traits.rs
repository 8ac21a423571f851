use async_trait::async_trait;

use crate::types::{CompletionRequest, SearchHit};

/// Maps text to unit-length vectors.
///
/// The same implementation (same `embedder_id`) must be used for the offline
/// corpus build and for live queries, otherwise scores are not comparable.
pub trait Embedder: Send + Sync {
    /// Identifies the model and every preprocessing parameter that affects output.
    fn embedder_id(&self) -> &str;
    fn dim(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;

    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| anyhow::anyhow!("embedder returned no vector"))
    }
}

/// Read-only nearest-neighbour search over one embedding per chunk.
pub trait VectorIndex: Send + Sync {
    fn len(&self) -> usize;
    fn dim(&self) -> usize;
    /// At most `k` hits, descending by score.
    fn search(&self, query: &[f32], k: usize) -> anyhow::Result<Vec<SearchHit>>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Opaque text-completion service.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> crate::Result<String>;
}
