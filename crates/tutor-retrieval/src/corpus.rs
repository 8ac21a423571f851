use tutor_core::types::{Chunk, ChunkId};
use tutor_core::{Error, Result};

/// Separator placed between chunks when they are joined into one context string.
pub const CONTEXT_SEPARATOR: &str = "\n\n";

/// Ordered, immutable chunk list. `chunks[i].id == i` always holds.
#[derive(Debug, Clone, Default)]
pub struct CorpusStore {
    chunks: Vec<Chunk>,
}

impl CorpusStore {
    pub fn new(chunks: Vec<Chunk>) -> Result<Self> {
        if let Some((pos, chunk)) = chunks.iter().enumerate().find(|(pos, c)| c.id != *pos) {
            return Err(Error::InvalidArtifact(format!("chunk at position {pos} carries id {}", chunk.id)));
        }
        Ok(Self { chunks })
    }

    /// Number chunks in the given order; `doc_id` is left empty.
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let chunks = texts.into_iter().enumerate().map(|(id, t)| Chunk::new(id, "", t)).collect();
        Self { chunks }
    }

    pub fn get(&self, id: ChunkId) -> Option<&Chunk> {
        self.chunks.get(id)
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.iter()
    }

    /// Join chunk texts in the order given by `ids`.
    pub fn join(&self, ids: &[ChunkId]) -> Result<String> {
        let texts = ids
            .iter()
            .map(|&id| self.get(id).map(|c| c.content.as_str()).ok_or_else(|| Error::NotFound(format!("chunk {id}"))))
            .collect::<Result<Vec<_>>>()?;
        Ok(texts.join(CONTEXT_SEPARATOR))
    }
}
