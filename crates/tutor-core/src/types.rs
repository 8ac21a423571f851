//! Domain types shared by the corpus, index, retrieval, and service crates.

use serde::{Deserialize, Serialize};

/// Zero-based position of a chunk in the corpus. Stable for the process lifetime.
pub type ChunkId = usize;

/// An immutable slice of course text as produced by the offline chunker.
///
/// - `doc_id`: file stem of the source document
/// - `doc_path`: path to the source file
/// - `content`: the text payload of the chunk
/// - `chunk_index`/`total_chunks`: position within the parent document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub doc_id: String,
    pub doc_path: String,
    pub content: String,
    pub chunk_index: usize,
    pub total_chunks: usize,
}

/// A corpus chunk addressed by its position.
///
/// `id` always equals the chunk's index in the corpus and in the vector index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub doc_id: String,
    pub content: String,
}

impl Chunk {
    pub fn new(id: ChunkId, doc_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self { id, doc_id: doc_id.into(), content: content.into() }
    }
}

/// One nearest-neighbour result. `score` is an inner product of unit
/// vectors, so it lies in `[-1, 1]` and higher is better.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: ChunkId,
    pub score: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// Everything the text-generation service needs for one completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}
