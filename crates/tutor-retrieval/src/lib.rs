//! Retrieval core of the tutor: corpus store, relevance-gated retriever,
//! keyword topic index, and the candidate sampler used for quiz material.
pub mod corpus;
pub mod knowledge;
pub mod retriever;
pub mod sampler;
pub mod topic_index;

pub use corpus::{CorpusStore, CONTEXT_SEPARATOR};
pub use knowledge::KnowledgeBase;
pub use retriever::{passes_gate, RetrievalResult, Retriever};
pub use sampler::{clamp_question_count, resolve_candidates, CandidatePool, CandidateSampler, SectionRef, TopicSelection};
pub use topic_index::TopicIndex;
