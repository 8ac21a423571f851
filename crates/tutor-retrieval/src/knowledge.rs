//! Process-wide read-only state, built once at startup and shared by every request.
use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use tutor_core::config::{resolve_with_base, QuizSettings, RetrievalSettings, Settings};
use tutor_core::topics::TopicCatalog;
use tutor_core::traits::{Embedder, VectorIndex};
use tutor_core::Error;

use crate::corpus::CorpusStore;
use crate::retriever::Retriever;
use crate::sampler::{resolve_candidates, CandidatePool, CandidateSampler, TopicSelection};
use crate::topic_index::TopicIndex;

pub struct KnowledgeBase {
    corpus: CorpusStore,
    index: Box<dyn VectorIndex>,
    embedder: Box<dyn Embedder>,
    catalog: TopicCatalog,
    topic_index: TopicIndex,
    retrieval: RetrievalSettings,
    quiz: QuizSettings,
}

impl KnowledgeBase {
    /// Assemble from already-loaded parts; the topic index is derived here.
    pub fn new(
        corpus: CorpusStore,
        index: Box<dyn VectorIndex>,
        embedder: Box<dyn Embedder>,
        catalog: TopicCatalog,
        retrieval: RetrievalSettings,
        quiz: QuizSettings,
    ) -> tutor_core::Result<Self> {
        if index.len() != corpus.len() {
            return Err(Error::InvalidArtifact(format!(
                "vector index holds {} embeddings for {} chunks",
                index.len(),
                corpus.len()
            )));
        }
        if index.dim() != embedder.dim() {
            return Err(Error::InvalidArtifact(format!(
                "vector index dimension {} differs from embedder dimension {}",
                index.dim(),
                embedder.dim()
            )));
        }
        let topic_index = TopicIndex::build(&corpus, &catalog);
        Ok(Self { corpus, index, embedder, catalog, topic_index, retrieval, quiz })
    }

    /// Load topics, embedder, and the corpus artifact named by `settings`.
    /// Relative paths resolve against `base_dir`.
    pub async fn load(settings: &Settings, base_dir: &Path) -> Result<Self> {
        let topics_path = resolve_with_base(base_dir, &settings.data.topics_path);
        let catalog = TopicCatalog::load(&topics_path)?;
        let embedder = tutor_embed::load_embedder(&settings.embedding)?;
        let artifacts_dir = resolve_with_base(base_dir, &settings.data.artifacts_dir);
        let loaded = tutor_vector::load_artifacts(
            &artifacts_dir.to_string_lossy(),
            &settings.data.table_name,
            embedder.embedder_id(),
        )
        .await
        .with_context(|| format!("loading corpus artifact from {}", artifacts_dir.display()))?;
        let corpus = CorpusStore::new(loaded.chunks)?;
        let kb = Self::new(corpus, Box::new(loaded.index), embedder, catalog, settings.retrieval, settings.quiz)?;
        info!(chunks = kb.corpus.len(), "knowledge base ready");
        Ok(kb)
    }

    pub fn retriever(&self) -> Retriever<'_> {
        Retriever::new(self.embedder.as_ref(), self.index.as_ref(), &self.corpus, self.retrieval)
    }

    pub fn resolve_candidates(&self, selection: &TopicSelection) -> tutor_core::Result<CandidatePool> {
        resolve_candidates(&self.topic_index, selection)
    }

    pub fn sampler(&self) -> CandidateSampler {
        CandidateSampler::new(self.quiz.sample_size)
    }

    pub fn corpus(&self) -> &CorpusStore {
        &self.corpus
    }

    pub fn catalog(&self) -> &TopicCatalog {
        &self.catalog
    }

    pub fn quiz_settings(&self) -> &QuizSettings {
        &self.quiz
    }
}
