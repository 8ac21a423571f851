//! Quiz material selection: topic selection -> candidate pool -> per-item samples.
//!
//! Resolution precedence: explicit (unit, section) pairs win outright; bare
//! units are consulted only when no pairs were supplied at all. Unknown units
//! or sections, and pairs missing either half, are skipped silently. An empty
//! pool is `EmptyCandidates`.
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

use tutor_core::config::QuizSettings;
use tutor_core::types::ChunkId;
use tutor_core::{Error, Result};

use crate::topic_index::TopicIndex;

/// A requested (unit, section) pair as sent by clients. Either half may be
/// missing on the wire; incomplete pairs match nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionRef {
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub section: Option<String>,
}

impl SectionRef {
    pub fn new(unit: impl Into<String>, section: impl Into<String>) -> Self {
        Self { unit: Some(unit.into()), section: Some(section.into()) }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicSelection {
    pub units: Vec<String>,
    pub sections: Vec<SectionRef>,
}

/// Deduplicated chunk ids eligible for quiz generation, in ascending order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidatePool {
    ids: Vec<ChunkId>,
}

impl CandidatePool {
    pub fn ids(&self) -> &[ChunkId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

pub fn resolve_candidates(index: &TopicIndex, selection: &TopicSelection) -> Result<CandidatePool> {
    let mut ids = BTreeSet::new();
    if selection.sections.is_empty() {
        for unit in &selection.units {
            if let Some(sections) = index.unit_sections(unit) {
                for (_, chunk_ids) in sections {
                    ids.extend(chunk_ids.iter().copied());
                }
            }
        }
    } else {
        for pair in &selection.sections {
            let (Some(unit), Some(section)) = (pair.unit.as_deref(), pair.section.as_deref()) else {
                debug!(?pair, "skipping incomplete section reference");
                continue;
            };
            if let Some(chunk_ids) = index.section(unit, section) {
                ids.extend(chunk_ids.iter().copied());
            }
        }
    }
    if ids.is_empty() {
        return Err(Error::EmptyCandidates);
    }
    debug!(candidates = ids.len(), "resolved candidate pool");
    Ok(CandidatePool { ids: ids.into_iter().collect() })
}

/// Clamp a client-supplied question count into `[min_questions, max_questions]`.
pub fn clamp_question_count(requested: i64, settings: &QuizSettings) -> usize {
    let min = i64::try_from(settings.min_questions).unwrap_or(i64::MAX);
    let max = i64::try_from(settings.max_questions).unwrap_or(i64::MAX);
    usize::try_from(requested.max(min).min(max)).unwrap_or(settings.min_questions)
}

/// Draws independent samples for each quiz item. Samples are not
/// deduplicated across items, so one chunk may feed several questions.
#[derive(Debug, Clone, Copy)]
pub struct CandidateSampler {
    sample_size: usize,
}

impl CandidateSampler {
    pub fn new(sample_size: usize) -> Self {
        Self { sample_size }
    }

    /// `min(sample_size, |pool|)` distinct ids, in the order they were drawn.
    pub fn draw<R: Rng + ?Sized>(&self, pool: &CandidatePool, rng: &mut R) -> Vec<ChunkId> {
        let amount = self.sample_size.min(pool.len());
        rand::seq::index::sample(rng, pool.len(), amount)
            .into_iter()
            .map(|i| pool.ids[i])
            .collect()
    }
}
