//! Keyword topic index: (unit, section) -> chunk ids.
//!
//! A chunk belongs to a section iff its lowercased text contains at least one
//! of the section's lowercased keywords as a substring. The scan is linear in
//! chunks x keywords per section, which is fine for course-sized corpora; an
//! inverted keyword index would satisfy the same contract for larger ones.
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

use tutor_core::topics::TopicCatalog;
use tutor_core::types::ChunkId;

use crate::corpus::CorpusStore;

pub type SectionChunks = BTreeSet<ChunkId>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicIndex {
    units: BTreeMap<String, BTreeMap<String, SectionChunks>>,
}

impl TopicIndex {
    pub fn build(corpus: &CorpusStore, catalog: &TopicCatalog) -> Self {
        let lowered: Vec<(ChunkId, String)> = corpus.iter().map(|c| (c.id, c.content.to_lowercase())).collect();
        let mut units = BTreeMap::new();
        for (unit_name, unit) in catalog.units() {
            let mut sections = BTreeMap::new();
            for (section_name, section) in unit {
                let keywords = section.lowercase_keywords();
                let ids: SectionChunks = lowered
                    .iter()
                    .filter(|(_, text)| keywords.iter().any(|kw| text.contains(kw.as_str())))
                    .map(|(id, _)| *id)
                    .collect();
                debug!(unit = unit_name, section = %section_name, chunks = ids.len(), "indexed section");
                sections.insert(section_name.clone(), ids);
            }
            units.insert(unit_name.to_string(), sections);
        }
        let index = Self { units };
        info!(units = index.units.len(), chunks = corpus.len(), "built topic index");
        index
    }

    pub fn section(&self, unit: &str, section: &str) -> Option<&SectionChunks> {
        self.units.get(unit).and_then(|s| s.get(section))
    }

    /// Every section of `unit`, or `None` for an unknown unit.
    pub fn unit_sections(&self, unit: &str) -> Option<impl Iterator<Item = (&str, &SectionChunks)>> {
        self.units.get(unit).map(|s| s.iter().map(|(name, ids)| (name.as_str(), ids)))
    }
}
